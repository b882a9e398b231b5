//! The error type returned by business handlers.
//!
//! The dispatcher branches on the variant: a [`ActionError::Coded`] error
//! reports its own code, anything else is reported as
//! [`SYSTEM_BUSY`](crate::codes::SYSTEM_BUSY).

use crate::codes::ErrorCode;

/// A failure reported by a business handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// A failure with an explicit numeric code.
    #[error("{message}")]
    Coded {
        /// Code surfaced in the envelope.
        code: ErrorCode,
        /// Human-readable (usually localized) description.
        message: String,
    },

    /// A failure that carries only text.
    #[error("{message}")]
    Generic {
        /// Human-readable description, kept for diagnostics.
        message: String,
    },
}

impl ActionError {
    /// Build a coded error.
    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Coded {
            code,
            message: message.into(),
        }
    }

    /// Build an uncoded error.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// The explicit code, if this error carries one.
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Coded { code, .. } => Some(*code),
            Self::Generic { .. } => None,
        }
    }

    /// The message text regardless of variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Coded { message, .. } | Self::Generic { message } => message,
        }
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        Self::generic(format!("{err:#}"))
    }
}
