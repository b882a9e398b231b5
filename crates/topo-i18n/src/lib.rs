//! Result codes, business errors, and localization for the topology service.
//!
//! Every request handled by the dispatcher gets a locale-bound
//! [`ErrorFormatter`] and [`Localizer`] built from the caller's language
//! tag. Both are produced by a [`LocaleFactory`]; [`MessageCatalog`] is the
//! file-backed implementation used in production.
//!
//! # Error model
//!
//! Business handlers return [`ActionError`], which is either
//! [`ActionError::Coded`] (the numeric code is surfaced to the client
//! verbatim) or [`ActionError::Generic`] (surfaced with
//! [`codes::SYSTEM_BUSY`]).

pub mod catalog;
pub mod codes;
pub mod error;

pub use catalog::{
    normalize_language, CatalogError, ErrorFormatter, LocaleFactory, Localizer, MessageCatalog,
};
pub use codes::ErrorCode;
pub use error::ActionError;
