//! Numeric result codes carried in the response envelope.
//!
//! The values match the service's public error catalog, so clients
//! that switch on `code` keep working across implementations.

/// A result code as carried in the envelope's `code` field.
pub type ErrorCode = i64;

/// The request succeeded.
pub const SUCCESS: ErrorCode = 0;

/// Message placed in the envelope alongside [`SUCCESS`].
pub const SUCCESS_STR: &str = "success";

/// Generic failure for errors that carry no code of their own.
pub const SYSTEM_BUSY: ErrorCode = -1;

/// The request body is not a JSON object.
pub const JSON_UNMARSHAL_FAILED: ErrorCode = 1_199_000;

/// The response payload could not be serialized.
pub const JSON_MARSHAL_FAILED: ErrorCode = 1_199_001;

/// The request body could not be read from the transport.
pub const HTTP_READ_BODY_FAILED: ErrorCode = 1_199_002;

/// A request parameter failed decoding or validation.
pub const PARAMS_INVALID: ErrorCode = 1_199_006;

/// Whether `code` denotes success.
pub const fn is_success(code: ErrorCode) -> bool {
    code == SUCCESS
}
