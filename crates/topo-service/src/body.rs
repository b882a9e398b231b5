//! The decoded request body.
//!
//! The dispatcher only guarantees that the payload is a JSON object.
//! Handlers convert it into a typed request with [`RequestBody::decode`]
//! or [`RequestBody::decode_validated`] instead of probing fields.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use topo_i18n::{codes, ActionError, ErrorFormatter};
use validator::Validate;

/// A JSON object parsed from the request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody(Map<String, Value>);

impl RequestBody {
    /// Parse a raw payload.
    ///
    /// An empty (or whitespace-only) payload and a literal `null` both
    /// yield an empty body, since many actions take no input.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the payload is not JSON, or is JSON
    /// but not an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let map: Option<Map<String, Value>> = serde_json::from_slice(bytes)?;
        Ok(Self(map.unwrap_or_default()))
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The string stored under `key`, if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether the body has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Convert into a typed request.
    ///
    /// # Errors
    ///
    /// Returns a [`codes::PARAMS_INVALID`] error rendered by `errors` if
    /// the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, errors: &dyn ErrorFormatter) -> Result<T, ActionError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| errors.errorf(codes::PARAMS_INVALID, &[&e]))
    }

    /// Convert into a typed request and run its validation rules.
    ///
    /// # Errors
    ///
    /// Returns a [`codes::PARAMS_INVALID`] error rendered by `errors` if
    /// the body does not match `T` or fails validation.
    pub fn decode_validated<T>(&self, errors: &dyn ErrorFormatter) -> Result<T, ActionError>
    where
        T: DeserializeOwned + Validate,
    {
        let value: T = self.decode(errors)?;
        value
            .validate()
            .map_err(|e| errors.errorf(codes::PARAMS_INVALID, &[&e]))?;
        Ok(value)
    }
}
