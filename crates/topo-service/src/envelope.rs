//! The uniform JSON response envelope.
//!
//! ```json
//! { "result": true,  "code": 0,       "message": "success", "data": {...} }
//! { "result": false, "code": 1199000, "message": "...",     "data": null }
//! ```
//!
//! [`build`] is what the dispatcher writes with; [`Envelope`] is the owned
//! form for clients and tests that read envelopes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use topo_i18n::codes::{self, ErrorCode};

/// Written when even a failure envelope cannot be serialized.
pub const MARSHAL_FAILED_FALLBACK: &[u8] =
    br#"{"result":false,"code":1199001,"message":"failed to marshal the response as JSON","data":null}"#;

/// An envelope read back from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// `true` iff `code` is [`codes::SUCCESS`].
    pub result: bool,
    /// Result code.
    pub code: ErrorCode,
    /// Success string, or the failure description.
    pub message: Value,
    /// Handler payload on success, `null` otherwise.
    pub data: Value,
}

impl Envelope {
    /// A success envelope around `data`.
    pub fn success(data: Value) -> Self {
        Self {
            result: true,
            code: codes::SUCCESS,
            message: Value::from(codes::SUCCESS_STR),
            data,
        }
    }
}

#[derive(Serialize)]
struct Wire<'a, M: Serialize + ?Sized, D: Serialize + ?Sized> {
    result: bool,
    code: ErrorCode,
    message: Option<&'a M>,
    data: Option<&'a D>,
}

/// Serialize an envelope for `code` around `payload`.
///
/// When `code` is [`codes::SUCCESS`] the payload becomes `data` and
/// `message` is [`codes::SUCCESS_STR`]; otherwise the payload becomes
/// `message` and `data` is `null`.
///
/// # Errors
///
/// Returns the serializer error if `payload` cannot be serialized.
pub fn build<T: Serialize + ?Sized>(code: ErrorCode, payload: &T) -> Result<Vec<u8>, serde_json::Error> {
    if codes::is_success(code) {
        serde_json::to_vec(&Wire {
            result: true,
            code,
            message: Some(codes::SUCCESS_STR),
            data: Some(payload),
        })
    } else {
        serde_json::to_vec(&Wire::<T, ()> {
            result: false,
            code,
            message: Some(payload),
            data: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(bytes: &[u8]) -> Envelope {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn success_places_payload_in_data() {
        let bytes = build(codes::SUCCESS, &json!({"bk_set_id": 7})).unwrap();
        assert_eq!(parse(&bytes), Envelope::success(json!({"bk_set_id": 7})));
    }

    #[test]
    fn success_with_string_payload_matches_wire_format() {
        let bytes = build(codes::SUCCESS, "pong").unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"result":true,"code":0,"message":"success","data":"pong"}"#
        );
    }

    #[test]
    fn failure_places_payload_in_message() {
        let bytes = build(codes::JSON_UNMARSHAL_FAILED, "bad body").unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"result":false,"code":1199000,"message":"bad body","data":null}"#
        );
    }

    #[test]
    fn failure_message_may_be_structured() {
        let bytes = build(codes::PARAMS_INVALID, &json!({"field": "bk_obj_id"})).unwrap();
        let envelope = parse(&bytes);
        assert!(!envelope.result);
        assert_eq!(envelope.message["field"], "bk_obj_id");
        assert!(envelope.data.is_null());
    }

    #[test]
    fn fallback_is_a_valid_failure_envelope() {
        let envelope = parse(MARSHAL_FAILED_FALLBACK);
        assert_eq!(envelope.code, codes::JSON_MARSHAL_FAILED);
        assert!(!envelope.result);
    }

    #[test]
    fn unserializable_payload_is_an_error() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1_u8], "non-string key");
        assert!(build(codes::SUCCESS, &map).is_err());
    }
}
