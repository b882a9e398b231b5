//! Per-request context handed to every business handler.
//!
//! A [`ContextParams`] is built fresh for each request and never shared
//! across requests. It carries the locale-bound error formatter and
//! localizer, the caller's identity headers, and the service's shared
//! support facility.

use std::fmt;
use std::sync::Arc;

use axum::http::HeaderMap;
use topo_i18n::{ErrorFormatter, Localizer};
use uuid::Uuid;

/// Header carrying the caller's language tag.
pub const LANGUAGE_HEADER: &str = "HTTP_BLUEKING_LANGUAGE";

/// Header carrying the acting user.
pub const USER_HEADER: &str = "BK_User";

/// Header carrying the tenant (supplier) identifier.
pub const OWNER_ID_HEADER: &str = "HTTP_BLUEKING_SUPPLIER_ID";

/// Header carrying the caller-assigned request id.
pub const REQUEST_ID_HEADER: &str = "Cc_Request_Id";

/// Identity and locale values read from the request.
///
/// Absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    /// Caller's language tag as sent (not normalized).
    pub language: String,
    /// Acting user.
    pub user: String,
    /// Tenant identifier.
    pub owner_id: String,
    /// Request id from the caller, or a generated v4 UUID.
    pub request_id: String,
}

impl Headers {
    /// Read the identity headers from a request's header map.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let request_id = header_value(headers, REQUEST_ID_HEADER);
        Self {
            language: header_value(headers, LANGUAGE_HEADER),
            user: header_value(headers, USER_HEADER),
            owner_id: header_value(headers, OWNER_ID_HEADER),
            request_id: if request_id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                request_id
            },
        }
    }
}

/// The value of `name`, or an empty string if it is absent or not
/// valid visible ASCII.
pub fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
        .to_owned()
}

/// Everything a handler needs beyond its path, query and body.
///
/// `S` is the business core's support facility; the dispatcher passes it
/// through untouched.
pub struct ContextParams<S> {
    /// Error formatter bound to the caller's language.
    pub errors: Arc<dyn ErrorFormatter>,
    /// Text localizer bound to the caller's language.
    pub lang: Arc<dyn Localizer>,
    /// Identity and locale headers.
    pub header: Headers,
    /// Shared support facility.
    pub support: Arc<S>,
}

impl<S> Clone for ContextParams<S> {
    fn clone(&self) -> Self {
        Self {
            errors: Arc::clone(&self.errors),
            lang: Arc::clone(&self.lang),
            header: self.header.clone(),
            support: Arc::clone(&self.support),
        }
    }
}

impl<S> fmt::Debug for ContextParams<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextParams")
            .field("language", &self.errors.language())
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_identity_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("http_blueking_language", HeaderValue::from_static("zh-cn"));
        headers.insert("bk_user", HeaderValue::from_static("admin"));
        headers.insert("http_blueking_supplier_id", HeaderValue::from_static("0"));
        headers.insert("cc_request_id", HeaderValue::from_static("rid-1"));

        let parsed = Headers::from_header_map(&headers);
        assert_eq!(parsed.language, "zh-cn");
        assert_eq!(parsed.user, "admin");
        assert_eq!(parsed.owner_id, "0");
        assert_eq!(parsed.request_id, "rid-1");
    }

    #[test]
    fn absent_headers_are_empty() {
        let parsed = Headers::from_header_map(&HeaderMap::new());
        assert!(parsed.language.is_empty());
        assert!(parsed.user.is_empty());
        assert!(parsed.owner_id.is_empty());
        assert!(Uuid::parse_str(&parsed.request_id).is_ok());
    }

    #[test]
    fn non_ascii_header_is_treated_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "bk_user",
            HeaderValue::from_bytes("用户".as_bytes()).unwrap(),
        );
        assert_eq!(header_value(&headers, USER_HEADER), "");
    }
}
