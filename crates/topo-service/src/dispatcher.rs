//! The per-request adapter installed behind every registered route.
//!
//! For each request the [`Dispatcher`]:
//!
//! 1. reads the language, user and owner headers (absent means empty)
//! 2. binds an error formatter and localizer to the language
//! 3. buffers the body, answering [`codes::HTTP_READ_BODY_FAILED`] on error
//! 4. parses it as a JSON object, answering [`codes::JSON_UNMARSHAL_FAILED`]
//!    on error (an empty body is an empty object)
//! 5. builds the [`ContextParams`]
//! 6. invokes the handler
//! 7. maps the outcome to an envelope code
//! 8. writes exactly one `application/json` envelope with status 200
//!
//! Steps 3 and 4 short-circuit; the handler never sees an unreadable or
//! malformed request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, Query, RawPathParams, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use topo_i18n::codes::{self, ErrorCode};
use topo_i18n::{ActionError, LocaleFactory};
use tracing::{debug, error, info_span, Instrument};

use crate::action::{BoxedHandler, PathParams, QueryParams};
use crate::body::RequestBody;
use crate::context::{ContextParams, Headers};
use crate::envelope;

/// Wraps business handlers with decoding, context and enveloping.
///
/// Holds only read-only shared state, so one instance serves every
/// route and every concurrent request.
pub struct Dispatcher<S> {
    locale: Arc<dyn LocaleFactory>,
    support: Arc<S>,
    max_body_bytes: usize,
}

impl<S: Send + Sync + 'static> Dispatcher<S> {
    /// Create a dispatcher.
    pub fn new(locale: Arc<dyn LocaleFactory>, support: Arc<S>, max_body_bytes: usize) -> Self {
        Self {
            locale,
            support,
            max_body_bytes,
        }
    }

    /// Handle one request with `handler`.
    ///
    /// The route's placeholders are bound by position as `p0`, `p1`, ...;
    /// `param_names` gives the names the handler declared for them.
    ///
    /// Never fails: every outcome, including transport and decode errors,
    /// becomes an envelope.
    pub async fn dispatch(
        &self,
        handler: &BoxedHandler<S>,
        param_names: &[String],
        request: Request,
    ) -> Response {
        let (parts, body) = request.into_parts();
        let header = Headers::from_header_map(&parts.headers);
        let span = info_span!(
            "dispatch",
            method = %parts.method,
            path = %parts.uri.path(),
            request_id = %header.request_id,
        );

        self.run(handler, param_names, parts, body, header)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        handler: &BoxedHandler<S>,
        param_names: &[String],
        mut parts: Parts,
        body: Body,
        header: Headers,
    ) -> Response {
        let errors = self.locale.error_formatter(&header.language);
        let lang = self.locale.localizer(&header.language);

        let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "read http request body failed");
                let err = errors.error(codes::HTTP_READ_BODY_FAILED);
                return respond(codes::HTTP_READ_BODY_FAILED, err.message());
            }
        };

        let body = match RequestBody::parse(&bytes) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "failed to unmarshal the request body");
                let err = errors.error(codes::JSON_UNMARSHAL_FAILED);
                return respond(codes::JSON_UNMARSHAL_FAILED, err.message());
            }
        };

        let path = path_params(&mut parts, param_names).await;
        let query = query_params(&parts);

        let ctx = ContextParams {
            errors,
            lang,
            header,
            support: Arc::clone(&self.support),
        };

        let call = handler.as_ref();
        match call(ctx, path, query, body).await {
            Ok(data) => respond(codes::SUCCESS, &data),
            Err(err) => {
                let (code, message) = classify(err);
                error!(code, error = %message, "action failed");
                respond(code, &message)
            }
        }
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// The envelope code and message for a handler error.
///
/// Coded errors keep their code; every other error reports
/// [`codes::SYSTEM_BUSY`] with its original text.
pub fn classify(err: ActionError) -> (ErrorCode, String) {
    match err {
        ActionError::Coded { code, message } => (code, message),
        ActionError::Generic { message } => (codes::SYSTEM_BUSY, message),
    }
}

async fn path_params(parts: &mut Parts, param_names: &[String]) -> PathParams {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(key, value)| (declared_name(key, param_names), value.to_owned()))
            .collect(),
        Err(e) => {
            debug!(error = %e, "path parameters unavailable");
            HashMap::new()
        }
    }
}

/// Map a positional slot (`p0`) back to the handler's placeholder name.
fn declared_name(slot: &str, param_names: &[String]) -> String {
    slot.strip_prefix('p')
        .and_then(|position| position.parse::<usize>().ok())
        .and_then(|position| param_names.get(position))
        .map_or_else(|| slot.to_owned(), Clone::clone)
}

fn query_params(parts: &Parts) -> QueryParams {
    match Query::<QueryParams>::try_from_uri(&parts.uri) {
        Ok(Query(params)) => params,
        Err(e) => {
            debug!(error = %e, "query parameters unavailable");
            HashMap::new()
        }
    }
}

/// Serialize and write one envelope.
///
/// A payload that cannot be serialized is logged and replaced by a
/// [`codes::JSON_MARSHAL_FAILED`] envelope.
fn respond<T: Serialize + ?Sized>(code: ErrorCode, payload: &T) -> Response {
    let bytes = envelope::build(code, payload).unwrap_or_else(|e| {
        error!(code, error = %e, "failed to marshal the response envelope");
        envelope::build(codes::JSON_MARSHAL_FAILED, &e.to_string())
            .unwrap_or_else(|_| envelope::MARSHAL_FAILED_FALLBACK.to_vec())
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        bytes,
    )
        .into_response()
}
