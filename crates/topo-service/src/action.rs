//! Action descriptors: one exposed operation each.
//!
//! An [`Action`] pairs an HTTP method and a path pattern with a business
//! handler. Handlers are async functions of the form
//!
//! ```rust,ignore
//! async fn find_set(
//!     ctx: ContextParams<Core>,
//!     path: PathParams,
//!     query: QueryParams,
//!     body: RequestBody,
//! ) -> Result<impl Serialize, ActionError>
//! ```
//!
//! The registrar consumes the descriptors at startup; afterwards only the
//! type-erased [`BoxedHandler`] survives inside the router.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use topo_i18n::{codes, ActionError};

use crate::body::RequestBody;
use crate::context::ContextParams;

/// Path parameters captured by the route pattern.
pub type PathParams = HashMap<String, String>;

/// Query-string parameters.
pub type QueryParams = HashMap<String, String>;

/// A type-erased business handler.
///
/// Resolves to the handler's payload already converted to JSON.
pub type BoxedHandler<S> = Arc<
    dyn Fn(
            ContextParams<S>,
            PathParams,
            QueryParams,
            RequestBody,
        ) -> BoxFuture<'static, Result<Value, ActionError>>
        + Send
        + Sync,
>;

/// One exposed operation: method, path pattern, handler.
///
/// Path patterns use `{name}` segments for parameters, e.g.
/// `/inst/{bk_obj_id}/{inst_id}`.
pub struct Action<S> {
    method: Method,
    path: String,
    handler: BoxedHandler<S>,
}

impl<S: Send + Sync + 'static> Action<S> {
    /// Describe an action.
    ///
    /// The handler's payload is converted to JSON when it resolves; a
    /// payload that cannot be converted becomes a
    /// [`codes::JSON_MARSHAL_FAILED`] error.
    pub fn new<F, Fut, T>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ContextParams<S>, PathParams, QueryParams, RequestBody) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler: BoxedHandler<S> = Arc::new(
            move |ctx: ContextParams<S>, path: PathParams, query: QueryParams, body: RequestBody| {
                let pending = handler(ctx, path, query, body);
                async move {
                    let payload = pending.await?;
                    serde_json::to_value(payload)
                        .map_err(|e| ActionError::coded(codes::JSON_MARSHAL_FAILED, e.to_string()))
                }
                .boxed()
            },
        );

        Self {
            method,
            path: path.into(),
            handler,
        }
    }

    /// A `GET` action.
    pub fn get<F, Fut, T>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ContextParams<S>, PathParams, QueryParams, RequestBody) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::new(Method::GET, path, handler)
    }

    /// A `POST` action.
    pub fn post<F, Fut, T>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ContextParams<S>, PathParams, QueryParams, RequestBody) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::new(Method::POST, path, handler)
    }

    /// A `PUT` action.
    pub fn put<F, Fut, T>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ContextParams<S>, PathParams, QueryParams, RequestBody) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::new(Method::PUT, path, handler)
    }

    /// A `DELETE` action.
    pub fn delete<F, Fut, T>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ContextParams<S>, PathParams, QueryParams, RequestBody) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::new(Method::DELETE, path, handler)
    }
}

impl<S> Action<S> {
    /// The path pattern, relative to the service prefix.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Split into parts for route binding.
    pub(crate) fn into_parts(self) -> (Method, String, BoxedHandler<S>) {
        (self.method, self.path, self.handler)
    }
}

impl<S> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
