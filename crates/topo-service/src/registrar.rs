//! Binding action descriptors to live Axum routes.
//!
//! The [`Registrar`] is built at startup, fed the service's actions, and
//! consumed once by [`Registrar::register`]. Calling `register` is the only
//! mutation of the routing table.
//!
//! Paths are grouped by shape: placeholder names are replaced by their
//! position before binding, so `GET /inst/{bk_obj_id}` and
//! `POST /inst/{inst_id}` share one Axum route while each handler still
//! sees its own parameter names.
//!
//! Routes that cannot be bound are logged and skipped, never fatal:
//!
//! - methods other than `GET`, `POST`, `PUT`, `DELETE`
//! - paths that do not start with `/`, use `:param` segments, or carry
//!   braces that do not enclose a whole segment
//! - shapes the router still refuses to insert
//!
//! A repeated `(method, shape)` pair replaces the earlier handler.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::action::{Action, BoxedHandler};
use crate::dispatcher::Dispatcher;

/// Outcome of [`Registrar::register`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    /// `METHOD /path` for every route bound, in path order.
    pub bound: Vec<String>,
    /// `METHOD /path` for every action that was skipped.
    pub skipped: Vec<String>,
}

/// Collects actions and binds them under one path prefix.
pub struct Registrar<S> {
    prefix: String,
    actions: Vec<Action<S>>,
}

struct Binding<S> {
    method: Method,
    filter: MethodFilter,
    path: String,
    param_names: Arc<[String]>,
    handler: BoxedHandler<S>,
}

impl<S: Send + Sync + 'static> Registrar<S> {
    /// A registrar mounting everything under `prefix` (e.g. `/topo/v3`).
    ///
    /// An empty prefix or `/` mounts at the root.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            actions: Vec::new(),
        }
    }

    /// Add actions, keeping their order.
    #[must_use]
    pub fn actions(mut self, actions: impl IntoIterator<Item = Action<S>>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Bind every collected action to a router, each behind `dispatcher`.
    pub fn register(self, dispatcher: &Arc<Dispatcher<S>>) -> (Router, RegistrationReport) {
        let mut report = RegistrationReport::default();
        let mut by_shape: BTreeMap<String, Vec<Binding<S>>> = BTreeMap::new();

        for action in self.actions {
            let (method, path, handler) = action.into_parts();

            let Some(filter) = method_filter(&method) else {
                error!(%method, path, "the http method is not supported, route skipped");
                report.skipped.push(format!("{method} {path}"));
                continue;
            };

            let pattern = match RoutePattern::parse(&path) {
                Ok(pattern) => pattern,
                Err(reason) => {
                    error!(%method, path, reason, "invalid route path, route skipped");
                    report.skipped.push(format!("{method} {path}"));
                    continue;
                }
            };

            let bindings = by_shape.entry(pattern.shape).or_default();
            let binding = Binding {
                method,
                filter,
                path,
                param_names: pattern.names.into(),
                handler,
            };
            if let Some(existing) = bindings.iter_mut().find(|b| b.method == binding.method) {
                warn!(
                    method = %binding.method,
                    path = binding.path,
                    replaced = existing.path,
                    "duplicate route, last registration wins"
                );
                *existing = binding;
            } else {
                bindings.push(binding);
            }
        }

        let mut router = Router::new();
        for (shape, bindings) in by_shape {
            let mut method_router: MethodRouter = MethodRouter::new();
            let mut routes = Vec::with_capacity(bindings.len());
            for binding in bindings {
                routes.push(format!("{} {}", binding.method, binding.path));
                method_router = method_router.on(
                    binding.filter,
                    bind(Arc::clone(dispatcher), binding.handler, binding.param_names),
                );
            }

            match try_route(&router, &shape, method_router) {
                Ok(next) => {
                    router = next;
                    for route in &routes {
                        debug!(route, shape, "route bound");
                    }
                    report.bound.extend(routes);
                }
                Err(reason) => {
                    for route in &routes {
                        error!(route, shape, reason, "route rejected by the router, route skipped");
                    }
                    report.skipped.extend(routes);
                }
            }
        }

        let prefix = format!("/{}", self.prefix.trim_matches('/'));
        let router = if prefix == "/" {
            router
        } else {
            Router::new().nest(&prefix, router)
        };

        info!(
            prefix,
            bound = report.bound.len(),
            skipped = report.skipped.len(),
            "actions registered"
        );

        (router, report)
    }
}

/// Add `method_router` at `shape` on a copy of `router`.
///
/// Axum reports routing conflicts by panicking; the panic is contained
/// here and `router` is left as it was.
fn try_route(router: &Router, shape: &str, method_router: MethodRouter) -> Result<Router, String> {
    let candidate = router.clone();
    panic::catch_unwind(AssertUnwindSafe(move || candidate.route(shape, method_router))).map_err(
        |payload| {
            payload
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
                .unwrap_or_else(|| "route conflict".to_owned())
        },
    )
}

/// An Axum handler that runs `handler` through the dispatcher.
fn bind<S: Send + Sync + 'static>(
    dispatcher: Arc<Dispatcher<S>>,
    handler: BoxedHandler<S>,
    param_names: Arc<[String]>,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move |request: Request| {
        let dispatcher = Arc::clone(&dispatcher);
        let handler = Arc::clone(&handler);
        let param_names = Arc::clone(&param_names);
        async move { dispatcher.dispatch(&handler, &param_names, request).await }.boxed()
    }
}

fn method_filter(method: &Method) -> Option<MethodFilter> {
    match *method {
        Method::GET => Some(MethodFilter::GET),
        Method::POST => Some(MethodFilter::POST),
        Method::PUT => Some(MethodFilter::PUT),
        Method::DELETE => Some(MethodFilter::DELETE),
        _ => None,
    }
}

/// A route path with its placeholders renamed by position.
#[derive(Debug, PartialEq, Eq)]
struct RoutePattern {
    /// The path as bound on the router, e.g. `/inst/{p0}/{*p1}`.
    shape: String,
    /// Declared placeholder names, indexed by position.
    names: Vec<String>,
}

impl RoutePattern {
    /// Parse `path`, rejecting anything Axum would panic on.
    fn parse(path: &str) -> Result<Self, &'static str> {
        if !path.starts_with('/') {
            return Err("path must start with '/'");
        }

        let mut shape = String::with_capacity(path.len());
        let mut names: Vec<String> = Vec::new();
        let mut segments = path.split('/').skip(1).peekable();

        while let Some(segment) = segments.next() {
            shape.push('/');
            if segment.starts_with(':') {
                return Err("use {name} instead of :name for path parameters");
            }

            let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
                if segment.contains(['{', '}']) {
                    return Err("a path parameter must be a whole {name} segment");
                }
                shape.push_str(segment);
                continue;
            };

            let (wildcard, name) = inner
                .strip_prefix('*')
                .map_or((false, inner), |name| (true, name));
            if name.is_empty() || name.contains(['{', '}', '*', ':']) {
                return Err("invalid path parameter name");
            }
            if names.iter().any(|known| known == name) {
                return Err("duplicate path parameter name");
            }
            if wildcard && segments.peek().is_some() {
                return Err("a wildcard parameter must be the last segment");
            }

            shape.push('{');
            if wildcard {
                shape.push('*');
            }
            shape.push_str(&slot_name(names.len()));
            shape.push('}');
            names.push(name.to_owned());
        }

        Ok(Self { shape, names })
    }
}

/// The router-side name of the placeholder at `position`.
fn slot_name(position: usize) -> String {
    format!("p{position}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_methods_map_to_filters() {
        assert!(method_filter(&Method::GET).is_some());
        assert!(method_filter(&Method::POST).is_some());
        assert!(method_filter(&Method::PUT).is_some());
        assert!(method_filter(&Method::DELETE).is_some());
    }

    #[test]
    fn other_methods_are_unsupported() {
        assert!(method_filter(&Method::PATCH).is_none());
        assert!(method_filter(&Method::HEAD).is_none());
        assert!(method_filter(&Method::OPTIONS).is_none());
    }

    #[test]
    fn valid_paths_parse() {
        assert!(RoutePattern::parse("/inst/{bk_obj_id}").is_ok());
        assert!(RoutePattern::parse("/").is_ok());
        assert!(RoutePattern::parse("/files/{*rest}").is_ok());
    }

    #[test]
    fn invalid_paths_are_rejected() {
        for path in [
            "inst",
            "",
            "/inst/:bk_obj_id",
            "/inst/{bk_obj_id",
            "/inst/bk_obj_id}",
            "/inst/{}",
            "/inst/{*}",
            "/inst/{{id}}",
            "/inst/x{id}",
            "/inst/{id}/{id}",
            "/files/{*rest}/tail",
        ] {
            assert!(RoutePattern::parse(path).is_err(), "{path} should be rejected");
        }
    }

    #[test]
    fn placeholders_are_renamed_by_position() {
        let pattern = RoutePattern::parse("/inst/{bk_obj_id}/{inst_id}").unwrap();
        assert_eq!(pattern.shape, "/inst/{p0}/{p1}");
        assert_eq!(pattern.names, ["bk_obj_id", "inst_id"]);

        let wildcard = RoutePattern::parse("/files/{*rest}").unwrap();
        assert_eq!(wildcard.shape, "/files/{*p0}");
        assert_eq!(wildcard.names, ["rest"]);
    }

    #[test]
    fn literal_paths_keep_their_shape() {
        let pattern = RoutePattern::parse("/find/instassociation").unwrap();
        assert_eq!(pattern.shape, "/find/instassociation");
        assert!(pattern.names.is_empty());
    }

    #[test]
    fn same_shape_paths_share_a_key() {
        let first = RoutePattern::parse("/inst/{bk_obj_id}").unwrap();
        let second = RoutePattern::parse("/inst/{inst_id}").unwrap();
        assert_eq!(first.shape, second.shape);
    }

    #[test]
    fn router_conflicts_are_contained() {
        let router = Router::new().route("/files", axum::routing::get(|| async {}));
        let result = try_route(&router, "/files", axum::routing::get(|| async {}));
        assert!(result.is_err());

        let extended = try_route(&router, "/files", axum::routing::post(|| async {}));
        assert!(extended.is_ok());
    }
}
