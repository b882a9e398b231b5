//! Action registration and per-request dispatch for the topology service.
//!
//! Business operations are declared as [`Action`]s (method, path, handler).
//! At startup a [`Registrar`] binds them to an Axum [`Router`](axum::Router)
//! under `/topo/v3`. Every route is served by the same [`Dispatcher`], which
//! gives handlers a uniform contract:
//!
//! - the body is always a JSON object ([`RequestBody`]), empty if none was sent
//! - a fresh [`ContextParams`] carries locale-bound errors and identity headers
//! - the outcome is always one JSON [`envelope`], HTTP 200
//!
//! # Architecture
//!
//! ```text
//! axum route --> Dispatcher --> handler --> envelope::build --> response
//! ```
//!
//! The dispatcher only holds read-only shared state, so requests run fully
//! in parallel with no locking.

pub mod action;
pub mod body;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod registrar;
pub mod server;
pub mod service;

// Re-export primary types for convenience.
pub use action::{Action, BoxedHandler, PathParams, QueryParams};
pub use body::RequestBody;
pub use config::{ConfigError, ServiceConfig};
pub use context::{ContextParams, Headers};
pub use dispatcher::Dispatcher;
pub use envelope::Envelope;
pub use registrar::{Registrar, RegistrationReport};
pub use server::{start_server, ServerError};
pub use service::TopoService;
