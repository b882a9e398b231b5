//! Service-level actions exposed by every topology server.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/topo/v3/ping` | Liveness check, answers `"pong"` |
//! | `GET` | `/topo/v3/version` | Package name, version, start time |

use chrono::{DateTime, Utc};
use serde::Serialize;
use topo_i18n::ActionError;
use topo_service::{Action, ContextParams, PathParams, QueryParams, RequestBody};

/// Support facility handed to every handler.
#[derive(Debug, Clone)]
pub struct Supplementary {
    /// When this process started serving.
    pub started_at: DateTime<Utc>,
}

impl Supplementary {
    /// A facility stamped with the current time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for Supplementary {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of `GET /version`.
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    name: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
}

/// The actions every server registers.
pub fn builtin_actions() -> Vec<Action<Supplementary>> {
    vec![Action::get("/ping", ping), Action::get("/version", version)]
}

async fn ping(
    _ctx: ContextParams<Supplementary>,
    _path: PathParams,
    _query: QueryParams,
    _body: RequestBody,
) -> Result<&'static str, ActionError> {
    Ok("pong")
}

async fn version(
    ctx: ContextParams<Supplementary>,
    _path: PathParams,
    _query: QueryParams,
    _body: RequestBody,
) -> Result<VersionInfo, ActionError> {
    Ok(VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        started_at: ctx.support.started_at,
    })
}
