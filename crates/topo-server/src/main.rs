//! Topology service HTTP server.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `topo-config.yaml` (or `TOPO_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the message catalog
//! 4. Register actions under the configured prefix
//! 5. Serve until `Ctrl-C`

mod actions;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use topo_i18n::MessageCatalog;
use topo_service::config::LoggingConfig;
use topo_service::{start_server, ServiceConfig, TopoService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::actions::Supplementary;
use crate::error::StartupError;

const DEFAULT_CONFIG_PATH: &str = "topo-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the catalog, or the listener
/// cannot be set up, or if serving fails.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let (config, config_path) = load_config()?;
    init_tracing(&config.logging);

    match &config_path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("config file not found, using defaults"),
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        path_prefix = config.dispatch.path_prefix,
        max_body_bytes = config.dispatch.max_body_bytes,
        default_language = config.i18n.default_language,
        "topo-server starting"
    );

    let catalog = match &config.i18n.catalog_path {
        Some(path) => {
            let catalog = MessageCatalog::load(&config.i18n.default_language, path)?;
            info!(path = %path.display(), "message catalog loaded");
            catalog
        }
        None => MessageCatalog::builtin(&config.i18n.default_language),
    };

    let (router, report) = TopoService::new(
        &config.dispatch,
        Arc::new(catalog),
        Arc::new(Supplementary::new()),
    )
    .with_actions(actions::builtin_actions())
    .into_router();

    for route in &report.skipped {
        warn!(route, "action not available");
    }

    start_server(&config.server, router).await?;
    Ok(())
}

/// Load `TOPO_CONFIG`, falling back to `topo-config.yaml`, falling back
/// to defaults when no file exists.
fn load_config() -> Result<(ServiceConfig, Option<PathBuf>), StartupError> {
    let path = std::env::var_os("TOPO_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        let config = ServiceConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = ServiceConfig::default();
        config.server.apply_env_overrides()?;
        Ok((config, None))
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
