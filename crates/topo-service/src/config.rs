//! Configuration loading and typed config structures for the topology service.
//!
//! Configuration lives in `topo-config.yaml`. Every section and field has a
//! default, so a partial (or absent) file is valid.
//!
//! ```yaml
//! server:
//!   host: "0.0.0.0"
//!   port: 60002
//! dispatch:
//!   path_prefix: "/topo/v3"
//!   max_body_bytes: 10485760
//! i18n:
//!   default_language: "en"
//!   catalog_path: "conf/errors.yaml"
//! logging:
//!   level: "info"
//!   json: false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid environment override {name}: {message}")]
    Env {
        /// The variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Route prefix and request limits.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Message catalog settings.
    #[serde(default)]
    pub i18n: I18nConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `TOPO_HOST` overrides `server.host`
    /// - `TOPO_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Env`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,
    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Apply `TOPO_HOST` / `TOPO_PORT` when they are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `TOPO_PORT` is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("TOPO_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("TOPO_PORT") {
            self.port = port.parse().map_err(|e| ConfigError::Env {
                name: "TOPO_PORT",
                message: format!("{port:?}: {e}"),
            })?;
        }
        Ok(())
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatchConfig {
    /// Prefix every action path is mounted under.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Largest request body the dispatcher will buffer.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            path_prefix: default_path_prefix(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Message catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct I18nConfig {
    /// Language used when a request names none or an unknown one.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Optional catalog file layered over the built-in messages.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            catalog_path: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    60002
}

fn default_path_prefix() -> String {
    "/topo/v3".to_owned()
}

const fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_language() -> String {
    "en".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 60002);
        assert_eq!(config.dispatch.path_prefix, "/topo/v3");
        assert_eq!(config.dispatch.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.i18n.default_language, "en");
        assert!(config.i18n.catalog_path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000
dispatch:
  path_prefix: "/api/v4"
  max_body_bytes: 1024
i18n:
  default_language: "zh-cn"
  catalog_path: "conf/errors.yaml"
logging:
  level: "debug"
  json: true
"#;
        let config = ServiceConfig::parse(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.dispatch.path_prefix, "/api/v4");
        assert_eq!(config.dispatch.max_body_bytes, 1024);
        assert_eq!(config.i18n.default_language, "zh-cn");
        assert_eq!(
            config.i18n.catalog_path.as_deref(),
            Some(Path::new("conf/errors.yaml"))
        );
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = ServiceConfig::parse("server:\n  port: 8081\n").unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.dispatch, DispatchConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let result = ServiceConfig::parse("server: [1, 2");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
