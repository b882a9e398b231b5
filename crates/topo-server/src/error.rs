//! Error types for the topology server binary.

/// Anything that can stop the server from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: topo_service::ConfigError,
    },

    /// The message catalog could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: topo_i18n::CatalogError,
    },

    /// Binding or serving failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: topo_service::ServerError,
    },
}
