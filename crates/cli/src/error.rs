#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("{0}")]
    Generic(String),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] txplain_config::error::Error),
    #[error("Core error: {0}")]
    CoreError(#[from] txplain_core::error::Error),
    #[error("Server error: {0}")]
    ServerError(#[from] txplain_server::error::Error),
}
