//! Error types for the server module

/// Errors that can stop the server
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The listener could not be bound, or the server failed while running
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The explainer could not be built
    #[error("{0}")]
    CoreError(#[from] txplain_core::error::Error),
}
