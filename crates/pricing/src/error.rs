//! Error types for the pricing module

/// Errors that can occur while pricing tokens
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The oracle could not be reached, or answered with something unreadable
    #[error("Oracle error: {0}")]
    OracleError(#[from] txplain_common::Error),

    /// An argument that can't be used for a lookup
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
