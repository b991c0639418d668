//! Error types for the configuration module

use mesc::MescError;

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A generic error with a message
    #[error("Error: {0}")]
    Generic(String),

    /// An error that occurred during parsing
    #[error("Parse error: {0}")]
    ParseError(String),

    /// An error reading or writing the configuration file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A key that doesn't exist in the configuration
    #[error("invalid key: '{0}' is not a valid configuration key.")]
    InvalidKey(String),

    /// A value that doesn't fit the key's type
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The key being set
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// An error from the MESC (Multiple Endpoint Shared Configuration) system
    #[error("MESC error: {0}")]
    MescError(#[from] MescError),
}
