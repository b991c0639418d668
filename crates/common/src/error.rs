//! Error types for the common module

/// Errors raised by the shared utilities and resources
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The JSON-RPC endpoint could not be reached or answered with a bad status
    #[error("RPC error: {0}")]
    RpcError(String),

    /// The JSON-RPC endpoint answered with an `error` object
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// The JSON-RPC error code
        code: i64,
        /// The human readable error message
        message: String,
        /// Optional error payload, e.g. revert data
        data: Option<serde_json::Value>,
    },

    /// Error raised by the HTTP client
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error when serializing or deserializing JSON data
    #[error("Json error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Error when parsing user or remote input
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error raised by the chat completion backend
    #[error("LLM error: {0}")]
    LlmError(String),

    /// Generic error with a message
    #[error("Error: {0}")]
    Generic(String),
}
