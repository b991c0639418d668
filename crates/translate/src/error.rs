//! Error types for the translate module

/// Errors that can occur while tagging or simulating a transaction
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node could not be reached, or answered with something unreadable
    #[error("RPC error: {0}")]
    RpcError(#[from] txplain_common::Error),

    /// The node doesn't know the transaction
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// The transaction has no receipt yet
    #[error("Transaction is pending: {0}")]
    PendingTransaction(String),

    /// The node doesn't know the block
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// An argument that can't be translated or simulated
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The node refuses `debug_traceCall`, which simulations need
    #[error("Tracing unsupported: {0}")]
    TracingUnsupported(String),
}
