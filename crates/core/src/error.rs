/// Error type for the Core module
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The given string is not a transaction hash
    #[error("Invalid transaction hash: {0}")]
    InvalidTxHash(String),

    /// The transaction could not be tagged or simulated
    #[error("{0}")]
    TranslateError(#[from] txplain_translate::error::Error),

    /// The price oracle failed
    #[error("{0}")]
    PricingError(#[from] txplain_pricing::error::Error),

    /// The completion backend failed
    #[error("LLM error: {0}")]
    LlmError(String),

    /// An argument or setting that can't be used
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
