/// A minimal JSON-RPC 2.0 client with retries, used for nodes and price oracles.
pub mod jsonrpc;

/// The tagged transaction model shared by the translator, the pricing module, and the
/// explainer.
pub mod tagged;
