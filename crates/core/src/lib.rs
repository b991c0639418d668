//! The core of txplain: turns a transaction hash into a natural language explanation.
//!
//! An [Explainer] tags the transaction with a [Translator](txplain_translate::Translator),
//! values its balance changes with a [PriceOracle](txplain_pricing::PriceOracle) when one is
//! configured, renders the result into a prompt and streams the completion of a
//! [CompletionBackend] back to the caller.
//!
//! The pricing and translation crates are re-exported for convenience.

/// Error types for the core module
pub mod error;

mod core;
mod interfaces;

// re-export the public interface
pub use core::{
    explain, render_prompt, simulate, tx, CompletionBackend, CompletionStream, Explainer,
    OpenAiBackend, PromptContext,
};
pub use interfaces::{
    ExplainArgs, ExplainArgsBuilder, ProviderArgs, ProviderArgsBuilder, SimulateArgs,
    SimulateArgsBuilder, TxArgs, TxArgsBuilder,
};

// re-export the module crates
pub use txplain_pricing;
pub use txplain_translate;
