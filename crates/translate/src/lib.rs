//! Turns transactions into [TaggedTx](txplain_common::ether::tagged::TaggedTx)s.
//!
//! The [Translator] trait is the seam the rest of txplain depends on. [RpcTranslator] implements
//! it on top of a plain Ethereum JSON-RPC node: it reads the transaction, its receipt and block,
//! traces it with `callTracer` when the node allows it, and derives actions and balance changes
//! from native value transfers and ERC-20, ERC-721 and WETH events.

pub mod error;

mod core;
mod interfaces;

// re-export the public interface
pub use core::{RpcTranslator, Translator};
pub use interfaces::{BlockSpec, GasPriceSpec, GasSpec, SimulationRequest};
