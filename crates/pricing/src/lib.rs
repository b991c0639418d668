//! Historical USD pricing for tagged transactions.
//!
//! A [PriceOracle] queries an `hdt_getTokenPrice` JSON-RPC endpoint for many tokens at once,
//! keeping a bounded number of lookups in flight and discarding prices that are too far from
//! the requested timestamp. [fill_usd_price] uses it to value every balance change of a
//! [TaggedTx](txplain_common::ether::tagged::TaggedTx).

pub mod error;

mod core;
mod interfaces;

// re-export the public interface
pub use core::{fill_usd_price, price, PriceOracle, TokenPrice, DEFAULT_MAX_WORKERS};
pub use interfaces::{PriceArgs, PriceArgsBuilder};
