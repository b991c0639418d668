use clap::Parser;
use derive_builder::Builder;
use txplain_common::constants::{DEFAULT_CHAIN, DEFAULT_PRICE_TOLERANCE};
use txplain_config::parse_url_arg;

use crate::core::DEFAULT_MAX_WORKERS;

#[derive(Debug, Clone, Parser, Builder)]
#[clap(
    about = "Look up historical token prices from the price oracle",
    override_usage = "txplain price <CHAIN> <TOKENS>... [OPTIONS]"
)]
/// Arguments for the price operation
///
/// This struct contains the parameters of a batch of price lookups against a price oracle
/// JSON-RPC endpoint.
pub struct PriceArgs {
    /// The chain the tokens live on, e.g. `ethereum`.
    #[clap(required = true)]
    pub chain: String,

    /// The token addresses to price.
    #[clap(required = true, num_args = 1..)]
    pub tokens: Vec<String>,

    /// The unix timestamp, in seconds, to price the tokens at. Defaults to now.
    #[clap(long, short, default_value = "0", hide_default_value = true)]
    pub timestamp: i64,

    /// The maximum distance, in seconds, between the timestamp and an accepted price.
    #[clap(long, default_value = None)]
    pub tolerance: Option<u64>,

    /// The price oracle to query.
    /// This can be an explicit URL or a reference to a MESC endpoint.
    #[clap(long, short, value_parser = parse_url_arg, default_value = "", hide_default_value = true)]
    pub rpc_url: String,

    /// The maximum number of lookups in flight at once.
    #[clap(long = "max-workers", default_value_t = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,
}

impl PriceArgsBuilder {
    /// Creates a new PriceArgsBuilder with default values
    pub fn new() -> Self {
        Self {
            chain: Some(DEFAULT_CHAIN.to_string()),
            tokens: Some(Vec::new()),
            timestamp: Some(0),
            tolerance: Some(Some(DEFAULT_PRICE_TOLERANCE)),
            rpc_url: Some(String::new()),
            max_workers: Some(DEFAULT_MAX_WORKERS),
        }
    }
}
