mod enrich;
mod oracle;

use std::time::Instant;

use chrono::Utc;
use hashbrown::HashMap;
use tracing::{debug, info};
use txplain_common::{ether::tagged::is_address, utils::env::get_env};

use crate::{error::Error, interfaces::PriceArgs};

pub use enrich::fill_usd_price;
pub use oracle::{PriceOracle, TokenPrice, DEFAULT_MAX_WORKERS};

/// Looks up the prices of `args.tokens`, keyed by token address.
pub async fn price(args: PriceArgs) -> Result<HashMap<String, TokenPrice>, Error> {
    let start_time = Instant::now();

    let rpc_url = match args.rpc_url.is_empty() {
        true => get_env("ORACLE_PROVIDER_URI").ok_or_else(|| {
            Error::InvalidArgument("no price oracle given, use --rpc-url".to_string())
        })?,
        false => args.rpc_url.clone(),
    };

    let tokens = args
        .tokens
        .iter()
        .map(|token| match is_address(token) {
            true => Ok(token.to_lowercase()),
            false => Err(Error::InvalidArgument(format!("'{token}' is not a token address"))),
        })
        .collect::<Result<Vec<String>, Error>>()?;

    let timestamp = match args.timestamp {
        0 => Utc::now().timestamp(),
        timestamp => timestamp,
    };

    let oracle = PriceOracle::new(&rpc_url)?.with_max_workers(args.max_workers);
    let prices =
        oracle.get_token_prices_by_address(&args.chain, &tokens, timestamp, args.tolerance).await?;

    debug!("priced {}/{} tokens in {:?} .", prices.len(), tokens.len(), start_time.elapsed());
    info!("found {} prices on {} at {} .", prices.len(), args.chain, timestamp);

    Ok(prices)
}
