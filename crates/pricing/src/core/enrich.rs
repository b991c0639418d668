use alloy::primitives::Address;
use hashbrown::HashMap;
use tracing::{debug, warn};
use txplain_common::{
    constants::{is_native_placeholder, wrapped_native},
    ether::tagged::TaggedTx,
};

use super::oracle::{PriceOracle, TokenPrice};
use crate::error::Error;

/// Returns the address whose price values `asset` on `chain`. Native asset placeholders are
/// priced as the chain's wrapped native token.
fn priced_as(chain: &str, asset: &Address) -> Option<Address> {
    match is_native_placeholder(asset) {
        true => wrapped_native(chain),
        false => Some(*asset),
    }
}

/// Values every balance change of `tx` in USD, at the block timestamp.
///
/// Every involved asset is looked up once. Assets without a price within `tolerance` keep
/// `balance_change_usd = None`.
pub async fn fill_usd_price(
    oracle: &PriceOracle,
    chain: &str,
    tx: &mut TaggedTx,
    tolerance: Option<u64>,
) -> Result<(), Error> {
    let mut tokens: Vec<String> = tx
        .involved_assets()
        .iter()
        .filter_map(|asset| match priced_as(chain, asset) {
            Some(token) => Some(format!("{token:#x}")),
            None => {
                warn!("no wrapped native token known for chain '{}', skipping {:#x} .", chain, asset);
                None
            }
        })
        .collect();
    tokens.sort_unstable();
    tokens.dedup();

    if tokens.is_empty() {
        debug!("no priceable assets in transaction .");
        return Ok(());
    }

    let timestamp = tx.block_time.timestamp();
    let prices: HashMap<String, TokenPrice> = oracle
        .get_token_prices_by_address(chain, &tokens, timestamp, tolerance)
        .await?
        .into_iter()
        .map(|(address, price)| (address.to_lowercase(), price))
        .collect();

    debug!("found {}/{} prices at {} .", prices.len(), tokens.len(), timestamp);

    for account in tx.balance_change.iter_mut() {
        for asset in account.assets.iter_mut() {
            let usd = priced_as(chain, &asset.asset.address)
                .and_then(|token| prices.get(&format!("{token:#x}")))
                .and_then(|price| match price.price_usd() {
                    Some(usd) => Some(usd),
                    None => {
                        warn!("oracle returned an invalid price '{}' for {} .", price.price, price.token_address);
                        None
                    }
                });

            if let Some(usd) = usd {
                asset.balance_change_usd = Some(asset.balance_change * usd);
            }
        }
    }

    Ok(())
}
