use alloy::primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::constants::{ADDRESS_REGEX, TRANSACTION_HASH_REGEX};

/// Returns true if the given string is a well-formed transaction hash.
///
/// ```
/// use txplain_common::ether::tagged::is_txhash;
///
/// assert!(is_txhash("0x9a5f4ef7678a94dd87048eeec931d30af21b1f4cecbf7e850a531d2bb64a54ac"));
/// assert!(!is_txhash("hello"));
/// ```
pub fn is_txhash(input: &str) -> bool {
    TRANSACTION_HASH_REGEX.is_match(input).unwrap_or(false)
}

/// Returns true if the given string is a well-formed address.
///
/// ```
/// use txplain_common::ether::tagged::is_address;
///
/// assert!(is_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"));
/// assert!(!is_address("0xC02a"));
/// ```
pub fn is_address(input: &str) -> bool {
    ADDRESS_REGEX.is_match(input).unwrap_or(false)
}

/// An address, optionally tagged with a human readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedAddr {
    /// The address itself
    pub address: Address,
    /// A label such as a token symbol or a known protocol name
    pub label: Option<String>,
}

impl TaggedAddr {
    /// An untagged address
    pub fn new(address: Address) -> Self {
        Self { address, label: None }
    }

    /// An address with a label
    pub fn labeled(address: Address, label: impl Into<String>) -> Self {
        Self { address, label: Some(label.into()) }
    }
}

/// A token, or anything that can be displayed like one (the native asset included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Compatible {
    /// The token contract, or a native asset placeholder
    pub address: Address,
    /// The token name
    pub name: String,
    /// The token symbol
    pub symbol: String,
    /// The number of decimals used for display units
    pub decimals: u8,
}

/// The change of one asset's balance for an account, in display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalanceChanged {
    /// The asset whose balance changed
    pub asset: Erc20Compatible,
    /// The signed balance change
    pub balance_change: f64,
    /// The balance change valued in USD, when a price was available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_change_usd: Option<f64>,
}

/// All asset balance changes of a single account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceChanged {
    /// The account
    pub address: TaggedAddr,
    /// The assets whose balance changed
    pub assets: Vec<AssetBalanceChanged>,
}

/// A structured summary of a transaction: parties, value, gas, decoded actions and
/// balance changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedTx {
    /// The transaction hash. `None` for simulated transactions.
    pub txhash: Option<String>,
    /// The sender
    pub from: TaggedAddr,
    /// The recipient. `None` for contract creations.
    pub to: Option<TaggedAddr>,
    /// The contract created by this transaction, if any
    pub contract_created: Option<TaggedAddr>,
    /// The block the transaction was included in (or simulated on)
    pub block_number: u64,
    /// The timestamp of that block
    pub block_time: DateTime<Utc>,
    /// The native value sent, in wei
    pub value: U256,
    /// The gas used
    pub gas_used: u64,
    /// The effective gas price, in wei
    pub gas_price: u128,
    /// The calldata
    pub input: Bytes,
    /// `1` on success, `0` on failure
    pub status: u8,
    /// The revert reason of a failed transaction, if one could be recovered
    pub reason: Option<String>,
    /// The resolved method name, or the raw selector
    pub method: Option<String>,
    /// Human readable actions, in execution order
    pub actions: Vec<String>,
    /// Balance changes per account
    pub balance_change: Vec<AccountBalanceChanged>,
}

impl TaggedTx {
    /// Returns the address of every asset referenced by a balance change.
    pub fn involved_assets(&self) -> HashSet<Address> {
        self.balance_change
            .iter()
            .flat_map(|account| account.assets.iter().map(|asset| asset.asset.address))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use chrono::TimeZone;

    fn asset(address: Address, symbol: &str, change: f64) -> AssetBalanceChanged {
        AssetBalanceChanged {
            asset: Erc20Compatible {
                address,
                name: symbol.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
            },
            balance_change: change,
            balance_change_usd: None,
        }
    }

    fn sample() -> TaggedTx {
        let usdc = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let weth = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        TaggedTx {
            txhash: Some(
                "0x9a5f4ef7678a94dd87048eeec931d30af21b1f4cecbf7e850a531d2bb64a54ac".to_string(),
            ),
            from: TaggedAddr::new(address!("0000000000000000000000000000000000000001")),
            to: None,
            contract_created: None,
            block_number: 1,
            block_time: Utc.timestamp_opt(1_693_497_600, 0).single().expect("valid timestamp"),
            value: U256::ZERO,
            gas_used: 21000,
            gas_price: 1_000_000_000,
            input: Bytes::new(),
            status: 1,
            reason: None,
            method: None,
            actions: vec![],
            balance_change: vec![
                AccountBalanceChanged {
                    address: TaggedAddr::new(address!("0000000000000000000000000000000000000001")),
                    assets: vec![asset(usdc, "USDC", -10.0), asset(weth, "WETH", 0.5)],
                },
                AccountBalanceChanged {
                    address: TaggedAddr::new(address!("0000000000000000000000000000000000000002")),
                    assets: vec![asset(usdc, "USDC", 10.0)],
                },
            ],
        }
    }

    #[test]
    fn test_involved_assets_are_deduplicated() {
        let assets = sample().involved_assets();
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn test_usd_value_is_omitted_when_absent() {
        let json = serde_json::to_value(sample()).expect("failed to serialize");
        let first = &json["balance_change"][0]["assets"][0];
        assert!(first.get("balance_change_usd").is_none());
        assert_eq!(first["balance_change"], -10.0);
    }
}
