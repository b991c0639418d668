use alloy::primitives::{address, Address};
use fancy_regex::Regex;
use lazy_static::lazy_static;

/// The chain every module defaults to when none is configured
pub const DEFAULT_CHAIN: &str = "ethereum";

/// The zero address. Used as the burn/mint counterparty and, by some protocols, as the
/// native asset.
pub const NULL_ADDRESS_0X0: Address = address!("0000000000000000000000000000000000000000");

/// The placeholder address used for the chain's native asset in balance changes
pub const NULL_ADDRESS_0XF: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Wrapped ether on Ethereum mainnet
pub const WETH_ETHEREUM: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// The default tolerance, in seconds, between a block timestamp and an oracle price
pub const DEFAULT_PRICE_TOLERANCE: u64 = 3600;

/// Returns the wrapped native token for the given chain, if one is known.
///
/// ```
/// use txplain_common::constants::{wrapped_native, WETH_ETHEREUM};
///
/// assert_eq!(wrapped_native("ethereum"), Some(WETH_ETHEREUM));
/// assert_eq!(wrapped_native("solana"), None);
/// ```
pub fn wrapped_native(chain: &str) -> Option<Address> {
    match chain {
        "ethereum" => Some(WETH_ETHEREUM),
        _ => None,
    }
}

/// Returns true if the address stands for the chain's native asset.
pub fn is_native_placeholder(address: &Address) -> bool {
    *address == NULL_ADDRESS_0X0 || *address == NULL_ADDRESS_0XF
}

lazy_static! {
    /// The following regex is used to validate Ethereum transaction hashes
    pub static ref TRANSACTION_HASH_REGEX: Regex = Regex::new(r"^0x[A-Fa-f0-9]{64}$").expect("failed to compile regex");

    /// The following regex is used to validate Ethereum addresses
    pub static ref ADDRESS_REGEX: Regex = Regex::new(r"^0x[A-Fa-f0-9]{40}$").expect("failed to compile regex");
}
