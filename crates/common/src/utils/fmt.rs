use alloy::primitives::{
    utils::{format_ether, format_units},
    U256,
};
use chrono::{DateTime, Utc};

use crate::ether::tagged::TaggedAddr;

/// Trims trailing zeros (and a dangling decimal point) from a decimal string.
///
/// ```
/// use txplain_common::utils::fmt::trim_decimal;
///
/// assert_eq!(trim_decimal("1.500000"), "1.5");
/// assert_eq!(trim_decimal("2.000"), "2");
/// assert_eq!(trim_decimal("100"), "100");
/// ```
pub fn trim_decimal(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }

    value.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Formats a tagged address. Labeled addresses render as `label (address)`.
///
/// ```
/// use alloy::primitives::address;
/// use txplain_common::{ether::tagged::TaggedAddr, utils::fmt::fmt_addr};
///
/// let weth = TaggedAddr::labeled(address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "WETH");
/// assert_eq!(fmt_addr(&weth, true), "WETH (0xC02a...6Cc2)");
/// ```
pub fn fmt_addr(addr: &TaggedAddr, truncate: bool) -> String {
    let checksummed = addr.address.to_checksum(None);
    let shown = if truncate {
        format!("{}...{}", &checksummed[..6], &checksummed[checksummed.len() - 4..])
    } else {
        checksummed
    };

    match addr.label.as_deref() {
        Some(label) if !label.is_empty() => format!("{label} ({shown})"),
        _ => shown,
    }
}

/// Formats a block timestamp
pub fn fmt_blktime(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Formats a wei amount as ether.
///
/// ```
/// use alloy::primitives::U256;
/// use txplain_common::utils::fmt::fmt_value;
///
/// assert_eq!(fmt_value(U256::from(1_500_000_000_000_000_000u128)), "1.5 ETH");
/// assert_eq!(fmt_value(U256::ZERO), "0 ETH");
/// ```
pub fn fmt_value(wei: U256) -> String {
    format!("{} ETH", trim_decimal(&format_ether(wei)))
}

/// Formats a wei gas price as gwei.
///
/// ```
/// use txplain_common::utils::fmt::fmt_gas;
///
/// assert_eq!(fmt_gas(12_500_000_000), "12.5 Gwei");
/// ```
pub fn fmt_gas(wei: u128) -> String {
    match format_units(U256::from(wei), 9u8) {
        Ok(gwei) => format!("{} Gwei", trim_decimal(&gwei)),
        Err(_) => format!("{wei} wei"),
    }
}

/// Formats a receipt status
pub fn fmt_status(status: u8) -> &'static str {
    match status {
        1 => "Success",
        _ => "Fail",
    }
}

/// Converts a raw token amount into display units.
///
/// ```
/// use alloy::primitives::U256;
/// use txplain_common::utils::fmt::to_display_units;
///
/// assert_eq!(to_display_units(U256::from(2_500_000u64), 6), 2.5);
/// assert_eq!(to_display_units(U256::from(3u64), 0), 3.0);
/// ```
pub fn to_display_units(raw: U256, decimals: u8) -> f64 {
    let formatted = match format_units(raw, decimals) {
        Ok(formatted) => formatted,
        Err(_) => return raw.to_string().parse::<f64>().unwrap_or(0.0) / 10f64.powi(decimals as i32),
    };

    formatted.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use chrono::TimeZone;

    #[test]
    fn test_fmt_addr_full() {
        let addr = TaggedAddr::new(address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        assert_eq!(fmt_addr(&addr, false), "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    }

    #[test]
    fn test_fmt_addr_ignores_blank_label() {
        let addr = TaggedAddr::labeled(address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "");
        assert_eq!(fmt_addr(&addr, true), "0xC02a...6Cc2");
    }

    #[test]
    fn test_fmt_blktime() {
        let time = Utc.timestamp_opt(1_693_497_600, 0).single().expect("valid timestamp");
        assert_eq!(fmt_blktime(&time), "2023-08-31 16:00:00 UTC");
    }

    #[test]
    fn test_fmt_status() {
        assert_eq!(fmt_status(1), "Success");
        assert_eq!(fmt_status(0), "Fail");
    }

    #[test]
    fn test_to_display_units_large_amounts() {
        let raw = U256::from(10u64).pow(U256::from(24u64));
        assert_eq!(to_display_units(raw, 18), 1_000_000.0);
    }
}
