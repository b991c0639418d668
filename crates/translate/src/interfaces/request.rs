use std::{fmt, str::FromStr};

use alloy::primitives::{
    utils::{parse_units, ParseUnits},
    Address, Bytes, U256,
};
use serde::Serialize;

use crate::error::Error;

/// The block a simulation runs on top of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BlockSpec {
    /// The node's latest block
    #[default]
    Latest,
    /// A block by number
    Number(u64),
}

impl BlockSpec {
    /// The block as a JSON-RPC block parameter
    pub fn to_param(&self) -> String {
        match self {
            BlockSpec::Latest => "latest".to_string(),
            BlockSpec::Number(number) => format!("{number:#x}"),
        }
    }
}

impl FromStr for BlockSpec {
    type Err = Error;

    /// Parses `latest`, a decimal block number or a `0x` quantity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" | "latest" => Ok(BlockSpec::Latest),
            _ => parse_quantity(s)
                .map(BlockSpec::Number)
                .ok_or_else(|| Error::InvalidArgument(format!("invalid block '{s}'"))),
        }
    }
}

impl fmt::Display for BlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSpec::Latest => write!(f, "latest"),
            BlockSpec::Number(number) => write!(f, "{number}"),
        }
    }
}

/// The gas limit of a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GasSpec {
    /// Estimated with `eth_estimateGas`
    #[default]
    Auto,
    /// An explicit gas limit
    Limit(u64),
}

impl FromStr for GasSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" | "auto" => Ok(GasSpec::Auto),
            _ => parse_quantity(s)
                .map(GasSpec::Limit)
                .ok_or_else(|| Error::InvalidArgument(format!("invalid gas limit '{s}'"))),
        }
    }
}

/// The gas price of a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GasPriceSpec {
    /// The node's current `eth_gasPrice`
    #[default]
    Auto,
    /// An explicit price, in wei
    Wei(u128),
}

impl FromStr for GasPriceSpec {
    type Err = Error;

    /// Parses `auto` or a price in gwei, e.g. `12.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "auto" {
            return Ok(GasPriceSpec::Auto);
        }

        let wei = parse_amount(s, 9)
            .and_then(|wei| u128::try_from(wei).ok())
            .ok_or_else(|| Error::InvalidArgument(format!("invalid gas price '{s}'")))?;
        Ok(GasPriceSpec::Wei(wei))
    }
}

/// A transaction to simulate, in node units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationRequest {
    /// The sender
    pub from_address: Address,
    /// The recipient
    pub to_address: Address,
    /// The native value sent, in wei
    pub value_wei: U256,
    /// The calldata
    pub data: Bytes,
    /// The block to simulate on top of
    pub block: BlockSpec,
    /// The gas limit
    pub gas: GasSpec,
    /// The gas price
    pub gas_price: GasPriceSpec,
}

impl SimulationRequest {
    /// A plain call from `from_address` to `to_address` with every other field defaulted.
    pub fn new(from_address: Address, to_address: Address) -> Self {
        Self {
            from_address,
            to_address,
            value_wei: U256::ZERO,
            data: Bytes::new(),
            block: BlockSpec::Latest,
            gas: GasSpec::Auto,
            gas_price: GasPriceSpec::Auto,
        }
    }

    /// Builds a request from user facing units: `value` in ether, `gas_price` in gwei, and the
    /// `latest` / `auto` keywords. Empty strings select the defaults.
    ///
    /// ```
    /// use txplain_translate::{BlockSpec, GasPriceSpec, SimulationRequest};
    ///
    /// let request = SimulationRequest::from_user_units(
    ///     "0x0000000000000000000000000000000000000001",
    ///     "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
    ///     "1.5",
    ///     "0xd0e30db0",
    ///     "latest",
    ///     "auto",
    ///     "12.5",
    /// )
    /// .unwrap();
    /// assert_eq!(request.value_wei.to_string(), "1500000000000000000");
    /// assert_eq!(request.block, BlockSpec::Latest);
    /// assert_eq!(request.gas_price, GasPriceSpec::Wei(12_500_000_000));
    /// ```
    pub fn from_user_units(
        from_address: &str,
        to_address: &str,
        value: &str,
        data: &str,
        block: &str,
        gas: &str,
        gas_price: &str,
    ) -> Result<Self, Error> {
        let value = value.trim();
        let value_wei = match value.is_empty() {
            true => U256::ZERO,
            false => parse_amount(value, 18)
                .ok_or_else(|| Error::InvalidArgument(format!("invalid value '{value}'")))?,
        };

        let data = match data.trim() {
            "" => Bytes::new(),
            data => Bytes::from_str(data)
                .map_err(|_| Error::InvalidArgument(format!("invalid calldata '{data}'")))?,
        };

        Ok(Self {
            from_address: parse_address(from_address)?,
            to_address: parse_address(to_address)?,
            value_wei,
            data,
            block: block.parse()?,
            gas: gas.parse()?,
            gas_price: gas_price.parse()?,
        })
    }
}

fn parse_address(address: &str) -> Result<Address, Error> {
    Address::from_str(address.trim())
        .map_err(|_| Error::InvalidArgument(format!("'{address}' is not an address")))
}

/// Parses a decimal or `0x` prefixed integer.
fn parse_quantity(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Parses a non-negative decimal amount into base units.
fn parse_amount(amount: &str, decimals: u8) -> Option<U256> {
    if amount.starts_with('-') {
        return None;
    }

    parse_units(amount, decimals).ok().map(ParseUnits::get_absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM: &str = "0x0000000000000000000000000000000000000001";
    const TO: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    #[test]
    fn test_block_spec() {
        assert_eq!("latest".parse::<BlockSpec>().ok(), Some(BlockSpec::Latest));
        assert_eq!("".parse::<BlockSpec>().ok(), Some(BlockSpec::Latest));
        assert_eq!("18000000".parse::<BlockSpec>().ok(), Some(BlockSpec::Number(18_000_000)));
        assert_eq!("0x112a880".parse::<BlockSpec>().ok(), Some(BlockSpec::Number(18_000_000)));
        assert!("pending".parse::<BlockSpec>().is_err());
        assert_eq!(BlockSpec::Number(18_000_000).to_param(), "0x112a880");
    }

    #[test]
    fn test_gas_specs() {
        assert_eq!("auto".parse::<GasSpec>().ok(), Some(GasSpec::Auto));
        assert_eq!("21000".parse::<GasSpec>().ok(), Some(GasSpec::Limit(21_000)));
        assert!("lots".parse::<GasSpec>().is_err());

        assert_eq!("auto".parse::<GasPriceSpec>().ok(), Some(GasPriceSpec::Auto));
        assert_eq!("30".parse::<GasPriceSpec>().ok(), Some(GasPriceSpec::Wei(30_000_000_000)));
        assert!("-1".parse::<GasPriceSpec>().is_err());
    }

    #[test]
    fn test_from_user_units_defaults() {
        let request =
            SimulationRequest::from_user_units(FROM, TO, "", "0x", "", "", "").expect("valid");
        assert_eq!(
            request,
            SimulationRequest::new(
                Address::from_str(FROM).expect("valid"),
                Address::from_str(TO).expect("valid")
            )
        );
    }

    #[test]
    fn test_from_user_units_rejects_garbage() {
        assert!(SimulationRequest::from_user_units("0x01", TO, "", "", "", "", "").is_err());
        assert!(SimulationRequest::from_user_units(FROM, TO, "-1", "", "", "", "").is_err());
        assert!(SimulationRequest::from_user_units(FROM, TO, "one", "", "", "", "").is_err());
        assert!(SimulationRequest::from_user_units(FROM, TO, "", "0xzz", "", "", "").is_err());
    }
}
