use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::U256,
};
use serde_json::Value;

/// The selector of `Error(string)`
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// The selector of `Panic(uint256)`
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Decodes revert data into a readable reason. Returns `None` for empty data and for custom
/// errors, whose ABI is unknown.
pub(crate) fn decode_revert(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }

    let (selector, payload) = data.split_at(4);
    match selector {
        s if s == ERROR_SELECTOR => match DynSolType::String.abi_decode(payload) {
            Ok(DynSolValue::String(reason)) => Some(reason),
            _ => None,
        },
        s if s == PANIC_SELECTOR => {
            let code = U256::try_from_be_slice(payload.get(..32)?)?;
            Some(format!("Panic({code:#x}): {}", panic_description(code)))
        }
        _ => None,
    }
}

fn panic_description(code: U256) -> &'static str {
    match u64::try_from(code).unwrap_or(u64::MAX) {
        0x00 => "generic compiler panic",
        0x01 => "assertion failed",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "invalid storage byte array",
        0x31 => "pop on an empty array",
        0x32 => "array index out of bounds",
        0x41 => "out of memory",
        0x51 => "call to an uninitialized function",
        _ => "unknown panic",
    }
}

/// Extracts a revert reason from the `data` of a JSON-RPC error, as returned by `eth_call`.
pub(crate) fn reason_from_error_data(data: Option<&Value>) -> Option<String> {
    let hex = match data? {
        Value::String(hex) => hex.as_str(),
        Value::Object(object) => object.get("data")?.as_str()?,
        _ => return None,
    };

    let bytes = alloy::hex::decode(hex).ok()?;
    decode_revert(&bytes)
}
