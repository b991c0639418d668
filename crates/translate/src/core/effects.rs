use alloy::primitives::{Address, U256};

use super::node::{CallFrame, NodeLog};

/// The raw material actions and balance changes are derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    /// Native value moved by a call
    NativeTransfer { from: Address, to: Address, value: U256 },
    /// A log emitted by a call that didn't revert
    Log(NodeLog),
}

/// Flattens a call trace into effects, in execution order.
///
/// Frames that reverted are skipped together with everything below them. Logs are placed
/// before the sub call their `position` points to; logs without a position come last.
pub(crate) fn effects_from_trace(root: &CallFrame) -> Vec<Effect> {
    let mut effects = Vec::new();
    walk(root, &mut effects);
    effects
}

fn walk(frame: &CallFrame, effects: &mut Vec<Effect>) {
    if frame.error.is_some() {
        return;
    }

    let moves_value = !matches!(frame.typ.as_str(), "DELEGATECALL" | "STATICCALL" | "CALLCODE");
    if let (true, Some(value), Some(to)) = (moves_value, frame.value, frame.to) {
        if !value.is_zero() {
            effects.push(Effect::NativeTransfer { from: frame.from, to, value });
        }
    }

    let logs_at = |index: usize| {
        frame
            .logs
            .iter()
            .filter(move |log| log.position.map(|p| p.to::<usize>()) == Some(index))
            .map(|log| Effect::Log(log.into()))
    };

    for (index, call) in frame.calls.iter().enumerate() {
        effects.extend(logs_at(index));
        walk(call, effects);
    }

    let calls = frame.calls.len();
    effects.extend(
        frame
            .logs
            .iter()
            .filter(|log| log.position.map_or(true, |p| p.to::<usize>() >= calls))
            .map(|log| Effect::Log(log.into())),
    );
}

/// Builds effects from a receipt when no trace is available: the top level value transfer
/// followed by the receipt logs. Failed transactions have no effects.
pub(crate) fn effects_from_receipt(
    succeeded: bool,
    from: Address,
    to: Option<Address>,
    value: U256,
    logs: &[NodeLog],
) -> Vec<Effect> {
    if !succeeded {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if let Some(to) = to {
        if !value.is_zero() {
            effects.push(Effect::NativeTransfer { from, to, value });
        }
    }
    effects.extend(logs.iter().cloned().map(Effect::Log));
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: serde_json::Value) -> CallFrame {
        serde_json::from_value(value).expect("failed to deserialize frame")
    }

    fn log_address(effect: &Effect) -> Option<String> {
        match effect {
            Effect::Log(log) => Some(format!("{:#x}", log.address)),
            _ => None,
        }
    }

    #[test]
    fn test_logs_interleave_with_calls() {
        let root = frame(json!({
            "type": "CALL",
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x00000000000000000000000000000000000000aa",
            "value": "0x1",
            "input": "0x",
            "calls": [
                {
                    "type": "CALL",
                    "from": "0x00000000000000000000000000000000000000aa",
                    "to": "0x00000000000000000000000000000000000000bb",
                    "input": "0x",
                    "logs": [{"address": "0x00000000000000000000000000000000000000bb", "topics": [], "data": "0x", "position": "0x0"}]
                }
            ],
            "logs": [
                {"address": "0x00000000000000000000000000000000000000a1", "topics": [], "data": "0x", "position": "0x0"},
                {"address": "0x00000000000000000000000000000000000000a2", "topics": [], "data": "0x", "position": "0x1"},
                {"address": "0x00000000000000000000000000000000000000a3", "topics": [], "data": "0x"}
            ]
        }));

        let effects = effects_from_trace(&root);
        assert!(matches!(effects[0], Effect::NativeTransfer { .. }));
        let order: Vec<String> = effects.iter().filter_map(log_address).collect();
        assert_eq!(
            order,
            vec![
                "0x00000000000000000000000000000000000000a1",
                "0x00000000000000000000000000000000000000bb",
                "0x00000000000000000000000000000000000000a2",
                "0x00000000000000000000000000000000000000a3",
            ]
        );
    }

    #[test]
    fn test_reverted_frames_are_skipped() {
        let root = frame(json!({
            "type": "CALL",
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x00000000000000000000000000000000000000aa",
            "input": "0x",
            "calls": [
                {
                    "type": "CALL",
                    "from": "0x00000000000000000000000000000000000000aa",
                    "to": "0x00000000000000000000000000000000000000bb",
                    "value": "0x10",
                    "input": "0x",
                    "error": "execution reverted",
                    "logs": [{"address": "0x00000000000000000000000000000000000000bb", "topics": [], "data": "0x"}]
                },
                {
                    "type": "DELEGATECALL",
                    "from": "0x00000000000000000000000000000000000000aa",
                    "to": "0x00000000000000000000000000000000000000cc",
                    "value": "0x10",
                    "input": "0x"
                }
            ]
        }));

        assert!(effects_from_trace(&root).is_empty());
    }

    #[test]
    fn test_receipt_fallback() {
        let from = Address::repeat_byte(0x01);
        let to = Address::repeat_byte(0x02);
        let log = NodeLog { address: to, topics: vec![], data: Default::default() };

        let effects = effects_from_receipt(true, from, Some(to), U256::from(5), &[log.clone()]);
        assert_eq!(
            effects,
            vec![Effect::NativeTransfer { from, to, value: U256::from(5) }, Effect::Log(log.clone())]
        );
        assert!(effects_from_receipt(false, from, Some(to), U256::from(5), &[log]).is_empty());
    }
}
