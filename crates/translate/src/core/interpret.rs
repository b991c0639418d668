use alloy::primitives::{keccak256, Address, B256, I256, U256};
use lazy_static::lazy_static;
use tracing::trace;
use txplain_common::{
    constants::NULL_ADDRESS_0X0,
    ether::tagged::{AccountBalanceChanged, AssetBalanceChanged, Erc20Compatible, TaggedAddr},
    utils::fmt::{fmt_addr, to_display_units, trim_decimal},
};

use super::{
    effects::Effect,
    node::NodeLog,
    tokens::{native_asset, TokenRegistry},
};

lazy_static! {
    static ref TRANSFER_TOPIC: B256 = keccak256("Transfer(address,address,uint256)");
    static ref APPROVAL_TOPIC: B256 = keccak256("Approval(address,address,uint256)");
    static ref DEPOSIT_TOPIC: B256 = keccak256("Deposit(address,uint256)");
    static ref WITHDRAWAL_TOPIC: B256 = keccak256("Withdrawal(address,uint256)");
}

/// Signed balance deltas in raw units, per account and asset, in first seen order.
#[derive(Debug, Default)]
pub(crate) struct BalanceSheet {
    accounts: Vec<(Address, Vec<(Erc20Compatible, I256)>)>,
}

impl BalanceSheet {
    pub(crate) fn credit(&mut self, account: Address, asset: &Erc20Compatible, amount: U256) {
        self.apply(account, asset, I256::from_raw(amount));
    }

    pub(crate) fn debit(&mut self, account: Address, asset: &Erc20Compatible, amount: U256) {
        self.apply(account, asset, I256::from_raw(amount).saturating_neg());
    }

    fn apply(&mut self, account: Address, asset: &Erc20Compatible, delta: I256) {
        // mints and burns only move the counterparty's balance
        if account == NULL_ADDRESS_0X0 {
            return;
        }

        let index = match self.accounts.iter().position(|(address, _)| *address == account) {
            Some(index) => index,
            None => {
                self.accounts.push((account, Vec::new()));
                self.accounts.len() - 1
            }
        };
        let assets = &mut self.accounts[index].1;

        match assets.iter_mut().find(|(known, _)| known.address == asset.address) {
            Some((_, balance)) => *balance = balance.saturating_add(delta),
            None => assets.push((asset.clone(), delta)),
        }
    }

    /// Converts the sheet into display units, dropping every zero entry.
    pub(crate) fn into_balance_changes(self) -> Vec<AccountBalanceChanged> {
        self.accounts
            .into_iter()
            .filter_map(|(address, assets)| {
                let assets: Vec<AssetBalanceChanged> = assets
                    .into_iter()
                    .filter(|(_, delta)| !delta.is_zero())
                    .map(|(asset, delta)| {
                        let magnitude = to_display_units(delta.unsigned_abs(), asset.decimals);
                        AssetBalanceChanged {
                            balance_change: match delta.is_negative() {
                                true => -magnitude,
                                false => magnitude,
                            },
                            asset,
                            balance_change_usd: None,
                        }
                    })
                    .collect();

                (!assets.is_empty())
                    .then_some(AccountBalanceChanged { address: TaggedAddr::new(address), assets })
            })
            .collect()
    }
}

/// Human readable actions and balance changes derived from a transaction's effects.
#[derive(Debug, Default)]
pub(crate) struct Interpretation {
    pub(crate) actions: Vec<String>,
    pub(crate) balances: BalanceSheet,
}

fn short(address: Address) -> String {
    fmt_addr(&TaggedAddr::new(address), true)
}

fn amount(raw: U256, token: &Erc20Compatible) -> String {
    let value = to_display_units(raw, token.decimals);
    format!("{} {}", trim_decimal(&format!("{value:.6}")), token.symbol)
}

fn word(log: &NodeLog) -> Option<U256> {
    log.data.get(..32).map(U256::from_be_slice)
}

/// Interprets effects in order. Logs that aren't transfers, approvals, or WETH wrapping are
/// ignored.
pub(crate) async fn interpret(effects: &[Effect], tokens: &TokenRegistry) -> Interpretation {
    let mut interpretation = Interpretation::default();
    let native = native_asset();

    for effect in effects {
        match effect {
            Effect::NativeTransfer { from, to, value } => {
                interpretation.actions.push(format!(
                    "Transfer {} from {} to {}",
                    amount(*value, &native),
                    short(*from),
                    short(*to)
                ));
                interpretation.balances.debit(*from, &native, *value);
                interpretation.balances.credit(*to, &native, *value);
            }
            Effect::Log(log) => interpret_log(log, tokens, &mut interpretation).await,
        }
    }

    interpretation
}

async fn interpret_log(log: &NodeLog, tokens: &TokenRegistry, out: &mut Interpretation) {
    let topic0 = match log.topics.first() {
        Some(topic) => *topic,
        None => return,
    };
    let address_at = |index: usize| log.topics.get(index).map(|topic| Address::from_word(*topic));

    if topic0 == *TRANSFER_TOPIC && log.topics.len() == 3 {
        let (Some(from), Some(to), Some(value)) = (address_at(1), address_at(2), word(log)) else {
            return;
        };
        let token = tokens.get(log.address, false).await;
        out.actions.push(match (from == NULL_ADDRESS_0X0, to == NULL_ADDRESS_0X0) {
            (true, _) => format!("Mint {} to {}", amount(value, &token), short(to)),
            (_, true) => format!("Burn {} from {}", amount(value, &token), short(from)),
            _ => format!("Transfer {} from {} to {}", amount(value, &token), short(from), short(to)),
        });
        out.balances.debit(from, &token, value);
        out.balances.credit(to, &token, value);
    } else if topic0 == *TRANSFER_TOPIC && log.topics.len() == 4 {
        let (Some(from), Some(to), Some(id)) =
            (address_at(1), address_at(2), log.topics.get(3).map(|t| U256::from_be_bytes(t.0)))
        else {
            return;
        };
        let token = tokens.get(log.address, true).await;
        out.actions.push(match (from == NULL_ADDRESS_0X0, to == NULL_ADDRESS_0X0) {
            (true, _) => format!("Mint {} #{} to {}", token.symbol, id, short(to)),
            (_, true) => format!("Burn {} #{} from {}", token.symbol, id, short(from)),
            _ => format!("Transfer {} #{} from {} to {}", token.symbol, id, short(from), short(to)),
        });
        out.balances.debit(from, &token, U256::from(1));
        out.balances.credit(to, &token, U256::from(1));
    } else if topic0 == *APPROVAL_TOPIC && log.topics.len() == 3 {
        let (Some(owner), Some(spender), Some(value)) = (address_at(1), address_at(2), word(log))
        else {
            return;
        };
        let token = tokens.get(log.address, false).await;
        let allowance = match value == U256::MAX {
            true => format!("unlimited {}", token.symbol),
            false => amount(value, &token),
        };
        out.actions.push(format!(
            "Approve {} to spend {} of {}",
            short(spender),
            allowance,
            short(owner)
        ));
    } else if topic0 == *DEPOSIT_TOPIC && log.topics.len() == 2 {
        let (Some(dst), Some(wad)) = (address_at(1), word(log)) else {
            return;
        };
        let token = tokens.get(log.address, false).await;
        out.actions.push(format!(
            "Wrap {} to {} by {}",
            amount(wad, &native_asset()),
            token.symbol,
            short(dst)
        ));
        out.balances.credit(dst, &token, wad);
    } else if topic0 == *WITHDRAWAL_TOPIC && log.topics.len() == 2 {
        let (Some(src), Some(wad)) = (address_at(1), word(log)) else {
            return;
        };
        let token = tokens.get(log.address, false).await;
        out.actions.push(format!(
            "Unwrap {} to {} by {}",
            amount(wad, &token),
            native_asset().symbol,
            short(src)
        ));
        out.balances.debit(src, &token, wad);
    } else {
        trace!("ignoring log {:#x} from {:#x} .", topic0, log.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes};
    use serde_json::json;
    use std::{sync::Arc, time::Duration};
    use txplain_common::ether::jsonrpc::JsonRpcClient;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, ResponseTemplate,
    };

    const ALICE: Address = address!("0000000000000000000000000000000000001111");
    const BOB: Address = address!("0000000000000000000000000000000000002222");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

    fn topic(address: Address) -> B256 {
        address.into_word()
    }

    fn data(value: U256) -> Bytes {
        Bytes::from(value.to_be_bytes::<32>().to_vec())
    }

    fn uint_result(value: u64) -> String {
        format!("0x{}", alloy::hex::encode(U256::from(value).to_be_bytes::<32>()))
    }

    fn string_result(value: &str) -> String {
        let encoded = alloy::dyn_abi::DynSolValue::String(value.to_string()).abi_encode();
        format!("0x{}", alloy::hex::encode(encoded))
    }

    async fn mock_token(server: &MockServer, token: Address, symbol: &str, decimals: u64) {
        for (selector, result) in [
            ("0x06fdde03", string_result(symbol)),
            ("0x95d89b41", string_result(symbol)),
            ("0x313ce567", uint_result(decimals)),
        ] {
            Mock::given(method("POST"))
                .and(body_partial_json(json!({
                    "method": "eth_call",
                    "params": [{"to": token, "data": selector}]
                })))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result})),
                )
                .mount(server)
                .await;
        }
    }

    async fn registry() -> (MockServer, TokenRegistry) {
        let server = MockServer::start().await;
        mock_token(&server, USDC, "USDC", 6).await;
        mock_token(&server, WETH, "WETH", 18).await;

        let client = JsonRpcClient::new(server.uri())
            .expect("failed to build client")
            .with_max_elapsed(Duration::from_secs(1));
        (server, TokenRegistry::new(Arc::new(client)))
    }

    #[test]
    fn test_balance_sheet_aggregates_and_drops_zeroes() {
        let usdc = Erc20Compatible {
            address: USDC,
            name: "USD Coin".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
        };
        let native = native_asset();

        let mut sheet = BalanceSheet::default();
        sheet.debit(ALICE, &usdc, U256::from(5_000_000));
        sheet.credit(BOB, &usdc, U256::from(5_000_000));
        sheet.credit(ALICE, &native, U256::from(10u64.pow(18)));
        sheet.credit(BOB, &native, U256::from(1));
        sheet.debit(BOB, &native, U256::from(1));
        sheet.credit(NULL_ADDRESS_0X0, &usdc, U256::from(1));

        let changes = sheet.into_balance_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].address.address, ALICE);
        assert_eq!(changes[0].assets[0].balance_change, -5.0);
        assert_eq!(changes[0].assets[1].balance_change, 1.0);
        assert_eq!(changes[1].address.address, BOB);
        assert_eq!(changes[1].assets.len(), 1);
        assert_eq!(changes[1].assets[0].asset.symbol, "USDC");
    }

    #[tokio::test]
    async fn test_erc20_transfer_and_mint() {
        let (_server, tokens) = registry().await;
        let effects = vec![
            Effect::Log(NodeLog {
                address: USDC,
                topics: vec![*TRANSFER_TOPIC, topic(ALICE), topic(BOB)],
                data: data(U256::from(1_500_000)),
            }),
            Effect::Log(NodeLog {
                address: USDC,
                topics: vec![*TRANSFER_TOPIC, topic(NULL_ADDRESS_0X0), topic(ALICE)],
                data: data(U256::from(2_000_000)),
            }),
        ];

        let interpretation = interpret(&effects, &tokens).await;
        assert_eq!(
            interpretation.actions,
            vec![
                "Transfer 1.5 USDC from 0x0000...1111 to 0x0000...2222".to_string(),
                "Mint 2 USDC to 0x0000...1111".to_string(),
            ]
        );

        let changes = interpretation.balances.into_balance_changes();
        assert_eq!(changes[0].assets[0].balance_change, 0.5);
        assert_eq!(changes[1].assets[0].balance_change, 1.5);
    }

    #[tokio::test]
    async fn test_weth_wrap_and_approval() {
        let (_server, tokens) = registry().await;
        let effects = vec![
            Effect::NativeTransfer { from: ALICE, to: WETH, value: U256::from(10u64.pow(18)) },
            Effect::Log(NodeLog {
                address: WETH,
                topics: vec![*DEPOSIT_TOPIC, topic(ALICE)],
                data: data(U256::from(10u64.pow(18))),
            }),
            Effect::Log(NodeLog {
                address: WETH,
                topics: vec![*APPROVAL_TOPIC, topic(ALICE), topic(BOB)],
                data: data(U256::MAX),
            }),
        ];

        let interpretation = interpret(&effects, &tokens).await;
        assert_eq!(interpretation.actions[1], "Wrap 1 ETH to WETH by 0x0000...1111");
        assert_eq!(
            interpretation.actions[2],
            "Approve 0x0000...2222 to spend unlimited WETH of 0x0000...1111"
        );

        let changes = interpretation.balances.into_balance_changes();
        let alice: Vec<(&str, f64)> = changes[0]
            .assets
            .iter()
            .map(|asset| (asset.asset.symbol.as_str(), asset.balance_change))
            .collect();
        assert_eq!(alice, vec![("ETH", -1.0), ("WETH", 1.0)]);
    }
}
