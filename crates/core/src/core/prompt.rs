use txplain_common::{
    ether::tagged::{AccountBalanceChanged, TaggedAddr, TaggedTx},
    utils::{
        fmt::{fmt_addr, fmt_blktime, fmt_gas, fmt_status, fmt_value},
        table::render_grid,
    },
};

const INSTRUCTION: &str = "As a proficient blockchain data analyst, your role entails delivering \
concise insights into the intentions driving the given transactions. Please present a brief \
overview for each transaction, comprising three sentences. Include details such as the \
transaction time, involved parties, and their actions.";

/// The display form of a [TaggedTx], as it appears in a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// The transaction hash, or `simulated`
    pub txhash: String,
    /// The formatted block time
    pub blocktime: String,
    /// The formatted sender
    pub from_addr: String,
    /// The formatted recipient
    pub to_addr: Option<String>,
    /// The formatted address of the created contract
    pub contract_created: Option<String>,
    /// The formatted value
    pub value: String,
    /// The gas used
    pub gas_used: String,
    /// The formatted gas price
    pub gas_price: String,
    /// `Success` or `Fail`
    pub status: String,
    /// The revert reason
    pub reason: Option<String>,
    /// The method name or selector
    pub method: Option<String>,
    /// The actions, in execution order
    pub actions: Vec<String>,
    /// The rendered balance change tables, empty when nothing changed
    pub balance_change: String,
}

impl PromptContext {
    /// Formats every field of `tx` for display.
    pub fn from_tagged(tx: &TaggedTx) -> Self {
        Self {
            txhash: tx.txhash.clone().unwrap_or_else(|| "simulated".to_string()),
            blocktime: fmt_blktime(&tx.block_time),
            from_addr: fmt_addr(&tx.from, true),
            to_addr: tx.to.as_ref().map(|to| fmt_addr(to, true)),
            contract_created: tx.contract_created.as_ref().map(|created| fmt_addr(created, true)),
            value: fmt_value(tx.value),
            gas_used: tx.gas_used.to_string(),
            gas_price: fmt_gas(tx.gas_price),
            status: fmt_status(tx.status).to_string(),
            reason: tx.reason.clone(),
            method: tx.method.clone(),
            actions: tx.actions.clone(),
            balance_change: render_balance_changes(&tx.balance_change),
        }
    }
}

/// One grid table per account. A USD column is added to every table as soon as any asset
/// has a USD value.
fn render_balance_changes(changes: &[AccountBalanceChanged]) -> String {
    let with_usd = changes
        .iter()
        .flat_map(|account| &account.assets)
        .any(|asset| asset.balance_change_usd.is_some());
    let headers: &[&str] = match with_usd {
        true => &["Asset", "Balance Change", "Balance Change (USD)"],
        false => &["Asset", "Balance Change"],
    };

    let mut render = String::new();
    for account in changes {
        let rows: Vec<Vec<String>> = account
            .assets
            .iter()
            .map(|asset| {
                let token = TaggedAddr::labeled(asset.asset.address, asset.asset.symbol.as_str());
                let mut row = vec![fmt_addr(&token, false), asset.balance_change.to_string()];
                if with_usd {
                    row.push(
                        asset.balance_change_usd.map(|usd| format!("{usd:.2}")).unwrap_or_default(),
                    );
                }
                row
            })
            .collect();

        render.push_str(&format!("\nAccount: {}\n", fmt_addr(&account.address, false)));
        render.push_str(&render_grid(headers, &rows));
        render.push('\n');
    }

    render
}

/// Renders the explanation prompt for a transaction.
pub fn render_prompt(ctx: &PromptContext) -> String {
    let mut prompt = format!("{INSTRUCTION}\n\n");

    prompt.push_str(&format!("Transaction: {}\n", ctx.txhash));
    prompt.push_str(&format!("Blocktime: {}\n", ctx.blocktime));
    prompt.push_str(&format!("From: {}\n", ctx.from_addr));

    let mut to = ctx.to_addr.clone().unwrap_or_default();
    if let Some(created) = &ctx.contract_created {
        if !to.is_empty() {
            to.push(' ');
        }
        to.push_str(&format!("(Contract Created: {created})"));
    }
    prompt.push_str(&format!("To: {to}\n"));

    prompt.push_str(&format!("Value: {}\n", ctx.value));
    prompt.push_str(&format!("GasUsed: {}\n", ctx.gas_used));
    prompt.push_str(&format!("Gas Price: {}\n", ctx.gas_price));
    match &ctx.reason {
        Some(reason) => prompt.push_str(&format!("Status: {} ({reason})\n", ctx.status)),
        None => prompt.push_str(&format!("Status: {}\n", ctx.status)),
    }
    if let Some(method) = &ctx.method {
        prompt.push_str(&format!("Method: {method}\n"));
    }

    if !ctx.actions.is_empty() {
        let actions: Vec<String> = ctx.actions.iter().map(|action| format!("- {action}")).collect();
        prompt.push_str(&format!("\nActions\n------\n{}\n", actions.join("\n")));
    }

    if !ctx.balance_change.is_empty() {
        prompt.push_str(&format!("\nBalance Changes\n--------------\n{}", ctx.balance_change));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes, U256};
    use chrono::{TimeZone, Utc};
    use txplain_common::ether::tagged::{AssetBalanceChanged, Erc20Compatible};

    fn sample() -> TaggedTx {
        let sender = address!("0000000000000000000000000000000000001111");
        TaggedTx {
            txhash: Some(
                "0x9a5f4ef7678a94dd87048eeec931d30af21b1f4cecbf7e850a531d2bb64a54ac".to_string(),
            ),
            from: TaggedAddr::new(sender),
            to: Some(TaggedAddr::new(address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"))),
            contract_created: None,
            block_number: 18_000_000,
            block_time: Utc.timestamp_opt(1_693_497_600, 0).single().expect("valid timestamp"),
            value: U256::from(500_000_000_000_000_000u64),
            gas_used: 27_938,
            gas_price: 12_500_000_000,
            input: Bytes::from_static(&[0x2e, 0x1a, 0x7d, 0x4d]),
            status: 1,
            reason: None,
            method: Some("withdraw".to_string()),
            actions: vec!["Unwrap 0.5 WETH to ETH by 0x0000...1111".to_string()],
            balance_change: vec![AccountBalanceChanged {
                address: TaggedAddr::new(sender),
                assets: vec![AssetBalanceChanged {
                    asset: Erc20Compatible {
                        address: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
                        name: "Wrapped Ether".to_string(),
                        symbol: "WETH".to_string(),
                        decimals: 18,
                    },
                    balance_change: -0.5,
                    balance_change_usd: None,
                }],
            }],
        }
    }

    #[test]
    fn test_context_formats_fields() {
        let ctx = PromptContext::from_tagged(&sample());
        assert_eq!(ctx.blocktime, "2023-08-31 16:00:00 UTC");
        assert_eq!(ctx.from_addr, "0x0000...1111");
        assert_eq!(ctx.to_addr.as_deref(), Some("0xC02a...6Cc2"));
        assert_eq!(ctx.value, "0.5 ETH");
        assert_eq!(ctx.gas_price, "12.5 Gwei");
        assert_eq!(ctx.status, "Success");
    }

    #[test]
    fn test_render_prompt() {
        let prompt = render_prompt(&PromptContext::from_tagged(&sample()));

        assert!(prompt.starts_with("As a proficient blockchain data analyst"));
        assert!(prompt.contains(
            "Transaction: 0x9a5f4ef7678a94dd87048eeec931d30af21b1f4cecbf7e850a531d2bb64a54ac\n\
             Blocktime: 2023-08-31 16:00:00 UTC\n\
             From: 0x0000...1111\n\
             To: 0xC02a...6Cc2\n\
             Value: 0.5 ETH\n\
             GasUsed: 27938\n\
             Gas Price: 12.5 Gwei\n\
             Status: Success\n\
             Method: withdraw\n"
        ));
        assert!(prompt.contains("\nActions\n------\n- Unwrap 0.5 WETH to ETH by 0x0000...1111\n"));
        assert!(prompt.contains(
            "\nBalance Changes\n--------------\n\nAccount: 0x0000000000000000000000000000000000001111\n"
        ));
        assert!(prompt.contains("| WETH (0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2) |           -0.5 |"));
        assert!(!prompt.contains("(USD)"));
    }

    #[test]
    fn test_render_prompt_failure_and_usd() {
        let mut tx = sample();
        tx.status = 0;
        tx.reason = Some("SafeMath: subtraction overflow".to_string());
        tx.method = None;
        tx.actions.clear();
        tx.balance_change[0].assets[0].balance_change_usd = Some(-800.0);

        let prompt = render_prompt(&PromptContext::from_tagged(&tx));
        assert!(prompt.contains("Status: Fail (SafeMath: subtraction overflow)\n"));
        assert!(!prompt.contains("Method:"));
        assert!(!prompt.contains("Actions"));
        assert!(prompt.contains("| Balance Change (USD) |"));
        assert!(prompt.contains("-800.00 |"));
    }

    #[test]
    fn test_contract_creation() {
        let mut tx = sample();
        tx.to = None;
        tx.contract_created =
            Some(TaggedAddr::new(address!("0000000000000000000000000000000000009999")));

        let prompt = render_prompt(&PromptContext::from_tagged(&tx));
        assert!(prompt.contains("To: (Contract Created: 0x0000...9999)\n"));
    }
}
