//! The subset of node responses the translator reads.

use alloy::primitives::{Address, Bytes, B256, U128, U256, U64};
use serde::Deserialize;
use serde_json::{json, Value};
use txplain_common::ether::jsonrpc::JsonRpcClient;

use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeTransaction {
    pub(crate) from: Address,
    pub(crate) to: Option<Address>,
    pub(crate) value: U256,
    pub(crate) input: Bytes,
    pub(crate) gas: U64,
    pub(crate) gas_price: Option<U128>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeReceipt {
    pub(crate) status: Option<U64>,
    pub(crate) gas_used: U64,
    pub(crate) effective_gas_price: Option<U128>,
    pub(crate) contract_address: Option<Address>,
    pub(crate) block_number: U64,
    #[serde(default)]
    pub(crate) logs: Vec<NodeLog>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct NodeLog {
    pub(crate) address: Address,
    #[serde(default)]
    pub(crate) topics: Vec<B256>,
    #[serde(default)]
    pub(crate) data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeBlock {
    pub(crate) number: U64,
    pub(crate) timestamp: U64,
    pub(crate) gas_limit: U64,
}

/// A frame of a `callTracer` trace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallFrame {
    #[serde(rename = "type")]
    pub(crate) typ: String,
    pub(crate) from: Address,
    pub(crate) to: Option<Address>,
    pub(crate) value: Option<U256>,
    pub(crate) gas_used: Option<U64>,
    #[serde(default)]
    pub(crate) output: Option<Bytes>,
    pub(crate) error: Option<String>,
    pub(crate) revert_reason: Option<String>,
    #[serde(default)]
    pub(crate) calls: Vec<CallFrame>,
    #[serde(default)]
    pub(crate) logs: Vec<CallLog>,
}

/// A log emitted by a [CallFrame]. `position` is the index of the sub call it precedes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CallLog {
    pub(crate) address: Address,
    #[serde(default)]
    pub(crate) topics: Vec<B256>,
    #[serde(default)]
    pub(crate) data: Bytes,
    pub(crate) position: Option<U64>,
}

impl From<&CallLog> for NodeLog {
    fn from(log: &CallLog) -> Self {
        NodeLog { address: log.address, topics: log.topics.clone(), data: log.data.clone() }
    }
}

/// A block selector in node syntax: a tag or a hex quantity.
pub(crate) fn block_param(number: Option<u64>) -> String {
    match number {
        Some(number) => format!("{number:#x}"),
        None => "latest".to_string(),
    }
}

fn call_tracer() -> Value {
    json!({"tracer": "callTracer", "tracerConfig": {"withLog": true}})
}

pub(crate) async fn get_transaction(
    client: &JsonRpcClient,
    txhash: &str,
) -> Result<NodeTransaction, Error> {
    client
        .request("eth_getTransactionByHash", [txhash])
        .await?
        .ok_or_else(|| Error::TransactionNotFound(txhash.to_string()))
}

pub(crate) async fn get_receipt(
    client: &JsonRpcClient,
    txhash: &str,
) -> Result<NodeReceipt, Error> {
    client
        .request("eth_getTransactionReceipt", [txhash])
        .await?
        .ok_or_else(|| Error::PendingTransaction(txhash.to_string()))
}

pub(crate) async fn get_block(client: &JsonRpcClient, block: &str) -> Result<NodeBlock, Error> {
    client
        .request("eth_getBlockByNumber", (block, false))
        .await?
        .ok_or_else(|| Error::BlockNotFound(block.to_string()))
}

pub(crate) async fn trace_transaction(
    client: &JsonRpcClient,
    txhash: &str,
) -> Result<Option<CallFrame>, Error> {
    Ok(client.request("debug_traceTransaction", (txhash, call_tracer())).await?)
}

pub(crate) async fn trace_call(
    client: &JsonRpcClient,
    call: &Value,
    block: &str,
) -> Result<Option<CallFrame>, Error> {
    Ok(client.request("debug_traceCall", (call, block, call_tracer())).await?)
}

pub(crate) async fn eth_call(
    client: &JsonRpcClient,
    call: &Value,
    block: &str,
) -> Result<Option<Bytes>, txplain_common::Error> {
    client.request("eth_call", (call, block)).await
}

pub(crate) async fn estimate_gas(
    client: &JsonRpcClient,
    call: &Value,
    block: &str,
) -> Result<Option<U64>, txplain_common::Error> {
    client.request("eth_estimateGas", (call, block)).await
}

pub(crate) async fn gas_price(client: &JsonRpcClient) -> Result<u128, Error> {
    let price: Option<U128> = client.request("eth_gasPrice", Vec::<Value>::new()).await?;
    Ok(price.map(|price| price.to::<u128>()).unwrap_or_default())
}
