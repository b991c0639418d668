mod effects;
mod interpret;
mod node;
mod revert;
mod tokens;

use std::{sync::Arc, time::Instant};

use alloy::primitives::{Bytes, U128, U64};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, trace, warn};
use txplain_common::{
    ether::{
        jsonrpc::JsonRpcClient,
        tagged::{TaggedAddr, TaggedTx},
    },
    resources::openchain::{resolve_function_selector_at, OPENCHAIN_API_URL},
};

use crate::{
    error::Error,
    interfaces::{GasPriceSpec, GasSpec, SimulationRequest},
};

use effects::{effects_from_receipt, effects_from_trace};
use interpret::interpret;
use node::{
    block_param, estimate_gas, eth_call, gas_price, get_block, get_receipt, get_transaction,
    trace_call, trace_transaction, CallFrame, NodeBlock, NodeTransaction,
};
use revert::{decode_revert, reason_from_error_data};
use tokens::TokenRegistry;

/// Produces tagged transactions, either from the chain or from a simulation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Tags the mined transaction `txhash`.
    async fn translate(&self, txhash: &str) -> Result<TaggedTx, Error>;

    /// Tags the outcome of executing `request` on top of its block, without sending it.
    async fn simulate(&self, request: &SimulationRequest) -> Result<TaggedTx, Error>;
}

/// A [Translator] backed by an Ethereum JSON-RPC node.
///
/// Tracing (`debug_traceTransaction`) is used when the node allows it, so that value moved by
/// internal calls shows up in balance changes. Without it, the receipt logs and the top level
/// value transfer are used instead. Simulations always need `debug_traceCall`.
#[derive(Debug, Clone)]
pub struct RpcTranslator {
    client: Arc<JsonRpcClient>,
    chain: String,
    tokens: TokenRegistry,
    signature_api: Option<String>,
}

impl RpcTranslator {
    /// Creates a translator for `chain`, reading from the node at `rpc_url`.
    pub fn new(rpc_url: &str, chain: &str) -> Result<Self, Error> {
        Ok(Self::from_client(JsonRpcClient::new(rpc_url)?, chain))
    }

    /// Creates a translator on top of an existing client.
    pub fn from_client(client: JsonRpcClient, chain: &str) -> Self {
        let client = Arc::new(client);
        Self {
            tokens: TokenRegistry::new(client.clone()),
            client,
            chain: chain.to_string(),
            signature_api: Some(OPENCHAIN_API_URL.to_string()),
        }
    }

    /// Resolves method names against the openchain compatible API at `url`.
    pub fn with_signature_api(mut self, url: impl Into<String>) -> Self {
        self.signature_api = Some(url.into());
        self
    }

    /// Enables or disables method name resolution. When disabled, methods are reported as
    /// their raw selector.
    pub fn with_selector_resolution(mut self, enabled: bool) -> Self {
        match enabled {
            true => {
                self.signature_api.get_or_insert_with(|| OPENCHAIN_API_URL.to_string());
            }
            false => self.signature_api = None,
        }
        self
    }

    /// The chain this translator reads from
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// The node this translator reads from
    pub fn rpc_url(&self) -> &str {
        self.client.url()
    }

    /// Names the method called by `input`, falling back to its selector.
    async fn resolve_method(&self, input: &Bytes) -> Option<String> {
        let selector = format!("0x{}", alloy::hex::encode(input.get(..4)?));

        if let Some(api) = &self.signature_api {
            match resolve_function_selector_at(api, &selector).await {
                Ok(Some(signatures)) => {
                    if let Some(signature) = signatures.first() {
                        return Some(signature.name.clone());
                    }
                }
                Ok(None) => trace!("no signature known for {} .", selector),
                Err(e) => debug!("failed to resolve {}: {} .", selector, e),
            }
        }

        Some(selector)
    }

    /// Replays a failed transaction with `eth_call` at its parent block to recover the reason
    /// it reverted.
    async fn replay_reason(&self, tx: &NodeTransaction, block_number: u64) -> Option<String> {
        let call = json!({
            "from": tx.from,
            "to": tx.to,
            "value": tx.value,
            "data": tx.input,
            "gas": tx.gas,
        });

        match eth_call(&self.client, &call, &block_param(Some(block_number.saturating_sub(1))))
            .await
        {
            Err(txplain_common::Error::JsonRpc { message, data, .. }) => {
                reason_from_error_data(data.as_ref()).or(Some(message))
            }
            Err(e) => {
                debug!("failed to replay transaction: {} .", e);
                None
            }
            Ok(_) => {
                debug!("replayed transaction didn't revert .");
                None
            }
        }
    }
}

#[async_trait]
impl Translator for RpcTranslator {
    async fn translate(&self, txhash: &str) -> Result<TaggedTx, Error> {
        let start_time = Instant::now();
        debug!("translating {} on {} .", txhash, self.chain);

        let tx = get_transaction(&self.client, txhash).await?;
        let receipt = get_receipt(&self.client, txhash).await?;
        let block_number = receipt.block_number.to::<u64>();
        let block = get_block(&self.client, &block_param(Some(block_number))).await?;

        let status = receipt.status.map(|status| u8::from(status == U64::from(1))).unwrap_or(1);

        let trace = match trace_transaction(&self.client, txhash).await {
            Ok(trace) => trace,
            Err(e) => {
                debug!("tracing unavailable, falling back to receipt logs: {} .", e);
                None
            }
        };
        let effects = match &trace {
            Some(root) => effects_from_trace(root),
            None => effects_from_receipt(status == 1, tx.from, tx.to, tx.value, &receipt.logs),
        };
        trace!("found {} effects .", effects.len());

        let reason = match (status, trace.as_ref().and_then(frame_reason)) {
            (1, _) => None,
            (_, Some(reason)) => Some(reason),
            (_, None) => self.replay_reason(&tx, block_number).await,
        };

        let method = match tx.to {
            Some(_) => self.resolve_method(&tx.input).await,
            None => None,
        };

        let interpretation = interpret(&effects, &self.tokens).await;

        let tagged = TaggedTx {
            txhash: Some(txhash.to_lowercase()),
            from: TaggedAddr::new(tx.from),
            to: tx.to.map(TaggedAddr::new),
            contract_created: receipt.contract_address.map(TaggedAddr::new),
            block_number,
            block_time: block_time(&block)?,
            value: tx.value,
            gas_used: receipt.gas_used.to::<u64>(),
            gas_price: receipt
                .effective_gas_price
                .or(tx.gas_price)
                .map(|price| price.to::<u128>())
                .unwrap_or_default(),
            input: tx.input,
            status,
            reason,
            method,
            actions: interpretation.actions,
            balance_change: interpretation.balances.into_balance_changes(),
        };

        debug!("translated {} in {:?} .", txhash, start_time.elapsed());
        info!("translated {} ({} actions) .", txhash, tagged.actions.len());

        Ok(tagged)
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<TaggedTx, Error> {
        let start_time = Instant::now();

        // pin the block so every call below sees the same state
        let block = get_block(&self.client, &request.block.to_param()).await?;
        let block_number = block.number.to::<u64>();
        let at = block_param(Some(block_number));
        debug!("simulating call to {:#x} on block {} .", request.to_address, block_number);

        let mut call = json!({
            "from": request.from_address,
            "to": request.to_address,
            "value": request.value_wei,
            "data": request.data,
        });

        let gas = match request.gas {
            GasSpec::Limit(gas) => gas,
            GasSpec::Auto => match estimate_gas(&self.client, &call, &at).await {
                Ok(Some(gas)) => gas.to::<u64>(),
                Ok(None) => block.gas_limit.to::<u64>(),
                Err(e) => {
                    warn!("gas estimation failed, using the block gas limit: {} .", e);
                    block.gas_limit.to::<u64>()
                }
            },
        };
        let price = match request.gas_price {
            GasPriceSpec::Wei(price) => price,
            GasPriceSpec::Auto => gas_price(&self.client).await?,
        };

        if let Value::Object(fields) = &mut call {
            fields.insert("gas".to_string(), json!(U64::from(gas)));
            fields.insert("gasPrice".to_string(), json!(U128::from(price)));
        }

        let root = match trace_call(&self.client, &call, &at).await {
            Ok(Some(root)) => root,
            Ok(None) => {
                return Err(Error::TracingUnsupported("the node returned an empty trace".into()))
            }
            Err(Error::RpcError(txplain_common::Error::JsonRpc { message, .. })) => {
                return Err(Error::TracingUnsupported(message))
            }
            Err(e) => return Err(e),
        };

        let status = u8::from(root.error.is_none());
        let effects = effects_from_trace(&root);
        let interpretation = interpret(&effects, &self.tokens).await;

        let tagged = TaggedTx {
            txhash: None,
            from: TaggedAddr::new(request.from_address),
            to: Some(TaggedAddr::new(request.to_address)),
            contract_created: None,
            block_number,
            block_time: block_time(&block)?,
            value: request.value_wei,
            gas_used: root.gas_used.map(|used| used.to::<u64>()).unwrap_or(gas),
            gas_price: price,
            input: request.data.clone(),
            status,
            reason: frame_reason(&root),
            method: self.resolve_method(&request.data).await,
            actions: interpretation.actions,
            balance_change: interpretation.balances.into_balance_changes(),
        };

        debug!("simulated call in {:?} .", start_time.elapsed());
        info!("simulated call to {:#x} (status {}) .", request.to_address, status);

        Ok(tagged)
    }
}

/// The revert reason of a failed root frame.
fn frame_reason(root: &CallFrame) -> Option<String> {
    root.error.as_ref()?;

    root.revert_reason
        .clone()
        .or_else(|| root.output.as_ref().and_then(|output| decode_revert(output)))
        .or_else(|| root.error.clone())
}

fn block_time(block: &NodeBlock) -> Result<DateTime<Utc>, Error> {
    let timestamp = block.timestamp.to::<u64>();
    i64::try_from(timestamp)
        .ok()
        .and_then(|timestamp| Utc.timestamp_opt(timestamp, 0).single())
        .ok_or_else(|| {
            Error::RpcError(txplain_common::Error::ParseError(format!(
                "invalid block timestamp {timestamp}"
            )))
        })
}
