use std::sync::Arc;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, Bytes},
};
use hashbrown::HashMap;
use lazy_static::lazy_static;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use txplain_common::{
    constants::NULL_ADDRESS_0XF,
    ether::{jsonrpc::JsonRpcClient, tagged::Erc20Compatible},
};

use super::node::eth_call;

lazy_static! {
    static ref NAME_SELECTOR: Bytes = Bytes::from_static(&[0x06, 0xfd, 0xde, 0x03]);
    static ref SYMBOL_SELECTOR: Bytes = Bytes::from_static(&[0x95, 0xd8, 0x9b, 0x41]);
    static ref DECIMALS_SELECTOR: Bytes = Bytes::from_static(&[0x31, 0x3c, 0xe5, 0x67]);
}

/// The chain's native asset, as it appears in balance changes
pub(crate) fn native_asset() -> Erc20Compatible {
    Erc20Compatible {
        address: NULL_ADDRESS_0XF,
        name: "Ether".to_string(),
        symbol: "ETH".to_string(),
        decimals: 18,
    }
}

/// Reads token metadata over `eth_call`, remembering every token it has seen.
#[derive(Debug, Clone)]
pub(crate) struct TokenRegistry {
    client: Arc<JsonRpcClient>,
    cache: Arc<RwLock<HashMap<Address, Erc20Compatible>>>,
}

impl TokenRegistry {
    pub(crate) fn new(client: Arc<JsonRpcClient>) -> Self {
        Self { client, cache: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Returns the metadata of `address`. Tokens that don't answer `decimals()` are assumed
    /// to have 18 decimals, or none when `is_nft`.
    pub(crate) async fn get(&self, address: Address, is_nft: bool) -> Erc20Compatible {
        if let Some(token) = self.cache.read().await.get(&address) {
            trace!("token cache hit for {:#x} .", address);
            return token.clone();
        }

        let name = self.call_string(address, &NAME_SELECTOR).await;
        let symbol = self.call_string(address, &SYMBOL_SELECTOR).await;
        let decimals = match is_nft {
            true => 0,
            false => self.call_decimals(address).await.unwrap_or(18),
        };

        let fallback = address.to_checksum(None);
        let token = Erc20Compatible {
            address,
            name: name.clone().or_else(|| symbol.clone()).unwrap_or_else(|| fallback.clone()),
            symbol: symbol.or(name).unwrap_or(fallback),
            decimals,
        };
        debug!("resolved token {:#x} as {} ({} decimals) .", address, token.symbol, token.decimals);

        self.cache.write().await.insert(address, token.clone());
        token
    }

    async fn call(&self, address: Address, selector: &Bytes) -> Option<Bytes> {
        let call = json!({"to": address, "data": selector});
        match eth_call(&self.client, &call, "latest").await {
            Ok(Some(output)) if !output.is_empty() => Some(output),
            Ok(_) => None,
            Err(e) => {
                trace!("eth_call to {:#x} failed: {} .", address, e);
                None
            }
        }
    }

    async fn call_string(&self, address: Address, selector: &Bytes) -> Option<String> {
        let output = self.call(address, selector).await?;
        decode_string(&output)
    }

    async fn call_decimals(&self, address: Address) -> Option<u8> {
        let output = self.call(address, &DECIMALS_SELECTOR).await?;
        match DynSolType::Uint(8).abi_decode(&output) {
            Ok(DynSolValue::Uint(decimals, _)) => u8::try_from(decimals).ok(),
            _ => None,
        }
    }
}

/// Decodes a `string` return value. Some early tokens return `bytes32` instead.
fn decode_string(output: &[u8]) -> Option<String> {
    let decoded = match DynSolType::String.abi_decode(output) {
        Ok(DynSolValue::String(value)) => value,
        _ if output.len() == 32 => {
            String::from_utf8_lossy(output).trim_end_matches('\0').to_string()
        }
        _ => return None,
    };

    let decoded = decoded.trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, ResponseTemplate,
    };

    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    fn encoded_string(value: &str) -> String {
        let encoded = DynSolValue::String(value.to_string()).abi_encode();
        format!("0x{}", alloy::hex::encode(encoded))
    }

    async fn mock_call(server: &MockServer, selector: &str, result: String) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_call", "params": [{"data": selector}]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result})),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    fn registry(server: &MockServer) -> TokenRegistry {
        let client = JsonRpcClient::new(server.uri())
            .expect("failed to build client")
            .with_max_elapsed(Duration::from_secs(1));
        TokenRegistry::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_reads_and_caches_metadata() {
        let server = MockServer::start().await;
        mock_call(&server, "0x06fdde03", encoded_string("USD Coin")).await;
        mock_call(&server, "0x95d89b41", encoded_string("USDC")).await;
        mock_call(
            &server,
            "0x313ce567",
            "0x0000000000000000000000000000000000000000000000000000000000000006".to_string(),
        )
        .await;

        let registry = registry(&server);
        let token = registry.get(USDC, false).await;
        assert_eq!(token.name, "USD Coin");
        assert_eq!(token.symbol, "USDC");
        assert_eq!(token.decimals, 6);

        // served from the cache, the mocks expect a single call each
        assert_eq!(registry.get(USDC, false).await, token);
    }

    #[tokio::test]
    async fn test_unresponsive_token_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x"})),
            )
            .mount(&server)
            .await;

        let token = registry(&server).get(USDC, false).await;
        assert_eq!(token.symbol, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        assert_eq!(token.decimals, 18);

        let nft = registry(&server).get(USDC, true).await;
        assert_eq!(nft.decimals, 0);
    }

    #[test]
    fn test_decode_bytes32_symbol() {
        let mut output = b"MKR".to_vec();
        output.resize(32, 0);
        assert_eq!(decode_string(&output).as_deref(), Some("MKR"));
    }
}
