use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};
use txplain_common::{ether::jsonrpc::JsonRpcClient, Error as CommonError};

use crate::error::Error;

/// The number of lookups a [PriceOracle] keeps in flight unless told otherwise
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// A token price as reported by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPrice {
    /// The chain name, e.g. `ethereum`
    pub chain: String,
    /// The token name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// The USD price, as a decimal string
    pub price: String,
    /// The token symbol
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symbol: String,
    /// When the price was observed, in seconds
    pub timestamp: i64,
    /// The token address, as the oracle spells it
    pub token_address: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl TokenPrice {
    /// Returns the price as a float, if it is a valid decimal.
    pub fn price_usd(&self) -> Option<f64> {
        self.price.trim().parse::<f64>().ok().filter(|price| price.is_finite())
    }

    /// Returns true if the price was observed within `tolerance` seconds of `timestamp`.
    /// A `None` tolerance accepts any time.
    pub fn is_within(&self, timestamp: i64, tolerance: Option<u64>) -> bool {
        match tolerance {
            Some(tolerance) => self.timestamp.abs_diff(timestamp) <= tolerance,
            None => true,
        }
    }
}

/// A client of a price oracle JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct PriceOracle {
    client: Arc<JsonRpcClient>,
    max_workers: usize,
}

impl PriceOracle {
    /// Creates an oracle client for `provider_uri`.
    pub fn new(provider_uri: &str) -> Result<Self, Error> {
        Ok(Self::from_client(JsonRpcClient::new(provider_uri)?))
    }

    /// Wraps an existing JSON-RPC client.
    pub fn from_client(client: JsonRpcClient) -> Self {
        Self { client: Arc::new(client), max_workers: DEFAULT_MAX_WORKERS }
    }

    /// Sets the maximum number of lookups in flight. Values below 1 are raised to 1.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// The maximum number of lookups in flight
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// The oracle endpoint
    pub fn url(&self) -> &str {
        self.client.url()
    }

    /// Looks up the price of one token at `timestamp`.
    ///
    /// Returns `None` when the oracle has no price, or when the price it has is further than
    /// `tolerance` seconds from `timestamp`. An error object returned by the oracle also
    /// counts as no price, as does a result that is not a price record. Transport failures
    /// are errors.
    pub async fn get_token_price(
        &self,
        chain: &str,
        token: &str,
        timestamp: i64,
        tolerance: Option<u64>,
    ) -> Result<Option<TokenPrice>, Error> {
        trace!("looking up price of {} on {} at {} .", token, chain, timestamp);

        let result: Value = match self
            .client
            .request("hdt_getTokenPrice", (chain, token, timestamp))
            .await
        {
            Ok(Some(result)) => result,
            Ok(None) => {
                debug!("no price for {} on {} at {} .", token, chain, timestamp);
                return Ok(None);
            }
            Err(CommonError::JsonRpc { code, message, .. }) => {
                warn!("oracle rejected price lookup for {}: {} ({}) .", token, message, code);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let price: TokenPrice = match serde_json::from_value(result) {
            Ok(price) => price,
            Err(e) => {
                warn!("discarding malformed price of {}: {} .", token, e);
                return Ok(None);
            }
        };

        if !price.is_within(timestamp, tolerance) {
            debug!(
                "discarding price of {} observed at {}, {}s away from {} .",
                token,
                price.timestamp,
                price.timestamp.abs_diff(timestamp),
                timestamp
            );
            return Ok(None);
        }

        Ok(Some(price))
    }

    /// Looks up the prices of many tokens at `timestamp`, with at most
    /// [max_workers](Self::max_workers) lookups in flight.
    ///
    /// Prices keep the order of `tokens`. Tokens without a valid price are left out. The
    /// first failed lookup fails the whole batch.
    pub async fn get_token_prices<T: AsRef<str>>(
        &self,
        chain: &str,
        tokens: &[T],
        timestamp: i64,
        tolerance: Option<u64>,
    ) -> Result<Vec<TokenPrice>, Error> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "looking up {} prices on {} with {} workers .",
            tokens.len(),
            chain,
            self.max_workers
        );

        let lookups: Vec<_> = tokens
            .iter()
            .map(|token| self.get_token_price(chain, token.as_ref(), timestamp, tolerance))
            .collect();
        let prices: Vec<Option<TokenPrice>> = stream::iter(lookups)
        .buffered(self.max_workers)
        .try_collect()
        .await?;

        Ok(prices.into_iter().flatten().collect())
    }

    /// Same as [get_token_prices](Self::get_token_prices), keyed by the token address the
    /// oracle returned.
    pub async fn get_token_prices_by_address<T: AsRef<str>>(
        &self,
        chain: &str,
        tokens: &[T],
        timestamp: i64,
        tolerance: Option<u64>,
    ) -> Result<HashMap<String, TokenPrice>, Error> {
        Ok(self
            .get_token_prices(chain, tokens, timestamp, tolerance)
            .await?
            .into_iter()
            .map(|price| (price.token_address.clone(), price))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, Request, Respond, ResponseTemplate,
    };

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const HZM: &str = "0x069f967be0ca21c7d793d8c343f71e597d9a49b3";

    fn price(token: &str, symbol: &str, price: &str, timestamp: i64) -> Value {
        json!({
            "chain": "ethereum",
            "name": symbol,
            "price": price,
            "symbol": symbol,
            "timestamp": timestamp,
            "token_address": token
        })
    }

    async fn mock_price(server: &MockServer, token: &str, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "hdt_getTokenPrice", "params": ["ethereum", token]})))
            .respond_with(move |request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "result": result.clone()
                }))
            })
            .mount(server)
            .await;
    }

    fn oracle(server: &MockServer) -> PriceOracle {
        let client = JsonRpcClient::new(server.uri())
            .expect("failed to build client")
            .with_max_elapsed(Duration::from_secs(2));
        PriceOracle::from_client(client)
    }

    #[tokio::test]
    async fn test_single_price() {
        let server = MockServer::start().await;
        mock_price(&server, HZM, price(HZM, "HZM", "0.00039805", 1_692_948_326)).await;

        let result = oracle(&server)
            .get_token_price("ethereum", HZM, 1_692_948_326, None)
            .await
            .expect("lookup failed")
            .expect("price should exist");
        assert_eq!(result.price, "0.00039805");
        assert_eq!(result.price_usd(), Some(0.00039805));
    }

    #[tokio::test]
    async fn test_request_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "hdt_getTokenPrice",
                "params": ["ethereum", WETH, 1_693_497_600]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = oracle(&server)
            .get_token_price("ethereum", WETH, 1_693_497_600, Some(3600))
            .await
            .expect("lookup failed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_tolerance_window() {
        let server = MockServer::start().await;
        mock_price(&server, WETH, price(WETH, "WETH", "1650.5", 1_693_497_600 - 3600)).await;
        let oracle = oracle(&server);

        // exactly on the edge of the window
        let inside = oracle
            .get_token_price("ethereum", WETH, 1_693_497_600, Some(3600))
            .await
            .expect("lookup failed");
        assert!(inside.is_some());

        let outside = oracle
            .get_token_price("ethereum", WETH, 1_693_497_600, Some(3599))
            .await
            .expect("lookup failed");
        assert!(outside.is_none());

        let unbounded = oracle
            .get_token_price("ethereum", WETH, 1_893_497_600, None)
            .await
            .expect("lookup failed");
        assert!(unbounded.is_some());
    }

    #[tokio::test]
    async fn test_batch_filters_and_keeps_order() {
        let server = MockServer::start().await;
        mock_price(&server, WETH, price(WETH, "WETH", "1650.5", 1_693_497_000)).await;
        mock_price(&server, USDC, price(USDC, "USDC", "1.0001", 1_693_497_500)).await;
        mock_price(&server, HZM, Value::Null).await;

        let prices = oracle(&server)
            .with_max_workers(2)
            .get_token_prices("ethereum", &[USDC, HZM, WETH], 1_693_497_600, Some(3600))
            .await
            .expect("batch failed");

        let symbols: Vec<&str> = prices.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["USDC", "WETH"]);
    }

    #[tokio::test]
    async fn test_batch_by_address() {
        let server = MockServer::start().await;
        mock_price(&server, WETH, price(WETH, "WETH", "1650.5", 1_693_497_000)).await;
        mock_price(&server, USDC, price(USDC, "USDC", "1.0001", 1_600_000_000)).await;

        let prices = oracle(&server)
            .get_token_prices_by_address("ethereum", &[WETH, USDC], 1_693_497_600, Some(3600))
            .await
            .expect("batch failed");

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[WETH].price, "1650.5");
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tokens: [&str; 0] = [];
        let prices = oracle(&server)
            .get_token_prices("ethereum", &tokens, 1_693_497_600, None)
            .await
            .expect("batch failed");
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_error_object_counts_as_missing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "token not supported"}
            })))
            .mount(&server)
            .await;

        let prices = oracle(&server)
            .get_token_prices("ethereum", &[WETH], 1_693_497_600, None)
            .await
            .expect("batch failed");
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_fails_batch() {
        let server = MockServer::start().await;
        mock_price(&server, WETH, price(WETH, "WETH", "1650.5", 1_693_497_000)).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"params": ["ethereum", USDC]})))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = oracle(&server)
            .get_token_prices("ethereum", &[WETH, USDC], 1_693_497_600, None)
            .await;
        assert!(matches!(result, Err(Error::OracleError(_))));
    }

    #[test]
    fn test_max_workers_floor() {
        let oracle = PriceOracle::new("http://localhost:8545").expect("valid oracle");
        assert_eq!(oracle.max_workers(), DEFAULT_MAX_WORKERS);
        assert_eq!(oracle.with_max_workers(0).max_workers(), 1);
    }

    #[tokio::test]
    async fn test_malformed_result_only_drops_its_token() {
        let server = MockServer::start().await;
        mock_price(&server, WETH, price(WETH, "WETH", "1650.5", 1_693_497_000)).await;
        let mut unnamed = price(USDC, "USDC", "1.0001", 1_693_497_500);
        unnamed["name"] = Value::Null;
        mock_price(&server, USDC, unnamed).await;
        mock_price(&server, HZM, json!({"price": {"usd": 0.0004}})).await;

        let prices = oracle(&server)
            .get_token_prices("ethereum", &[WETH, USDC, HZM], 1_693_497_600, Some(3600))
            .await
            .expect("batch failed");

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].symbol, "WETH");
        assert_eq!(prices[1].token_address, USDC);
        assert_eq!(prices[1].name, "");
    }

    /// Answers every lookup with a null price after `delay`, recording when each arrived.
    struct SlowOracle {
        delay: Duration,
        arrivals: Arc<Mutex<Vec<Instant>>>,
    }

    impl Respond for SlowOracle {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            if let Ok(mut arrivals) = self.arrivals.lock() {
                arrivals.push(Instant::now());
            }
            let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "id": body["id"], "result": null}))
                .set_delay(self.delay)
        }
    }

    #[tokio::test]
    async fn test_batch_bounds_lookups_in_flight() {
        let delay = Duration::from_millis(300);
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(SlowOracle { delay, arrivals: Arc::clone(&arrivals) })
            .expect(12)
            .mount(&server)
            .await;

        let tokens: Vec<String> = (0..12).map(|i| format!("0x{:040x}", i + 1)).collect();
        let prices = oracle(&server)
            .with_max_workers(3)
            .get_token_prices("ethereum", &tokens, 1_693_497_600, None)
            .await
            .expect("batch failed");
        assert!(prices.is_empty());

        // a lookup is still in flight when another arrives less than `delay` after it
        let arrivals = arrivals.lock().expect("poisoned").clone();
        let peak = arrivals
            .iter()
            .map(|at| {
                arrivals.iter().filter(|other| **other <= *at && *at - **other < delay / 2).count()
            })
            .max()
            .unwrap_or_default();
        assert!(peak <= 3, "{peak} lookups in flight");
        assert!(peak > 1, "lookups ran one at a time");
    }
}
