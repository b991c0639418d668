use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use backoff::ExponentialBackoff;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Error;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// A small JSON-RPC 2.0 client over HTTP.
///
/// Transport failures, rate limiting, and server errors are retried with exponential
/// backoff. Errors returned by the endpoint itself are never retried.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    max_elapsed: Duration,
}

impl JsonRpcClient {
    /// Creates a client for the given endpoint with a 30 second request timeout.
    ///
    /// ```
    /// use txplain_common::ether::jsonrpc::JsonRpcClient;
    ///
    /// let client = JsonRpcClient::new("http://localhost:8545").expect("valid client");
    /// assert_eq!(client.url(), "http://localhost:8545");
    /// assert!(JsonRpcClient::new("").is_err());
    /// ```
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    /// Creates a client for the given endpoint with a custom request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let url = url.into();
        if url.is_empty() {
            return Err(Error::RpcError("no RPC URL provided".to_string()));
        }

        let client = reqwest::Client::builder().user_agent(APP_USER_AGENT).timeout(timeout).build()?;

        Ok(Self { url, client, next_id: AtomicU64::new(1), max_elapsed: Duration::from_secs(10) })
    }

    /// Sets the maximum time spent retrying a single request.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// The endpoint this client talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Calls `method` with `params`, returning `None` when the endpoint answers with a null
    /// result.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<Option<R>, Error>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_value(JsonRpcRequest { jsonrpc: "2.0", id, method, params })?;

        let body = &body;
        let client = &self.client;
        let url = self.url.as_str();

        backoff::future::retry(
            ExponentialBackoff {
                max_elapsed_time: Some(self.max_elapsed),
                ..ExponentialBackoff::default()
            },
            || async move {
                trace!("calling '{}' on '{}' (id {}) .", method, url, id);

                let response = client.post(url).json(body).send().await.map_err(|e| {
                    debug!("request to '{}' failed: {}", url, e);
                    backoff::Error::transient(Error::HttpError(e))
                })?;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    debug!("'{}' returned status {}, retrying .", url, status);
                    return Err(backoff::Error::transient(Error::RpcError(format!(
                        "'{method}' returned status {status}"
                    ))));
                }
                if !status.is_success() {
                    return Err(backoff::Error::permanent(Error::RpcError(format!(
                        "'{method}' returned status {status}"
                    ))));
                }

                let text = response
                    .text()
                    .await
                    .map_err(|e| backoff::Error::transient(Error::HttpError(e)))?;

                let envelope: JsonRpcResponse<R> = serde_json::from_str(&text).map_err(|e| {
                    debug!("response body: {:?}", text);
                    backoff::Error::permanent(Error::SerdeError(e))
                })?;

                if let Some(error) = envelope.error {
                    return Err(backoff::Error::permanent(Error::JsonRpc {
                        code: error.code,
                        message: error.message,
                        data: error.data,
                    }));
                }

                trace!("'{}' answered (id {}) .", method, id);
                Ok(envelope.result)
            },
        )
        .await
    }
}
