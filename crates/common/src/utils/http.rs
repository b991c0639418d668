use std::time::Duration;

use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// How long connection failures are retried for
const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(2);

/// Make a GET request to the target URL and return the response body as JSON.
///
/// Connection failures are retried with exponential backoff for a couple of seconds, after
/// which the request yields `Ok(None)`. A body that isn't JSON also yields `Ok(None)`.
///
/// ```no_run
/// use txplain_common::utils::http::get_json_from_url;
///
/// let url = "https://example.com";
/// let timeout = 5;
/// // get_json_from_url(url, timeout).await;
/// ```
pub async fn get_json_from_url(url: &str, timeout: u64) -> Result<Option<Value>, reqwest::Error> {
    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(Duration::from_secs(timeout))
        .build()?;
    let client = &client;

    let sent = backoff::future::retry(
        ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_elapsed_time: Some(MAX_RETRY_ELAPSED),
            ..ExponentialBackoff::default()
        },
        || async move {
            trace!("GET {}", url);
            client.get(url).send().await.map_err(|e| {
                trace!("GET {}: {:?}", url, e);
                backoff::Error::transient(e)
            })
        },
    )
    .await;

    let res = match sent {
        Ok(res) => res,
        Err(_) => return Ok(None),
    };
    trace!("GET {}: {:?}", url, res);
    let body = res.text().await?;

    match serde_json::from_str(&body) {
        Ok(json) => Ok(Some(json)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_get_json_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let value = get_json_from_url(&format!("{}/json", server.uri()), 5)
            .await
            .expect("request failed");
        assert_eq!(value, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_non_json_body_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let value = get_json_from_url(&server.uri(), 5).await.expect("request failed");
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_none_after_retries() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let url = format!("http://{}", listener.local_addr().expect("no local addr"));
        drop(listener);

        let value = get_json_from_url(&url, 1).await.expect("request failed");
        assert!(value.is_none());
    }
}
