//! Upstream HTTP client.

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::RetryPolicy;
use crate::error::UpstreamError;

// == Upstream Request ==
/// One outbound call, built fresh per client request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub policy: RetryPolicy,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            policy: RetryPolicy::default(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST with a JSON body.
    pub fn post_json(url: Url, body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(Method::POST, url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

// == Upstream Response ==
/// Fully read upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Upstream Client ==
/// Shared HTTP client; cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Builds a client with rustls and the crate user agent.
    pub fn new() -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    // == Send ==
    /// Runs the request under its [`RetryPolicy`].
    ///
    /// A response with a retryable status is retried while attempts remain;
    /// once they run out it is returned as-is, whatever its status. Network
    /// failures are retried the same way and the last one is returned.
    /// A timed-out attempt is not retried.
    pub async fn send(&self, req: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let policy = &req.policy;
        let mut last_error = None;

        for attempt in 0..=policy.max_retries {
            let retries_left = attempt < policy.max_retries;

            match self.attempt(req).await {
                Ok(response) if retries_left && policy.should_retry_status(response.status) => {
                    let delay = policy.backoff();
                    warn!(
                        url = %req.url.path(),
                        status = response.status,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "retrying upstream call after retryable status"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(err @ UpstreamError::Timeout { .. }) => return Err(err),
                Err(err) => {
                    if retries_left {
                        let delay = policy.backoff();
                        warn!(
                            url = %req.url.path(),
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "retrying upstream call after network error"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| UpstreamError::Network("Request failed after retries".to_string())))
    }

    // == Fetch JSON ==
    /// [`send`](Self::send), then require a 2xx status and a JSON body.
    pub async fn fetch_json(&self, req: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let response = self.send(req).await?;

        if !response.is_success() {
            return Err(UpstreamError::Status {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| UpstreamError::Parse(e.to_string()))
    }

    /// One attempt bounded by the policy timeout, body included.
    async fn attempt(&self, req: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = self.http.request(req.method.clone(), req.url.clone());
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let timeout = req.policy.timeout;
        let timeout_ms = timeout.as_millis() as u64;
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse { status, body })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(url = %req.url.path(), status = response.status, "upstream responded");
                Ok(response)
            }
            Ok(Err(e)) if e.is_timeout() => Err(UpstreamError::Timeout { timeout_ms }),
            Ok(Err(e)) => Err(UpstreamError::Network(e.to_string())),
            Err(_) => Err(UpstreamError::Timeout { timeout_ms }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url() -> Url {
        Url::parse("https://api.example.com/v1/status").unwrap()
    }

    #[test]
    fn test_request_builders() {
        let req = UpstreamRequest::post_json(url(), json!({"a": 1}))
            .header("x-api", "key")
            .policy(RetryPolicy::no_retry(std::time::Duration::from_secs(30)));

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.body, Some(json!({"a": 1})));
        assert!(req
            .headers
            .iter()
            .any(|(n, v)| n == "x-api" && v == "key"));
        assert_eq!(req.policy.max_retries, 0);
    }

    #[test]
    fn test_get_has_no_body() {
        let req = UpstreamRequest::get(url());
        assert_eq!(req.method, Method::GET);
        assert!(req.body.is_none());
    }

    #[test]
    fn test_response_success_range() {
        let ok = UpstreamResponse {
            status: 204,
            body: String::new(),
        };
        let bad = UpstreamResponse {
            status: 302,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = UpstreamClient::new().unwrap();
        let req = UpstreamRequest::get(Url::parse("http://127.0.0.1:9/unreachable").unwrap())
            .policy(
                RetryPolicy::idempotent(std::time::Duration::from_secs(2))
                    .max_retries(0),
            );

        let err = client.send(&req).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Network(_)), "got {:?}", err);
    }
}
