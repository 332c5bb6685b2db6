//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - TLS support by default
/// - Optional retry with exponential backoff via `execute_with_retry`
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("drivesyncd/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Create a new HTTP client from a pre-built reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    async fn execute_once(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(key.to_string(), value.to_string());
            }
        }

        let body = response.bytes().await.map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to read response body: {}", e))
        })?;

        debug!(url = %url, status = status, bytes = body.len(), "HTTP request completed");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_once(request).await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.execute_once(request.clone()).await {
                Ok(response) => {
                    // Retry only on rate limiting and server errors.
                    if response.status != 429 && !response.is_server_error() {
                        return Ok(response);
                    }

                    if attempt >= policy.max_attempts {
                        warn!(
                            url = %request.url,
                            status = response.status,
                            attempts = attempt,
                            "Giving up after retries"
                        );
                        return Ok(response);
                    }

                    let backoff = backoff_delay(&policy, attempt);
                    warn!(
                        url = %request.url,
                        status = response.status,
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Retrying HTTP request"
                    );
                    sleep(backoff).await;
                }
                Err(e) => {
                    if attempt >= policy.max_attempts {
                        return Err(e);
                    }

                    let backoff = backoff_delay(&policy, attempt);
                    warn!(
                        url = %request.url,
                        error = %e,
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Retrying HTTP request after transport error"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}

fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exp = policy.base_delay.saturating_mul(2u32.saturating_pow(attempt));
    exp.min(policy.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        };

        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(400));
        assert_eq!(backoff_delay(&policy, 10), Duration::from_secs(2));
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Patch),
            reqwest::Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Delete),
            reqwest::Method::DELETE
        );
    }
}
