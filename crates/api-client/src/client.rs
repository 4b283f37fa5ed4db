//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{ConfluenceApi, GeminiApi, SumoApi};
use crate::error::{ApiError, ApiResult};
use crate::resilience::{CircuitBreaker, CircuitState};
use querydeck_core::rate_limit::FixedWindowLimiter;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Authentication applied to a single request
///
/// The three upstreams authenticate differently, so auth travels with the
/// request instead of living on the client: SumoLogic takes HTTP basic
/// auth, Confluence a bearer token, Gemini a key header.
#[derive(Clone)]
pub enum AuthScheme {
    /// No authentication
    None,
    /// HTTP basic auth
    Basic {
        /// Username (SumoLogic access ID)
        username: String,
        /// Password (SumoLogic access key)
        password: String,
    },
    /// Bearer token
    Bearer(String),
    /// API key carried in a named header
    Header {
        /// Header name
        name: &'static str,
        /// Header value
        value: String,
    },
}

impl AuthScheme {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => request,
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
            Self::Bearer(token) => request.bearer_auth(token),
            Self::Header { name, value } => request.header(*name, value),
        }
    }
}

// Credentials must never reach logs, so Debug prints the variant only
impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { .. } => f.write_str("Basic"),
            Self::Bearer(_) => f.write_str("Bearer"),
            Self::Header { name, .. } => write!(f, "Header({})", name),
        }
    }
}

/// HTTP client for the Querydeck integrations with built-in resilience
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker to prevent cascading failures
/// - Per-service rate limiting to avoid upstream throttling
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct QuerydeckClient {
    inner: Client,
    config: Arc<ClientConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<FixedWindowLimiter>,
}

impl QuerydeckClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("querydeck-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
        let rate_limiter = Arc::new(FixedWindowLimiter::new(config.rate_limit.clone()));

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker,
            rate_limiter,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    /// Reset the rate limit window for a service host
    pub fn reset_rate_limit(&self, service: &str) {
        self.rate_limiter.reset(service);
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access SumoLogic endpoints (search jobs, dashboards)
    #[must_use]
    pub fn sumo(&self) -> SumoApi {
        SumoApi::new(self.clone())
    }

    /// Access Confluence endpoints (page read and update)
    #[must_use]
    pub fn confluence(&self) -> ConfluenceApi {
        ConfluenceApi::new(self.clone())
    }

    /// Access Gemini endpoints (query assistance)
    #[must_use]
    pub fn gemini(&self) -> GeminiApi {
        GeminiApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods with resilience
    // -------------------------------------------------------------------------

    /// Perform a GET request with resilience patterns
    #[instrument(skip(self, auth), fields(request_id))]
    pub async fn get_url<T: DeserializeOwned>(&self, url: &str, auth: &AuthScheme) -> ApiResult<T> {
        self.request_url(Method::GET, url, auth, Option::<&()>::None)
            .await
    }

    /// Perform a POST request with resilience patterns
    #[instrument(skip(self, auth, body), fields(request_id))]
    pub async fn post_url<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        auth: &AuthScheme,
        body: &B,
    ) -> ApiResult<T> {
        self.request_url(Method::POST, url, auth, Some(body)).await
    }

    /// Perform a PUT request with resilience patterns
    #[instrument(skip(self, auth, body), fields(request_id))]
    pub async fn put_url<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        auth: &AuthScheme,
        body: &B,
    ) -> ApiResult<T> {
        self.request_url(Method::PUT, url, auth, Some(body)).await
    }

    /// Perform a DELETE request, ignoring any response body
    #[instrument(skip(self, auth), fields(request_id))]
    pub async fn delete_url(&self, url: &str, auth: &AuthScheme) -> ApiResult<()> {
        self.request_url(Method::DELETE, url, auth, Option::<&()>::None)
            .await
    }

    /// Build a request builder for custom requests (see [`execute_raw`])
    ///
    /// [`execute_raw`]: QuerydeckClient::execute_raw
    pub fn request_builder(&self, method: Method, url: &str, auth: &AuthScheme) -> RequestBuilder {
        auth.apply(self.inner.request(method, url))
    }

    /// Execute a request to an absolute URL with full resilience patterns
    async fn request_url<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        auth: &AuthScheme,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let request_id = Uuid::new_v4().to_string();
        let service = extract_service_key(url);

        // Check circuit breaker
        if !self.circuit_breaker.can_execute() {
            warn!(
                request_id = %request_id,
                url = %url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(ApiError::CircuitOpen);
        }

        // Check rate limiter
        if !self.rate_limiter.try_acquire(&service) {
            warn!(
                request_id = %request_id,
                url = %url,
                service = %service,
                "Rate limited"
            );
            return Err(ApiError::RateLimited(service));
        }

        // Execute with retry
        self.execute_with_retry(&request_id, method, url, auth, body)
            .await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        request_id: &str,
        method: Method,
        url: &str,
        auth: &AuthScheme,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let retry_config = &self.config.retry;
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..retry_config.max_attempts {
            // Wait before retry (except first attempt)
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self
                .execute_single_request(request_id, method.clone(), url, auth, body)
                .await;
            let elapsed = start.elapsed();

            match result {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis(),
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();

                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned, B: Serialize>(
        &self,
        request_id: &str,
        method: Method,
        url: &str,
        auth: &AuthScheme,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let mut request = auth
            .apply(self.inner.request(method, url))
            .header(X_REQUEST_ID, request_id);

        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle HTTP response and deserialize
    ///
    /// An empty success body decodes as JSON `null` so endpoints that
    /// return 204 can deserialize into `()`.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                serde_json::from_slice(b"null").map_err(ApiError::Json)
            } else {
                serde_json::from_slice(&bytes).map_err(ApiError::Json)
            }
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::api_response(status.as_u16(), message))
        }
    }

    /// Execute a raw request and return the response (for connectivity probes)
    pub async fn execute_raw(&self, request: RequestBuilder) -> ApiResult<Response> {
        let request_id = Uuid::new_v4().to_string();

        // Check circuit breaker
        if !self.circuit_breaker.can_execute() {
            return Err(ApiError::CircuitOpen);
        }

        let response = request.header(X_REQUEST_ID, &request_id).send().await?;

        if response.status().is_success() {
            self.circuit_breaker.record_success();
        } else {
            self.circuit_breaker.record_failure();
        }

        Ok(response)
    }

    /// Get duration timing for a URL request
    pub async fn timed_get_url<T: DeserializeOwned>(
        &self,
        url: &str,
        auth: &AuthScheme,
    ) -> ApiResult<(T, Duration)> {
        let start = Instant::now();
        let result = self.get_url(url, auth).await?;
        Ok((result, start.elapsed()))
    }
}

/// Extract a rate limit key from a URL (uses the host)
///
/// Each upstream lives on its own host, so the host is the natural
/// per-service limit key.
fn extract_service_key(url: &str) -> String {
    url.split("://")
        .nth(1)
        .and_then(|s| s.split('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("default")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_service_key() {
        assert_eq!(
            extract_service_key("https://api.sumologic.com/api/v1/search/jobs?foo=bar"),
            "api.sumologic.com"
        );
        assert_eq!(
            extract_service_key("http://localhost:8080/health"),
            "localhost:8080"
        );
        assert_eq!(extract_service_key("not a url"), "default");
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::default();
        let client = QuerydeckClient::with_config(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_auth_scheme_debug_redacts_credentials() {
        let basic = AuthScheme::Basic {
            username: "access-id".to_string(),
            password: "access-key".to_string(),
        };
        assert_eq!(format!("{:?}", basic), "Basic");

        let bearer = AuthScheme::Bearer("secret-token".to_string());
        assert_eq!(format!("{:?}", bearer), "Bearer");

        let header = AuthScheme::Header {
            name: "x-goog-api-key",
            value: "secret".to_string(),
        };
        assert_eq!(format!("{:?}", header), "Header(x-goog-api-key)");
    }
}
