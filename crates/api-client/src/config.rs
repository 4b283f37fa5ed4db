//! Client configuration
//!
//! Credentials come from the environment, tuning knobs from builder
//! methods. Secrets are never serialized.

use crate::error::{ApiError, ApiResult};
use crate::resilience::{CircuitBreakerConfig, RetryConfig};
use querydeck_core::rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default Gemini model used for query assistance
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// SumoLogic deployment pod
///
/// Each pod serves its own API host; us1 is the historical default and
/// the only one without a pod infix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SumoDeployment {
    /// United States (original pod)
    #[default]
    Us1,
    /// United States (second pod)
    Us2,
    /// European Union
    Eu,
    /// Australia
    Au,
    /// Germany
    De,
    /// Japan
    Jp,
    /// Canada
    Ca,
    /// India
    In,
    /// US Federal
    Fed,
}

impl SumoDeployment {
    /// API base URL for this pod, without a trailing slash
    pub fn api_base(&self) -> &'static str {
        match self {
            Self::Us1 => "https://api.sumologic.com/api",
            Self::Us2 => "https://api.us2.sumologic.com/api",
            Self::Eu => "https://api.eu.sumologic.com/api",
            Self::Au => "https://api.au.sumologic.com/api",
            Self::De => "https://api.de.sumologic.com/api",
            Self::Jp => "https://api.jp.sumologic.com/api",
            Self::Ca => "https://api.ca.sumologic.com/api",
            Self::In => "https://api.in.sumologic.com/api",
            Self::Fed => "https://api.fed.sumologic.com/api",
        }
    }

    /// Web UI base URL for this pod, used to build dashboard links
    pub fn service_base(&self) -> &'static str {
        match self {
            Self::Us1 => "https://service.sumologic.com",
            Self::Us2 => "https://service.us2.sumologic.com",
            Self::Eu => "https://service.eu.sumologic.com",
            Self::Au => "https://service.au.sumologic.com",
            Self::De => "https://service.de.sumologic.com",
            Self::Jp => "https://service.jp.sumologic.com",
            Self::Ca => "https://service.ca.sumologic.com",
            Self::In => "https://service.in.sumologic.com",
            Self::Fed => "https://service.fed.sumologic.com",
        }
    }

    /// Short pod name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Us1 => "us1",
            Self::Us2 => "us2",
            Self::Eu => "eu",
            Self::Au => "au",
            Self::De => "de",
            Self::Jp => "jp",
            Self::Ca => "ca",
            Self::In => "in",
            Self::Fed => "fed",
        }
    }
}

impl fmt::Display for SumoDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SumoDeployment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "us1" => Ok(Self::Us1),
            "us2" => Ok(Self::Us2),
            "eu" => Ok(Self::Eu),
            "au" => Ok(Self::Au),
            "de" => Ok(Self::De),
            "jp" => Ok(Self::Jp),
            "ca" => Ok(Self::Ca),
            "in" => Ok(Self::In),
            "fed" => Ok(Self::Fed),
            other => Err(ApiError::Config(format!(
                "unknown SumoLogic deployment '{}' (expected one of us1, us2, eu, au, de, jp, ca, in, fed)",
                other
            ))),
        }
    }
}

/// API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// SumoLogic deployment pod
    pub sumo_deployment: SumoDeployment,
    /// SumoLogic access ID
    #[serde(skip)]
    pub sumo_access_id: Option<String>,
    /// SumoLogic access key
    #[serde(skip)]
    pub sumo_access_key: Option<String>,
    /// Confluence instance base URL (e.g. `https://wiki.example.com`)
    pub confluence_base_url: Option<String>,
    /// Confluence personal access token
    #[serde(skip)]
    pub confluence_token: Option<String>,
    /// Gemini API key
    #[serde(skip)]
    pub gemini_api_key: Option<String>,
    /// Gemini model identifier
    pub gemini_model: String,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Per-service rate limit
    pub rate_limit: RateLimitConfig,
    /// Circuit breaker configuration
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Serde helper for Duration as whole seconds
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sumo_deployment: SumoDeployment::default(),
            sumo_access_id: None,
            sumo_access_key: None,
            confluence_base_url: None,
            confluence_token: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::per_minute(30),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from environment variables
    ///
    /// Reads `SUMO_ACCESS_ID`, `SUMO_ACCESS_KEY`, `SUMO_DEPLOYMENT`,
    /// `CONFLUENCE_BASE_URL`, `CONFLUENCE_TOKEN`, `GEMINI_API_KEY` and
    /// `QUERYDECK_TIMEOUT_SECS`. Missing variables leave the defaults in
    /// place so a partially configured environment still serves the
    /// integrations it has credentials for.
    pub fn from_env() -> ApiResult<Self> {
        let mut config = Self::default();

        if let Ok(pod) = std::env::var("SUMO_DEPLOYMENT") {
            config.sumo_deployment = pod.parse()?;
        }
        config.sumo_access_id = std::env::var("SUMO_ACCESS_ID").ok().filter(|v| !v.is_empty());
        config.sumo_access_key = std::env::var("SUMO_ACCESS_KEY").ok().filter(|v| !v.is_empty());
        config.confluence_base_url = std::env::var("CONFLUENCE_BASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| v.trim_end_matches('/').to_string());
        config.confluence_token = std::env::var("CONFLUENCE_TOKEN").ok().filter(|v| !v.is_empty());
        config.gemini_api_key = std::env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty());

        if let Ok(secs) = std::env::var("QUERYDECK_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ApiError::Config(format!("invalid QUERYDECK_TIMEOUT_SECS value '{}'", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the SumoLogic deployment pod
    pub fn with_deployment(mut self, deployment: SumoDeployment) -> Self {
        self.sumo_deployment = deployment;
        self
    }

    /// Set SumoLogic credentials
    pub fn with_sumo_credentials(
        mut self,
        access_id: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        self.sumo_access_id = Some(access_id.into());
        self.sumo_access_key = Some(access_key.into());
        self
    }

    /// Set the Confluence base URL and token
    pub fn with_confluence(
        mut self,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        self.confluence_base_url = Some(base_url.trim_end_matches('/').to_string());
        self.confluence_token = Some(token.into());
        self
    }

    /// Set the Gemini API key
    pub fn with_gemini_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Set the Gemini model
    pub fn with_gemini_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = model.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-service rate limit
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(url) = &self.confluence_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::Config(format!(
                    "Confluence base URL must start with http:// or https://, got '{}'",
                    url
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(ApiError::Config("timeout must be greater than zero".to_string()));
        }
        if self.gemini_model.is_empty() {
            return Err(ApiError::Config("Gemini model must not be empty".to_string()));
        }
        Ok(())
    }

    /// SumoLogic API base URL for the configured pod
    pub fn sumo_api_base(&self) -> &'static str {
        self.sumo_deployment.api_base()
    }

    /// SumoLogic credentials, or which variable to set
    pub fn sumo_credentials(&self) -> ApiResult<(&str, &str)> {
        let id = self
            .sumo_access_id
            .as_deref()
            .ok_or_else(|| ApiError::MissingEnvVar("SUMO_ACCESS_ID".to_string()))?;
        let key = self
            .sumo_access_key
            .as_deref()
            .ok_or_else(|| ApiError::MissingEnvVar("SUMO_ACCESS_KEY".to_string()))?;
        Ok((id, key))
    }

    /// Confluence base URL, or which variable to set
    pub fn confluence_base(&self) -> ApiResult<&str> {
        self.confluence_base_url
            .as_deref()
            .ok_or_else(|| ApiError::MissingEnvVar("CONFLUENCE_BASE_URL".to_string()))
    }

    /// Confluence token, or which variable to set
    pub fn confluence_auth(&self) -> ApiResult<&str> {
        self.confluence_token
            .as_deref()
            .ok_or_else(|| ApiError::MissingEnvVar("CONFLUENCE_TOKEN".to_string()))
    }

    /// Gemini API key, or which variable to set
    pub fn gemini_key(&self) -> ApiResult<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| ApiError::MissingEnvVar("GEMINI_API_KEY".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_parse_and_display() {
        assert_eq!("us1".parse::<SumoDeployment>().unwrap(), SumoDeployment::Us1);
        assert_eq!("EU".parse::<SumoDeployment>().unwrap(), SumoDeployment::Eu);
        assert_eq!(" au ".parse::<SumoDeployment>().unwrap(), SumoDeployment::Au);
        assert_eq!(SumoDeployment::Us2.to_string(), "us2");
        assert!("mars".parse::<SumoDeployment>().is_err());
    }

    #[test]
    fn test_deployment_api_base() {
        assert_eq!(SumoDeployment::Us1.api_base(), "https://api.sumologic.com/api");
        assert_eq!(SumoDeployment::Eu.api_base(), "https://api.eu.sumologic.com/api");
        assert_eq!(SumoDeployment::Fed.api_base(), "https://api.fed.sumologic.com/api");
    }

    #[test]
    fn test_deployment_service_base() {
        assert_eq!(SumoDeployment::Us1.service_base(), "https://service.sumologic.com");
        assert_eq!(SumoDeployment::Jp.service_base(), "https://service.jp.sumologic.com");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::default()
            .with_deployment(SumoDeployment::Eu)
            .with_sumo_credentials("id", "key")
            .with_confluence("https://wiki.example.com/", "token")
            .with_gemini_key("gk")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.sumo_deployment, SumoDeployment::Eu);
        assert_eq!(config.sumo_credentials().unwrap(), ("id", "key"));
        // Trailing slash is stripped so path joins stay predictable
        assert_eq!(config.confluence_base().unwrap(), "https://wiki.example.com");
        assert_eq!(config.gemini_key().unwrap(), "gk");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_credentials_name_the_variable() {
        let config = ClientConfig::default();

        match config.sumo_credentials() {
            Err(ApiError::MissingEnvVar(name)) => assert_eq!(name, "SUMO_ACCESS_ID"),
            other => panic!("unexpected: {:?}", other),
        }
        match config.confluence_auth() {
            Err(ApiError::MissingEnvVar(name)) => assert_eq!(name, "CONFLUENCE_TOKEN"),
            other => panic!("unexpected: {:?}", other),
        }
        match config.gemini_key() {
            Err(ApiError::MissingEnvVar(name)) => assert_eq!(name, "GEMINI_API_KEY"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig::default().with_confluence("wiki.example.com", "t");
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let config = ClientConfig::default()
            .with_sumo_credentials("id", "secret-key")
            .with_gemini_key("gemini-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("gemini-secret"));
    }
}
