//! Health check system for verifying configuration and environment
//!
//! Provides health checks for:
//! - Configuration discovery and parsing
//! - Credential environment variables
//! - File system paths (library store, activity log)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All checks passed
    Healthy,
    /// Some optional checks failed
    Degraded,
    /// Required checks failed
    Unhealthy,
    /// Status could not be determined
    Unknown,
}

impl HealthStatus {
    /// Returns true if status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Returns true if status is healthy or degraded (still operational)
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Status of the check
    pub status: HealthStatus,
    /// Optional message with details
    pub message: Option<String>,
    /// Duration of the check in milliseconds
    pub duration_ms: u64,
    /// Additional details as key-value pairs
    pub details: HashMap<String, String>,
}

impl CheckResult {
    /// Create a healthy check result
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            duration_ms: 0,
            details: HashMap::new(),
        }
    }

    /// Create an unhealthy check result with a message
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            duration_ms: 0,
            details: HashMap::new(),
        }
    }

    /// Create a degraded check result with a message
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            duration_ms: 0,
            details: HashMap::new(),
        }
    }

    /// Set the duration of the check
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Add a detail key-value pair
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Overall health report containing all check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status based on all checks
    pub status: HealthStatus,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Total duration of all checks in milliseconds
    pub total_duration_ms: u64,
    /// Timestamp when the report was generated
    pub timestamp: String,
    /// Version of the tool
    pub version: String,
}

impl HealthReport {
    /// Create a new health report from check results
    #[must_use]
    pub fn new(checks: Vec<CheckResult>, duration: Duration) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            checks,
            total_duration_ms: duration.as_millis() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Returns true if overall status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Get all checks that failed (not healthy)
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| !c.status.is_healthy())
            .collect()
    }
}

/// Health checker with configurable checks
pub struct HealthChecker {
    checks: Vec<Box<dyn HealthCheck>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    /// Create a new health checker with no checks
    #[must_use]
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a health check
    pub fn add_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Add the standard environment checks.
    ///
    /// Credentials are optional at this level; individual commands fail
    /// with a clear error when the variable they need is missing.
    #[must_use]
    pub fn with_standard_checks(self) -> Self {
        self.add_check(EnvVarCheck::optional("SUMO_ACCESS_ID"))
            .add_check(EnvVarCheck::optional("SUMO_ACCESS_KEY"))
            .add_check(EnvVarCheck::optional("CONFLUENCE_TOKEN"))
            .add_check(EnvVarCheck::optional("GEMINI_API_KEY"))
    }

    /// Run all health checks
    #[must_use]
    pub fn run(&self) -> HealthReport {
        let start = Instant::now();
        let mut results = Vec::new();

        for check in &self.checks {
            let check_start = Instant::now();
            let mut result = check.check();
            result.duration_ms = check_start.elapsed().as_millis() as u64;
            results.push(result);
        }

        HealthReport::new(results, start.elapsed())
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    /// Perform the health check and return a result
    fn check(&self) -> CheckResult;
}

/// Check if an environment variable is set.
///
/// Values are never echoed into the report; credentials would leak into
/// the activity log otherwise. Only the length is recorded.
pub struct EnvVarCheck {
    var_name: String,
    required: bool,
}

impl EnvVarCheck {
    /// Create a required environment variable check
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            required: true,
        }
    }

    /// Create an optional environment variable check
    pub fn optional(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            required: false,
        }
    }
}

impl HealthCheck for EnvVarCheck {
    fn check(&self) -> CheckResult {
        match std::env::var(&self.var_name) {
            Ok(value) => CheckResult::healthy(&self.var_name)
                .with_detail("set", "true")
                .with_detail("length", value.len().to_string()),
            Err(_) => {
                if self.required {
                    CheckResult::unhealthy(&self.var_name, format!("{} is not set", self.var_name))
                } else {
                    CheckResult::degraded(
                        &self.var_name,
                        format!("{} is not set (optional)", self.var_name),
                    )
                }
            }
        }
    }
}

/// Check that the configuration file loads
pub struct ConfigCheck {
    path: Option<String>,
}

impl ConfigCheck {
    /// Check the discovered configuration, or an explicit path
    pub fn new(path: Option<String>) -> Self {
        Self { path }
    }
}

impl HealthCheck for ConfigCheck {
    fn check(&self) -> CheckResult {
        match crate::config::Config::load(self.path.as_deref()) {
            Ok(config) => match config.path {
                Some(path) => CheckResult::healthy("config").with_detail("path", path),
                None => CheckResult::degraded("config", "No config file found, using defaults"),
            },
            Err(e) => CheckResult::unhealthy("config", e.to_string()),
        }
    }
}

/// Check if a path exists and is accessible
pub struct PathCheck {
    path: String,
    check_writable: bool,
}

impl PathCheck {
    /// Create a check for a readable path
    pub fn readable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            check_writable: false,
        }
    }

    /// Create a check for a writable path
    pub fn writable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            check_writable: true,
        }
    }
}

impl HealthCheck for PathCheck {
    fn check(&self) -> CheckResult {
        let path = Path::new(&self.path);

        if !path.exists() {
            return CheckResult::unhealthy(&self.path, "Path does not exist");
        }

        if self.check_writable {
            let metadata = match std::fs::metadata(path) {
                Ok(m) => m,
                Err(e) => return CheckResult::unhealthy(&self.path, e.to_string()),
            };

            if metadata.permissions().readonly() {
                return CheckResult::unhealthy(&self.path, "Path is read-only");
            }
        }

        CheckResult::healthy(&self.path)
            .with_detail("exists", "true")
            .with_detail("writable", self.check_writable.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_check_optional_missing() {
        let check = EnvVarCheck::optional("QUERYDECK_NONEXISTENT_VAR_12345");
        let result = check.check();
        // Should be degraded, not unhealthy
        assert_eq!(result.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_env_var_check_never_echoes_value() {
        // PATH is set everywhere the tests run
        let check = EnvVarCheck::new("PATH");
        let result = check.check();
        assert!(result.status.is_healthy());
        assert!(!result.details.contains_key("value"));
    }

    #[test]
    fn test_health_report() {
        let checks = vec![
            CheckResult::healthy("check1"),
            CheckResult::healthy("check2"),
        ];
        let report = HealthReport::new(checks, Duration::from_millis(100));
        assert!(report.is_healthy());
    }

    #[test]
    fn test_health_report_with_failure() {
        let checks = vec![
            CheckResult::healthy("check1"),
            CheckResult::unhealthy("check2", "Failed"),
        ];
        let report = HealthReport::new(checks, Duration::from_millis(100));
        assert!(!report.is_healthy());
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.failed_checks().len(), 1);
    }

    #[test]
    fn test_degraded_report_is_operational() {
        let checks = vec![
            CheckResult::healthy("check1"),
            CheckResult::degraded("check2", "Optional thing missing"),
        ];
        let report = HealthReport::new(checks, Duration::from_millis(10));
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(report.status.is_operational());
    }

    #[test]
    fn test_path_check_missing() {
        let check = PathCheck::readable("/definitely/not/a/real/path/12345");
        let result = check.check();
        assert_eq!(result.status, HealthStatus::Unhealthy);
    }
}
