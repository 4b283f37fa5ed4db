//! Core utilities for the Querydeck toolkit
//!
//! This crate provides shared functionality used across the Querydeck crates:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with discovery and validation
//! - **Validation**: Fluent validation for query records and user input
//! - **Rate limiting**: Bounded fixed-window limiter for assistant prompts
//! - **Activity log**: JSON-lines log of library changes and searches
//! - **Health checks**: Verify configuration, credentials, and paths
//!
//! # Example
//!
//! ```rust,no_run
//! use querydeck_core::config::Config;
//! use querydeck_core::health::HealthChecker;
//!
//! // Load configuration from the usual locations
//! let config = Config::load(None).expect("config");
//!
//! // Check the environment
//! let report = HealthChecker::new()
//!     .with_standard_checks()
//!     .run();
//!
//! if !report.is_healthy() {
//!     eprintln!("Environment issues detected for {}", config.actor());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod config;
pub mod error;
pub mod health;
pub mod rate_limit;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::activity::{ActivityEvent, ActivityKind, ActivityLog};
    pub use crate::config::Config;
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::health::{HealthChecker, HealthReport, HealthStatus};
    pub use crate::rate_limit::{FixedWindowLimiter, QuotaFile, RateLimitConfig};
    pub use crate::validation::{ValidationResult, Validator};
}
