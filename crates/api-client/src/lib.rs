//! HTTP client for the services behind the Querydeck CLI
//!
//! This crate provides one resilient client for the three upstreams the
//! tool talks to: SumoLogic (search jobs, dashboards), Confluence (the
//! tracking page) and Gemini (query assistance).
//!
//! # Features
//!
//! - **Environment-based configuration**: credentials load from environment variables
//! - **Retry with exponential backoff**: automatic retry for transient failures
//! - **Circuit breaker**: prevent cascading failures during outages
//! - **Per-service rate limiting**: avoid upstream throttling
//! - **Request correlation**: track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use querydeck_api_client::{ClientConfig, QuerydeckClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client with environment configuration
//!     let client = QuerydeckClient::new()?;
//!
//!     // Draft a query from an intent
//!     let reply = client.gemini().generate_text("count login failures").await?;
//!     println!("{reply}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod resilience;

pub use client::{AuthScheme, QuerydeckClient};
pub use config::{ClientConfig, SumoDeployment};
pub use error::{ApiError, ApiResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{AuthScheme, QuerydeckClient};
    pub use crate::config::{ClientConfig, SumoDeployment};
    pub use crate::endpoints::{ConfluenceApi, GeminiApi, SumoApi};
    pub use crate::error::{ApiError, ApiResult};
}
