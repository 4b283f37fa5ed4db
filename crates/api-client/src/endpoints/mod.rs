//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one upstream service.
//!
//! | Module | Service | Description |
//! |--------|---------|-------------|
//! | `sumo` | SumoLogic | Search jobs and generated dashboards |
//! | `confluence` | Confluence | Tracking page reads and updates |
//! | `gemini` | Gemini | Query drafting and explanation |

pub mod confluence;
pub mod gemini;
pub mod sumo;

pub use confluence::ConfluenceApi;
pub use gemini::GeminiApi;
pub use sumo::SumoApi;
