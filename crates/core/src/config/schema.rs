//! Configuration schema definitions
//!
//! Settings for the query library, SumoLogic account, Confluence target,
//! and the assistant. Credentials never live here; they come from the
//! environment.

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub sumo: SumoConfig,

    #[serde(default)]
    pub confluence: ConfluenceConfig,

    #[serde(default)]
    pub assist: AssistConfig,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub activity: ActivitySection,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Name recorded as the actor in the activity log.
    /// Falls back to $USER when unset.
    #[serde(default)]
    pub user: Option<String>,

    /// Category assigned to new queries when none is given
    #[serde(default = "default_category")]
    pub default_category: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user: None,
            default_category: default_category(),
        }
    }
}

fn default_category() -> String {
    "general".to_string()
}

/// Query library storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Path to the library store file.
    /// Defaults to the platform data directory when unset.
    #[serde(default)]
    pub path: Option<String>,

    /// Maximum number of search results
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,

    /// Seed starter queries when `init` creates a fresh store
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: None,
            result_cap: default_result_cap(),
            seed: true,
        }
    }
}

fn default_result_cap() -> usize {
    50
}

fn default_true() -> bool {
    true
}

/// SumoLogic account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumoConfig {
    /// Deployment the account lives in (us1, us2, eu, au, ...)
    #[serde(default = "default_deployment")]
    pub deployment: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SumoConfig {
    fn default() -> Self {
        Self {
            deployment: default_deployment(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_deployment() -> String {
    "us1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Confluence publishing settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfluenceConfig {
    /// Base URL of the Confluence instance
    #[serde(default)]
    pub base_url: Option<String>,

    /// Page the `link` command appends to
    #[serde(default)]
    pub page_id: Option<String>,
}

/// Assistant settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Gemini model used for query suggestions
    #[serde(default = "default_model")]
    pub model: String,

    /// Disable the `ask` command entirely
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            enabled: true,
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Rate limiting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSection {
    /// Assistant prompts allowed per user per hour
    #[serde(default = "default_assist_per_hour")]
    pub assist_per_hour: u32,

    /// Maximum identities the limiter tracks at once
    #[serde(default = "default_max_identities")]
    pub max_identities: usize,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            assist_per_hour: default_assist_per_hour(),
            max_identities: default_max_identities(),
        }
    }
}

fn default_assist_per_hour() -> u32 {
    20
}

fn default_max_identities() -> usize {
    1024
}

/// Activity log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySection {
    /// Path to the activity log.
    /// Defaults to the platform data directory when unset.
    #[serde(default)]
    pub path: Option<String>,

    /// Disable activity logging entirely
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ActivitySection {
    fn default() -> Self {
        Self {
            path: None,
            enabled: true,
        }
    }
}
