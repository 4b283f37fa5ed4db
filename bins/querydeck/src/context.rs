//! Shared command setup
//!
//! Every command starts by loading configuration and opening the pieces
//! it needs. The context ties those together so the commands stay small.

use anyhow::Result;
use querydeck_api_client::{ClientConfig, QuerydeckClient};
use querydeck_core::activity::ActivityLog;
use querydeck_core::config::Config;
use querydeck_core::rate_limit::{QuotaFile, RateLimitConfig};
use querydeck_core::Error;
use querydeck_library::store::LibraryStore;
use std::time::Duration;

/// Configuration, activity log, and factories for the heavier pieces.
pub struct CommandContext {
    pub config: Config,
    pub activity: ActivityLog,
}

impl CommandContext {
    /// Load configuration and open the activity log.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config = Config::load(config_path)?;

        let activity = if config.schema.activity.enabled {
            ActivityLog::with_config(config.activity_config())?
        } else {
            ActivityLog::noop()
        };

        Ok(Self { config, activity })
    }

    /// Open the library store at the configured path.
    pub fn open_store(&self) -> Result<LibraryStore> {
        Ok(LibraryStore::open(self.config.library_path())?)
    }

    /// Name recorded as the actor on activity events.
    pub fn actor(&self) -> String {
        self.config.actor()
    }

    /// Search result cap from configuration.
    pub fn result_cap(&self) -> usize {
        self.config.schema.library.result_cap
    }

    /// API client built from the environment, with the config file
    /// filling in deployment, timeout, and model when the corresponding
    /// variables are absent. Environment always wins.
    pub fn api_client(&self) -> Result<QuerydeckClient> {
        let mut client_config = ClientConfig::from_env()?;

        if std::env::var("SUMO_DEPLOYMENT").is_err() {
            client_config.sumo_deployment = self.config.schema.sumo.deployment.parse()?;
        }
        if std::env::var("QUERYDECK_TIMEOUT_SECS").is_err() {
            client_config.timeout = Duration::from_secs(self.config.schema.sumo.timeout_secs);
        }
        if std::env::var("CONFLUENCE_BASE_URL").is_err() {
            if let Some(url) = &self.config.schema.confluence.base_url {
                client_config.confluence_base_url = Some(url.trim_end_matches('/').to_string());
            }
        }
        client_config.gemini_model = self.config.schema.assist.model.clone();
        client_config.validate()?;

        Ok(QuerydeckClient::with_config(client_config)?)
    }

    /// Confluence page the link commands append to.
    pub fn confluence_page_id(&self) -> Result<String> {
        self.config
            .schema
            .confluence
            .page_id
            .clone()
            .ok_or_else(|| {
                Error::config("No Confluence page configured")
                    .with_suggestion("Set page_id under [confluence] in .querydeck.toml")
                    .into()
            })
    }

    /// Assistant prompt quota, persisted so it holds across runs.
    pub fn assist_quota(&self) -> QuotaFile {
        let limit = RateLimitConfig {
            max_requests: self.config.schema.rate_limit.assist_per_hour,
            window: Duration::from_secs(60 * 60),
            max_identities: self.config.schema.rate_limit.max_identities,
        };
        QuotaFile::open(self.config.assist_quota_path(), limit)
    }
}
