//! Configuration file loading

use super::schema::ConfigSchema;
use crate::activity::{ActivityConfig, ActivitySeverity};
use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Load with defaults only (no file)
    pub fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Name recorded as the actor in the activity log
    pub fn actor(&self) -> String {
        self.schema.general.user.clone().unwrap_or_else(|| {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".to_string())
        })
    }

    /// Resolved path of the library store file
    pub fn library_path(&self) -> PathBuf {
        self.schema
            .library
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("library.json"))
    }

    /// Path of the file holding assist quota windows
    pub fn assist_quota_path(&self) -> PathBuf {
        data_dir().join("assist_quota.json")
    }

    /// Activity log configuration derived from the schema
    pub fn activity_config(&self) -> ActivityConfig {
        let log_path = self
            .schema
            .activity
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("activity.log"));

        ActivityConfig {
            log_path,
            min_severity: ActivitySeverity::Low,
            ..ActivityConfig::default()
        }
    }
}

/// Platform data directory for querydeck files
fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("querydeck")
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [
        ".querydeck.toml",
        "querydeck.toml",
        ".config/querydeck.toml",
    ];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
    }

    None
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path))
}
