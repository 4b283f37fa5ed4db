//! Activity logging for the query library
//!
//! Provides structured JSON-lines logging for:
//! - Library changes (add, edit, remove, usage)
//! - Searches and their outcomes
//! - Dashboard and Confluence publishing
//! - Assistant prompts, including throttled and blocked ones
//!
//! # Example
//!
//! ```rust,ignore
//! use querydeck_core::activity::{ActivityLog, ActivityEvent, ActivityKind};
//!
//! let activity = ActivityLog::new()?;
//!
//! activity.log(ActivityEvent::new(
//!     ActivityKind::QueryAdded,
//!     "login tracking",
//! ).with_detail("category", "auth"));
//! ```

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Activity kinds for categorizing events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    // Library changes
    /// A query was added to the library
    QueryAdded,
    /// A query was edited
    QueryUpdated,
    /// A query was removed
    QueryRemoved,
    /// A query's usage counter was bumped
    QueryUsed,
    /// A log mapping was added
    MappingAdded,
    /// A log mapping was removed
    MappingRemoved,

    // Search
    /// A library search ran
    SearchPerformed,

    // Publishing
    /// A dashboard definition was generated
    DashboardGenerated,
    /// A link was published to Confluence
    LinkPublished,

    // Assistant
    /// A prompt was forwarded to the assistant
    AssistPromptSent,
    /// A prompt was rejected by the rate limiter
    AssistThrottled,
    /// The assistant refused to answer a prompt
    AssistBlocked,

    // System
    /// Configuration was loaded successfully
    ConfigLoaded,
    /// An error occurred
    ErrorOccurred,
}

impl ActivityKind {
    /// Get the severity level of this kind of event
    #[must_use]
    pub fn severity(&self) -> ActivitySeverity {
        match self {
            ActivityKind::AssistBlocked => ActivitySeverity::High,

            ActivityKind::AssistThrottled | ActivityKind::ErrorOccurred => {
                ActivitySeverity::Medium
            }

            _ => ActivitySeverity::Low,
        }
    }
}

/// Activity severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySeverity {
    /// Low severity - informational events
    Low,
    /// Medium severity - warnings or minor issues
    Medium,
    /// High severity - refusals and data problems
    High,
    /// Critical severity - requires immediate attention
    Critical,
}

/// Activity event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Unique event ID
    pub id: String,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Event kind
    pub kind: ActivityKind,
    /// Severity level
    pub severity: ActivitySeverity,
    /// Target of the event (query key, search term, page title, ...)
    pub target: String,
    /// Whether the action succeeded
    pub success: bool,
    /// Duration in milliseconds (if applicable)
    pub duration_ms: Option<u64>,
    /// Additional details
    pub details: HashMap<String, String>,
    /// User that triggered the event
    pub actor: String,
    /// Session ID for correlation
    pub session_id: String,
}

impl ActivityEvent {
    /// Create a new activity event
    pub fn new(kind: ActivityKind, target: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            severity: kind.severity(),
            target: target.into(),
            success: true,
            duration_ms: None,
            details: HashMap::new(),
            actor: whoami(),
            session_id: session_id(),
        }
    }

    /// Mark as failed
    #[must_use]
    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    /// Set duration
    #[must_use]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add a detail
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Set severity override
    #[must_use]
    pub fn with_severity(mut self, severity: ActivitySeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}

/// Activity log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Log file path
    pub log_path: PathBuf,
    /// Minimum severity to log
    pub min_severity: ActivitySeverity,
    /// Maximum log file size in bytes before rotation
    pub max_file_size: u64,
    /// Number of rotated files to keep
    pub max_files: usize,
    /// Log to stdout as well
    pub stdout: bool,
    /// JSON format (vs human-readable)
    pub json_format: bool,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        let log_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querydeck")
            .join("activity.log");

        Self {
            log_path,
            min_severity: ActivitySeverity::Low,
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files: 5,
            stdout: false,
            json_format: true,
        }
    }
}

/// Activity log writer
pub struct ActivityLog {
    config: ActivityConfig,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl ActivityLog {
    /// Create a new activity log at the default location
    pub fn new() -> Result<Self> {
        Self::with_config(ActivityConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: ActivityConfig) -> Result<Self> {
        // Ensure directory exists
        if let Some(parent) = config.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_path)?;

        let writer = BufWriter::new(file);

        Ok(Self {
            config,
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Create a no-op activity log (for testing and --no-activity runs)
    #[must_use]
    pub fn noop() -> Self {
        Self {
            config: ActivityConfig::default(),
            writer: Mutex::new(None),
        }
    }

    /// Log an activity event
    pub fn log(&self, event: ActivityEvent) {
        // Check severity threshold
        if event.severity < self.config.min_severity {
            return;
        }

        let line = if self.config.json_format {
            serde_json::to_string(&event).unwrap_or_default()
        } else {
            format!(
                "[{}] {} {} {} target={} success={} actor={}",
                event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                format!("{:?}", event.severity).to_uppercase(),
                format!("{:?}", event.kind),
                event.id,
                event.target,
                event.success,
                event.actor,
            )
        };

        // Write to file
        if let Ok(mut guard) = self.writer.lock() {
            if let Some(ref mut writer) = *guard {
                let _ = writeln!(writer, "{line}");
                let _ = writer.flush();
            }
        }

        // Write to stdout if configured
        if self.config.stdout {
            println!("{line}");
        }
    }

    /// Log a search with its outcome
    pub fn log_search(&self, term: &str, result_count: usize, duration_ms: u64) {
        let display_target = if term.trim().is_empty() { "(browse)" } else { term };
        let event = ActivityEvent::new(ActivityKind::SearchPerformed, display_target)
            .with_duration(duration_ms)
            .with_detail("results", result_count.to_string());
        self.log(event);
    }

    /// Log an assistant prompt that was rejected by the rate limiter
    pub fn log_throttled(&self, actor: &str) {
        self.log(
            ActivityEvent::new(ActivityKind::AssistThrottled, actor)
                .with_actor(actor)
                .failed(),
        );
    }

    /// Rotate log files if needed
    pub fn rotate_if_needed(&self) -> Result<bool> {
        let metadata = std::fs::metadata(&self.config.log_path)?;

        if metadata.len() < self.config.max_file_size {
            return Ok(false);
        }

        // Close current writer
        if let Ok(mut guard) = self.writer.lock() {
            *guard = None;
        }

        // Rotate files
        for i in (1..self.config.max_files).rev() {
            let from = self.config.log_path.with_extension(format!("log.{i}"));
            let to = self.config.log_path.with_extension(format!("log.{}", i + 1));
            if from.exists() {
                let _ = std::fs::rename(&from, &to);
            }
        }

        // Rename current to .1
        let rotated = self.config.log_path.with_extension("log.1");
        std::fs::rename(&self.config.log_path, &rotated)?;

        // Open new file
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.log_path)?;

        if let Ok(mut guard) = self.writer.lock() {
            *guard = Some(BufWriter::new(file));
        }

        Ok(true)
    }

    /// Get recent events, newest first (reads from file)
    pub fn recent_events(&self, count: usize) -> Result<Vec<ActivityEvent>> {
        let content = std::fs::read_to_string(&self.config.log_path)?;
        let events: Vec<ActivityEvent> = content
            .lines()
            .rev()
            .take(count)
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        Ok(events)
    }

    /// Get events at or above a severity
    pub fn events_by_severity(&self, min_severity: ActivitySeverity) -> Result<Vec<ActivityEvent>> {
        let content = std::fs::read_to_string(&self.config.log_path)?;
        let events: Vec<ActivityEvent> = content
            .lines()
            .filter_map(|line| serde_json::from_str::<ActivityEvent>(line).ok())
            .filter(|e| e.severity >= min_severity)
            .collect();

        Ok(events)
    }
}

// Helper functions

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn session_id() -> String {
    // Use a static session ID for the process lifetime
    use once_cell::sync::Lazy;
    static SESSION: Lazy<String> = Lazy::new(|| uuid::Uuid::new_v4().to_string());
    SESSION.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_activity() -> (ActivityLog, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = ActivityConfig {
            log_path: temp_dir.path().join("activity.log"),
            stdout: false,
            ..Default::default()
        };
        let activity = ActivityLog::with_config(config).unwrap();
        (activity, temp_dir)
    }

    #[test]
    fn test_event_creation() {
        let event = ActivityEvent::new(ActivityKind::QueryAdded, "login tracking");

        assert_eq!(event.kind, ActivityKind::QueryAdded);
        assert_eq!(event.target, "login tracking");
        assert!(event.success);
    }

    #[test]
    fn test_event_with_details() {
        let event = ActivityEvent::new(ActivityKind::AssistBlocked, "how do I...")
            .with_detail("reason", "SAFETY")
            .failed();

        assert!(!event.success);
        assert_eq!(event.details.get("reason"), Some(&"SAFETY".to_string()));
    }

    #[test]
    fn test_log_write_and_read_back() {
        let (activity, _temp) = test_activity();

        activity.log(ActivityEvent::new(ActivityKind::QueryUsed, "login tracking"));

        let events = activity.recent_events(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, "login tracking");
    }

    #[test]
    fn test_recent_events_newest_first() {
        let (activity, _temp) = test_activity();

        activity.log(ActivityEvent::new(ActivityKind::QueryAdded, "first"));
        activity.log(ActivityEvent::new(ActivityKind::QueryAdded, "second"));

        let events = activity.recent_events(10).unwrap();
        assert_eq!(events[0].target, "second");
        assert_eq!(events[1].target, "first");
    }

    #[test]
    fn test_severity_filtering() {
        let (activity, _temp) = test_activity();

        activity.log(ActivityEvent::new(ActivityKind::QueryUsed, "low"));
        activity.log(ActivityEvent::new(ActivityKind::AssistThrottled, "medium"));
        activity.log(ActivityEvent::new(ActivityKind::AssistBlocked, "high"));

        let high_events = activity.events_by_severity(ActivitySeverity::High).unwrap();
        assert_eq!(high_events.len(), 1);
        assert_eq!(high_events[0].target, "high");
    }

    #[test]
    fn test_kind_severity() {
        assert_eq!(ActivityKind::AssistBlocked.severity(), ActivitySeverity::High);
        assert_eq!(ActivityKind::AssistThrottled.severity(), ActivitySeverity::Medium);
        assert_eq!(ActivityKind::QueryAdded.severity(), ActivitySeverity::Low);
    }

    #[test]
    fn test_search_logging_marks_browse() {
        let (activity, _temp) = test_activity();

        activity.log_search("   ", 12, 3);

        let events = activity.recent_events(1).unwrap();
        assert_eq!(events[0].target, "(browse)");
        assert_eq!(events[0].details.get("results"), Some(&"12".to_string()));
    }

    #[test]
    fn test_rotation_renames_current_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("activity.log");
        let config = ActivityConfig {
            log_path: log_path.clone(),
            max_file_size: 1,
            ..Default::default()
        };
        let activity = ActivityLog::with_config(config).unwrap();

        activity.log(ActivityEvent::new(ActivityKind::QueryAdded, "filler"));
        let rotated = activity.rotate_if_needed().unwrap();

        assert!(rotated);
        assert!(log_path.with_extension("log.1").exists());
        assert!(log_path.exists());
    }
}
