//! Rate limiting for assistant prompts and other per-identity quotas
//!
//! Provides a bounded fixed-window rate limiter:
//! - One counting window per identity (user name, API key, ...)
//! - Expired windows reset on the next request
//! - The identity map is capped; expired entries are evicted first,
//!   then the oldest window
//!
//! [`FixedWindowLimiter`] keeps its windows in memory and suits long-lived
//! processes. [`QuotaFile`] persists them to disk so a quota holds across
//! separate CLI invocations.
//!
//! # Example
//!
//! ```rust,ignore
//! use querydeck_core::rate_limit::{FixedWindowLimiter, RateLimitConfig};
//!
//! let limiter = FixedWindowLimiter::new(RateLimitConfig::per_hour(20));
//!
//! if limiter.try_acquire("dana") {
//!     // Forward the prompt
//! } else {
//!     // Throttled, surface retry time from status()
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
    /// Maximum number of identities tracked at once
    pub max_identities: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            max_identities: 1024,
        }
    }
}

impl RateLimitConfig {
    /// Per-minute rate limit
    #[must_use]
    pub fn per_minute(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// Per-hour rate limit
    #[must_use]
    pub fn per_hour(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(3600),
            ..Self::default()
        }
    }

    /// Override the identity cap
    #[must_use]
    pub fn with_max_identities(mut self, max_identities: usize) -> Self {
        self.max_identities = max_identities;
        self
    }
}

/// Time source, injectable so tests can drive the window forward
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall-clock time source used outside of tests
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// One identity's counting window
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Bounded fixed-window rate limiter keyed by identity
pub struct FixedWindowLimiter {
    windows: RwLock<HashMap<String, Window>>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a limiter backed by the system clock
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter with an explicit time source
    #[must_use]
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Try to record one request for the given identity.
    ///
    /// Returns `false` when the identity has exhausted its window.
    #[must_use]
    pub fn try_acquire(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());

        if let Some(window) = windows.get_mut(identity) {
            if now.duration_since(window.started_at) >= self.config.window {
                window.count = 1;
                window.started_at = now;
                return true;
            }
            if window.count < self.config.max_requests {
                window.count += 1;
                return true;
            }
            return false;
        }

        Self::evict_if_full(&mut windows, &self.config, now);
        windows.insert(
            identity.to_string(),
            Window {
                count: 1,
                started_at: now,
            },
        );
        true
    }

    /// Get the current status for an identity without consuming a request
    #[must_use]
    pub fn status(&self, identity: &str) -> RateLimitStatus {
        let now = self.clock.now();
        let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());

        match windows.get(identity) {
            Some(window) if now.duration_since(window.started_at) < self.config.window => {
                RateLimitStatus {
                    remaining: self.config.max_requests.saturating_sub(window.count),
                    limit: self.config.max_requests,
                    resets_in: self.config.window - now.duration_since(window.started_at),
                }
            }
            _ => RateLimitStatus {
                remaining: self.config.max_requests,
                limit: self.config.max_requests,
                resets_in: Duration::ZERO,
            },
        }
    }

    /// Number of identities currently tracked
    #[must_use]
    pub fn tracked_identities(&self) -> usize {
        let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
        windows.len()
    }

    /// Forget one identity's window
    pub fn reset(&self, identity: &str) {
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows.remove(identity);
    }

    /// Forget all windows
    pub fn reset_all(&self) {
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows.clear();
    }

    /// Make room for one more identity. Expired windows go first; if none
    /// are expired, the oldest window is dropped.
    fn evict_if_full(windows: &mut HashMap<String, Window>, config: &RateLimitConfig, now: Instant) {
        if windows.len() < config.max_identities {
            return;
        }

        windows.retain(|_, w| now.duration_since(w.started_at) < config.window);

        while windows.len() >= config.max_identities {
            let oldest = windows
                .iter()
                .min_by_key(|(_, w)| w.started_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => windows.remove(&key),
                None => break,
            };
        }
    }
}

/// Rate limit status
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatus {
    /// Requests left in the current window
    pub remaining: u32,
    /// Window size in requests
    pub limit: u32,
    /// Time until the window resets
    pub resets_in: Duration,
}

/// One persisted counting window
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredWindow {
    count: u32,
    started_at: DateTime<Utc>,
}

impl StoredWindow {
    /// Wall-clock time since the window opened. A clock that moved
    /// backwards reads as zero, which keeps the window alive.
    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Fixed-window quota persisted to a JSON file
///
/// Same window semantics as [`FixedWindowLimiter`], but counters survive
/// process restarts, so a per-user quota holds across separate CLI runs.
/// Windows use wall-clock time instead of [`Instant`] because the process
/// that opened a window is usually gone by the next request.
///
/// The file is bookkeeping, not data: one that is missing or fails to
/// parse starts over with empty windows.
#[derive(Debug, Clone)]
pub struct QuotaFile {
    path: PathBuf,
    config: RateLimitConfig,
}

impl QuotaFile {
    /// Create a quota backed by the given file. The file is created on
    /// the first acquire.
    pub fn open(path: impl Into<PathBuf>, config: RateLimitConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Try to consume one request for the identity, persisting the
    /// updated window. Returns `Ok(false)` when the quota is spent.
    pub fn try_acquire(&self, identity: &str) -> Result<bool> {
        let now = Utc::now();
        let mut windows = self.load();

        if let Some(window) = windows.get_mut(identity) {
            if window.elapsed(now) >= self.config.window {
                window.count = 1;
                window.started_at = now;
            } else if window.count < self.config.max_requests {
                window.count += 1;
            } else {
                return Ok(false);
            }
            self.save(&windows)?;
            return Ok(true);
        }

        Self::evict_stored_if_full(&mut windows, &self.config, now);
        windows.insert(
            identity.to_string(),
            StoredWindow {
                count: 1,
                started_at: now,
            },
        );
        self.save(&windows)?;
        Ok(true)
    }

    /// Get the current status for an identity without consuming a request
    #[must_use]
    pub fn status(&self, identity: &str) -> RateLimitStatus {
        let now = Utc::now();
        let windows = self.load();

        match windows.get(identity) {
            Some(window) if window.elapsed(now) < self.config.window => RateLimitStatus {
                remaining: self.config.max_requests.saturating_sub(window.count),
                limit: self.config.max_requests,
                resets_in: self.config.window - window.elapsed(now),
            },
            _ => RateLimitStatus {
                remaining: self.config.max_requests,
                limit: self.config.max_requests,
                resets_in: Duration::ZERO,
            },
        }
    }

    /// Forget one identity's window
    pub fn reset(&self, identity: &str) -> Result<()> {
        let mut windows = self.load();
        if windows.remove(identity).is_some() {
            self.save(&windows)?;
        }
        Ok(())
    }

    fn load(&self) -> HashMap<String, StoredWindow> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    fn save(&self, windows: &HashMap<String, StoredWindow>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::io(format!("Failed to create {}", parent.display())).with_source(e)
                })?;
            }
        }
        let json = serde_json::to_string(windows)
            .map_err(|e| Error::io("Failed to encode quota state").with_source(e))?;
        fs::write(&self.path, json).map_err(|e| {
            Error::io(format!("Failed to write {}", self.path.display())).with_source(e)
        })
    }

    /// Same eviction order as the in-memory limiter: expired windows
    /// first, then the oldest.
    fn evict_stored_if_full(
        windows: &mut HashMap<String, StoredWindow>,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) {
        if windows.len() < config.max_identities {
            return;
        }

        windows.retain(|_, w| w.elapsed(now) < config.window);

        while windows.len() >= config.max_identities {
            let oldest = windows
                .iter()
                .min_by_key(|(_, w)| w.started_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => windows.remove(&key),
                None => break,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        fn starting_now() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Instant::now()),
            })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn limiter_with_clock(
        max_requests: u32,
        window_secs: u64,
        max_identities: usize,
    ) -> (FixedWindowLimiter, Arc<ManualClock>) {
        let clock = ManualClock::starting_now();
        let config = RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
            max_identities,
        };
        (
            FixedWindowLimiter::with_clock(config, clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_limits_within_window() {
        let (limiter, _clock) = limiter_with_clock(3, 60, 16);

        assert!(limiter.try_acquire("dana"));
        assert!(limiter.try_acquire("dana"));
        assert!(limiter.try_acquire("dana"));
        assert!(!limiter.try_acquire("dana"));
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let (limiter, clock) = limiter_with_clock(2, 60, 16);

        assert!(limiter.try_acquire("dana"));
        assert!(limiter.try_acquire("dana"));
        assert!(!limiter.try_acquire("dana"));

        clock.advance(Duration::from_secs(61));
        assert!(limiter.try_acquire("dana"));
        assert_eq!(limiter.status("dana").remaining, 1);
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _clock) = limiter_with_clock(1, 60, 16);

        assert!(limiter.try_acquire("dana"));
        assert!(!limiter.try_acquire("dana"));
        assert!(limiter.try_acquire("kim"));
    }

    #[test]
    fn test_eviction_prefers_expired_windows() {
        let (limiter, clock) = limiter_with_clock(5, 60, 2);

        assert!(limiter.try_acquire("old"));
        clock.advance(Duration::from_secs(61));
        assert!(limiter.try_acquire("fresh"));

        // Map is at capacity; "old" has expired and must be the one evicted
        assert!(limiter.try_acquire("new"));
        assert_eq!(limiter.tracked_identities(), 2);

        // "fresh" kept its window
        assert_eq!(limiter.status("fresh").remaining, 4);
    }

    #[test]
    fn test_eviction_falls_back_to_oldest() {
        let (limiter, clock) = limiter_with_clock(5, 600, 2);

        assert!(limiter.try_acquire("first"));
        clock.advance(Duration::from_secs(10));
        assert!(limiter.try_acquire("second"));
        clock.advance(Duration::from_secs(10));

        // Neither window has expired, so the oldest ("first") is dropped
        assert!(limiter.try_acquire("third"));
        assert_eq!(limiter.tracked_identities(), 2);
        assert_eq!(limiter.status("second").remaining, 4);
        assert_eq!(limiter.status("first").remaining, 5);
    }

    #[test]
    fn test_status_without_consuming() {
        let (limiter, _clock) = limiter_with_clock(10, 60, 16);

        assert!(limiter.try_acquire("dana"));
        let before = limiter.status("dana").remaining;
        let after = limiter.status("dana").remaining;

        assert_eq!(before, 9);
        assert_eq!(after, 9);
    }

    #[test]
    fn test_status_for_unknown_identity() {
        let (limiter, _clock) = limiter_with_clock(10, 60, 16);

        let status = limiter.status("nobody");
        assert_eq!(status.remaining, 10);
        assert_eq!(status.resets_in, Duration::ZERO);
    }

    #[test]
    fn test_reset_forgets_identity() {
        let (limiter, _clock) = limiter_with_clock(1, 60, 16);

        assert!(limiter.try_acquire("dana"));
        assert!(!limiter.try_acquire("dana"));

        limiter.reset("dana");
        assert!(limiter.try_acquire("dana"));
    }

    fn quota_in(dir: &tempfile::TempDir, max: u32, window_secs: u64) -> QuotaFile {
        QuotaFile::open(
            dir.path().join("quota.json"),
            RateLimitConfig {
                max_requests: max,
                window: Duration::from_secs(window_secs),
                max_identities: 16,
            },
        )
    }

    #[test]
    fn test_quota_file_limits_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let quota = quota_in(&dir, 2, 3600);

        assert!(quota.try_acquire("dana").unwrap());
        assert!(quota.try_acquire("dana").unwrap());
        assert!(!quota.try_acquire("dana").unwrap());
        assert!(quota.try_acquire("sam").unwrap());
    }

    #[test]
    fn test_quota_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let quota = quota_in(&dir, 2, 3600);
            assert!(quota.try_acquire("dana").unwrap());
            assert!(quota.try_acquire("dana").unwrap());
        }

        // New handle, same file: the spent window still counts.
        let quota = quota_in(&dir, 2, 3600);
        assert!(!quota.try_acquire("dana").unwrap());
        assert_eq!(quota.status("dana").remaining, 0);
    }

    #[test]
    fn test_quota_file_expired_window_resets() {
        let dir = tempfile::tempdir().unwrap();
        let quota = quota_in(&dir, 1, 0);

        assert!(quota.try_acquire("dana").unwrap());
        // Zero-length window: already expired for the next request.
        assert!(quota.try_acquire("dana").unwrap());
    }

    #[test]
    fn test_quota_file_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota.json");
        std::fs::write(&path, "not json {{{").unwrap();

        let quota = QuotaFile::open(&path, RateLimitConfig::per_hour(5));
        assert!(quota.try_acquire("dana").unwrap());
        assert_eq!(quota.status("dana").remaining, 4);
    }

    #[test]
    fn test_quota_file_status_does_not_consume() {
        let dir = tempfile::tempdir().unwrap();
        let quota = quota_in(&dir, 5, 3600);

        assert!(quota.try_acquire("dana").unwrap());
        assert_eq!(quota.status("dana").remaining, 4);
        assert_eq!(quota.status("dana").remaining, 4);
        assert_eq!(quota.status("nobody").remaining, 5);
    }

    #[test]
    fn test_quota_file_reset() {
        let dir = tempfile::tempdir().unwrap();
        let quota = quota_in(&dir, 1, 3600);

        assert!(quota.try_acquire("dana").unwrap());
        assert!(!quota.try_acquire("dana").unwrap());

        quota.reset("dana").unwrap();
        assert!(quota.try_acquire("dana").unwrap());
    }
}
