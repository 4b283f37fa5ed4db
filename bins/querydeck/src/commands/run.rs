//! Run command - execute a saved query through the Search Job API
//!
//! Starts a search job over the requested time range, polls until it
//! finishes, prints a page of messages, and deletes the job.

use crate::context::CommandContext;
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use owo_colors::OwoColorize;
use querydeck_api_client::endpoints::sumo::{
    LogMessage, SearchJobRequest, SearchJobState, SearchJobStatus, SumoApi,
};
use querydeck_cli::output::{banner, format_count};
use querydeck_cli::progress::{finish_error, finish_success, spinner};
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use querydeck_core::Error;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// How often a running job is polled
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct JsonRunOutput {
    key: String,
    query: String,
    from: String,
    to: String,
    state: SearchJobState,
    message_count: u64,
    record_count: u64,
    messages: Vec<JsonMessage>,
}

#[derive(Debug, Serialize)]
struct JsonMessage {
    timestamp_ms: Option<i64>,
    raw: Option<String>,
}

struct JobOutcome {
    status: SearchJobStatus,
    messages: Vec<LogMessage>,
}

/// Run a saved query as a search job
#[allow(clippy::too_many_arguments)]
pub async fn run(
    config_path: Option<&str>,
    selector: &str,
    category: Option<&str>,
    from: &str,
    to: Option<&str>,
    tz: &str,
    limit: usize,
    timeout: u64,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;
    let record = store.resolve(selector, category)?;

    let now = Utc::now();
    let from = resolve_time(from, now)?;
    let to = match to {
        Some(expr) => resolve_time(expr, now)?,
        None => format_timestamp(now),
    };

    let client = ctx.api_client()?;
    let sumo = client.sumo();
    let request = SearchJobRequest::new(&record.query, &from, &to).with_time_zone(tz);

    if format == "json" {
        let outcome = execute_job(&sumo, &request, limit, timeout).await?;
        finish_bookkeeping(&ctx, &store, &record, &outcome)?;

        let output = JsonRunOutput {
            key: record.key,
            query: record.query,
            from,
            to,
            state: outcome.status.state,
            message_count: outcome.status.message_count,
            record_count: outcome.status.record_count,
            messages: outcome
                .messages
                .iter()
                .map(|m| JsonMessage {
                    timestamp_ms: m.timestamp_ms(),
                    raw: m.raw().map(String::from),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner(&format!("🚀 Run: {}", record.key));

    println!("  {}", record.query.dimmed());
    println!("  {} to {} ({})", from.cyan(), to.cyan(), tz);
    println!();

    let pb = spinner("Running search job...");
    let outcome = match execute_job(&sumo, &request, limit, timeout).await {
        Ok(outcome) => {
            finish_success(&pb, "Search job finished");
            outcome
        }
        Err(e) => {
            finish_error(&pb, "Search job failed");
            return Err(e);
        }
    };

    finish_bookkeeping(&ctx, &store, &record, &outcome)?;

    println!();
    for warning in &outcome.status.pending_warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    if outcome.messages.is_empty() {
        println!("  No messages in this time range");
    } else {
        for message in &outcome.messages {
            let time = message
                .timestamp_ms()
                .and_then(DateTime::from_timestamp_millis)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "--:--:--".to_string());

            match message.raw() {
                Some(raw) => println!("  {}  {}", time.dimmed(), raw),
                None => println!(
                    "  {}  {}",
                    time.dimmed(),
                    serde_json::to_string(&message.map)?
                ),
            }
        }
    }

    println!();
    println!(
        "  {} gathered, showing {}",
        format_count(outcome.status.message_count as usize, "message", "messages"),
        outcome.messages.len()
    );
    println!();

    Ok(())
}

/// Start, wait for, page, and delete one search job.
async fn execute_job(
    sumo: &SumoApi,
    request: &SearchJobRequest,
    limit: usize,
    timeout: u64,
) -> Result<JobOutcome> {
    let handle = sumo.start_search_job(request).await?;

    let status = match sumo
        .wait_for_completion(&handle.id, POLL_INTERVAL, Duration::from_secs(timeout))
        .await
    {
        Ok(status) => status,
        Err(e) => {
            // The job may still be running; clean it up before bailing
            if let Err(del) = sumo.delete_search_job(&handle.id).await {
                warn!(job_id = %handle.id, error = %del, "failed to delete search job");
            }
            return Err(e.into());
        }
    };

    if !status.is_done() {
        let detail = status
            .pending_errors
            .first()
            .cloned()
            .unwrap_or_else(|| "no further detail".to_string());
        if let Err(del) = sumo.delete_search_job(&handle.id).await {
            warn!(job_id = %handle.id, error = %del, "failed to delete search job");
        }
        return Err(Error::new(
            querydeck_core::ErrorCode::SumoError,
            format!("Search job ended in state {:?}: {}", status.state, detail),
        )
        .into());
    }

    let messages = if limit > 0 && status.message_count > 0 {
        sumo.search_job_messages(&handle.id, 0, limit as u32)
            .await?
            .messages
    } else {
        Vec::new()
    };

    if let Err(del) = sumo.delete_search_job(&handle.id).await {
        warn!(job_id = %handle.id, error = %del, "failed to delete search job");
    }

    Ok(JobOutcome { status, messages })
}

/// Record usage and log the run once the job has finished.
fn finish_bookkeeping(
    ctx: &CommandContext,
    store: &querydeck_library::store::LibraryStore,
    record: &querydeck_library::types::QueryRecord,
    outcome: &JobOutcome,
) -> Result<()> {
    store.record_usage(record.id)?;
    ctx.activity.log(
        ActivityEvent::new(ActivityKind::QueryUsed, &record.key)
            .with_actor(ctx.actor())
            .with_detail("mode", "run")
            .with_detail("messages", outcome.status.message_count.to_string()),
    );
    Ok(())
}

/// Turn a relative expression like `-15m` into an ISO 8601 timestamp,
/// or pass an absolute timestamp through unchanged.
fn resolve_time(expr: &str, now: DateTime<Utc>) -> Result<String> {
    let trimmed = expr.trim();

    if let Some(rest) = trimmed.strip_prefix('-') {
        if let Some(minutes) = parse_relative(rest) {
            return Ok(format_timestamp(now - ChronoDuration::minutes(minutes)));
        }
    }

    if DateTime::parse_from_rfc3339(trimmed).is_ok()
        || NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").is_ok()
    {
        return Ok(trimmed.to_string());
    }

    Err(Error::validation(format!("Unrecognized time '{}'", expr))
        .with_suggestion("Use a relative offset like -15m, -2h, -1d, or an ISO 8601 timestamp")
        .into())
}

/// Parse the body of a relative offset (`15m`, `2h`, `1d`, `1w`) into minutes.
fn parse_relative(rest: &str) -> Option<i64> {
    let unit = rest.chars().last()?;
    let value: i64 = rest.get(..rest.len() - unit.len_utf8())?.parse().ok()?;
    match unit {
        'm' => Some(value),
        'h' => Some(value * 60),
        'd' => Some(value * 24 * 60),
        'w' => Some(value * 7 * 24 * 60),
        _ => None,
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_resolve_relative_minutes() {
        let resolved = resolve_time("-15m", base_time()).unwrap();
        assert_eq!(resolved, "2026-03-14T11:45:00");
    }

    #[test]
    fn test_resolve_relative_hours_and_days() {
        assert_eq!(resolve_time("-2h", base_time()).unwrap(), "2026-03-14T10:00:00");
        assert_eq!(resolve_time("-1d", base_time()).unwrap(), "2026-03-13T12:00:00");
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let resolved = resolve_time("2026-01-01T00:00:00", base_time()).unwrap();
        assert_eq!(resolved, "2026-01-01T00:00:00");
    }

    #[test]
    fn test_resolve_rejects_nonsense() {
        assert!(resolve_time("yesterday", base_time()).is_err());
        assert!(resolve_time("-15x", base_time()).is_err());
    }
}
