//! Activity command - show recent events from the activity log

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::{banner, format_count};
use querydeck_core::activity::{ActivityEvent, ActivityKind, ActivitySeverity};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonActivityOutput {
    total: usize,
    events: Vec<ActivityEvent>,
}

/// Show recent activity events, newest first
pub fn run(
    config_path: Option<&str>,
    limit: usize,
    kind: Option<&str>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;

    if !ctx.config.schema.activity.enabled {
        if format == "json" {
            let output = JsonActivityOutput {
                total: 0,
                events: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "{} Activity logging is disabled (set enabled = true under [activity])",
                "ℹ".cyan()
            );
        }
        return Ok(());
    }

    let filter = kind.map(parse_kind).transpose()?;

    // Over-fetch when filtering so the kind filter can still fill the page
    let fetch = match filter {
        Some(_) => limit.saturating_mul(20),
        None => limit,
    };

    let mut events = ctx.activity.recent_events(fetch).unwrap_or_default();
    if let Some(wanted) = filter {
        events.retain(|e| e.kind == wanted);
        events.truncate(limit);
    }

    if format == "json" {
        let output = JsonActivityOutput {
            total: events.len(),
            events,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner("📋 Recent Activity");

    if events.is_empty() {
        println!("  No activity recorded yet");
        println!();
        return Ok(());
    }

    for event in &events {
        let glyph = if event.success {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        let label = kind_label(event.kind);
        let kind_col = match event.severity {
            ActivitySeverity::Low => label.dimmed().to_string(),
            ActivitySeverity::Medium => label.yellow().to_string(),
            _ => label.red().to_string(),
        };
        let duration = event
            .duration_ms
            .map(|ms| format!("  ({}ms)", ms))
            .unwrap_or_default();
        println!(
            "  {}  {}  {:<20}  {}{}  {}",
            event.timestamp.format("%Y-%m-%d %H:%M"),
            glyph,
            kind_col,
            event.target.bold(),
            duration.dimmed(),
            event.actor.dimmed()
        );
    }

    println!();
    println!("  {}", format_count(events.len(), "event", "events"));
    println!();

    Ok(())
}

/// Parse a kind filter from its wire name, case-insensitively
fn parse_kind(input: &str) -> Result<ActivityKind> {
    let normalized = input.to_uppercase();
    serde_json::from_str(&format!("\"{}\"", normalized)).map_err(|_| {
        querydeck_core::Error::validation(format!("Unknown activity kind '{}'", input))
            .with_suggestion("Try QUERY_ADDED, SEARCH_PERFORMED or LINK_PUBLISHED")
            .into()
    })
}

fn kind_label(kind: ActivityKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_accepts_lowercase() {
        assert_eq!(parse_kind("query_added").unwrap(), ActivityKind::QueryAdded);
        assert_eq!(
            parse_kind("SEARCH_PERFORMED").unwrap(),
            ActivityKind::SearchPerformed
        );
    }

    #[test]
    fn test_parse_kind_rejects_garbage() {
        assert!(parse_kind("coffee_break").is_err());
    }

    #[test]
    fn test_kind_label_is_wire_name() {
        assert_eq!(kind_label(ActivityKind::LinkPublished), "LINK_PUBLISHED");
    }
}
