//! Use command - print a saved query and record the usage
//!
//! The query text is the only thing on stdout so the command pipes
//! cleanly into other tools; confirmation goes to stderr.

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonUseOutput {
    id: String,
    key: String,
    query: String,
    usage_count: u64,
}

/// Run use command
pub fn run(
    config_path: Option<&str>,
    selector: &str,
    category: Option<&str>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let record = store.resolve(selector, category)?;
    let count = store.record_usage(record.id)?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::QueryUsed, &record.key)
            .with_actor(ctx.actor())
            .with_detail("usage_count", count.to_string()),
    );

    if format == "json" {
        let output = JsonUseOutput {
            id: record.id.to_string(),
            key: record.key,
            query: record.query,
            usage_count: count,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", record.query);
    eprintln!(
        "{} {}",
        "✓".green(),
        format!("Use #{} of '{}'", count, record.key).dimmed()
    );

    Ok(())
}
