//! Mapping commands - service to source-category table

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::{banner, format_count, Status};
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use querydeck_library::types::LogMapping;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonMappingList {
    total: usize,
    mappings: Vec<LogMapping>,
}

/// List configured mappings
pub fn list(config_path: Option<&str>, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;
    let mappings = store.mappings();

    if format == "json" {
        let output = JsonMappingList {
            total: mappings.len(),
            mappings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner("🗺  Log Mappings");

    if mappings.is_empty() {
        println!("  No mappings configured");
        println!("  Add one with `querydeck mapping add <service> <source-category>`");
        println!();
        return Ok(());
    }

    let width = mappings.iter().map(|m| m.service.len()).max().unwrap_or(0);
    for mapping in &mappings {
        let note = mapping
            .notes
            .as_deref()
            .map(|n| format!("  ({})", n))
            .unwrap_or_default();
        println!(
            "  {:<w$}  {}{}",
            mapping.service.bold(),
            mapping.source_category.cyan(),
            note.dimmed(),
            w = width
        );
    }

    println!();
    println!("  {}", format_count(mappings.len(), "mapping", "mappings"));
    println!();

    Ok(())
}

/// Add a mapping
pub fn add(
    config_path: Option<&str>,
    service: &str,
    source_category: &str,
    note: Option<String>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let mapping = store.add_mapping(service, source_category, note)?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::MappingAdded, &mapping.service)
            .with_actor(ctx.actor())
            .with_detail("source_category", &mapping.source_category),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&mapping)?);
        return Ok(());
    }

    Status::success(&format!(
        "Mapped {} to {}",
        mapping.service.bold(),
        mapping.source_category.cyan()
    ));

    Ok(())
}

/// Remove a mapping
pub fn remove(config_path: Option<&str>, service: &str, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let removed = store.remove_mapping(service)?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::MappingRemoved, &removed.service)
            .with_actor(ctx.actor()),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&removed)?);
        return Ok(());
    }

    Status::success(&format!("Removed mapping for {}", removed.service.bold()));

    Ok(())
}
