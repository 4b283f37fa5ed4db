//! Show command - one saved query in full

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::{banner, format_count};

/// Run show command
pub fn run(
    config_path: Option<&str>,
    selector: &str,
    category: Option<&str>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let record = store.resolve(selector, category)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    banner(&format!("📄 {}", record.key));

    println!("  {:<10} {}", "id".dimmed(), record.id);
    println!("  {:<10} {}", "category".dimmed(), record.category.cyan());
    if !record.tags.is_empty() {
        println!("  {:<10} {}", "tags".dimmed(), record.tags.join(", "));
    }
    println!(
        "  {:<10} {}",
        "usage".dimmed(),
        format_count(record.usage_count as usize, "use", "uses")
    );
    println!(
        "  {:<10} {}",
        "created".dimmed(),
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  {:<10} {}",
        "updated".dimmed(),
        record.updated_at.format("%Y-%m-%d %H:%M UTC")
    );

    println!();
    for line in record.query.lines() {
        println!("    {}", line);
    }
    println!();

    Ok(())
}
