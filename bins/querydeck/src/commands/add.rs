//! Add command - save a query to the library

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::Status;
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use querydeck_library::types::{parse_tag_list, NewQuery};

/// Run add command
pub fn run(
    config_path: Option<&str>,
    category: &str,
    key: &str,
    query: &str,
    tags: &str,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let record = store.add_query(NewQuery {
        category: category.to_string(),
        key: key.to_string(),
        query: query.to_string(),
        tags: parse_tag_list(tags),
    })?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::QueryAdded, &record.key)
            .with_actor(ctx.actor())
            .with_detail("category", &record.category),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    Status::success(&format!(
        "Saved '{}' to {}",
        record.key.bold(),
        record.category.cyan()
    ));
    println!("  id: {}", record.id.to_string().dimmed());

    Ok(())
}
