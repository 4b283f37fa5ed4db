//! Remove command - delete a saved query

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::Status;
use querydeck_core::activity::{ActivityEvent, ActivityKind};

/// Run remove command
pub fn run(
    config_path: Option<&str>,
    selector: &str,
    category: Option<&str>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let record = store.resolve(selector, category)?;
    let removed = store.remove_query(record.id)?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::QueryRemoved, &removed.key)
            .with_actor(ctx.actor())
            .with_detail("category", &removed.category),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&removed)?);
        return Ok(());
    }

    Status::success(&format!(
        "Removed '{}' from {}",
        removed.key.bold(),
        removed.category.cyan()
    ));

    Ok(())
}
