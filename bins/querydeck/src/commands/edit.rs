//! Edit command - partial update of a saved query

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::Status;
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use querydeck_library::types::{parse_tag_list, QueryPatch};

/// Run edit command
#[allow(clippy::too_many_arguments)]
pub fn run(
    config_path: Option<&str>,
    selector: &str,
    category: Option<&str>,
    new_category: Option<String>,
    key: Option<String>,
    query: Option<String>,
    tags: Option<String>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let record = store.resolve(selector, category)?;

    let patch = QueryPatch {
        category: new_category,
        key,
        query,
        tags: tags.as_deref().map(parse_tag_list),
    };

    if patch.category.is_none() && patch.key.is_none() && patch.query.is_none() && patch.tags.is_none()
    {
        Status::warning("Nothing to change; pass --new-category, --key, --query or --tags");
        return Ok(());
    }

    let updated = store.update_query(record.id, patch)?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::QueryUpdated, &updated.key)
            .with_actor(ctx.actor())
            .with_detail("category", &updated.category),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&updated)?);
        return Ok(());
    }

    Status::success(&format!(
        "Updated '{}' in {}",
        updated.key.bold(),
        updated.category.cyan()
    ));

    Ok(())
}
