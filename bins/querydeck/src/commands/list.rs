//! List command - browse the library without ranking

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::{banner, format_count};
use querydeck_library::search::browse_queries;
use querydeck_library::types::QueryRecord;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonListOutput {
    category: Option<String>,
    total: usize,
    queries: Vec<QueryRecord>,
}

/// Run list command
pub fn run(
    config_path: Option<&str>,
    category: Option<&str>,
    limit: Option<usize>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;
    let cap = limit.unwrap_or_else(|| ctx.result_cap());

    let queries = browse_queries(&store, category, cap);

    if format == "json" {
        let output = JsonListOutput {
            category: category.map(String::from),
            total: queries.len(),
            queries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match category {
        Some(c) => banner(&format!("📚 Saved Queries: {}", c)),
        None => banner("📚 Saved Queries"),
    }

    if queries.is_empty() {
        match category {
            Some(c) => println!("  No queries in category '{}'", c.yellow()),
            None => println!("  The library is empty. Run `querydeck init` to seed it."),
        }
        println!();
        return Ok(());
    }

    let mut current_category = String::new();
    for record in &queries {
        if record.category != current_category {
            current_category = record.category.clone();
            println!("  {}", current_category.cyan().bold());
        }

        let tags = if record.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", record.tags.join(", "))
        };

        println!(
            "    {}{}  {}",
            record.key,
            tags.dimmed(),
            format_count(record.usage_count as usize, "use", "uses").dimmed()
        );
    }

    println!();
    let categories = store.categories();
    println!(
        "  {} across {}",
        format_count(store.query_count(), "query", "queries"),
        format_count(categories.len(), "category", "categories")
    );
    println!();

    Ok(())
}
