//! Search command - ranked lookup over the query library

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::{banner, format_count, format_score};
use querydeck_library::search::search_queries;
use querydeck_search::{MIN_SIMILARITY, TAG_MATCH_SCORE};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct JsonSearchOutput {
    term: String,
    total: usize,
    results: Vec<JsonSearchResult>,
}

#[derive(Debug, Serialize)]
struct JsonSearchResult {
    score: f64,
    id: String,
    category: String,
    key: String,
    query: String,
    tags: Vec<String>,
    usage_count: u64,
}

/// Run search command
pub fn run(config_path: Option<&str>, term: &str, limit: Option<usize>, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;
    let cap = limit.unwrap_or_else(|| ctx.result_cap());

    let start = Instant::now();
    let results = search_queries(&store, term, cap);
    let elapsed = start.elapsed();

    ctx.activity
        .log_search(term, results.len(), elapsed.as_millis() as u64);

    if format == "json" {
        let output = JsonSearchOutput {
            term: term.to_string(),
            total: results.len(),
            results: results
                .iter()
                .map(|r| JsonSearchResult {
                    score: r.score,
                    id: r.item.id.to_string(),
                    category: r.item.category.clone(),
                    key: r.item.key.clone(),
                    query: r.item.query.clone(),
                    tags: r.item.tags.clone(),
                    usage_count: r.item.usage_count,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner("🔎 Query Library Search");

    if results.is_empty() {
        println!("  No matches for '{}'", term.yellow());
        println!(
            "  Try a broader term, or `querydeck ask generate \"{}\"` to draft one",
            term
        );
        println!();
        return Ok(());
    }

    for result in &results {
        let score = format_score(result.score);
        let score_display = if result.score >= TAG_MATCH_SCORE {
            score.green().to_string()
        } else if result.score >= MIN_SIMILARITY {
            score.yellow().to_string()
        } else {
            score.dimmed().to_string()
        };

        let tags = if result.item.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", result.item.tags.join(", "))
        };

        println!(
            "  {:>4}  {}/{}{}  {}",
            score_display,
            result.item.category.cyan(),
            result.item.key.bold(),
            tags.dimmed(),
            format_count(result.item.usage_count as usize, "use", "uses").dimmed()
        );
        println!("        {}", result.item.query.dimmed());
    }

    println!();
    println!(
        "  {} in {}ms",
        format_count(results.len(), "match", "matches"),
        elapsed.as_millis()
    );
    println!();

    Ok(())
}
