//! Ask command - assistant-backed query generation and explanation
//!
//! Prompts are quota-gated per user; the quota file persists across runs
//! so the limit holds even though each invocation is a fresh process.

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_api_client::ApiError;
use querydeck_cli::output::{banner, format_duration, Status};
use querydeck_cli::progress::{finish_error, finish_success, spinner};
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use querydeck_core::{Error, ErrorCode};
use querydeck_library::suggest::{parse_suggestion, QuerySuggestion};
use querydeck_library::types::NewQuery;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct JsonGenerateOutput {
    intent: String,
    suggestion: QuerySuggestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct JsonExplainOutput {
    target: String,
    query: String,
    explanation: String,
}

/// Generate a query from an intent description
pub async fn generate(
    config_path: Option<&str>,
    intent: &str,
    save: bool,
    category: &str,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let actor = check_quota(&ctx)?;

    let prompt = generate_prompt(intent);
    let reply = prompt_with_spinner(&ctx, &actor, &prompt, intent, format).await?;

    let suggestion = parse_suggestion(&reply)
        .map_err(|e| Error::new(ErrorCode::ResponseMalformed, e.to_string()))?;

    let saved = if save {
        let store = ctx.open_store()?;
        let record = store.add_query(NewQuery {
            category: category.to_string(),
            key: suggestion
                .title
                .clone()
                .unwrap_or_else(|| fallback_key(intent)),
            query: suggestion.query.clone(),
            tags: suggestion.tags.clone(),
        })?;
        ctx.activity.log(
            ActivityEvent::new(ActivityKind::QueryAdded, &record.key)
                .with_actor(&actor)
                .with_detail("category", &record.category)
                .with_detail("source", "assist"),
        );
        Some(record)
    } else {
        None
    };

    if format == "json" {
        let output = JsonGenerateOutput {
            intent: intent.to_string(),
            suggestion,
            saved_id: saved.map(|r| r.id.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner("🤖 Query Suggestion");

    if let Some(title) = &suggestion.title {
        println!("  {}", title.bold());
        println!();
    }
    for line in suggestion.query.lines() {
        println!("    {}", line.cyan());
    }
    if let Some(explanation) = &suggestion.explanation {
        println!();
        for line in explanation.lines() {
            println!("  {}", line.dimmed());
        }
    }
    if !suggestion.tags.is_empty() {
        println!();
        println!("  tags: {}", suggestion.tags.join(", ").dimmed());
    }
    println!();

    match saved {
        Some(record) => Status::success(&format!(
            "Saved as '{}' in {}",
            record.key.bold(),
            record.category.cyan()
        )),
        None => Status::info("Re-run with --save to add it to the library"),
    }
    println!();

    Ok(())
}

/// Explain a saved or ad-hoc query
pub async fn explain(
    config_path: Option<&str>,
    selector: Option<&str>,
    query: Option<&str>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;

    let (target, query_text) = match (query, selector) {
        (Some(q), _) => ("ad-hoc query".to_string(), q.to_string()),
        (None, Some(sel)) => {
            let store = ctx.open_store()?;
            let record = store.resolve(sel, None)?;
            (record.key, record.query)
        }
        (None, None) => {
            return Err(Error::new(
                ErrorCode::InvalidInput,
                "Pass a query id/key or --query",
            )
            .into())
        }
    };

    let actor = check_quota(&ctx)?;
    let prompt = explain_prompt(&query_text);
    let explanation = prompt_with_spinner(&ctx, &actor, &prompt, &target, format).await?;

    if format == "json" {
        let output = JsonExplainOutput {
            target,
            query: query_text,
            explanation,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner(&format!("🤖 Explain: {}", target));

    for line in query_text.lines() {
        println!("    {}", line.cyan());
    }
    println!();
    for line in explanation.lines() {
        println!("  {}", line);
    }
    println!();

    Ok(())
}

/// Enforce the assist gate and per-user quota, returning the actor name.
fn check_quota(ctx: &CommandContext) -> Result<String> {
    if !ctx.config.schema.assist.enabled {
        return Err(Error::config("The assistant is disabled")
            .with_suggestion("Set enabled = true under [assist] in .querydeck.toml")
            .into());
    }

    let actor = ctx.actor();
    let quota = ctx.assist_quota();
    if !quota.try_acquire(&actor)? {
        ctx.activity.log_throttled(&actor);
        let status = quota.status(&actor);
        return Err(Error::rate_limited(&actor)
            .with_context(format!(
                "{} prompts per hour; resets in {}",
                status.limit,
                format_duration(status.resets_in)
            ))
            .into());
    }

    Ok(actor)
}

/// Send one prompt, logging the outcome and spinning in text mode.
async fn prompt_with_spinner(
    ctx: &CommandContext,
    actor: &str,
    prompt: &str,
    target: &str,
    format: &str,
) -> Result<String> {
    let pb = if format == "json" {
        None
    } else {
        Some(spinner("Asking the assistant..."))
    };

    match send_prompt(ctx, actor, prompt, target).await {
        Ok(reply) => {
            if let Some(pb) = &pb {
                finish_success(pb, "Reply received");
            }
            Ok(reply)
        }
        Err(e) => {
            if let Some(pb) = &pb {
                finish_error(pb, "Assistant call failed");
            }
            Err(e)
        }
    }
}

async fn send_prompt(
    ctx: &CommandContext,
    actor: &str,
    prompt: &str,
    target: &str,
) -> Result<String> {
    let client = ctx.api_client()?;
    let start = Instant::now();

    match client.gemini().generate_text(prompt).await {
        Ok(reply) => {
            ctx.activity.log(
                ActivityEvent::new(ActivityKind::AssistPromptSent, target)
                    .with_actor(actor)
                    .with_duration(start.elapsed().as_millis() as u64),
            );
            Ok(reply)
        }
        Err(e) => {
            if matches!(e, ApiError::SafetyBlocked { .. }) {
                ctx.activity.log(
                    ActivityEvent::new(ActivityKind::AssistBlocked, target)
                        .with_actor(actor)
                        .failed(),
                );
            }
            Err(e.into())
        }
    }
}

fn generate_prompt(intent: &str) -> String {
    format!(
        "You are helping an engineer write a SumoLogic query.\n\
         Request: {}\n\n\
         Reply with a line `Title: <short name>`, a line `Tags: <comma-separated labels>`,\n\
         the query itself in a fenced code block, and one short paragraph explaining it.",
        intent
    )
}

fn explain_prompt(query: &str) -> String {
    format!(
        "Explain what this SumoLogic query does, step by step, for an engineer\n\
         who knows the platform but not this query. Keep it under 150 words.\n\n\
         ```\n{}\n```",
        query
    )
}

/// Derive a library key from the intent when the reply offered no title.
fn fallback_key(intent: &str) -> String {
    intent.trim().chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prompt_carries_intent() {
        let prompt = generate_prompt("failed logins by host");
        assert!(prompt.contains("failed logins by host"));
        assert!(prompt.contains("Title:"));
    }

    #[test]
    fn test_explain_prompt_fences_the_query() {
        let prompt = explain_prompt("_sourceCategory=prod | count");
        assert!(prompt.contains("```\n_sourceCategory=prod | count\n```"));
    }

    #[test]
    fn test_fallback_key_truncates() {
        let long = "x".repeat(200);
        assert_eq!(fallback_key(&long).len(), 80);
        assert_eq!(fallback_key("  short  "), "short");
    }
}
