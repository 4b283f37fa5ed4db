//! Link command - append a link to the Confluence tracking page

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_api_client::endpoints::confluence::TrackedLink;
use querydeck_cli::output::Status;
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonLinkOutput {
    title: String,
    url: String,
    page_id: String,
    page_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_url: Option<String>,
}

/// Run link command
pub async fn run(
    config_path: Option<&str>,
    title: &str,
    url: &str,
    note: Option<String>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let page_id = ctx.confluence_page_id()?;
    let client = ctx.api_client()?;

    let mut link = TrackedLink::new(title, url);
    if let Some(note) = note {
        link = link.with_note(note);
    }

    let page = client.confluence().append_link(&page_id, &link).await?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::LinkPublished, title)
            .with_actor(ctx.actor())
            .with_detail("page_id", &page_id)
            .with_detail("url", url),
    );

    if format == "json" {
        let output = JsonLinkOutput {
            title: title.to_string(),
            url: url.to_string(),
            page_id,
            page_version: page.version.number,
            page_url: page.web_url(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Status::success(&format!("Added '{}' to {}", title.bold(), page.title));
    if let Some(page_url) = page.web_url() {
        println!("  {}", page_url.cyan().underline());
    }

    Ok(())
}
