//! Dashboard command - generate a dashboard from matching queries
//!
//! Dry-run by default: prints the definition that would be created.
//! `--apply` creates it through the Dashboard API, `--publish` then
//! appends the link to the Confluence tracking page.

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_api_client::endpoints::confluence::TrackedLink;
use querydeck_api_client::endpoints::sumo::{DashboardBuilder, DashboardRequest};
use querydeck_cli::output::{banner, format_count, Status};
use querydeck_cli::progress::{finish_error, finish_success, spinner};
use querydeck_core::activity::{ActivityEvent, ActivityKind};
use querydeck_core::{Error, ErrorCode};
use querydeck_library::search::search_queries;
use querydeck_library::store::LibraryStore;
use querydeck_library::types::QueryRecord;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct JsonDashboardOutput {
    title: String,
    dry_run: bool,
    panel_count: usize,
    panels: Vec<JsonPanel>,
    definition: DashboardRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_to: Option<String>,
}

#[derive(Debug, Serialize)]
struct JsonPanel {
    id: String,
    key: String,
    category: String,
}

/// Run dashboard command
#[allow(clippy::too_many_arguments)]
pub async fn run(
    config_path: Option<&str>,
    term: Option<&str>,
    ids: Option<&str>,
    title: Option<String>,
    limit: usize,
    service: Option<&str>,
    time_range: &str,
    apply: bool,
    publish: bool,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.open_store()?;

    let records = select_queries(&store, term, ids, limit)?;
    if records.is_empty() {
        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "dry_run": !apply,
                "panel_count": 0,
            }))?);
        } else {
            Status::warning("No matching queries; nothing to build");
        }
        return Ok(());
    }

    let source_category = match service {
        Some(s) => {
            let mapping = store.mapping_for(s).ok_or_else(|| {
                Error::new(
                    ErrorCode::MappingNotFound,
                    format!("No mapping for service '{}'", s),
                )
                .with_suggestion("Run `querydeck mapping list` to see configured services")
            })?;
            Some(mapping.source_category)
        }
        None => None,
    };

    let title = title.unwrap_or_else(|| match term {
        Some(t) => format!("Querydeck: {}", t),
        None => "Querydeck dashboard".to_string(),
    });

    let mut builder = DashboardBuilder::new(&title)
        .description("Generated by querydeck from the query library")
        .time_range(time_range);
    for record in &records {
        builder = builder.add_query_panel(&record.key, &record.query, source_category.as_deref());
    }
    let definition = builder.build();

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::DashboardGenerated, &title)
            .with_actor(ctx.actor())
            .with_detail("panels", records.len().to_string())
            .with_detail("applied", apply.to_string()),
    );

    let panels: Vec<JsonPanel> = records
        .iter()
        .map(|r| JsonPanel {
            id: r.id.to_string(),
            key: r.key.clone(),
            category: r.category.clone(),
        })
        .collect();

    if !apply {
        if format == "json" {
            let output = JsonDashboardOutput {
                title,
                dry_run: true,
                panel_count: records.len(),
                panels,
                definition,
                dashboard_id: None,
                dashboard_url: None,
                published_to: None,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        banner(&format!("📊 Dashboard (dry-run): {}", title));

        print_panels(&records, source_category.as_deref());
        println!();
        println!("{}", serde_json::to_string_pretty(&definition)?);
        println!();
        Status::info("Dry-run only; use --apply to create the dashboard");
        println!();
        return Ok(());
    }

    let client = ctx.api_client()?;
    let deployment = client.config().sumo_deployment;

    if format == "json" {
        let response = client.sumo().create_dashboard(&definition).await?;
        let url = dashboard_url(deployment.service_base(), &response.id);
        let published_to = if publish {
            Some(publish_link(&ctx, &client, &title, &url, records.len()).await?)
        } else {
            None
        };

        let output = JsonDashboardOutput {
            title,
            dry_run: false,
            panel_count: records.len(),
            panels,
            definition,
            dashboard_id: Some(response.id),
            dashboard_url: Some(url),
            published_to,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner(&format!("📊 Dashboard: {}", title));
    print_panels(&records, source_category.as_deref());
    println!();

    let pb = spinner("Creating dashboard...");
    let response = match client.sumo().create_dashboard(&definition).await {
        Ok(r) => {
            finish_success(&pb, "Dashboard created");
            r
        }
        Err(e) => {
            finish_error(&pb, "Dashboard creation failed");
            return Err(e.into());
        }
    };

    let url = dashboard_url(deployment.service_base(), &response.id);
    println!("  {}", url.cyan().underline());

    if publish {
        let pb = spinner("Publishing link to Confluence...");
        match publish_link(&ctx, &client, &title, &url, records.len()).await {
            Ok(page_url) => {
                finish_success(&pb, "Link published");
                println!("  {}", page_url.cyan().underline());
            }
            Err(e) => {
                finish_error(&pb, "Publishing failed");
                return Err(e);
            }
        }
    }

    println!();
    Ok(())
}

/// Pick the queries that become panels, by explicit ids or by search.
fn select_queries(
    store: &LibraryStore,
    term: Option<&str>,
    ids: Option<&str>,
    limit: usize,
) -> Result<Vec<QueryRecord>> {
    if let Some(ids) = ids {
        let mut records = Vec::new();
        for raw in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id = Uuid::parse_str(raw).map_err(|_| {
                Error::new(
                    ErrorCode::InvalidInput,
                    format!("Invalid query id '{}'", raw),
                )
            })?;
            let record = store
                .get(id)
                .ok_or_else(|| Error::query_not_found(raw))?;
            records.push(record);
        }
        records.truncate(limit);
        return Ok(records);
    }

    let term = term.ok_or_else(|| {
        Error::new(
            ErrorCode::InvalidInput,
            "Pass a search term or --ids to pick the panels",
        )
    })?;

    Ok(search_queries(store, term, limit)
        .into_iter()
        .map(|r| r.item)
        .collect())
}

fn print_panels(records: &[QueryRecord], source_category: Option<&str>) {
    println!("  {}:", format_count(records.len(), "panel", "panels"));
    for record in records {
        println!("    {} {}", "•".dimmed(), record.key);
    }
    if let Some(sc) = source_category {
        println!();
        println!("  Unscoped queries are scoped to {}", sc.cyan());
    }
}

fn dashboard_url(service_base: &str, dashboard_id: &str) -> String {
    format!("{}/ui/#/dashboardv2/{}", service_base, dashboard_id)
}

/// Append the dashboard link to the tracking page, returning the page URL.
async fn publish_link(
    ctx: &CommandContext,
    client: &querydeck_api_client::QuerydeckClient,
    title: &str,
    url: &str,
    panel_count: usize,
) -> Result<String> {
    let page_id = ctx.confluence_page_id()?;
    let link = TrackedLink::new(title, url)
        .with_note(format!("{}, generated by querydeck", format_count(panel_count, "panel", "panels")));

    let page = client.confluence().append_link(&page_id, &link).await?;

    ctx.activity.log(
        ActivityEvent::new(ActivityKind::LinkPublished, title)
            .with_actor(ctx.actor())
            .with_detail("page_id", &page_id),
    );

    Ok(page.web_url().unwrap_or_else(|| page_id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_url_shape() {
        let url = dashboard_url("https://service.eu.sumologic.com", "abc123");
        assert_eq!(url, "https://service.eu.sumologic.com/ui/#/dashboardv2/abc123");
    }
}
