//! Health command - diagnose configuration, credentials and connectivity

use crate::context::CommandContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_api_client::ApiResult;
use querydeck_cli::output::banner;
use querydeck_core::health::{
    CheckResult, ConfigCheck, HealthChecker, HealthReport, HealthStatus,
};
use std::future::Future;
use std::time::{Duration, Instant};

/// Run health checks and print the report.
///
/// Always exits successfully; the report itself is the product. Scripts
/// that need the status should parse `--format json`.
pub async fn run(config_path: Option<&str>, detailed: bool, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let start = Instant::now();

    let base = HealthChecker::new()
        .add_check(ConfigCheck::new(ctx.config.path.clone()))
        .with_standard_checks()
        .run();

    let mut checks = base.checks;
    checks.push(library_check(&ctx));

    if detailed {
        checks.extend(probe_integrations(&ctx).await);
    }

    let report = HealthReport::new(checks, start.elapsed());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    banner("🩺 Health Check");

    for check in &report.checks {
        let glyph = match check.status {
            HealthStatus::Healthy => "✓".green().to_string(),
            HealthStatus::Degraded => "⚠".yellow().to_string(),
            HealthStatus::Unhealthy => "✗".red().to_string(),
            HealthStatus::Unknown => "○".cyan().to_string(),
        };
        let message = check
            .message
            .as_deref()
            .map(|m| format!("  {}", m))
            .unwrap_or_default();
        let timing = if detailed && check.duration_ms > 0 {
            format!("  ({}ms)", check.duration_ms)
        } else {
            String::new()
        };
        println!(
            "  {} {:<20}{}{}",
            glyph,
            check.name,
            message.dimmed(),
            timing.dimmed()
        );
    }

    println!();
    match report.status {
        HealthStatus::Healthy => println!("  {}", "✓ All checks passed".green()),
        HealthStatus::Degraded => println!(
            "  {}",
            "⚠ Operational; some optional checks did not pass".yellow()
        ),
        _ => println!(
            "  {}",
            format!("✗ {} check(s) failed", report.failed_checks().len()).red()
        ),
    }
    println!(
        "  {}",
        format!(
            "querydeck {} in {}ms",
            report.version, report.total_duration_ms
        )
        .dimmed()
    );
    println!();

    Ok(())
}

/// Library store check: degraded before `init`, unhealthy when unreadable
fn library_check(ctx: &CommandContext) -> CheckResult {
    let path = ctx.config.library_path();
    if !path.exists() {
        return CheckResult::degraded("library", "Library not initialized (run `querydeck init`)");
    }
    match ctx.open_store() {
        Ok(store) => CheckResult::healthy("library")
            .with_detail("path", path.display().to_string())
            .with_detail("queries", store.query_count().to_string()),
        Err(e) => CheckResult::unhealthy("library", e.to_string()),
    }
}

/// Probe each integration that has credentials configured.
///
/// Missing credentials degrade the probe rather than failing it; the env
/// var checks already point at what to set.
async fn probe_integrations(ctx: &CommandContext) -> Vec<CheckResult> {
    let client = match ctx.api_client() {
        Ok(client) => client,
        Err(e) => {
            return vec![CheckResult::unhealthy("api client", format!("{:#}", e))];
        }
    };
    let cfg = client.config().clone();
    let mut results = Vec::new();

    if cfg.sumo_access_id.is_some() && cfg.sumo_access_key.is_some() {
        let sumo = client.sumo();
        results.push(probe("sumo api", sumo.ping()).await);
    } else {
        results.push(skipped("sumo api"));
    }

    if cfg.confluence_base_url.is_some() && cfg.confluence_token.is_some() {
        let confluence = client.confluence();
        results.push(probe("confluence api", confluence.ping()).await);
    } else {
        results.push(skipped("confluence api"));
    }

    if cfg.gemini_api_key.is_some() {
        let gemini = client.gemini();
        results.push(probe("gemini api", gemini.ping()).await);
    } else {
        results.push(skipped("gemini api"));
    }

    results
}

async fn probe<F>(name: &str, call: F) -> CheckResult
where
    F: Future<Output = ApiResult<Duration>>,
{
    match call.await {
        Ok(elapsed) => CheckResult::healthy(name).with_duration(elapsed),
        Err(e) => CheckResult::unhealthy(name, e.to_string()),
    }
}

fn skipped(name: &str) -> CheckResult {
    CheckResult::degraded(name, "Credentials not configured; probe skipped")
}
