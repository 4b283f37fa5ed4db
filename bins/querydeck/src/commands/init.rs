//! Init command - write the config file and seed the library

use anyhow::Result;
use owo_colors::OwoColorize;
use querydeck_cli::output::{banner, Status};
use querydeck_core::activity::{ActivityEvent, ActivityKind, ActivityLog};
use querydeck_core::config::Config;
use querydeck_library::seed::starter_doc;
use querydeck_library::store::LibraryStore;
use querydeck_library::types::LibraryDoc;
use serde::Serialize;
use std::path::Path;

/// Configuration template written by `init`
const CONFIG_TEMPLATE: &str = r#"# Querydeck configuration
# Credentials never live here; export SUMO_ACCESS_ID, SUMO_ACCESS_KEY,
# CONFLUENCE_TOKEN and GEMINI_API_KEY in the environment instead.

[general]
# Name recorded in the activity log. Falls back to $USER.
# user = "dana"
default_category = "general"

[library]
# Store location. Defaults to the platform data directory.
# path = "/shared/querydeck/library.json"
result_cap = 50
seed = true

[sumo]
deployment = "us1"
timeout_secs = 30

[confluence]
# base_url = "https://wiki.example.com"
# page_id = "123456"

[assist]
model = "gemini-2.0-flash"
enabled = true

[rate_limit]
assist_per_hour = 20

[activity]
enabled = true
"#;

#[derive(Debug, Serialize)]
struct JsonInitOutput {
    config_path: String,
    config_created: bool,
    library_path: String,
    library_created: bool,
    seeded: bool,
    queries: usize,
    mappings: usize,
}

/// Run init command
pub fn run(config_path: Option<&str>, no_seed: bool, format: &str) -> Result<()> {
    let target = config_path.unwrap_or(".querydeck.toml");

    let config_created = if Path::new(target).exists() {
        false
    } else {
        std::fs::write(target, CONFIG_TEMPLATE)?;
        true
    };

    let config = Config::load(Some(target))?;
    let library_path = config.library_path();

    let seed = !no_seed && config.schema.library.seed;
    let existed = library_path.exists();

    let store = if existed {
        LibraryStore::open(&library_path)?
    } else {
        if let Some(parent) = library_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let doc = if seed { starter_doc() } else { LibraryDoc::default() };
        LibraryStore::initialize(&library_path, doc)?
    };

    let queries = store.query_count();
    let mappings = store.mappings().len();
    let library_created = !existed;
    let seeded = library_created && seed;

    if config.schema.activity.enabled {
        let activity = ActivityLog::with_config(config.activity_config())?;
        activity.log(
            ActivityEvent::new(ActivityKind::ConfigLoaded, target)
                .with_actor(config.actor())
                .with_detail("library", library_path.display().to_string()),
        );
    }

    if format == "json" {
        let output = JsonInitOutput {
            config_path: target.to_string(),
            config_created,
            library_path: library_path.display().to_string(),
            library_created,
            seeded,
            queries,
            mappings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner("🗂  Querydeck Setup");

    if config_created {
        Status::success(&format!("Wrote {}", target));
    } else {
        Status::info(&format!("Using existing {}", target));
    }

    if library_created {
        if seeded {
            Status::success(&format!(
                "Created library at {} ({} starter queries, {} mappings)",
                library_path.display(),
                queries,
                mappings
            ));
        } else {
            Status::success(&format!("Created empty library at {}", library_path.display()));
        }
    } else {
        Status::info(&format!(
            "Library already exists at {} ({} queries)",
            library_path.display(),
            queries
        ));
    }

    println!();
    println!("  Next steps:");
    println!("    {} export SumoLogic credentials to run queries", "1.".dimmed());
    println!("    {} try `querydeck search \"errors\"`", "2.".dimmed());
    println!();

    Ok(())
}
