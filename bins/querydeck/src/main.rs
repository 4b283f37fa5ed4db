//! Querydeck CLI - query library and dashboard tooling for SumoLogic
//!
//! Searches a shared library of saved queries, turns matches into
//! dashboards, and keeps a Confluence page of published links.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::ExitCode;

mod commands;
mod context;

use querydeck_api_client::ApiError;
use querydeck_core::error::exit_codes;

/// Query library and dashboard CLI for SumoLogic teams
#[derive(Parser)]
#[command(name = "querydeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration file and seed the query library
    Init {
        /// Skip seeding starter queries and mappings
        #[arg(long)]
        no_seed: bool,
    },

    /// Search the query library by intent
    Search {
        /// What you're looking for, e.g. "failed logins"
        term: String,

        /// Maximum results to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List saved queries without ranking
    List {
        /// Only show one category
        #[arg(short, long)]
        category: Option<String>,

        /// Maximum results to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Save a query to the library
    Add {
        /// Category bucket, e.g. "errors"
        category: String,

        /// Short intent text the query is found by
        key: String,

        /// The query text
        query: String,

        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,
    },

    /// Show one saved query in full
    Show {
        /// Query id or key
        selector: String,

        /// Category to disambiguate identical keys
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Edit fields of a saved query
    Edit {
        /// Query id or key
        selector: String,

        /// Category to disambiguate identical keys
        #[arg(short, long)]
        category: Option<String>,

        /// New category
        #[arg(long)]
        new_category: Option<String>,

        /// New key
        #[arg(long)]
        key: Option<String>,

        /// New query text
        #[arg(long)]
        query: Option<String>,

        /// New comma-separated tag list (replaces the old one)
        #[arg(long)]
        tags: Option<String>,
    },

    /// Remove a saved query
    Remove {
        /// Query id or key
        selector: String,

        /// Category to disambiguate identical keys
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Print a saved query and record its usage
    Use {
        /// Query id or key
        selector: String,

        /// Category to disambiguate identical keys
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Run a saved query as a search job and show the results
    Run {
        /// Query id or key
        selector: String,

        /// Category to disambiguate identical keys
        #[arg(short, long)]
        category: Option<String>,

        /// Start of the time range (ISO 8601, or relative like -15m, -2h, -1d)
        #[arg(long, default_value = "-15m")]
        from: String,

        /// End of the time range (defaults to now)
        #[arg(long)]
        to: Option<String>,

        /// Time zone the range is interpreted in
        #[arg(long, default_value = "UTC")]
        tz: String,

        /// Maximum messages to print
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Seconds to wait for the job before giving up
        #[arg(long, default_value = "120")]
        timeout: u64,
    },

    /// Manage service to source-category mappings
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },

    /// Generate a dashboard from matching queries
    Dashboard {
        /// Search term selecting the panels
        term: Option<String>,

        /// Comma-separated query ids, used instead of a search term
        #[arg(long)]
        ids: Option<String>,

        /// Dashboard title
        #[arg(short, long)]
        title: Option<String>,

        /// Maximum panels
        #[arg(short, long, default_value = "6")]
        limit: usize,

        /// Service whose source category scopes unscoped queries
        #[arg(short, long)]
        service: Option<String>,

        /// Dashboard time range, e.g. -1h or -24h
        #[arg(long, default_value = "-1h")]
        time_range: String,

        /// Create the dashboard (dry-run if not specified)
        #[arg(short, long)]
        apply: bool,

        /// Also append the dashboard link to the Confluence page
        #[arg(short, long, requires = "apply")]
        publish: bool,
    },

    /// Ask the assistant for query help
    Ask {
        #[command(subcommand)]
        target: AskTarget,
    },

    /// Append a link to the Confluence tracking page
    Link {
        /// Link text
        title: String,

        /// Link target URL
        url: String,

        /// Short note shown after the link
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show recent activity events
    Activity {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only show events of one kind, e.g. query_added
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Check configuration and integrations
    Health {
        /// Probe each integration and show response times
        #[arg(short, long)]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum MappingAction {
    /// List configured mappings
    List,

    /// Map a service to its source category
    Add {
        /// Service name as engineers refer to it
        service: String,

        /// The _sourceCategory its logs land in
        source_category: String,

        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Remove a mapping
    Remove {
        /// Service name
        service: String,
    },
}

#[derive(Subcommand)]
enum AskTarget {
    /// Generate a query from an intent description
    Generate {
        /// What the query should find
        intent: String,

        /// Save the suggestion to the library
        #[arg(short, long)]
        save: bool,

        /// Category used with --save
        #[arg(short, long, default_value = "suggested")]
        category: String,
    },

    /// Explain what a query does
    Explain {
        /// Query id or key (omit when using --query)
        selector: Option<String>,

        /// Explain this query text instead of a saved one
        #[arg(short, long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("querydeck=debug,querydeck_api_client=debug")
            .init();
    }

    let config = cli.config.as_deref();
    let format = cli.format.as_str();

    let result = match cli.command {
        Commands::Init { no_seed } => commands::init::run(config, no_seed, format),

        Commands::Search { term, limit } => commands::search::run(config, &term, limit, format),

        Commands::List { category, limit } => {
            commands::list::run(config, category.as_deref(), limit, format)
        }

        Commands::Add { category, key, query, tags } => {
            commands::add::run(config, &category, &key, &query, &tags, format)
        }

        Commands::Show { selector, category } => {
            commands::show::run(config, &selector, category.as_deref(), format)
        }

        Commands::Edit { selector, category, new_category, key, query, tags } => commands::edit::run(
            config,
            &selector,
            category.as_deref(),
            new_category,
            key,
            query,
            tags,
            format,
        ),

        Commands::Remove { selector, category } => {
            commands::remove::run(config, &selector, category.as_deref(), format)
        }

        Commands::Use { selector, category } => {
            commands::use_query::run(config, &selector, category.as_deref(), format)
        }

        Commands::Run { selector, category, from, to, tz, limit, timeout } => {
            commands::run::run(
                config,
                &selector,
                category.as_deref(),
                &from,
                to.as_deref(),
                &tz,
                limit,
                timeout,
                format,
            )
            .await
        }

        Commands::Mapping { action } => match action {
            MappingAction::List => commands::mapping::list(config, format),
            MappingAction::Add { service, source_category, note } => {
                commands::mapping::add(config, &service, &source_category, note, format)
            }
            MappingAction::Remove { service } => {
                commands::mapping::remove(config, &service, format)
            }
        },

        Commands::Dashboard {
            term,
            ids,
            title,
            limit,
            service,
            time_range,
            apply,
            publish,
        } => {
            commands::dashboard::run(
                config,
                term.as_deref(),
                ids.as_deref(),
                title,
                limit,
                service.as_deref(),
                &time_range,
                apply,
                publish,
                format,
            )
            .await
        }

        Commands::Ask { target } => match target {
            AskTarget::Generate { intent, save, category } => {
                commands::ask::generate(config, &intent, save, &category, format).await
            }
            AskTarget::Explain { selector, query } => {
                commands::ask::explain(config, selector.as_deref(), query.as_deref(), format).await
            }
        },

        Commands::Link { title, url, note } => {
            commands::link::run(config, &title, &url, note, format).await
        }

        Commands::Activity { limit, kind } => {
            commands::activity::run(config, limit, kind.as_deref(), format)
        }

        Commands::Health { detailed } => commands::health::run(config, detailed, format).await,
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code_for(&e)
        }
    }
}

/// Map an error to the exit code its family calls for.
///
/// Core errors carry a coded family; API errors map by variant. Anything
/// else is a plain failure.
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    let code = if let Some(e) = error.downcast_ref::<querydeck_core::Error>() {
        match e.code.code() / 1000 {
            3 => exit_codes::CONFIG_ERROR,
            4 => exit_codes::LIBRARY_ERROR,
            5 => exit_codes::VALIDATION_ERROR,
            6 => exit_codes::RATE_LIMITED,
            7 => exit_codes::INTEGRATION_ERROR,
            _ => exit_codes::FAILURE,
        }
    } else if let Some(e) = error.downcast_ref::<ApiError>() {
        match e {
            ApiError::Timeout(_) => exit_codes::TIMEOUT,
            ApiError::RateLimited(_) | ApiError::CircuitOpen => exit_codes::RATE_LIMITED,
            ApiError::Config(_) | ApiError::MissingEnvVar(_) => exit_codes::CONFIG_ERROR,
            _ => exit_codes::INTEGRATION_ERROR,
        }
    } else {
        exit_codes::FAILURE
    };

    ExitCode::from(code as u8)
}
