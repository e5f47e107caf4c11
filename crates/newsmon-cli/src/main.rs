use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsmon_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "newsmon")]
#[command(author, version, about = "Scheduled tech news collection and export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collection daemon (scheduler + periodic collection)
    Run,
    /// Run a single collection pass now
    Collect {
        /// Collect from a single source id only
        #[arg(long)]
        source: Option<i64>,
    },
    /// Manage collection sources
    Sources {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// List stored articles
    Articles {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Substring match against title/description
        #[arg(long)]
        search: Option<String>,
        /// Filter by source id
        #[arg(long)]
        source: Option<i64>,
        /// Only articles not yet exported
        #[arg(long)]
        unexported: bool,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Export articles and manage export files
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },
    /// Generate an AI digest over recent articles
    Summarize {
        /// Restrict the digest to one category
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// List previously generated digests
    Summaries {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Get or set stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Show collection statistics
    Stats,
}

#[derive(Subcommand)]
enum SourceAction {
    /// Add a source
    Add {
        /// Display name
        name: String,
        /// Source URL
        url: String,
        /// Source type tag: rss, reddit, or scraper
        #[arg(short = 't', long = "type", default_value = "rss")]
        kind: String,
        /// Extra configuration as a JSON object (selectors, subreddit, ...)
        #[arg(long)]
        config: Option<String>,
    },
    /// List sources
    List {
        /// Only enabled sources
        #[arg(long)]
        enabled: bool,
    },
    /// Enable a source
    Enable { id: i64 },
    /// Disable a source
    Disable { id: i64 },
    /// Remove a source
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Create an export file
    Create {
        /// Format: notebooklm, jsonl, or urls
        #[arg(short, long, default_value = "notebooklm")]
        format: String,
        /// Explicit article ids to export (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i64>,
        /// Only include articles not yet exported
        #[arg(long)]
        unexported_only: bool,
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Leave the exported flag untouched
        #[arg(long)]
        no_mark: bool,
    },
    /// List export files and history
    List,
    /// Print an export file
    Show { filename: String },
    /// Delete an export file
    Delete { filename: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print one setting
    Get { key: String },
    /// Update one setting
    Set { key: String, value: String },
    /// Print all settings
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize database and first-run defaults
    let db = Database::new(&config).await?;
    db.seed_defaults().await?;

    match cli.command {
        Commands::Run => commands::run::run(db, config).await,
        Commands::Collect { source } => commands::collect::run(&db, &config, source).await,
        Commands::Sources { action } => match action {
            SourceAction::Add {
                name,
                url,
                kind,
                config: extra,
            } => commands::sources::add(&db, &name, &kind, &url, extra.as_deref()).await,
            SourceAction::List { enabled } => commands::sources::list(&db, enabled).await,
            SourceAction::Enable { id } => commands::sources::set_enabled(&db, id, true).await,
            SourceAction::Disable { id } => commands::sources::set_enabled(&db, id, false).await,
            SourceAction::Remove { id } => commands::sources::remove(&db, id).await,
        },
        Commands::Articles {
            category,
            search,
            source,
            unexported,
            limit,
            offset,
        } => {
            commands::articles::run(&db, category, search, source, unexported, limit, offset).await
        }
        Commands::Export { action } => match action {
            ExportAction::Create {
                format,
                ids,
                unexported_only,
                limit,
                no_mark,
            } => {
                commands::export::create(
                    &db,
                    &config,
                    &format,
                    &ids,
                    unexported_only,
                    limit,
                    !no_mark,
                )
                .await
            }
            ExportAction::List => commands::export::list(&db, &config).await,
            ExportAction::Show { filename } => commands::export::show(&config, &filename).await,
            ExportAction::Delete { filename } => commands::export::delete(&config, &filename).await,
        },
        Commands::Summarize { category, limit } => {
            commands::summarize::run(&db, &config, category.as_deref(), limit).await
        }
        Commands::Summaries { limit } => commands::summarize::history(&db, limit).await,
        Commands::Settings { action } => match action {
            SettingsAction::Get { key } => commands::settings::get(&db, &key).await,
            SettingsAction::Set { key, value } => commands::settings::set(&db, &key, &value).await,
            SettingsAction::List => commands::settings::list(&db).await,
        },
        Commands::Stats => commands::stats::run(&db).await,
    }
}
