use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::AppConfig;
use crate::model::{NewSource, SourceKind};
use crate::Result;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations.
    ///
    /// Failure here is the one fatal condition in the pipeline; everything
    /// downstream degrades per source instead of aborting.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let db_path = config.database_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}", db_path.display());

        tracing::info!("Connecting to database: {}", db_path.display());

        // Per-connection PRAGMAs so every pool member gets the same
        // settings, not just the first one.
        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create an in-memory database (used by tests)
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        tracing::debug!("Running database migrations...");

        sqlx::query(MIGRATION_001_SOURCES)
            .execute(&self.pool)
            .await?;

        sqlx::query(MIGRATION_002_ARTICLES)
            .execute(&self.pool)
            .await?;

        sqlx::query(MIGRATION_003_SETTINGS)
            .execute(&self.pool)
            .await?;

        sqlx::query(MIGRATION_004_SUMMARIES)
            .execute(&self.pool)
            .await?;

        sqlx::query(MIGRATION_005_EXPORTS)
            .execute(&self.pool)
            .await?;

        for statement in MIGRATION_INDEXES {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::debug!("Database migrations completed");
        Ok(())
    }

    /// Seed default settings, and a default source set when the source
    /// table is empty. Safe to call on every startup.
    pub async fn seed_defaults(&self) -> Result<()> {
        for (key, value) in DEFAULT_SETTINGS {
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?;
        }

        let (source_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sources")
            .fetch_one(&self.pool)
            .await?;

        if source_count == 0 {
            let repo = super::SourceRepository::new(self);
            for source in default_sources() {
                repo.create(&source).await?;
            }
            tracing::info!("Seeded default sources");
        }

        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("schedule_interval", "60"),
    (
        "categories",
        "AI/ML,Software Development,Cybersecurity,New Technologies",
    ),
    ("max_articles_per_fetch", "50"),
    ("auto_summarize", "true"),
    ("llm_model", "gpt-4o-mini"),
];

fn default_sources() -> Vec<NewSource> {
    let mut sources = vec![
        NewSource::new("Hacker News", SourceKind::Feed, "https://news.ycombinator.com/rss"),
        NewSource::new("TechCrunch", SourceKind::Feed, "https://techcrunch.com/feed/"),
        NewSource::new("Wired", SourceKind::Feed, "https://www.wired.com/feed/rss"),
        NewSource::new(
            "Ars Technica",
            SourceKind::Feed,
            "https://feeds.arstechnica.com/arstechnica/index",
        ),
        NewSource::new(
            "MIT Tech Review",
            SourceKind::Feed,
            "https://www.technologyreview.com/feed/",
        ),
        NewSource::new(
            "The Verge",
            SourceKind::Feed,
            "https://www.theverge.com/rss/index.xml",
        ),
        NewSource::new(
            "AI News (VentureBeat)",
            SourceKind::Feed,
            "https://venturebeat.com/category/ai/feed/",
        ),
        NewSource::new("Dev.to", SourceKind::Feed, "https://dev.to/feed"),
    ];

    let mut ml = NewSource::new(
        "r/MachineLearning",
        SourceKind::Aggregator,
        "https://www.reddit.com/r/MachineLearning",
    );
    ml.config.insert("subreddit".into(), "MachineLearning".into());
    sources.push(ml);

    let mut programming = NewSource::new(
        "r/programming",
        SourceKind::Aggregator,
        "https://www.reddit.com/r/programming",
    );
    programming
        .config
        .insert("subreddit".into(), "programming".into());
    sources.push(programming);

    sources
}

const MIGRATION_001_SOURCES: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    url TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    config TEXT NOT NULL DEFAULT '{}',
    last_fetched DATETIME,
    created_at DATETIME NOT NULL
)
"#;

const MIGRATION_002_ARTICLES: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    author TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL UNIQUE,
    published_date TEXT NOT NULL DEFAULT '',
    source_id INTEGER REFERENCES sources(id),
    collected_at DATETIME NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL DEFAULT '',
    exported INTEGER NOT NULL DEFAULT 0
)
"#;

const MIGRATION_003_SETTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

const MIGRATION_004_SUMMARIES: &str = r#"
CREATE TABLE IF NOT EXISTS summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_ids TEXT NOT NULL,
    summary_text TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    created_at DATETIME NOT NULL
)
"#;

const MIGRATION_005_EXPORTS: &str = r#"
CREATE TABLE IF NOT EXISTS exports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    articles_count INTEGER NOT NULL,
    export_date DATETIME NOT NULL,
    filename TEXT NOT NULL,
    export_type TEXT NOT NULL
)
"#;

const MIGRATION_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_articles_url ON articles(url)",
    "CREATE INDEX IF NOT EXISTS idx_articles_hash ON articles(content_hash)",
    "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category)",
    "CREATE INDEX IF NOT EXISTS idx_articles_collected ON articles(collected_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_sources_enabled ON sources(enabled)",
];
