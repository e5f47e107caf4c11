use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three known collector variants, dispatched by the source's type tag.
///
/// The tag is stored as free text so a row carrying an unknown tag still
/// loads; dispatch rejects it. New variants extend this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Feed,
    Aggregator,
    Scrape,
}

impl SourceKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Feed => "rss",
            SourceKind::Aggregator => "reddit",
            SourceKind::Scrape => "scraper",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rss" => Some(SourceKind::Feed),
            "reddit" => Some(SourceKind::Aggregator),
            "scraper" => Some(SourceKind::Scrape),
            _ => None,
        }
    }
}

/// A configured origin articles are collected from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    /// Raw type tag as stored; see [`SourceKind::from_tag`]
    pub kind: String,
    pub url: String,
    pub enabled: bool,
    /// Opaque per-collector configuration; interpreted only by the
    /// matching collector variant
    pub config: Map<String, Value>,
    pub last_fetched: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Source {
    pub fn source_kind(&self) -> Option<SourceKind> {
        SourceKind::from_tag(&self.kind)
    }
}

/// Data required to create a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub kind: String,
    pub url: String,
    pub enabled: bool,
    pub config: Map<String, Value>,
}

impl NewSource {
    pub fn new(name: impl Into<String>, kind: SourceKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.tag().to_string(),
            url: url.into(),
            enabled: true,
            config: Map::new(),
        }
    }
}

/// Partial field patch for updating a source
#[derive(Debug, Clone, Default)]
pub struct SourcePatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub enabled: Option<bool>,
    pub config: Option<Map<String, Value>>,
}

/// A per-source record as emitted by a collector, before normalization
#[derive(Debug, Clone, Default)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
    pub content: String,
    pub author: String,
    pub url: String,
    /// ISO-8601 string; empty when the source carries no usable timestamp
    pub published_date: String,
    pub category: String,
}

/// A normalized article ready for insertion
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub content: String,
    pub author: String,
    pub url: String,
    pub published_date: String,
    pub source_id: Option<i64>,
    pub category: String,
}

impl NewArticle {
    /// Articles with an empty title or url never reach the store
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.url.is_empty()
    }
}

/// A stored article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub author: String,
    pub url: String,
    pub published_date: String,
    pub source_id: Option<i64>,
    /// Joined from the sources table, not stored on the article row
    pub source_name: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub content_hash: String,
    pub category: String,
    pub exported: bool,
}

/// Independently combinable article listing filters
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub source_id: Option<i64>,
    pub exported: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            source_id: None,
            exported: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Per-source tally within a collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub collected: u32,
}

/// Aggregate report for one collection run; transient, not persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResult {
    pub total_collected: u32,
    pub sources_processed: usize,
    pub results: Vec<SourceReport>,
    pub timestamp: DateTime<Utc>,
}

/// A stored digest over a set of articles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub article_ids: Vec<i64>,
    pub summary_text: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded export run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: i64,
    pub articles_count: i64,
    pub filename: String,
    pub export_type: String,
    pub export_date: DateTime<Utc>,
}
