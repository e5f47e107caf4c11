mod openai;

pub use openai::OpenAiOracle;

use crate::model::Article;
use crate::Result;

/// The closed category label set the oracle may answer with
pub const CATEGORIES: &[&str] = &[
    "AI/ML",
    "Software Development",
    "Cybersecurity",
    "New Technologies",
    "Other",
];

/// External capability for categorization and digest generation.
///
/// The pipeline consults it optionally; every failure degrades to an
/// empty category and never aborts a batch.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    /// Assign one label from [`CATEGORIES`]. Callers validate the answer
    /// with [`validate_category`]; raw output is untrusted.
    async fn categorize(&self, title: &str, description: &str) -> Result<String>;

    /// Generate a markdown digest over a batch of articles
    async fn summarize(&self, articles: &[Article], category: Option<&str>) -> Result<String>;
}

/// Coerce an oracle answer into the closed label set; anything else is
/// treated as empty/untrusted.
pub fn validate_category(raw: &str) -> String {
    let candidate = raw.trim();
    if CATEGORIES.contains(&candidate) {
        candidate.to_string()
    } else {
        String::new()
    }
}
