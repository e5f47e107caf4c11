use std::collections::BTreeMap;

use super::Database;
use crate::Result;

/// Well-known settings keys
pub mod keys {
    /// Collection interval in minutes (integer string)
    pub const SCHEDULE_INTERVAL: &str = "schedule_interval";
    /// Comma-separated closed category set
    pub const CATEGORIES: &str = "categories";
    pub const MAX_ARTICLES_PER_FETCH: &str = "max_articles_per_fetch";
    /// The literal string "true" enables oracle categorization
    pub const AUTO_SUMMARIZE: &str = "auto_summarize";
    pub const LLM_MODEL: &str = "llm_model";
}

const DEFAULT_SCHEDULE_INTERVAL: u64 = 60;

/// Simple string key-value settings with typed readers for the keys the
/// pipeline consumes
pub struct SettingsRepository<'a> {
    db: &'a Database,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|(value,)| value))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn all(&self) -> Result<BTreeMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Collection interval in minutes; unparseable or missing values fall
    /// back to the default
    pub async fn schedule_interval(&self) -> Result<u64> {
        let value = self.get(keys::SCHEDULE_INTERVAL).await?;
        Ok(value
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SCHEDULE_INTERVAL))
    }

    /// Whether the orchestrator consults the categorization oracle
    pub async fn auto_summarize(&self) -> Result<bool> {
        Ok(self.get(keys::AUTO_SUMMARIZE).await?.as_deref() == Some("true"))
    }

    /// The closed category label set
    pub async fn categories(&self) -> Result<Vec<String>> {
        let value = self.get(keys::CATEGORIES).await?.unwrap_or_default();
        Ok(value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    pub async fn llm_model(&self) -> Result<Option<String>> {
        self.get(keys::LLM_MODEL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_set_round_trip() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SettingsRepository::new(&db);

        assert!(repo.get("missing").await.unwrap().is_none());

        repo.set("schedule_interval", "15").await.unwrap();
        assert_eq!(repo.get("schedule_interval").await.unwrap().as_deref(), Some("15"));
        assert_eq!(repo.schedule_interval().await.unwrap(), 15);

        repo.set("schedule_interval", "30").await.unwrap();
        assert_eq!(repo.schedule_interval().await.unwrap(), 30);
    }

    #[tokio::test]
    async fn interval_falls_back_on_garbage() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SettingsRepository::new(&db);

        assert_eq!(repo.schedule_interval().await.unwrap(), 60);

        repo.set("schedule_interval", "soon").await.unwrap();
        assert_eq!(repo.schedule_interval().await.unwrap(), 60);
    }

    #[tokio::test]
    async fn auto_summarize_requires_literal_true() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SettingsRepository::new(&db);

        assert!(!repo.auto_summarize().await.unwrap());

        repo.set("auto_summarize", "true").await.unwrap();
        assert!(repo.auto_summarize().await.unwrap());

        repo.set("auto_summarize", "TRUE").await.unwrap();
        assert!(!repo.auto_summarize().await.unwrap());
    }

    #[tokio::test]
    async fn categories_split_on_commas() {
        let db = Database::new_in_memory().await.unwrap();
        db.seed_defaults().await.unwrap();
        let repo = SettingsRepository::new(&db);

        let categories = repo.categories().await.unwrap();
        assert_eq!(categories.len(), 4);
        assert!(categories.contains(&"AI/ML".to_string()));
    }
}
