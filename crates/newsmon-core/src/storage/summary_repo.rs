use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::model::Summary;
use crate::Result;

/// Data required to record a generated digest
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub article_ids: Vec<i64>,
    pub summary_text: String,
    pub category: String,
}

/// Repository for stored digests
pub struct SummaryRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SummaryRow {
    id: i64,
    article_ids: String,
    summary_text: String,
    category: String,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for Summary {
    fn from(row: SummaryRow) -> Self {
        Summary {
            id: row.id,
            article_ids: serde_json::from_str(&row.article_ids).unwrap_or_default(),
            summary_text: row.summary_text,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

impl<'a> SummaryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, summary: &NewSummary) -> Result<i64> {
        let article_ids = serde_json::to_string(&summary.article_ids)?;

        let result = sqlx::query(
            r#"
            INSERT INTO summaries (article_ids, summary_text, category, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&article_ids)
        .bind(&summary.summary_text)
        .bind(&summary.category)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<Summary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT id, article_ids, summary_text, category, created_at
            FROM summaries ORDER BY created_at DESC, id DESC LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Summary::from).collect())
    }
}
