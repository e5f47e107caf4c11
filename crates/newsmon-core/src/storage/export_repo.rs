use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::model::ExportRecord;
use crate::Result;

/// Repository for the export history
pub struct ExportRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ExportRow {
    id: i64,
    articles_count: i64,
    filename: String,
    export_type: String,
    export_date: DateTime<Utc>,
}

impl From<ExportRow> for ExportRecord {
    fn from(row: ExportRow) -> Self {
        ExportRecord {
            id: row.id,
            articles_count: row.articles_count,
            filename: row.filename,
            export_type: row.export_type,
            export_date: row.export_date,
        }
    }
}

impl<'a> ExportRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, articles_count: i64, filename: &str, export_type: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO exports (articles_count, export_date, filename, export_type)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(articles_count)
        .bind(Utc::now())
        .bind(filename)
        .bind(export_type)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<ExportRecord>> {
        let rows: Vec<ExportRow> = sqlx::query_as(
            r#"
            SELECT id, articles_count, filename, export_type, export_date
            FROM exports ORDER BY export_date DESC LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(ExportRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_export_history() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ExportRepository::new(&db);

        repo.insert(12, "news_export_20250106.jsonl", "jsonl")
            .await
            .unwrap();

        let records = repo.list(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].articles_count, 12);
        assert_eq!(records[0].export_type, "jsonl");
    }
}
