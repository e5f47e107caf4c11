use chrono::{DateTime, Utc};
use serde_json::Map;
use sqlx::FromRow;

use super::Database;
use crate::model::{NewSource, Source, SourcePatch};
use crate::{Error, Result};

/// Repository for source CRUD operations
pub struct SourceRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    #[sqlx(rename = "type")]
    kind: String,
    url: String,
    enabled: i32,
    config: String,
    last_fetched: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        let config = serde_json::from_str::<Map<_, _>>(&row.config).unwrap_or_default();
        Source {
            id: row.id,
            name: row.name,
            kind: row.kind,
            url: row.url,
            enabled: row.enabled != 0,
            config,
            last_fetched: row.last_fetched,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, type, url, enabled, config, last_fetched, created_at FROM sources";

impl<'a> SourceRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_source: &NewSource) -> Result<Source> {
        let config = serde_json::to_string(&new_source.config)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sources (name, type, url, enabled, config, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new_source.name)
        .bind(&new_source.kind)
        .bind(&new_source.url)
        .bind(new_source.enabled as i64)
        .bind(&config)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or(Error::SourceNotFound(id))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Source>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row: Option<SourceRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Source::from))
    }

    /// List sources ordered by name; optionally only the enabled ones
    pub async fn list(&self, enabled_only: bool) -> Result<Vec<Source>> {
        let sql = if enabled_only {
            format!("{SELECT_COLUMNS} WHERE enabled = 1 ORDER BY name ASC")
        } else {
            format!("{SELECT_COLUMNS} ORDER BY name ASC")
        };

        let rows: Vec<SourceRow> = sqlx::query_as(&sql).fetch_all(self.db.pool()).await?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Apply a partial field patch
    pub async fn update(&self, id: i64, patch: &SourcePatch) -> Result<Source> {
        let mut clauses = Vec::new();
        let mut string_binds: Vec<String> = Vec::new();

        if let Some(ref name) = patch.name {
            clauses.push("name = ?");
            string_binds.push(name.clone());
        }
        if let Some(ref url) = patch.url {
            clauses.push("url = ?");
            string_binds.push(url.clone());
        }
        if let Some(ref config) = patch.config {
            clauses.push("config = ?");
            string_binds.push(serde_json::to_string(config)?);
        }

        if !clauses.is_empty() || patch.enabled.is_some() {
            let mut set_clauses = clauses.join(", ");
            if patch.enabled.is_some() {
                if !set_clauses.is_empty() {
                    set_clauses.push_str(", ");
                }
                set_clauses.push_str("enabled = ?");
            }

            let sql = format!("UPDATE sources SET {set_clauses} WHERE id = ?");
            let mut query = sqlx::query(&sql);
            for value in &string_binds {
                query = query.bind(value);
            }
            if let Some(enabled) = patch.enabled {
                query = query.bind(enabled as i64);
            }
            query.bind(id).execute(self.db.pool()).await?;
        }

        self.find_by_id(id).await?.ok_or(Error::SourceNotFound(id))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Stamp `last_fetched` with the current time. Called exactly once per
    /// completed collection attempt on a source.
    pub async fn touch_last_fetched(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE sources SET last_fetched = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
