use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::Database;
use crate::collect::fingerprint;
use crate::model::{Article, ArticleFilter, NewArticle};
use crate::Result;

/// Repository for article persistence with dedup-at-insert semantics
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    description: String,
    content: String,
    author: String,
    url: String,
    published_date: String,
    source_id: Option<i64>,
    source_name: Option<String>,
    collected_at: DateTime<Utc>,
    content_hash: String,
    category: String,
    exported: i32,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            description: row.description,
            content: row.content,
            author: row.author,
            url: row.url,
            published_date: row.published_date,
            source_id: row.source_id,
            source_name: row.source_name,
            collected_at: row.collected_at,
            content_hash: row.content_hash,
            category: row.category,
            exported: row.exported != 0,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT a.id, a.title, a.description, a.content, a.author, a.url,
           a.published_date, a.source_id, s.name AS source_name,
           a.collected_at, a.content_hash, a.category, a.exported
    FROM articles a
    LEFT JOIN sources s ON a.source_id = s.id
"#;

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert an article, deduplicating on the content fingerprint (and
    /// url). Returns the new id, or `None` when an article with the same
    /// fingerprint or url already exists — an expected steady-state
    /// outcome during re-collection, not an error.
    pub async fn insert(&self, article: &NewArticle) -> Result<Option<i64>> {
        let content_hash = fingerprint(&article.title, &article.url);
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
            (title, description, content, author, url, published_date,
             source_id, collected_at, content_hash, category, exported)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.author)
        .bind(&article.url)
        .bind(&article.published_date)
        .bind(article.source_id)
        .bind(now)
        .bind(&content_hash)
        .bind(&article.category)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            tracing::debug!("Duplicate article skipped: {}", article.title);
            Ok(None)
        }
    }

    /// List articles matching the filter, most recently collected first,
    /// together with the total count for the same filter.
    pub async fn list(&self, filter: &ArticleFilter) -> Result<(Vec<Article>, i64)> {
        let (conditions, sql) = build_filter_sql(filter);

        let mut query = sqlx::query_as::<_, ArticleRow>(&sql);
        query = bind_filter(query, filter, &conditions);
        query = query.bind(filter.limit).bind(filter.offset);

        let rows = query.fetch_all(self.db.pool()).await?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM articles a LEFT JOIN sources s ON a.source_id = s.id WHERE 1=1{conditions}"
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        count_query = bind_filter(count_query, filter, &conditions);
        let (total,) = count_query.fetch_one(self.db.pool()).await?;

        Ok((rows.into_iter().map(Article::from).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("{SELECT_COLUMNS} WHERE a.id = ?");
        let row: Option<ArticleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Article::from))
    }

    /// List articles by explicit id set; one of the two operations the
    /// export sink consumes.
    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "{SELECT_COLUMNS} WHERE a.id IN ({placeholders}) ORDER BY a.collected_at DESC"
        );

        let mut query = sqlx::query_as::<_, ArticleRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Idempotent bulk flag flip; the export sink's other operation
    pub async fn mark_exported(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("UPDATE articles SET exported = 1 WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        query.execute(self.db.pool()).await?;

        Ok(())
    }

    /// Dashboard statistics
    pub async fn stats(&self) -> Result<Stats> {
        let (total_articles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.db.pool())
            .await?;

        let (exported_articles,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE exported = 1")
                .fetch_one(self.db.pool())
                .await?;

        let (active_sources,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sources WHERE enabled = 1")
                .fetch_one(self.db.pool())
                .await?;

        let (total_summaries,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM summaries")
            .fetch_one(self.db.pool())
            .await?;

        let by_category: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM articles WHERE category != '' GROUP BY category",
        )
        .fetch_all(self.db.pool())
        .await?;

        let articles_by_day: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT DATE(collected_at) AS day, COUNT(*) FROM articles
            GROUP BY DATE(collected_at) ORDER BY day DESC LIMIT 7
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(Stats {
            total_articles,
            exported_articles,
            active_sources,
            total_summaries,
            by_category,
            articles_by_day,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_articles: i64,
    pub exported_articles: i64,
    pub active_sources: i64,
    pub total_summaries: i64,
    pub by_category: Vec<(String, i64)>,
    pub articles_by_day: Vec<(String, i64)>,
}

/// Assemble the optional WHERE clauses; binding order must match
/// [`bind_filter`].
fn build_filter_sql(filter: &ArticleFilter) -> (String, String) {
    let mut conditions = String::new();

    if filter.category.is_some() {
        conditions.push_str(" AND a.category = ?");
    }
    if filter.search.is_some() {
        conditions.push_str(" AND (a.title LIKE ? OR a.description LIKE ?)");
    }
    if filter.source_id.is_some() {
        conditions.push_str(" AND a.source_id = ?");
    }
    if filter.exported.is_some() {
        conditions.push_str(" AND a.exported = ?");
    }

    let sql = format!(
        "{SELECT_COLUMNS} WHERE 1=1{conditions} ORDER BY a.collected_at DESC LIMIT ? OFFSET ?"
    );

    (conditions, sql)
}

fn bind_filter<'q, O>(
    mut query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q ArticleFilter,
    _conditions: &str,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(ref category) = filter.category {
        query = query.bind(category);
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{search}%");
        query = query.bind(pattern.clone()).bind(pattern);
    }
    if let Some(source_id) = filter.source_id {
        query = query.bind(source_id);
    }
    if let Some(exported) = filter.exported {
        query = query.bind(exported as i64);
    }
    query
}
