use std::sync::Arc;

use chrono::Utc;

use super::normalize;
use super::{AggregatorCollector, Collector, FeedCollector, ScrapeCollector};
use crate::ai::{validate_category, Oracle};
use crate::config::AppConfig;
use crate::model::{CollectionResult, Source, SourceKind, SourceReport};
use crate::storage::{ArticleRepository, Database, SettingsRepository, SourceRepository};
use crate::Result;

/// Fans a collection run out across all enabled sources.
///
/// Sources are processed sequentially to bound outbound request
/// concurrency and keep per-source accounting race-free; a failing source
/// contributes zero and never prevents the remaining sources from being
/// processed.
pub struct Orchestrator {
    db: Database,
    feed: Box<dyn Collector>,
    aggregator: Box<dyn Collector>,
    scrape: Box<dyn Collector>,
    oracle: Option<Arc<dyn Oracle>>,
}

impl Orchestrator {
    pub fn new(db: Database, config: &AppConfig) -> Result<Self> {
        let oracle = config.ai.openai_api_key.as_ref().map(|key| {
            Arc::new(crate::ai::OpenAiOracle::new(key, &config.ai.model)) as Arc<dyn Oracle>
        });

        Ok(Self {
            db,
            feed: Box::new(FeedCollector::new(config)?),
            aggregator: Box::new(AggregatorCollector::new(config)?),
            scrape: Box::new(ScrapeCollector::new(config)?),
            oracle,
        })
    }

    /// Construct with explicit collector implementations (stubbed in tests)
    pub fn with_collectors(
        db: Database,
        feed: Box<dyn Collector>,
        aggregator: Box<dyn Collector>,
        scrape: Box<dyn Collector>,
    ) -> Self {
        Self {
            db,
            feed,
            aggregator,
            scrape,
            oracle: None,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collector_for(&self, kind: SourceKind) -> &dyn Collector {
        match kind {
            SourceKind::Feed => self.feed.as_ref(),
            SourceKind::Aggregator => self.aggregator.as_ref(),
            SourceKind::Scrape => self.scrape.as_ref(),
        }
    }

    /// Run one collection pass across all enabled sources
    pub async fn collect_all(&self) -> Result<CollectionResult> {
        let sources = SourceRepository::new(&self.db).list(true).await?;

        let mut total_collected = 0;
        let mut results = Vec::with_capacity(sources.len());

        for source in &sources {
            // Per-source failure boundary: nothing a single source does may
            // abort the rest of the run.
            let collected = match self.collect_source(source).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::error!("Error collecting from '{}': {}", source.name, e);
                    0
                }
            };

            total_collected += collected;
            results.push(SourceReport {
                source: source.name.clone(),
                collected,
            });
        }

        tracing::info!(
            "Total collected: {} articles from {} sources",
            total_collected,
            sources.len()
        );

        Ok(CollectionResult {
            total_collected,
            sources_processed: sources.len(),
            results,
            timestamp: Utc::now(),
        })
    }

    /// Collect from a single source, returning the count of fresh inserts.
    ///
    /// An unknown type tag is skipped before the source is considered
    /// processed and does not stamp `last_fetched`; a source whose
    /// collector failed is still stamped, so it is not retried instantly.
    pub async fn collect_source(&self, source: &Source) -> Result<u32> {
        let Some(kind) = source.source_kind() else {
            tracing::warn!(
                "Unknown source type '{}' for '{}', skipping",
                source.kind,
                source.name
            );
            return Ok(0);
        };

        let raw_articles = match self.collector_for(kind).collect(source).await {
            Ok(raw_articles) => raw_articles,
            Err(e) => {
                tracing::error!("Collector failed for '{}': {}", source.name, e);
                Vec::new()
            }
        };

        let settings = SettingsRepository::new(&self.db);
        let categorize = settings.auto_summarize().await? && self.oracle.is_some();

        let article_repo = ArticleRepository::new(&self.db);
        let mut inserted = 0;

        for raw in &raw_articles {
            let mut article = normalize(raw, source.id);
            if !article.is_valid() {
                continue;
            }

            if categorize && article.category.is_empty() {
                if let Some(ref oracle) = self.oracle {
                    match oracle.categorize(&article.title, &article.description).await {
                        Ok(label) => article.category = validate_category(&label),
                        Err(e) => {
                            tracing::warn!("Categorization failed for '{}': {}", article.title, e);
                        }
                    }
                }
            }

            if article_repo.insert(&article).await?.is_some() {
                inserted += 1;
            }
        }

        SourceRepository::new(&self.db)
            .touch_last_fetched(source.id)
            .await?;

        tracing::info!("Collected {} new articles from '{}'", inserted, source.name);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArticleFilter, NewSource, RawArticle};
    use crate::storage::keys;
    use crate::{Error, Result};

    /// Emits two articles derived from the source url; fails for sources
    /// whose url contains "fail".
    struct ScriptedCollector;

    #[async_trait::async_trait]
    impl Collector for ScriptedCollector {
        async fn collect(&self, source: &Source) -> Result<Vec<RawArticle>> {
            if source.url.contains("fail") {
                return Err(Error::Other("connection reset".into()));
            }

            Ok((0..2)
                .map(|i| RawArticle {
                    title: format!("{} item {}", source.name, i),
                    url: format!("{}/item/{}", source.url, i),
                    ..RawArticle::default()
                })
                .collect())
        }
    }

    /// Replays a fixed batch regardless of the source
    struct StaticCollector {
        articles: Vec<RawArticle>,
    }

    #[async_trait::async_trait]
    impl Collector for StaticCollector {
        async fn collect(&self, _source: &Source) -> Result<Vec<RawArticle>> {
            Ok(self.articles.clone())
        }
    }

    struct EmptyCollector;

    #[async_trait::async_trait]
    impl Collector for EmptyCollector {
        async fn collect(&self, _source: &Source) -> Result<Vec<RawArticle>> {
            Ok(Vec::new())
        }
    }

    fn scripted_orchestrator(db: Database) -> Orchestrator {
        Orchestrator::with_collectors(
            db,
            Box::new(ScriptedCollector),
            Box::new(ScriptedCollector),
            Box::new(ScriptedCollector),
        )
    }

    async fn add_source(db: &Database, name: &str, kind: SourceKind, url: &str) -> Source {
        SourceRepository::new(db)
            .create(&NewSource::new(name, kind, url))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_the_run() {
        let db = Database::new_in_memory().await.unwrap();
        add_source(&db, "one", SourceKind::Feed, "https://one.example").await;
        add_source(&db, "two", SourceKind::Feed, "https://fail.example").await;
        add_source(&db, "three", SourceKind::Feed, "https://three.example").await;

        let orchestrator = scripted_orchestrator(db);
        let result = orchestrator.collect_all().await.unwrap();

        assert_eq!(result.sources_processed, 3);
        assert_eq!(result.total_collected, 4);

        let by_name = |name: &str| {
            result
                .results
                .iter()
                .find(|r| r.source == name)
                .unwrap()
                .collected
        };
        assert_eq!(by_name("one"), 2);
        assert_eq!(by_name("two"), 0);
        assert_eq!(by_name("three"), 2);
    }

    #[tokio::test]
    async fn collector_failure_still_touches_last_fetched() {
        let db = Database::new_in_memory().await.unwrap();
        let source = add_source(&db, "broken", SourceKind::Feed, "https://fail.example").await;

        let orchestrator = scripted_orchestrator(db);
        orchestrator.collect_all().await.unwrap();

        let stored = SourceRepository::new(orchestrator.database())
            .find_by_id(source.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_fetched.is_some());
    }

    #[tokio::test]
    async fn unknown_type_tag_is_skipped_without_touching_last_fetched() {
        let db = Database::new_in_memory().await.unwrap();
        let source = SourceRepository::new(&db)
            .create(&NewSource {
                name: "mystery".into(),
                kind: "api".into(),
                url: "https://api.example".into(),
                enabled: true,
                config: Default::default(),
            })
            .await
            .unwrap();

        let orchestrator = scripted_orchestrator(db);
        let result = orchestrator.collect_all().await.unwrap();

        assert_eq!(result.total_collected, 0);
        assert_eq!(result.sources_processed, 1);

        let stored = SourceRepository::new(orchestrator.database())
            .find_by_id(source.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_fetched.is_none());
    }

    #[tokio::test]
    async fn second_run_over_unchanged_sources_inserts_nothing() {
        let db = Database::new_in_memory().await.unwrap();
        add_source(&db, "one", SourceKind::Feed, "https://one.example").await;

        let orchestrator = scripted_orchestrator(db);
        assert_eq!(orchestrator.collect_all().await.unwrap().total_collected, 2);
        assert_eq!(orchestrator.collect_all().await.unwrap().total_collected, 0);
    }

    #[tokio::test]
    async fn disabled_sources_are_not_processed() {
        let db = Database::new_in_memory().await.unwrap();
        add_source(&db, "on", SourceKind::Feed, "https://on.example").await;
        let off = add_source(&db, "off", SourceKind::Feed, "https://off.example").await;
        SourceRepository::new(&db)
            .update(
                off.id,
                &crate::model::SourcePatch {
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let orchestrator = scripted_orchestrator(db);
        let result = orchestrator.collect_all().await.unwrap();
        assert_eq!(result.sources_processed, 1);
        assert_eq!(result.results[0].source, "on");
    }

    #[tokio::test]
    async fn invalid_records_never_reach_the_store() {
        let db = Database::new_in_memory().await.unwrap();
        add_source(&db, "feed", SourceKind::Feed, "https://feed.example").await;

        let articles = vec![
            RawArticle {
                title: "   ".into(),
                url: "https://feed.example/no-title".into(),
                ..RawArticle::default()
            },
            RawArticle {
                title: "No url".into(),
                ..RawArticle::default()
            },
            RawArticle {
                title: "Kept".into(),
                url: "https://feed.example/kept".into(),
                ..RawArticle::default()
            },
        ];

        let orchestrator = Orchestrator::with_collectors(
            db,
            Box::new(StaticCollector { articles }),
            Box::new(EmptyCollector),
            Box::new(EmptyCollector),
        );

        let result = orchestrator.collect_all().await.unwrap();
        assert_eq!(result.total_collected, 1);

        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Kept");
    }

    // End-to-end: 2-entry feed fixture through parse, orchestrate, store.
    #[tokio::test]
    async fn feed_fixture_end_to_end() {
        let fixture = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Fixture</title>
<item><title>Entry A</title><link>https://example.com/a</link><description>First</description></item>
<item><title>Entry B</title><link>https://example.com/b</link><description>Second</description></item>
</channel></rss>"#;
        let articles = super::super::feed::parse_entries(fixture.as_bytes()).unwrap();

        let db = Database::new_in_memory().await.unwrap();
        let source = add_source(&db, "Fixture Feed", SourceKind::Feed, "https://example.com").await;

        let orchestrator = Orchestrator::with_collectors(
            db,
            Box::new(StaticCollector { articles }),
            Box::new(EmptyCollector),
            Box::new(EmptyCollector),
        );

        let result = orchestrator.collect_all().await.unwrap();
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].source, "Fixture Feed");
        assert_eq!(result.results[0].collected, 2);

        let (stored, total) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(stored.iter().all(|a| a.source_id == Some(source.id)));

        let stored_source = SourceRepository::new(orchestrator.database())
            .find_by_id(source.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored_source.last_fetched.is_some());
    }

    // End-to-end: stickied aggregator post is filtered before the store.
    #[tokio::test]
    async fn aggregator_fixture_end_to_end() {
        let fixture = r#"{"data": {"children": [
            {"data": {"title": "Pinned", "stickied": true, "url": "https://example.com/pinned"}},
            {"data": {"title": "Normal", "stickied": false, "url": "https://example.com/normal",
                      "score": 1, "num_comments": 0}}
        ]}}"#;
        let articles = super::super::aggregator::parse_listing(fixture).unwrap();

        let db = Database::new_in_memory().await.unwrap();
        add_source(
            &db,
            "r/fixture",
            SourceKind::Aggregator,
            "https://www.reddit.com/r/fixture",
        )
        .await;

        let orchestrator = Orchestrator::with_collectors(
            db,
            Box::new(EmptyCollector),
            Box::new(StaticCollector { articles }),
            Box::new(EmptyCollector),
        );

        let result = orchestrator.collect_all().await.unwrap();
        assert_eq!(result.total_collected, 1);

        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert_eq!(stored[0].title, "Normal");
    }

    // End-to-end: scrape page matching only the fallback container set.
    #[tokio::test]
    async fn scrape_fallback_fixture_end_to_end() {
        let page = r#"<html><body>
            <div class="entry"><h2><a href="/p/1">Fallback Article</a></h2></div>
        </body></html>"#;
        let articles = super::super::scrape::extract_articles(
            page,
            "https://example.com",
            &super::super::ScrapeSelectors::default(),
        );
        assert_eq!(articles.len(), 1);

        let db = Database::new_in_memory().await.unwrap();
        add_source(&db, "Scraped", SourceKind::Scrape, "https://example.com").await;

        let orchestrator = Orchestrator::with_collectors(
            db,
            Box::new(EmptyCollector),
            Box::new(EmptyCollector),
            Box::new(StaticCollector { articles }),
        );

        let result = orchestrator.collect_all().await.unwrap();
        assert_eq!(result.total_collected, 1);

        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert_eq!(stored[0].url, "https://example.com/p/1");
        assert!(stored[0].content.is_empty());
    }

    struct FixedOracle {
        label: &'static str,
    }

    #[async_trait::async_trait]
    impl Oracle for FixedOracle {
        async fn categorize(&self, _title: &str, _description: &str) -> Result<String> {
            Ok(self.label.to_string())
        }

        async fn summarize(
            &self,
            _articles: &[crate::model::Article],
            _category: Option<&str>,
        ) -> Result<String> {
            Ok(String::new())
        }
    }

    struct FailingOracle;

    #[async_trait::async_trait]
    impl Oracle for FailingOracle {
        async fn categorize(&self, _title: &str, _description: &str) -> Result<String> {
            Err(Error::AiProvider("quota exceeded".into()))
        }

        async fn summarize(
            &self,
            _articles: &[crate::model::Article],
            _category: Option<&str>,
        ) -> Result<String> {
            Err(Error::AiProvider("quota exceeded".into()))
        }
    }

    async fn enable_auto_summarize(db: &Database) {
        SettingsRepository::new(db)
            .set(keys::AUTO_SUMMARIZE, "true")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn oracle_labels_are_validated_against_the_closed_set() {
        let db = Database::new_in_memory().await.unwrap();
        enable_auto_summarize(&db).await;
        add_source(&db, "feed", SourceKind::Feed, "https://feed.example").await;

        let orchestrator = scripted_orchestrator(db)
            .with_oracle(Arc::new(FixedOracle { label: "AI/ML" }));
        orchestrator.collect_all().await.unwrap();

        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert!(stored.iter().all(|a| a.category == "AI/ML"));
    }

    #[tokio::test]
    async fn out_of_set_oracle_answer_degrades_to_empty() {
        let db = Database::new_in_memory().await.unwrap();
        enable_auto_summarize(&db).await;
        add_source(&db, "feed", SourceKind::Feed, "https://feed.example").await;

        let orchestrator = scripted_orchestrator(db)
            .with_oracle(Arc::new(FixedOracle { label: "Gardening" }));
        orchestrator.collect_all().await.unwrap();

        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert!(stored.iter().all(|a| a.category.is_empty()));
    }

    #[tokio::test]
    async fn oracle_failure_never_aborts_the_batch() {
        let db = Database::new_in_memory().await.unwrap();
        enable_auto_summarize(&db).await;
        add_source(&db, "feed", SourceKind::Feed, "https://feed.example").await;

        let orchestrator = scripted_orchestrator(db).with_oracle(Arc::new(FailingOracle));
        let result = orchestrator.collect_all().await.unwrap();

        assert_eq!(result.total_collected, 2);
        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert!(stored.iter().all(|a| a.category.is_empty()));
    }

    #[tokio::test]
    async fn oracle_is_not_consulted_when_auto_summarize_is_off() {
        let db = Database::new_in_memory().await.unwrap();
        add_source(&db, "feed", SourceKind::Feed, "https://feed.example").await;

        // auto_summarize unset: the oracle label must not appear
        let orchestrator = scripted_orchestrator(db)
            .with_oracle(Arc::new(FixedOracle { label: "AI/ML" }));
        orchestrator.collect_all().await.unwrap();

        let (stored, _) = ArticleRepository::new(orchestrator.database())
            .list(&ArticleFilter::default())
            .await
            .unwrap();
        assert!(stored.iter().all(|a| a.category.is_empty()));
    }
}
