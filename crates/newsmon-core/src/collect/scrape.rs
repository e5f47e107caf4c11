use chrono::Utc;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use url::Url;

use super::normalize::truncate_chars;
use super::{http_client, Collector};
use crate::config::AppConfig;
use crate::model::{RawArticle, Source};
use crate::{Error, Result};

const MAX_CONTAINERS: usize = 30;
const MAX_DESCRIPTION_CHARS: usize = 500;

const DEFAULT_CONTAINER: &str = "article";
const DEFAULT_TITLE: &str = "h2 a, h3 a, .title a";
const DEFAULT_DESCRIPTION: &str = "p, .summary, .excerpt";
const DEFAULT_LINK: &str = "a";
/// Tried when the configured container selector matches nothing
const FALLBACK_CONTAINERS: &str = "article, .post, .entry, .item";

/// CSS selectors controlling page extraction, parsed once from the
/// source's opaque config map. The raw map never travels deeper than this.
pub struct ScrapeSelectors {
    container: Selector,
    title: Selector,
    description: Selector,
    link: Selector,
}

impl ScrapeSelectors {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let selectors = config
            .get("selectors")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let pick = |key: &str, default: &str| -> Result<Selector> {
            let raw = selectors
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or(default);
            Selector::parse(raw).map_err(|e| Error::Selector(format!("{key}: {e}")))
        };

        Ok(Self {
            container: pick("article", DEFAULT_CONTAINER)?,
            title: pick("title", DEFAULT_TITLE)?,
            description: pick("description", DEFAULT_DESCRIPTION)?,
            link: pick("link", DEFAULT_LINK)?,
        })
    }
}

impl Default for ScrapeSelectors {
    fn default() -> Self {
        Self::from_config(&Map::new()).expect("default selectors are valid")
    }
}

/// Collector that extracts article listings from generic web pages
pub struct ScrapeCollector {
    client: Client,
}

impl ScrapeCollector {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = http_client(
            config.http.request_timeout_secs,
            &config.http.scrape_user_agent,
        )?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Collector for ScrapeCollector {
    async fn collect(&self, source: &Source) -> Result<Vec<RawArticle>> {
        let selectors = match ScrapeSelectors::from_config(&source.config) {
            Ok(selectors) => selectors,
            Err(e) => {
                tracing::error!("Bad selector config for '{}': {}", source.name, e);
                return Ok(Vec::new());
            }
        };

        let response = match self.client.get(&source.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Scrape fetch failed for '{}': {}", source.name, e);
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Scrape fetch failed for '{}': HTTP {}", source.name, status);
            return Ok(Vec::new());
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Scrape body read failed for '{}': {}", source.name, e);
                return Ok(Vec::new());
            }
        };

        let articles = extract_articles(&html, &source.url, &selectors);
        tracing::info!("Scraped {} articles from '{}'", articles.len(), source.name);
        Ok(articles)
    }
}

/// Extract article records from a page.
///
/// Containers come from the configured selector, falling back to a set of
/// common patterns when it matches nothing; capped at [`MAX_CONTAINERS`].
/// Items missing a title or link are skipped. The page carries no reliable
/// per-item timestamp, so `published_date` is the collection time.
pub fn extract_articles(html: &str, base_url: &str, selectors: &ScrapeSelectors) -> Vec<RawArticle> {
    let document = Html::parse_document(html);

    let mut containers: Vec<ElementRef> = document
        .select(&selectors.container)
        .take(MAX_CONTAINERS)
        .collect();

    if containers.is_empty() {
        let fallback =
            Selector::parse(FALLBACK_CONTAINERS).expect("fallback container selector is valid");
        containers = document.select(&fallback).take(MAX_CONTAINERS).collect();
    }

    let any_anchor = Selector::parse("a").expect("anchor selector is valid");
    let collected_at = Utc::now().to_rfc3339();

    containers
        .into_iter()
        .filter_map(|container| {
            let title_el = container.select(&selectors.title).next();
            let title = title_el
                .map(|el| element_text(&el))
                .unwrap_or_default();

            let link_el = container
                .select(&selectors.link)
                .next()
                .or_else(|| container.select(&any_anchor).next());
            let link = link_el
                .and_then(|el| el.value().attr("href"))
                .unwrap_or_default();

            if title.is_empty() || link.is_empty() {
                return None;
            }

            let url = resolve_link(link, base_url)?;

            let description = container
                .select(&selectors.description)
                .next()
                .map(|el| truncate_chars(&element_text(&el), MAX_DESCRIPTION_CHARS).to_string())
                .unwrap_or_default();

            Some(RawArticle {
                title,
                description,
                content: String::new(),
                author: String::new(),
                url,
                published_date: collected_at.clone(),
                category: String::new(),
            })
        })
        .collect()
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Resolve a possibly relative href against the page url
fn resolve_link(link: &str, base_url: &str) -> Option<String> {
    if link.starts_with("http") {
        return Some(link.to_string());
    }
    let base = Url::parse(base_url).ok()?;
    base.join(link).ok().map(|u| u.to_string())
}
