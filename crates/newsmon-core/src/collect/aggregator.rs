use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;

use super::normalize::truncate_chars;
use super::{http_client, Collector};
use crate::config::AppConfig;
use crate::model::{RawArticle, Source};
use crate::Result;

const LISTING_LIMIT: u32 = 50;
const MAX_SELFTEXT_CHARS: usize = 500;

/// Collector for reddit-style JSON listing endpoints
pub struct AggregatorCollector {
    client: Client,
}

impl AggregatorCollector {
    pub fn new(config: &AppConfig) -> Result<Self> {
        // The remote API's usage policy requires a descriptive client
        // identifier.
        let client = http_client(
            config.http.request_timeout_secs,
            &config.http.aggregator_user_agent,
        )?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Collector for AggregatorCollector {
    async fn collect(&self, source: &Source) -> Result<Vec<RawArticle>> {
        let Some(subreddit) = resolve_subreddit(source) else {
            tracing::error!("No subreddit configured for '{}'", source.name);
            return Ok(Vec::new());
        };

        let url = format!("https://www.reddit.com/r/{subreddit}/hot.json?limit={LISTING_LIMIT}");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Aggregator fetch failed for r/{}: {}", subreddit, e);
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Aggregator fetch failed for r/{}: HTTP {}", subreddit, status);
            return Ok(Vec::new());
        }

        let listing: Listing = match response.json().await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!("Aggregator payload malformed for r/{}: {}", subreddit, e);
                return Ok(Vec::new());
            }
        };

        let articles = listing_to_articles(listing);
        tracing::info!("Collected {} posts from r/{}", articles.len(), subreddit);
        Ok(articles)
    }
}

/// Subreddit name from explicit config, else the path segment after `/r/`
/// in the source url
fn resolve_subreddit(source: &Source) -> Option<String> {
    if let Some(name) = source.config.get("subreddit").and_then(|v| v.as_str()) {
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let (_, rest) = source.url.split_once("/r/")?;
    let name = rest.split('/').next().unwrap_or_default();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    data: PostData,
}

#[derive(Debug, Default, Deserialize)]
struct PostData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
}

fn listing_to_articles(listing: Listing) -> Vec<RawArticle> {
    listing
        .data
        .children
        .into_iter()
        .filter(|post| !post.data.stickied)
        .map(|post| post_to_article(post.data))
        .collect()
}

fn post_to_article(post: PostData) -> RawArticle {
    let published_date = if post.created_utc > 0.0 {
        DateTime::from_timestamp(post.created_utc as i64, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default()
    } else {
        String::new()
    };

    let description = if post.selftext.is_empty() {
        format!("Score: {} | Comments: {}", post.score, post.num_comments)
    } else {
        truncate_chars(&post.selftext, MAX_SELFTEXT_CHARS).to_string()
    };

    let url = if post.url.is_empty() {
        format!("https://reddit.com{}", post.permalink)
    } else {
        post.url
    };

    RawArticle {
        title: post.title,
        description,
        content: post.selftext,
        author: post.author,
        url,
        published_date,
        category: String::new(),
    }
}

/// Parse a raw listing payload; exposed for fixture-driven tests
pub fn parse_listing(json: &str) -> Result<Vec<RawArticle>> {
    let listing: Listing = serde_json::from_str(json)?;
    Ok(listing_to_articles(listing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn source_with(url: &str, config: Map<String, serde_json::Value>) -> Source {
        Source {
            id: 1,
            name: "r/test".into(),
            kind: "reddit".into(),
            url: url.into(),
            enabled: true,
            config,
            last_fetched: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn subreddit_from_config_wins() {
        let mut config = Map::new();
        config.insert("subreddit".into(), "rust".into());
        let source = source_with("https://www.reddit.com/r/technology", config);
        assert_eq!(resolve_subreddit(&source).as_deref(), Some("rust"));
    }

    #[test]
    fn subreddit_extracted_from_url() {
        let source = source_with("https://www.reddit.com/r/programming/", Map::new());
        assert_eq!(resolve_subreddit(&source).as_deref(), Some("programming"));
    }

    #[test]
    fn missing_subreddit_resolves_to_none() {
        let source = source_with("https://www.reddit.com/hot", Map::new());
        assert_eq!(resolve_subreddit(&source), None);
    }

    const LISTING_FIXTURE: &str = r#"{
        "data": {
            "children": [
                {"data": {
                    "title": "Pinned megathread",
                    "stickied": true,
                    "url": "https://example.com/pinned",
                    "created_utc": 1735689600
                }},
                {"data": {
                    "title": "A normal post",
                    "selftext": "",
                    "author": "alice",
                    "url": "",
                    "permalink": "/r/test/comments/abc/a_normal_post/",
                    "stickied": false,
                    "created_utc": 1735689600,
                    "score": 42,
                    "num_comments": 7
                }}
            ]
        }
    }"#;

    #[test]
    fn stickied_posts_are_skipped() {
        let articles = parse_listing(LISTING_FIXTURE).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "A normal post");
    }

    #[test]
    fn empty_selftext_synthesizes_description() {
        let articles = parse_listing(LISTING_FIXTURE).unwrap();
        assert_eq!(articles[0].description, "Score: 42 | Comments: 7");
    }

    #[test]
    fn missing_link_falls_back_to_permalink() {
        let articles = parse_listing(LISTING_FIXTURE).unwrap();
        assert_eq!(
            articles[0].url,
            "https://reddit.com/r/test/comments/abc/a_normal_post/"
        );
    }

    #[test]
    fn timestamp_converted_to_iso8601() {
        let articles = parse_listing(LISTING_FIXTURE).unwrap();
        assert!(articles[0].published_date.starts_with("2025-01-01"));
    }

    #[test]
    fn zero_timestamp_yields_empty_date() {
        let json = r#"{"data": {"children": [
            {"data": {"title": "t", "url": "https://example.com", "created_utc": 0}}
        ]}}"#;
        let articles = parse_listing(json).unwrap();
        assert_eq!(articles[0].published_date, "");
    }
}
