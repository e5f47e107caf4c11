use feed_rs::parser;
use reqwest::Client;

use super::normalize::truncate_chars;
use super::{http_client, Collector};
use crate::config::AppConfig;
use crate::model::{RawArticle, Source};
use crate::{Error, Result};

const MAX_ENTRIES: usize = 50;
const MAX_SUMMARY_CHARS: usize = 500;
const FEED_USER_AGENT: &str = "newsmon/0.1 (feed reader)";

/// Collector for RSS/Atom syndication feeds
pub struct FeedCollector {
    client: Client,
}

impl FeedCollector {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = http_client(config.http.request_timeout_secs, FEED_USER_AGENT)?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Collector for FeedCollector {
    async fn collect(&self, source: &Source) -> Result<Vec<RawArticle>> {
        let response = match self.client.get(&source.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Feed fetch failed for '{}': {}", source.name, e);
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Feed fetch failed for '{}': HTTP {}", source.name, status);
            return Ok(Vec::new());
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Feed body read failed for '{}': {}", source.name, e);
                return Ok(Vec::new());
            }
        };

        match parse_entries(&body) {
            Ok(articles) => {
                tracing::info!("Collected {} entries from '{}'", articles.len(), source.name);
                Ok(articles)
            }
            Err(e) => {
                tracing::warn!("Feed parse warning for '{}': {}", source.name, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Parse feed content into raw article records, capped at [`MAX_ENTRIES`]
pub fn parse_entries(content: &[u8]) -> Result<Vec<RawArticle>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let articles = feed
        .entries
        .into_iter()
        .take(MAX_ENTRIES)
        .map(|entry| {
            let published_date = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default();

            let summary = entry.summary.map(|s| s.content).unwrap_or_default();

            let content = entry
                .content
                .and_then(|c| c.body)
                .unwrap_or_else(|| summary.clone());

            RawArticle {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                description: truncate_chars(&summary, MAX_SUMMARY_CHARS).to_string(),
                content,
                author: entry
                    .authors
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                url: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                published_date,
                category: String::new(),
            }
        })
        .collect();

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTRY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <link>https://example.com</link>
    <item>
      <title>Entry A</title>
      <link>https://example.com/a</link>
      <description>First summary</description>
      <author>alice@example.com (Alice)</author>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Entry B</title>
      <link>https://example.com/b</link>
      <description>Second summary</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_entries_with_date_fallback() {
        let articles = parse_entries(TWO_ENTRY_FEED.as_bytes()).unwrap();
        assert_eq!(articles.len(), 2);

        assert_eq!(articles[0].title, "Entry A");
        assert_eq!(articles[0].url, "https://example.com/a");
        assert!(articles[0].published_date.starts_with("2025-01-06"));

        // No published or updated field at all
        assert_eq!(articles[1].published_date, "");
    }

    #[test]
    fn content_falls_back_to_summary() {
        let articles = parse_entries(TWO_ENTRY_FEED.as_bytes()).unwrap();
        assert_eq!(articles[0].content, "First summary");
        assert_eq!(articles[0].description, "First summary");
    }

    #[test]
    fn atom_updated_used_when_published_missing() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <id>urn:example</id>
  <updated>2025-02-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry</title>
    <id>urn:example:1</id>
    <link href="https://example.com/atom/1"/>
    <updated>2025-02-01T12:00:00Z</updated>
  </entry>
</feed>"#;
        let articles = parse_entries(atom.as_bytes()).unwrap();
        assert_eq!(articles.len(), 1);
        assert!(articles[0].published_date.starts_with("2025-02-01T12"));
    }

    #[test]
    fn malformed_body_is_an_error_not_a_panic() {
        assert!(parse_entries(b"not a feed at all").is_err());
    }

    #[test]
    fn caps_at_fifty_entries() {
        let mut feed = String::from(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>big</title>"#,
        );
        for i in 0..60 {
            feed.push_str(&format!(
                "<item><title>Entry {i}</title><link>https://example.com/{i}</link></item>"
            ));
        }
        feed.push_str("</channel></rss>");

        let articles = parse_entries(feed.as_bytes()).unwrap();
        assert_eq!(articles.len(), 50);
    }
}
