mod aggregator;
mod feed;
mod fingerprint;
mod normalize;
mod orchestrator;
mod scrape;

pub use aggregator::AggregatorCollector;
pub use feed::FeedCollector;
pub use fingerprint::fingerprint;
pub use normalize::normalize;
pub(crate) use normalize::truncate_chars;
pub use orchestrator::Orchestrator;
pub use scrape::{ScrapeCollector, ScrapeSelectors};

use std::time::Duration;

use reqwest::Client;

use crate::model::{RawArticle, Source};
use crate::Result;

/// Common capability every collector variant satisfies.
///
/// A collector fetches from the network, parses, and emits raw per-source
/// records. Failures are isolated: a broken item skips that item, a broken
/// fetch logs and yields an empty batch. The orchestrator additionally
/// treats an `Err` as a zero-contribution source, so nothing a collector
/// does can abort the surrounding run.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self, source: &Source) -> Result<Vec<RawArticle>>;
}

/// Build an HTTP client with the given per-request timeout.
///
/// Every network call in the pipeline goes through a client built here; a
/// fetch without a timeout would stall the whole run.
pub(crate) fn http_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(crate::Error::Http)
}
