pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::normalizer::{self, RssFeed};

pub use http_fetcher::HttpFetcher;

/// Downloads a feed document. Implementations fail on any non-success status.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetch `url` and parse it into an [`RssFeed`].
///
/// Item dates are left as raw text; callers decide what to do with
/// unparsable ones.
pub async fn fetch_feed(fetcher: &(dyn Fetcher + Send + Sync), url: &str) -> Result<RssFeed> {
    let body = fetcher.fetch(url).await?;
    normalizer::parse_feed(&body)
}
