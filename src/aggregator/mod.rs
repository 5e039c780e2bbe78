//! Single-feed ingestion.
//!
//! Each call to [`scrape_feeds`] handles exactly one feed: the one fetched
//! longest ago. Repeated runs are left to whatever invokes the binary.

use chrono::Utc;
use tracing::{info, warn};

use crate::app::{GatorError, Result};
use crate::domain::Post;
use crate::fetcher::{fetch_feed, Fetcher};
use crate::normalizer::parse_pub_date;
use crate::store::Store;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    pub feed_name: String,
    pub feed_url: String,
    pub added: usize,
    pub existing: usize,
    pub failed: usize,
}

/// Fetch the least recently fetched feed and store its new posts.
///
/// The feed is marked fetched before the request goes out and that mark
/// stays even when the fetch, the parse, or a date fails. A bad `pubDate`
/// stops the run at that item; a failed insert only skips the item.
pub async fn scrape_feeds<S>(store: &S, fetcher: &(dyn Fetcher + Send + Sync)) -> Result<ScrapeReport>
where
    S: Store + Sync + ?Sized,
{
    let feed = store.get_next_feed_to_fetch()?.ok_or(GatorError::NoFeeds)?;
    info!(feed = %feed.name, url = %feed.url, "Fetching feed");

    let now = Utc::now();
    store.mark_feed_fetched(feed.id, now)?;

    let rss = fetch_feed(fetcher, &feed.url).await?;

    let mut report = ScrapeReport {
        feed_name: feed.name.clone(),
        feed_url: feed.url.clone(),
        ..Default::default()
    };

    for item in rss.items {
        let published_at = parse_pub_date(&item.pub_date)?;

        let mut post = Post::new(feed.id, item.title, item.link);
        post.description = (!item.description.is_empty()).then_some(item.description);
        post.published_at = published_at;

        match store.add_post(&post) {
            Ok(_) => {
                info!("Added post: {}", post.display_title());
                report.added += 1;
            }
            Err(GatorError::Duplicate(_)) => {
                info!("Post already exists: {}", post.display_title());
                report.existing += 1;
            }
            Err(e) => {
                warn!("Couldn't create post {}: {}", post.url, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Finished {}: {} added, {} already present, {} failed",
        report.feed_name, report.added, report.existing, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use chrono::DateTime;

    use crate::domain::{Feed, FeedFollow, FollowedFeed, User};
    use crate::store::SqliteStore;

    /// Rejects inserts of one post URL with a database error.
    struct FailingPostStore {
        inner: SqliteStore,
        fail_url: &'static str,
    }

    impl Store for FailingPostStore {
        fn add_user(&self, user: &User) -> Result<i64> {
            self.inner.add_user(user)
        }
        fn get_user(&self, id: i64) -> Result<Option<User>> {
            self.inner.get_user(id)
        }
        fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
            self.inner.get_user_by_name(name)
        }
        fn get_users(&self) -> Result<Vec<User>> {
            self.inner.get_users()
        }
        fn delete_all_users(&self) -> Result<usize> {
            self.inner.delete_all_users()
        }
        fn add_feed(&self, feed: &Feed) -> Result<i64> {
            self.inner.add_feed(feed)
        }
        fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
            self.inner.get_feed_by_url(url)
        }
        fn get_feeds(&self) -> Result<Vec<Feed>> {
            self.inner.get_feeds()
        }
        fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>> {
            self.inner.get_next_feed_to_fetch()
        }
        fn mark_feed_fetched(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
            self.inner.mark_feed_fetched(id, at)
        }
        fn add_feed_follow(&self, follow: &FeedFollow) -> Result<i64> {
            self.inner.add_feed_follow(follow)
        }
        fn get_feed_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowedFeed>> {
            self.inner.get_feed_follows_for_user(user_id)
        }
        fn delete_feed_follow(&self, user_id: i64, feed_id: i64) -> Result<()> {
            self.inner.delete_feed_follow(user_id, feed_id)
        }
        fn add_post(&self, post: &Post) -> Result<i64> {
            if post.url == self.fail_url {
                return Err(GatorError::Database(rusqlite::Error::InvalidQuery));
            }
            self.inner.add_post(post)
        }
        fn get_posts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<Post>> {
            self.inner.get_posts_for_user(user_id, limit)
        }
    }

    /// Serves canned bodies by URL and records every request.
    #[derive(Default)]
    struct CannedFetcher {
        bodies: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url)
                .map(|b| b.clone().into_bytes())
                .ok_or_else(|| GatorError::Fetch {
                    url: url.to_string(),
                    status: 500,
                })
        }
    }

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link, date)| {
                format!("<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate></item>")
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title><link>https://x</link><description>D</description>{items}</channel></rss>"#
        )
    }

    fn setup(urls: &[&str]) -> (SqliteStore, i64, Vec<i64>) {
        let store = SqliteStore::in_memory().unwrap();
        let user_id = store.add_user(&User::new("alice".into())).unwrap();
        let feed_ids = urls
            .iter()
            .map(|url| {
                let id = store
                    .add_feed(&Feed::new(format!("Feed {url}"), url.to_string(), user_id))
                    .unwrap();
                store.add_feed_follow(&FeedFollow::new(user_id, id)).unwrap();
                id
            })
            .collect();
        (store, user_id, feed_ids)
    }

    const DATE: &str = "Mon, 02 Jan 2006 15:04:05 -0700";

    #[tokio::test]
    async fn test_no_feeds_is_error() {
        let store = SqliteStore::in_memory().unwrap();
        let fetcher = CannedFetcher::default();

        let err = scrape_feeds(&store, &fetcher).await.unwrap_err();
        assert!(matches!(err, GatorError::NoFeeds));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_adds_posts_and_marks_fetched() {
        let (store, user_id, _) = setup(&["https://a.example/rss"]);
        let fetcher = CannedFetcher::default().with(
            "https://a.example/rss",
            &rss(&[
                ("First", "https://a.example/1", DATE),
                ("Second", "https://a.example/2", ""),
            ]),
        );

        let report = scrape_feeds(&store, &fetcher).await.unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.existing, 0);

        let feed = store.get_feed_by_url("https://a.example/rss").unwrap().unwrap();
        assert!(feed.last_fetched_at.is_some());

        let posts = store.get_posts_for_user(user_id, 10).unwrap();
        assert_eq!(posts.len(), 2);
        let second = posts.iter().find(|p| p.title == "Second").unwrap();
        assert!(second.published_at.is_none());
        let first = posts.iter().find(|p| p.title == "First").unwrap();
        assert!(first.published_at.is_some());
    }

    #[tokio::test]
    async fn test_second_run_inserts_no_duplicates() {
        let (store, user_id, _) = setup(&["https://a.example/rss"]);
        let body = rss(&[
            ("First", "https://a.example/1", DATE),
            ("Second", "https://a.example/2", DATE),
        ]);
        let fetcher = CannedFetcher::default().with("https://a.example/rss", &body);

        scrape_feeds(&store, &fetcher).await.unwrap();
        let report = scrape_feeds(&store, &fetcher).await.unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.existing, 2);
        assert_eq!(store.get_posts_for_user(user_id, 10).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rotates_through_feeds() {
        let (store, _, _) = setup(&["https://a.example/rss", "https://b.example/rss"]);
        let fetcher = CannedFetcher::default()
            .with("https://a.example/rss", &rss(&[]))
            .with("https://b.example/rss", &rss(&[]));

        scrape_feeds(&store, &fetcher).await.unwrap();
        scrape_feeds(&store, &fetcher).await.unwrap();
        scrape_feeds(&store, &fetcher).await.unwrap();

        assert_eq!(
            fetcher.requests(),
            vec![
                "https://a.example/rss",
                "https://b.example/rss",
                "https://a.example/rss"
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_fetched_mark() {
        let (store, _, _) = setup(&["https://down.example/rss", "https://up.example/rss"]);
        let fetcher = CannedFetcher::default().with("https://up.example/rss", &rss(&[]));

        let err = scrape_feeds(&store, &fetcher).await.unwrap_err();
        assert!(matches!(err, GatorError::Fetch { status: 500, .. }));

        let down = store.get_feed_by_url("https://down.example/rss").unwrap().unwrap();
        assert!(down.last_fetched_at.is_some());

        // The failed feed is no longer first in line.
        let report = scrape_feeds(&store, &fetcher).await.unwrap();
        assert_eq!(report.feed_url, "https://up.example/rss");
    }

    #[tokio::test]
    async fn test_bad_date_aborts_run() {
        let (store, user_id, _) = setup(&["https://a.example/rss"]);
        let fetcher = CannedFetcher::default().with(
            "https://a.example/rss",
            &rss(&[
                ("Good", "https://a.example/1", DATE),
                ("Bad", "https://a.example/2", "yesterday"),
                ("Never reached", "https://a.example/3", DATE),
            ]),
        );

        let err = scrape_feeds(&store, &fetcher).await.unwrap_err();
        assert!(matches!(err, GatorError::DateFormat { .. }));

        let titles: Vec<String> = store
            .get_posts_for_user(user_id, 10)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Good"]);
    }

    #[tokio::test]
    async fn test_duplicate_url_within_document_is_skipped() {
        let (store, user_id, _) = setup(&["https://a.example/rss"]);
        let fetcher = CannedFetcher::default().with(
            "https://a.example/rss",
            &rss(&[
                ("One", "https://a.example/same", DATE),
                ("Two", "https://a.example/same", DATE),
                ("Three", "https://a.example/3", DATE),
            ]),
        );

        let report = scrape_feeds(&store, &fetcher).await.unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.existing, 1);
        assert_eq!(store.get_posts_for_user(user_id, 10).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_insert_is_skipped() {
        let (inner, user_id, _) = setup(&["https://a.example/rss"]);
        let store = FailingPostStore {
            inner,
            fail_url: "https://a.example/2",
        };
        let fetcher = CannedFetcher::default().with(
            "https://a.example/rss",
            &rss(&[
                ("Before", "https://a.example/1", DATE),
                ("Broken", "https://a.example/2", DATE),
                ("After", "https://a.example/3", DATE),
            ]),
        );

        let report = scrape_feeds(&store, &fetcher).await.unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.existing, 0);
        assert_eq!(report.failed, 1);

        let mut titles: Vec<String> = store
            .get_posts_for_user(user_id, 10)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["After", "Before"]);
    }
}
