pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Feed, FeedFollow, FollowedFeed, Post, User};

pub use sqlite::SqliteStore;

pub trait Store {
    // User operations
    fn add_user(&self, user: &User) -> Result<i64>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;
    fn get_users(&self) -> Result<Vec<User>>;
    fn delete_all_users(&self) -> Result<usize>;

    // Feed operations
    fn add_feed(&self, feed: &Feed) -> Result<i64>;
    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;
    fn get_feeds(&self) -> Result<Vec<Feed>>;
    fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>>;
    fn mark_feed_fetched(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    // Follow operations
    fn add_feed_follow(&self, follow: &FeedFollow) -> Result<i64>;
    fn get_feed_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowedFeed>>;
    fn delete_feed_follow(&self, user_id: i64, feed_id: i64) -> Result<()>;

    // Post operations
    fn add_post(&self, post: &Post) -> Result<i64>;
    fn get_posts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<Post>>;
}
