use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedFollow {
    pub fn new(user_id: i64, feed_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            feed_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A follow joined with the names needed for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowedFeed {
    pub feed_id: i64,
    pub feed_name: String,
}
