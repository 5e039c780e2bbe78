use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    /// `None` until the feed is picked by the aggregator for the first time.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(name: String, url: String, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name,
            url,
            user_id,
            last_fetched_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
