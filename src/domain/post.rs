use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    /// Unique across all posts; a second insert with the same URL is rejected.
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(feed_id: i64, title: String, url: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            feed_id,
            title,
            url,
            description: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
