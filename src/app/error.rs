use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum GatorError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch feed {url}: status code {status}")]
    Fetch { url: String, status: u16 },

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Failed to parse pubDate {input:?}: {reason}")]
    DateFormat { input: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("No feeds to fetch")]
    NoFeeds,

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("No follow found for user {user_id} on feed {feed_id}")]
    FollowNotFound { user_id: i64, feed_id: i64 },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Error executing command {name}: {source}")]
    Command {
        name: String,
        #[source]
        source: Box<GatorError>,
    },

    // Fatal preconditions. These reach the top level without command context.
    #[error("usage: {usage}")]
    MissingArgument { usage: &'static str },

    #[error("No user logged in; run `gator login <name>` first")]
    NotLoggedIn,

    #[error("User {0} already exists")]
    UserExists(String),

    #[error("User {0} does not exist")]
    UserNotFound(String),

    #[error("Feed {0} already exists")]
    FeedExists(String),

    #[error("Already following {0}")]
    AlreadyFollowing(String),

    #[error("Failed to get current user {name}: {source}")]
    SessionLookup {
        name: String,
        #[source]
        source: Box<GatorError>,
    },
}

impl GatorError {
    /// Fatal errors end the process with their bare message; everything else
    /// is reported with the failing command's name attached.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GatorError::MissingArgument { .. }
                | GatorError::NotLoggedIn
                | GatorError::UserExists(_)
                | GatorError::UserNotFound(_)
                | GatorError::FeedExists(_)
                | GatorError::AlreadyFollowing(_)
                | GatorError::SessionLookup { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(GatorError::NotLoggedIn.is_fatal());
        assert!(GatorError::UserExists("alice".into()).is_fatal());
        assert!(GatorError::MissingArgument { usage: "login <name>" }.is_fatal());

        assert!(!GatorError::NoFeeds.is_fatal());
        assert!(!GatorError::UnknownCommand("nope".into()).is_fatal());
        assert!(!GatorError::Fetch {
            url: "https://example.com".into(),
            status: 500
        }
        .is_fatal());
    }

    #[test]
    fn test_command_wrap_message() {
        let err = GatorError::Command {
            name: "follow".into(),
            source: Box::new(GatorError::FeedNotFound("https://example.com/rss".into())),
        };
        assert_eq!(
            err.to_string(),
            "Error executing command follow: Feed not found: https://example.com/rss"
        );
    }
}
