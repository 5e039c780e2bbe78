use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{GatorError, Result};
use crate::domain::{Feed, FeedFollow, FollowedFeed, Post, User};
use crate::store::Store;

const USER_COLUMNS: &str = "id, name, created_at, updated_at";
const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at, updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            GatorError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    /// Fixed-width UTC text so that `ORDER BY` on the column is chronological.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn timestamp(row: &Row<'_>, idx: usize) -> DateTime<Utc> {
        row.get::<_, String>(idx)
            .ok()
            .and_then(|s| Self::parse_datetime(&s))
            .unwrap_or_else(Utc::now)
    }

    fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
        Ok(row
            .get::<_, Option<String>>(idx)?
            .and_then(|s| Self::parse_datetime(&s)))
    }

    fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: Self::timestamp(row, 2),
            updated_at: Self::timestamp(row, 3),
        })
    }

    fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            user_id: row.get(3)?,
            last_fetched_at: Self::optional_timestamp(row, 4)?,
            created_at: Self::timestamp(row, 5),
            updated_at: Self::timestamp(row, 6),
        })
    }

    fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            feed_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            description: row.get(4)?,
            published_at: Self::optional_timestamp(row, 5)?,
            created_at: Self::timestamp(row, 6),
            updated_at: Self::timestamp(row, 7),
        })
    }
}

/// Turn a UNIQUE constraint failure into [`GatorError::Duplicate`].
fn map_unique(err: rusqlite::Error, entity: &'static str) -> GatorError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            GatorError::Duplicate(entity)
        }
        other => GatorError::Database(other),
    }
}

impl Store for SqliteStore {
    fn add_user(&self, user: &User) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (name, created_at, updated_at) VALUES (?1, ?2, ?3)",
            params![
                user.name,
                Self::format_datetime(&user.created_at),
                Self::format_datetime(&user.updated_at)
            ],
        )
        .map_err(|e| map_unique(e, "user"))?;

        Ok(conn.last_insert_rowid())
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                Self::user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1"),
                params![name],
                Self::user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    fn get_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name"))?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn delete_all_users(&self) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM users", [])?)
    }

    fn add_feed(&self, feed: &Feed) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feeds (name, url, user_id, last_fetched_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                feed.name,
                feed.url,
                feed.user_id,
                feed.last_fetched_at.as_ref().map(Self::format_datetime),
                Self::format_datetime(&feed.created_at),
                Self::format_datetime(&feed.updated_at)
            ],
        )
        .map_err(|e| map_unique(e, "feed"))?;

        Ok(conn.last_insert_rowid())
    }

    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1"),
                params![url],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(feed)
    }

    fn get_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare(&format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY name, url"))?;
        let feeds = stmt
            .query_map([], Self::feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let feed = conn
            .query_row(
                &format!(
                    "SELECT {FEED_COLUMNS} FROM feeds
                     ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
                     LIMIT 1"
                ),
                [],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(feed)
    }

    fn mark_feed_fetched(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;

        let at = Self::format_datetime(&at);
        let updated = conn.execute(
            "UPDATE feeds SET last_fetched_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![at, id],
        )?;

        if updated == 0 {
            return Err(GatorError::FeedNotFound(format!("id {id}")));
        }
        Ok(())
    }

    fn add_feed_follow(&self, follow: &FeedFollow) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                follow.user_id,
                follow.feed_id,
                Self::format_datetime(&follow.created_at),
                Self::format_datetime(&follow.updated_at)
            ],
        )
        .map_err(|e| map_unique(e, "feed follow"))?;

        Ok(conn.last_insert_rowid())
    }

    fn get_feed_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowedFeed>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT f.id, f.name
             FROM feed_follows ff
             JOIN feeds f ON f.id = ff.feed_id
             WHERE ff.user_id = ?1
             ORDER BY ff.id",
        )?;

        let follows = stmt
            .query_map(params![user_id], |row| {
                Ok(FollowedFeed {
                    feed_id: row.get(0)?,
                    feed_name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(follows)
    }

    fn delete_feed_follow(&self, user_id: i64, feed_id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute(
            "DELETE FROM feed_follows WHERE user_id = ?1 AND feed_id = ?2",
            params![user_id, feed_id],
        )?;

        if deleted == 0 {
            return Err(GatorError::FollowNotFound { user_id, feed_id });
        }
        Ok(())
    }

    fn add_post(&self, post: &Post) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO posts (feed_id, title, url, description, published_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                post.feed_id,
                post.title,
                post.url,
                post.description,
                post.published_at.as_ref().map(Self::format_datetime),
                Self::format_datetime(&post.created_at),
                Self::format_datetime(&post.updated_at)
            ],
        )
        .map_err(|e| map_unique(e, "post"))?;

        Ok(conn.last_insert_rowid())
    }

    fn get_posts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<Post>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT p.id, p.feed_id, p.title, p.url, p.description, p.published_at,
                    p.created_at, p.updated_at
             FROM posts p
             JOIN feed_follows ff ON ff.feed_id = p.feed_id
             WHERE ff.user_id = ?1
             ORDER BY p.published_at DESC NULLS LAST, p.id DESC
             LIMIT ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let posts = stmt
            .query_map(params![user_id, limit], Self::post_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}
