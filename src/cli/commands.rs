use async_trait::async_trait;
use tracing::warn;
use url::Url;

use crate::aggregator::scrape_feeds;
use crate::app::{AppContext, GatorError, Result};
use crate::cli::middleware::{logged_in, AuthedHandler};
use crate::cli::registry::{Command, CommandHandler, Commands};
use crate::domain::{Feed, FeedFollow, User};
use crate::fetcher::fetch_feed;
use crate::store::Store;

pub const DEMO_FEED_URL: &str = "https://www.wagslane.dev/index.xml";
pub const DEFAULT_BROWSE_LIMIT: usize = 2;

/// The full command table.
pub fn registry() -> Commands {
    let mut commands = Commands::new();

    commands.register("register", Register);
    commands.register("login", Login);
    commands.register("reset", Reset);
    commands.register("users", Users);
    commands.register("agg", Agg);
    commands.register("scrape", Scrape);
    commands.register("feeds", Feeds);
    commands.register("addfeed", logged_in(AddFeed));
    commands.register("follow", logged_in(Follow));
    commands.register("following", logged_in(Following));
    commands.register("unfollow", logged_in(Unfollow));
    commands.register("browse", logged_in(Browse));

    commands
}

pub struct Register;

#[async_trait]
impl CommandHandler for Register {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command) -> Result<()> {
        let name = cmd.arg(0, "register <name>")?;

        let mut user = User::new(name.to_string());
        user.id = ctx.store.add_user(&user).map_err(|e| match e {
            GatorError::Duplicate(_) => GatorError::UserExists(name.to_string()),
            other => other,
        })?;

        ctx.config.set_user(&user.name);
        println!("User {} registered successfully", user.name);
        Ok(())
    }
}

pub struct Login;

#[async_trait]
impl CommandHandler for Login {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command) -> Result<()> {
        let name = cmd.arg(0, "login <name>")?;

        let user = ctx
            .store
            .get_user_by_name(name)?
            .ok_or_else(|| GatorError::UserNotFound(name.to_string()))?;

        ctx.config.set_user(&user.name);
        println!("User set to {}", user.name);
        Ok(())
    }
}

/// Deletes every user; feeds, follows and posts go with them.
pub struct Reset;

#[async_trait]
impl CommandHandler for Reset {
    async fn run(&self, ctx: &mut AppContext, _cmd: &Command) -> Result<()> {
        let count = ctx.store.delete_all_users()?;
        println!("All users have been reset successfully ({} removed)", count);
        Ok(())
    }
}

pub struct Users;

#[async_trait]
impl CommandHandler for Users {
    async fn run(&self, ctx: &mut AppContext, _cmd: &Command) -> Result<()> {
        let users = ctx.store.get_users()?;

        if users.is_empty() {
            println!("No users found");
            return Ok(());
        }

        println!("Registered Users:");
        let current = ctx.config.current_user();
        for user in users {
            if Some(user.name.as_str()) == current {
                println!("- {} (current)", user.name);
            } else {
                println!("- {}", user.name);
            }
        }
        Ok(())
    }
}

/// Fetch one feed (the demo feed unless a URL is given) and print it.
pub struct Agg;

#[async_trait]
impl CommandHandler for Agg {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command) -> Result<()> {
        let url = cmd.args.first().map(String::as_str).unwrap_or(DEMO_FEED_URL);
        let feed = fetch_feed(ctx.fetcher.as_ref(), url).await?;

        println!("{}", feed.title);
        println!("{}", feed.description);
        println!("Items:");
        for item in feed.items {
            println!("- {} ({})", item.title, item.pub_date);
            if !item.description.is_empty() {
                println!("  {}", item.description);
            }
        }
        Ok(())
    }
}

/// One ingestion run over the least recently fetched feed.
pub struct Scrape;

#[async_trait]
impl CommandHandler for Scrape {
    async fn run(&self, ctx: &mut AppContext, _cmd: &Command) -> Result<()> {
        let report = scrape_feeds(&ctx.store, ctx.fetcher.as_ref()).await?;

        println!("{} ({})", report.feed_name, report.feed_url);
        println!(
            "  {} added, {} already present, {} failed",
            report.added, report.existing, report.failed
        );
        Ok(())
    }
}

pub struct Feeds;

#[async_trait]
impl CommandHandler for Feeds {
    async fn run(&self, ctx: &mut AppContext, _cmd: &Command) -> Result<()> {
        let feeds = ctx.store.get_feeds()?;

        if feeds.is_empty() {
            println!("No feeds found");
            return Ok(());
        }

        println!("Registered Feeds:");
        for feed in feeds {
            let owner = match ctx.store.get_user(feed.user_id) {
                Ok(Some(user)) => user.name,
                Ok(None) => {
                    warn!("Feed {} has no owner {}", feed.name, feed.user_id);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to get user for feed {}: {}", feed.name, e);
                    continue;
                }
            };
            println!("- '{}' : {}", feed.name, feed.url);
            println!("  User: {}", owner);
        }
        Ok(())
    }
}

/// Create a feed and follow it as its owner.
pub struct AddFeed;

#[async_trait]
impl AuthedHandler for AddFeed {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command, user: User) -> Result<()> {
        const USAGE: &str = "addfeed <name> <url>";
        let name = cmd.arg(0, USAGE)?;
        let url = cmd.arg(1, USAGE)?;
        Url::parse(url)?;

        let mut feed = Feed::new(name.to_string(), url.to_string(), user.id);
        feed.id = ctx.store.add_feed(&feed).map_err(|e| match e {
            GatorError::Duplicate(_) => GatorError::FeedExists(url.to_string()),
            other => other,
        })?;

        ctx.store.add_feed_follow(&FeedFollow::new(user.id, feed.id))?;

        println!("Feed {} added successfully", feed.name);
        println!("  URL: {}", feed.url);
        println!("  Followed by: {}", user.name);
        Ok(())
    }
}

pub struct Follow;

#[async_trait]
impl AuthedHandler for Follow {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command, user: User) -> Result<()> {
        let url = cmd.arg(0, "follow <url>")?;

        let feed = ctx
            .store
            .get_feed_by_url(url)?
            .ok_or_else(|| GatorError::FeedNotFound(url.to_string()))?;

        ctx.store
            .add_feed_follow(&FeedFollow::new(user.id, feed.id))
            .map_err(|e| match e {
                GatorError::Duplicate(_) => GatorError::AlreadyFollowing(feed.name.clone()),
                other => other,
            })?;

        println!("{} is now following {}", user.name, feed.name);
        Ok(())
    }
}

pub struct Following;

#[async_trait]
impl AuthedHandler for Following {
    async fn run(&self, ctx: &mut AppContext, _cmd: &Command, user: User) -> Result<()> {
        let follows = ctx.store.get_feed_follows_for_user(user.id)?;

        if follows.is_empty() {
            println!("No followed feeds found");
            return Ok(());
        }

        println!("Feeds followed by {}:", user.name);
        for follow in follows {
            println!("- {}", follow.feed_name);
        }
        Ok(())
    }
}

pub struct Unfollow;

#[async_trait]
impl AuthedHandler for Unfollow {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command, user: User) -> Result<()> {
        let url = cmd.arg(0, "unfollow <url>")?;

        let feed = ctx
            .store
            .get_feed_by_url(url)?
            .ok_or_else(|| GatorError::FeedNotFound(url.to_string()))?;

        ctx.store.delete_feed_follow(user.id, feed.id)?;

        println!("{} unfollowed {}", user.name, feed.name);
        Ok(())
    }
}

/// Most recent posts from the feeds the user follows.
pub struct Browse;

#[async_trait]
impl AuthedHandler for Browse {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command, user: User) -> Result<()> {
        let limit = match cmd.args.first() {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| GatorError::MissingArgument {
                    usage: "browse [limit]",
                })?,
            None => DEFAULT_BROWSE_LIMIT,
        };

        let posts = ctx.store.get_posts_for_user(user.id, limit)?;

        if posts.is_empty() {
            println!("No posts found");
            return Ok(());
        }

        for post in posts {
            let date = post
                .published_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "undated".to_string());
            println!("{}  {}", date, post.display_title());
            println!("  {}", post.url);
            if let Some(description) = post.description.as_deref() {
                println!("  {}", description);
            }
        }
        Ok(())
    }
}
