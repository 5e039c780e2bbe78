//! # Gator
//!
//! A command-line RSS aggregator. Users register, add and follow feeds, and
//! each `gator scrape` pulls new posts for one feed into SQLite.
//!
//! ## Architecture
//!
//! ```text
//! CLI → Commands registry → (LoggedIn) → handler → Store
//!                                           └→ aggregator → fetcher → normalizer
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gator register alice
//! gator addfeed "Rust Blog" https://blog.rust-lang.org/feed.xml
//! gator scrape
//! gator browse 10
//! ```

/// Ingestion of one feed per run.
///
/// [`scrape_feeds`](aggregator::scrape_feeds) picks the least recently
/// fetched feed, marks it, fetches it and inserts posts it hasn't seen.
pub mod aggregator;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// the fetcher and the session config.
pub mod app;

/// Command-line interface.
///
/// - [`Cli`](cli::Cli): clap argument parser
/// - [`Commands`](cli::Commands): name → handler table
/// - [`LoggedIn`](cli::LoggedIn): wraps handlers that need the current user
pub mod cli;

/// Session configuration stored in `~/.gatorconfig.json`.
pub mod config;

/// Core domain models: users, feeds, follows and posts.
pub mod domain;

/// HTTP fetching of feed documents.
pub mod fetcher;

/// RSS parsing, HTML entity unescaping and `pubDate` parsing.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
