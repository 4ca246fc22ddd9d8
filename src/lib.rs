//! Turns a social timeline into an RSS feed of the pages its posts link to.
//!
//! Every link in every post becomes one feed item. Linked pages are fetched
//! concurrently (through a link cache), their `<title>` becomes the item
//! title, and items come out in the order the links appeared.
//!
//! - [`timeline`] - post model, loading and filtering
//! - [`storage`] - link cache backends (SQLite, in-memory LRU)
//! - [`content`] - cache-aside fetching and title extraction
//! - [`itemize`] - bounded concurrent dispatch of work units into feed items
//! - [`feed`] - feed assembly and RSS output
//! - [`config`] - TOML configuration
//! - [`util`] - URL validation and text cleanup

pub mod config;
pub mod content;
pub mod feed;
pub mod itemize;
pub mod storage;
pub mod timeline;
pub mod util;
