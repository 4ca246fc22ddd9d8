//! Feed assembly and serialization.
//!
//! - [`assembler`] - channel metadata and wrapping of ordered items
//! - [`rss`] - RSS 2.0 output, to a string or atomically to a file
//!
//! # Example
//!
//! ```ignore
//! use linkfeed::feed::{assemble, write_rss, FeedMeta};
//!
//! let meta = FeedMeta::for_screen_name("alice", "https://twitter.com/");
//! let xml = write_rss(&assemble(meta, items))?;
//! ```

mod assembler;
mod rss;

pub use assembler::{assemble, Feed, FeedMeta};
pub use rss::{write_rss, write_rss_to_file};
