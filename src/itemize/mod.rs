//! The concurrent itemization pipeline.
//!
//! Posts are fanned out into one [`WorkUnit`] per embedded link, each unit is
//! turned into a [`FeedItem`] by an [`ItemBuilder`] running on its own task,
//! and the [`Dispatcher`] collects the items back into link order.
//!
//! # Architecture
//!
//! - [`unit`] - position numbering of links across posts
//! - [`item`] - the feed item, its defaults and description rendering
//! - [`builder`] - fetch, title extraction, and final rendering for one unit
//! - [`dispatcher`] - bounded fan-out and position-ordered fan-in
//!
//! # Example
//!
//! ```ignore
//! let builder = ItemBuilder::new(fetcher, "https://twitter.com/");
//! let dispatcher = Dispatcher::new(Arc::new(builder), 100);
//! let items = dispatcher.itemize(posts, 20).await?;
//! ```

mod builder;
mod dispatcher;
mod item;
mod unit;

pub use builder::ItemBuilder;
pub use dispatcher::{DispatchError, Dispatcher};
pub use item::{parse_created_at, render_description, Author, FeedItem};
pub use unit::{expand_units, WorkUnit};
