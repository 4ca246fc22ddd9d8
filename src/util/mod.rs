//! Utility functions shared by the fetcher and the feed writer.
//!
//! - **URL validation**: scheme checks plus an SSRF guard for linked pages
//! - **Text cleanup**: removal of characters that cannot appear in XML 1.0
//! - **File output**: whole-file replacement through a synced rename
//!
//! # Examples
//!
//! ```
//! use linkfeed::util::{strip_control_chars, validate_url};
//!
//! let url = validate_url("https://example.com/post", false).unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! assert_eq!(strip_control_chars("bell\u{7}less"), "bellless");
//! ```

mod fs;
mod text;
mod url_validator;

pub use fs::atomic_write;
pub use text::strip_control_chars;
pub use url_validator::{validate_url, UrlValidationError};
