//! Scrapes the latest 8-K, 10-K and 10-Q filings announced on [EDGAR]'s feeds.
//!
//! A run is four stages, each feeding the next:
//! 1. [`feed`]: fetch and parse the RSS/Atom feed
//! 2. [`filing`]: pick the first entry of a requested filing type
//! 3. [`locate`]: resolve its link to a sub-feed entry or the filing index's document links
//! 4. [`download`]: save the raw document
//!
//! [`pipeline::Pipeline`] strings them together.
//!
//! [EDGAR]: https://www.sec.gov/edgar/search-and-access

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod feed;
pub mod filing;
pub mod fs;
pub mod locate;
pub mod pipeline;
mod tui;

pub use config::{Config, Naming};
pub use error::{Result, SpiderError};
pub use filing::{FilingType, RequestedTypes};
pub use pipeline::{Outcome, Pipeline, Stage};

/// Shortcut for required API elements.
pub(crate) mod http {
    pub(crate) use dotenv::var;
    pub(crate) use reqwest::Client as HttpClient;
}
