//! guest-token scraper for twitter's private web api. searches, hashtags and
//! user timelines come back as a stream of normalised posts, whichever of
//! the two response schemas the endpoint speaks

pub mod config;
pub mod error;
pub mod fetch;
pub mod node;
pub mod scraper;
pub mod token;
pub mod tweets;
pub mod types;

pub use config::{ApiVariant, DateRange, Lang, QueryConfig, ScraperConfig, TransportConfig};
pub use error::{ScrapeError, ScrapeResult};
pub use scraper::Scraper;
pub use tokio_util::sync::CancellationToken;
pub use types::{Card, CardValue, Media, Post, Quote, Trend, TweetReference, TweetResult, User};

#[cfg(test)]
mod fixtures;
