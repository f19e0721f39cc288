use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ScrapeError;

pub(crate) const PLATFORM_HOST: &str = "twitter.com";

/// what a crawl hands back: one post, or the error that ended the crawl
pub type TweetResult = Result<Post, ScrapeError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Post {
  /// id number of tweet (last part of url)
  pub id: u64,
  pub url: String,
  pub date: Option<DateTime<Utc>>,
  /// the text of the tweet, as sent
  pub content: String,
  /// the text with every t.co link swapped for the url it points to
  pub rendered_content: String,
  pub reply_count: u64,
  pub retweet_count: u64,
  pub like_count: u64,
  pub quote_count: u64,
  pub conversation_id: u64,
  pub lang: String,
  /// html anchor of the client used to post, e.g. `<a href="...">Twitter Web App</a>`
  pub source: String,
  pub source_url: Option<String>,
  pub source_label: Option<String>,
  pub links: Vec<TextLink>,
  pub media: Media,
  pub in_reply_to_tweet_id: Option<u64>,
  pub in_reply_to_user: Option<User>,
  pub mentioned_users: Vec<User>,
  pub coordinates: Option<Coordinates>,
  pub place: Option<Place>,
  pub hashtags: Vec<String>,
  pub cash_tags: Vec<String>,
  pub card: Option<Card>,
  /// the account who posted the tweet
  pub user: Option<User>,
  pub retweeted_tweet: Option<Box<Post>>,
  pub quote: Option<Quote>,
}

impl Post {
  pub fn quoted_tweet(&self) -> Option<&Post> {
    match &self.quote {
      Some(Quote::Post(post)) => Some(post),
      _ => None,
    }
  }

  pub fn quoted_ref(&self) -> Option<&TweetReference> {
    match &self.quote {
      Some(Quote::Reference(reference)) => Some(reference),
      _ => None,
    }
  }
}

/// a quoted tweet is either fully embedded, or (deleted, withheld, not in the
/// payload) only known by id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quote {
  Post(Box<Post>),
  Reference(TweetReference),
}

/// whatever a post embeds besides its own fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Related {
  pub retweeted: Option<Post>,
  pub quote: Option<Quote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TweetReference {
  pub id: u64,
  pub url: String,
}

impl TweetReference {
  pub fn new(id: u64) -> Self {
    Self {
      id,
      url: format!("https://{PLATFORM_HOST}/i/web/status/{id}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextLink {
  /// what twitter displays, e.g. `example.com/abc…`
  pub text: String,
  /// the original url
  pub url: String,
  /// the twitter shortened url
  pub tco_url: String,
  pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Media {
  pub photos: Vec<Photo>,
  pub videos: Vec<Video>,
  pub gifs: Vec<Gif>,
}

impl Media {
  pub fn is_empty(&self) -> bool {
    self.photos.is_empty() && self.videos.is_empty() && self.gifs.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
  pub preview_url: String,
  pub full_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
  pub thumbnail_url: String,
  pub variants: Vec<VideoVariant>,
  /// seconds
  pub duration: f64,
  pub views: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gif {
  pub thumbnail_url: String,
  pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoVariant {
  pub content_type: String,
  pub url: String,
  /// the .m3u8 variant never has one
  pub bit_rate: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
  pub latitude: f64,
  pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Place {
  pub full_name: String,
  pub name: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub country: String,
  pub country_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
  pub id: u64,
  pub username: String,
  pub display_name: String,
  /// bio with its links expanded, joined to the raw bio when they differ
  pub description: String,
  pub raw_description: String,
  pub description_links: Vec<String>,
  pub verified: bool,
  pub created: Option<DateTime<Utc>>,
  pub followers_count: u64,
  pub friends_count: u64,
  pub statuses_count: u64,
  pub favourites_count: u64,
  pub listed_count: u64,
  pub media_count: u64,
  pub location: String,
  pub protected: bool,
  pub profile_image_url: String,
  pub profile_banner_url: String,
  pub label: UserLabel,
  pub url: String,
}

impl User {
  /// a user we only know by handle/id, e.g. a mention
  pub fn reference(id: u64, username: &str, display_name: &str) -> Self {
    Self {
      id,
      username: username.to_string(),
      display_name: display_name.to_string(),
      ..Default::default()
    }
  }
}

/// the "highlighted label" badge shown next to affiliated accounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserLabel {
  pub url: String,
  pub badge: String,
  pub description: String,
  pub long_description: String,
}

impl UserLabel {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// rich preview attached to a tweet. at most one slot is filled
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Card {
  pub name: String,
  pub summary: Option<CardValues>,
  pub app: Option<CardValues>,
  pub player: Option<CardValues>,
}

pub type CardValues = BTreeMap<String, CardValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardValue {
  String(String),
  DateTime(DateTime<Utc>),
  /// image url
  Image(String),
  Boolean(bool),
  User(Box<User>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trend {
  pub name: String,
  pub meta_description: Option<String>,
  pub domain_context: String,
  /// search page for the trend
  pub url: String,
}
