//! canned pages and a scripted transport for the crawl tests

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use crate::{
  config::ScraperConfig,
  error::{ScrapeError, ScrapeResult},
  fetch::{ResponseCheck, Transport},
  scraper::Scraper,
  token::TokenProvider,
  types::TweetResult,
};

pub const OLD_DATE: &str = "Wed Oct 10 20:19:24 +0000 2018";
pub const JANUARY_2022: &str = "Sat Jan 15 12:00:00 +0000 2022";

/* ------------------------------ legacy pages ------------------------------ */

pub fn legacy_user(id: u64, screen_name: &str) -> Value {
  json!({
    "id": id,
    "id_str": id.to_string(),
    "name": format!("{screen_name} display"),
    "screen_name": screen_name,
    "location": "Jakarta",
    "description": "",
    "url": null,
    "entities": { "description": { "urls": [] } },
    "protected": false,
    "followers_count": 120,
    "friends_count": 80,
    "listed_count": 2,
    "created_at": "Mon Jan 02 03:04:05 +0000 2012",
    "favourites_count": 10,
    "verified": false,
    "statuses_count": 500,
    "media_count": 4,
    "profile_image_url_https": "https://pbs.twimg.com/profile_images/1/a_normal.jpg",
  })
}

pub fn legacy_tweet(id: u64, user_id: u64, text: &str) -> Value {
  json!({
    "id": id,
    "id_str": id.to_string(),
    "conversation_id_str": id.to_string(),
    "created_at": OLD_DATE,
    "full_text": text,
    "display_text_range": [0, text.len()],
    "entities": { "hashtags": [], "symbols": [], "user_mentions": [], "urls": [] },
    "source": "<a href=\"https://mobile.twitter.com\" rel=\"nofollow\">Twitter Web App</a>",
    "user_id_str": user_id.to_string(),
    "retweet_count": 2,
    "favorite_count": 3,
    "reply_count": 1,
    "quote_count": 0,
    "lang": "in",
  })
}

pub fn legacy_entry(id: u64) -> Value {
  json!({
    "entryId": format!("sq-I-t-{id}"),
    "sortIndex": "999",
    "content": { "item": { "content": { "tweet": { "id": id.to_string(), "displayType": "Tweet" } } } },
  })
}

pub fn legacy_cursor(entry_id: &str, value: &str) -> Value {
  json!({
    "entryId": entry_id,
    "sortIndex": "0",
    "content": { "operation": { "cursor": { "value": value, "cursorType": "Bottom" } } },
  })
}

/// a search page with `ids` by user 1, in order, and `cursor` as the bottom
/// cursor (empty = no more pages)
pub fn legacy_page(ids: &[u64], cursor: &str) -> Value {
  let mut tweets = Map::new();
  let mut entries = Vec::new();
  for id in ids {
    tweets.insert(id.to_string(), legacy_tweet(*id, 1, &format!("tweet number {id}")));
    entries.push(legacy_entry(*id));
  }
  entries.push(legacy_cursor("sq-cursor-top", "top-cursor"));
  json!({
    "globalObjects": {
      "tweets": tweets,
      "users": { "1": legacy_user(1, "alice") },
    },
    "timeline": {
      "id": "search-6",
      "instructions": [
        { "addEntries": { "entries": entries } },
        { "replaceEntry": { "entryIdToReplace": "sq-cursor-bottom", "entry": legacy_cursor("sq-cursor-bottom", cursor) } },
      ],
    },
  })
}

/* ------------------------------ graphql pages ----------------------------- */

pub fn graphql_user(id: u64, screen_name: &str) -> Value {
  json!({ "__typename": "User", "rest_id": id.to_string(), "legacy": legacy_user(id, screen_name) })
}

pub fn graphql_tweet(id: u64, created_at: &str) -> Value {
  let mut legacy = legacy_tweet(id, 1, &format!("tweet number {id}"));
  legacy["created_at"] = json!(created_at);
  json!({
    "__typename": "Tweet",
    "rest_id": id.to_string(),
    "core": { "user_results": { "result": graphql_user(1, "alice") } },
    "legacy": legacy,
  })
}

pub fn graphql_entry(id: u64, result: Value) -> Value {
  json!({
    "entryId": format!("tweet-{id}"),
    "sortIndex": id.to_string(),
    "content": {
      "entryType": "TimelineTimelineItem",
      "__typename": "TimelineTimelineItem",
      "itemContent": {
        "itemType": "TimelineTweet",
        "__typename": "TimelineTweet",
        "tweet_results": { "result": result },
        "tweetDisplayType": "Tweet",
      },
    },
  })
}

pub fn graphql_cursor(entry_id: &str, value: &str) -> Value {
  json!({
    "entryId": entry_id,
    "sortIndex": "0",
    "content": {
      "entryType": "TimelineTimelineCursor",
      "__typename": "TimelineTimelineCursor",
      "value": value,
      "cursorType": "Bottom",
    },
  })
}

/// a user timeline page around `entries`, with a top and a bottom cursor
pub fn graphql_page(mut entries: Vec<Value>, cursor: &str) -> Value {
  entries.push(graphql_cursor("cursor-top-1", "top-cursor"));
  entries.push(graphql_cursor("cursor-bottom-1", cursor));
  json!({
    "data": { "user": { "result": {
      "__typename": "User",
      "timeline": { "timeline": { "instructions": [
        { "type": "TimelineClearCache" },
        { "type": "TimelineAddEntries", "entries": entries },
      ] } },
    } } },
  })
}

/// graphql page of plain tweets, each `(id, created_at)`
pub fn graphql_tweets_page(tweets: &[(u64, &str)], cursor: &str) -> Value {
  let entries = tweets.iter().map(|(id, date)| graphql_entry(*id, graphql_tweet(*id, date))).collect();
  graphql_page(entries, cursor)
}

/* -------------------------------- transport ------------------------------- */

#[derive(Debug, Clone)]
pub struct Recorded {
  pub url: String,
  pub query: Vec<(String, String)>,
  pub headers: HeaderMap,
}

impl Recorded {
  pub fn param(&self, name: &str) -> Option<&str> {
    self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
  }
}

/// hands out canned bodies in order, then fails
#[derive(Default)]
pub struct ScriptedTransport {
  responses: Mutex<VecDeque<ScrapeResult<String>>>,
  requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
  pub fn new(responses: Vec<ScrapeResult<String>>) -> Arc<Self> {
    Arc::new(Self {
      responses: Mutex::new(responses.into()),
      requests: Mutex::default(),
    })
  }

  pub fn pages(pages: Vec<Value>) -> Arc<Self> {
    Self::new(pages.into_iter().map(|p| Ok(p.to_string())).collect())
  }

  pub fn requests(&self) -> Vec<Recorded> {
    self.requests.lock().unwrap().clone()
  }

  fn next(&self, url: &str, query: &[(String, String)], headers: &HeaderMap) -> ScrapeResult<String> {
    self.requests.lock().unwrap().push(Recorded {
      url: url.to_string(),
      query: query.to_vec(),
      headers: headers.clone(),
    });
    self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
      Err(ScrapeError::Transport {
        url: url.to_string(),
        status: None,
        reason: "script exhausted".into(),
      })
    })
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn get(&self, url: &str, query: &[(String, String)], headers: &HeaderMap, _check: ResponseCheck) -> ScrapeResult<String> {
    self.next(url, query, headers)
  }

  async fn post(&self, url: &str, query: &[(String, String)], headers: &HeaderMap, _check: ResponseCheck) -> ScrapeResult<String> {
    self.next(url, query, headers)
  }
}

pub struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
  async fn current_token(&self) -> String {
    "1600000000000000000".into()
  }

  async fn refresh(&self) -> ScrapeResult<()> {
    Ok(())
  }

  async fn reset(&self) {}
}

pub fn scraper(transport: Arc<ScriptedTransport>) -> Scraper {
  Scraper::with_parts(&ScraperConfig::default(), transport, Arc::new(StaticToken)).unwrap()
}

/// everything the crawl sends, until it closes the channel
pub async fn drain(mut rx: mpsc::Receiver<TweetResult>) -> Vec<TweetResult> {
  let mut items = Vec::new();
  while let Some(item) = rx.recv().await {
    items.push(item);
  }
  items
}

/// ids of the posts, panicking on any error
pub fn ids(items: &[TweetResult]) -> Vec<u64> {
  items.iter().map(|item| item.as_ref().unwrap().id).collect()
}
