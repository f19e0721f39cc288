//! the pagination engine: fetch a page, turn it into posts on a blocking
//! worker, stream them out, decide from the page's cursors whether (and
//! where) to go next

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  config::{DateRange, QueryConfig},
  error::{ScrapeError, ScrapeResult},
  node::Node,
  scraper::Scraper,
  types::{Post, TweetResult},
};
use super::schema::{CursorState, TimelineSchema};

/// posts buffered between the crawl task and the caller
pub const CHANNEL_CAPACITY: usize = 32;

/// how the first-page request is turned into the request for a cursor
#[derive(Debug, Clone)]
pub enum PageQuery {
  /// plain query parameters, the cursor goes in as `cursor=`
  Params(Vec<(String, String)>),
  /// graphql operations: the cursor is one of the json `variables`
  Variables(Map<String, Value>),
}

impl PageQuery {
  pub fn with_cursor(&self, cursor: Option<&str>) -> ScrapeResult<Vec<(String, String)>> {
    match self {
      Self::Params(params) => {
        let mut params = params.clone();
        if let Some(cursor) = cursor {
          params.push(("cursor".into(), cursor.into()));
        }
        Ok(params)
      },
      Self::Variables(variables) => {
        let mut variables = variables.clone();
        if let Some(cursor) = cursor {
          variables.insert("cursor".into(), Value::String(cursor.into()));
        }
        Ok(vec![("variables".into(), serde_json::to_string(&variables)?)])
      },
    }
  }
}

/* -------------------------------- one page -------------------------------- */

#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
  pub first_page: bool,
  pub date_range: Option<DateRange>,
  pub skip_unsupported: bool,
}

#[derive(Debug, Default)]
pub struct ParsedPage {
  pub posts: Vec<Post>,
  pub cursor: CursorState,
}

fn in_window(schema: &dyn TimelineSchema, range: Option<&DateRange>, post: &Post) -> bool {
  match range {
    Some(range) if schema.filters_by_date() => post.date.map_or(false, |date| range.contains(&date)),
    _ => true,
  }
}

/// everything that happens to a page between the json and the posts. pure
/// and synchronous, the crawl runs it off the async threads
pub fn parse_page(schema: &dyn TimelineSchema, page: &Value, options: &PageOptions) -> ScrapeResult<ParsedPage> {
  let page = Node::new(page);
  if options.first_page {
    match schema.check_first_page(page) {
      Ok(()) => {},
      Err(e @ ScrapeError::Unsupported(_)) if options.skip_unsupported => {
        warn!(error = %e, "Ignoring unsupported structure");
      },
      Err(e) => return Err(e),
    }
  }

  let mut posts = Vec::new();
  for entry in schema.entries(page)? {
    match schema.record(page, entry).and_then(|record| schema.post(page, record)) {
      Ok(post) if in_window(schema, options.date_range.as_ref(), &post) => posts.push(post),
      Ok(post) => debug!(id = post.id, date = ?post.date, "Post outside the date window"),
      Err(e @ ScrapeError::Unsupported(_)) => {
        if !options.skip_unsupported {
          return Err(e);
        }
        warn!(error = %e, "Skipping unsupported entry");
      },
      Err(e) => warn!(error = %e, "Skipping timeline entry"),
    }
  }

  Ok(ParsedPage { posts, cursor: schema.cursor(page)? })
}

/* --------------------------------- crawl ---------------------------------- */

pub struct Crawl {
  pub scraper: Scraper,
  pub schema: Arc<dyn TimelineSchema>,
  pub endpoint: String,
  pub query: PageQuery,
  pub config: QueryConfig,
  pub cancel: CancellationToken,
}

impl Crawl {
  /// start crawling on a background task. the receiver yields posts in page
  /// order, then at most one error, then closes
  pub fn spawn(self) -> mpsc::Receiver<TweetResult> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
      if let Err(e) = self.run(&tx).await {
        warn!(endpoint = %self.endpoint, error = %e, "Crawl ended with an error");
        // if the receiver is gone there's no one left to tell
        let _ = tx.send(Err(e)).await;
      }
    });
    rx
  }

  async fn run(&self, tx: &mpsc::Sender<TweetResult>) -> ScrapeResult<()> {
    let mut cursor: Option<String> = None;
    let mut emitted = 0_usize;
    let mut repeats = 0_u32;
    let mut first_page = true;

    loop {
      if self.cancel.is_cancelled() {
        return Err(ScrapeError::Cancelled);
      }
      let params = self.query.with_cursor(cursor.as_deref())?;
      debug!(endpoint = %self.endpoint, cursor = ?cursor, "Fetching page");
      let page = tokio::select! {
        biased;
        _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
        page = self.scraper.api_json(&self.endpoint, &params) => page?,
      };

      let options = PageOptions {
        first_page,
        date_range: self.config.date_range,
        skip_unsupported: self.config.skip_unsupported,
      };
      let schema = Arc::clone(&self.schema);
      let worker = tokio::task::spawn_blocking(move || parse_page(schema.as_ref(), &page, &options));
      let parsed = tokio::select! {
        biased;
        _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
        parsed = worker => parsed??,
      };
      first_page = false;

      for post in parsed.posts {
        tokio::select! {
          biased;
          _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
          sent = tx.send(Ok(post)) => {
            if sent.is_err() {
              debug!("Receiver dropped, stopping crawl");
              return Ok(());
            }
          },
        }
        emitted += 1;
        if emitted >= self.config.max_results {
          info!(emitted, "Reached result cap");
          return Ok(());
        }
      }

      let CursorState { next, stop_on_empty, prompt, tweet_entries } = parsed.cursor;
      if prompt.is_some() && !self.config.skip_unsupported {
        return Err(ScrapeError::Unsupported("show more threads prompt".into()));
      }
      let exhausted = next.is_none() || (stop_on_empty && tweet_entries == 0);
      let next = if exhausted { prompt } else { next };
      let Some(next) = next else {
        info!(emitted, "No more pages");
        return Ok(());
      };

      if cursor.as_deref() == Some(next.as_str()) && tweet_entries == 0 {
        repeats += 1;
        if repeats > self.config.retries {
          info!(emitted, repeats, "Cursor stopped moving");
          return Ok(());
        }
        debug!(repeats, "Same cursor came back with nothing, trying again");
      } else {
        repeats = 0;
      }
      cursor = Some(next);
    }
  }
}
