//! the two response schemas twitter serves timelines in. both carry the same
//! "instructions -> entries" skeleton but disagree on where tweets, users and
//! cursors live, so each gets an adapter behind one trait and the pagination
//! engine never looks at raw paths itself

use tracing::{debug, warn};

use crate::{
  config::ApiVariant,
  error::{ScrapeError, ScrapeResult},
  node::Node,
  types::{Post, Quote, Related, TweetReference},
};
use super::{
  parsing::{build_card, build_post, build_user, parse_label},
  raw::{RawTweet, RawUser},
};

/// retweets of quotes of retweets... twitter caps this well below 8 in
/// practice, anything deeper is treated as malformed
pub const MAX_NESTING: usize = 8;

/// what the cursor entries of one page say about the next one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorState {
  /// bottom cursor, `None` when absent or empty
  pub next: Option<String>,
  pub stop_on_empty: bool,
  /// "show more threads" prompt cursor
  pub prompt: Option<String>,
  /// tweet entries on the page, counted before any resolution or filtering
  pub tweet_entries: usize,
}

pub trait TimelineSchema: Send + Sync {
  fn variant(&self) -> ApiVariant;

  /// the page's instruction list
  fn instructions<'a>(&self, page: Node<'a>) -> ScrapeResult<Vec<Node<'a>>>;

  /// entries that (by id and type) should hold a tweet
  fn entries<'a>(&self, page: Node<'a>) -> ScrapeResult<Vec<Node<'a>>>;

  /// the tweet record an entry points at. `SkippedEntry` for promoted,
  /// tombstoned or otherwise unusable entries
  fn record<'a>(&self, page: Node<'a>, entry: Node<'a>) -> ScrapeResult<Node<'a>>;

  /// build the post, its author and everything it embeds
  fn post(&self, page: Node<'_>, record: Node<'_>) -> ScrapeResult<Post>;

  /// `(value, stopOnEmptyResponse)` of one cursor entry
  fn cursor_value(&self, entry: Node<'_>) -> ScrapeResult<(String, bool)>;

  /// structures only the first page may carry that we can't paginate past
  fn check_first_page(&self, _page: Node<'_>) -> ScrapeResult<()> {
    Ok(())
  }

  /// whether the crawl has to drop posts outside the date window itself.
  /// search endpoints filter server side
  fn filters_by_date(&self) -> bool {
    false
  }

  fn cursor(&self, page: Node<'_>) -> ScrapeResult<CursorState> {
    let mut state = CursorState::default();
    for instruction in self.instructions(page)? {
      let Some(entries) = instruction_entries(instruction)? else {
        continue;
      };
      for entry in entries {
        let Some(entry_id) = entry.opt_str("entryId")? else {
          continue;
        };
        if is_tweet_entry(entry_id) {
          state.tweet_entries += 1;
          continue;
        }
        if !is_cursor_entry(entry_id) {
          continue;
        }
        let (value, stop_on_empty) = match self.cursor_value(entry) {
          Ok(cursor) => cursor,
          Err(e) => {
            warn!(entry_id, error = %e, "Unreadable cursor entry");
            continue;
          },
        };
        let value = Some(value).filter(|v| !v.is_empty());
        if entry_id == "sq-cursor-bottom" || entry_id.starts_with("cursor-bottom-") {
          state.next = value;
          state.stop_on_empty = stop_on_empty;
        } else if entry_id.starts_with("cursor-showMoreThreadsPrompt-") {
          state.prompt = value;
        }
      }
    }
    debug!(next = ?state.next, stop_on_empty = state.stop_on_empty, tweet_entries = state.tweet_entries, "Read page cursor");
    Ok(state)
  }
}

/* ------------------------------- shared bits ------------------------------ */

/// entries of one instruction: `addEntries.entries`, the single
/// `replaceEntry.entry`, or the flat graphql forms
pub fn instruction_entries(instruction: Node<'_>) -> ScrapeResult<Option<Vec<Node<'_>>>> {
  let added = instruction.path(&["addEntries", "entries"])?;
  if !added.is_absent() {
    return added.as_seq().map(Some);
  }
  let replaced = instruction.path(&["replaceEntry", "entry"])?;
  if !replaced.is_absent() {
    return Ok(Some(vec![replaced]));
  }
  match instruction.opt_str("type")? {
    Some("TimelineAddEntries") => instruction.field("entries")?.as_seq().map(Some),
    Some("TimelineReplaceEntry") => {
      let entry = instruction.field("entry")?;
      Ok((!entry.is_absent()).then(|| vec![entry]))
    },
    _ => Ok(None),
  }
}

pub fn is_tweet_entry(entry_id: &str) -> bool {
  entry_id.starts_with("sq-I-t-") || entry_id.starts_with("tweet-")
}

pub fn is_cursor_entry(entry_id: &str) -> bool {
  entry_id.starts_with("sq-cursor-") || entry_id.starts_with("cursor-")
}

fn entry_id<'a>(entry: Node<'a>) -> ScrapeResult<&'a str> {
  entry.field("entryId")?.as_str()
}

fn parse_id(id: Option<&str>) -> Option<u64> {
  id.and_then(|s| s.parse().ok())
}

fn too_deep(depth: usize, record: Node<'_>) -> ScrapeResult<()> {
  if depth > MAX_NESTING {
    let id = record.opt_str("id_str").ok().flatten().unwrap_or("?");
    return Err(ScrapeError::skipped(id, format!("nested more than {MAX_NESTING} levels deep")));
  }
  Ok(())
}

/* --------------------------------- legacy --------------------------------- */

/// `2/search/adaptive.json`: entries point into a `globalObjects` dictionary
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySchema;

impl LegacySchema {
  fn tweet_to_post(&self, page: Node<'_>, record: Node<'_>, depth: usize) -> ScrapeResult<Post> {
    too_deep(depth, record)?;
    let tweet: RawTweet = record.decode()?;
    let tweets = page.path(&["globalObjects", "tweets"])?;
    let users = page.path(&["globalObjects", "users"])?;

    let user = match tweet.user_id_str.as_deref() {
      Some(user_id) => {
        let raw = users.lookup(user_id);
        if raw.is_absent() {
          debug!(user_id, "Author not in globalObjects");
          None
        } else {
          Some(build_user(&raw.decode::<RawUser>()?))
        }
      },
      None => None,
    };

    let mut related = Related::default();
    if let Some(retweet_id) = tweet.retweeted_status_id_str.as_deref() {
      let retweeted = tweets.lookup(retweet_id);
      if retweeted.is_absent() {
        warn!(retweet_id, "Retweeted tweet not in globalObjects, leaving it out");
      } else {
        related.retweeted = Some(self.tweet_to_post(page, retweeted, depth + 1)?);
      }
    }
    if let Some(quoted_id) = tweet.quoted_status_id_str.as_deref() {
      let quoted = tweets.lookup(quoted_id);
      related.quote = if quoted.is_absent() {
        parse_id(Some(quoted_id)).map(|id| Quote::Reference(TweetReference::new(id)))
      } else {
        Some(Quote::Post(Box::new(self.tweet_to_post(page, quoted, depth + 1)?)))
      };
    }

    let card = match tweet.card.as_ref() {
      Some(card) => {
        let tweet_id = parse_id(tweet.id_str.as_deref()).or(tweet.id).unwrap_or(0);
        Some(build_card(Node::new(card), ApiVariant::Legacy, tweet_id)?)
      },
      None => None,
    };
    Ok(build_post(&tweet, user, card, related))
  }
}

impl TimelineSchema for LegacySchema {
  fn variant(&self) -> ApiVariant {
    ApiVariant::Legacy
  }

  fn instructions<'a>(&self, page: Node<'a>) -> ScrapeResult<Vec<Node<'a>>> {
    let instructions = page.path(&["timeline", "instructions"])?;
    if instructions.is_absent() {
      return Err(ScrapeError::UnexpectedShape("no timeline.instructions in legacy response".into()));
    }
    instructions.as_seq()
  }

  fn entries<'a>(&self, page: Node<'a>) -> ScrapeResult<Vec<Node<'a>>> {
    let mut found = Vec::new();
    for instruction in self.instructions(page)? {
      for entry in instruction_entries(instruction)?.unwrap_or_default() {
        if entry.opt_str("entryId")?.map_or(false, is_tweet_entry) {
          found.push(entry);
        }
      }
    }
    Ok(found)
  }

  fn record<'a>(&self, page: Node<'a>, entry: Node<'a>) -> ScrapeResult<Node<'a>> {
    let entry_id = entry_id(entry)?;
    let content = entry.path(&["content", "item", "content"])?;

    if content.has("tweet") {
      let tweet = content.field("tweet")?;
      if tweet.has("promotedMetadata") {
        return Err(ScrapeError::skipped(entry_id, "promoted tweet"));
      }
      let id = tweet.field("id")?.as_str()?;
      let record = page.path(&["globalObjects", "tweets", id])?;
      if record.is_absent() {
        return Err(ScrapeError::skipped(entry_id, format!("tweet {id} not in globalObjects")));
      }
      return Ok(record);
    }
    if content.has("tombstone") {
      return Err(ScrapeError::skipped(entry_id, "tombstone"));
    }
    Err(ScrapeError::skipped(entry_id, "no tweet or tombstone in entry"))
  }

  fn post(&self, page: Node<'_>, record: Node<'_>) -> ScrapeResult<Post> {
    self.tweet_to_post(page, record, 0)
  }

  fn cursor_value(&self, entry: Node<'_>) -> ScrapeResult<(String, bool)> {
    let cursor = entry.path(&["content", "operation", "cursor"])?;
    let value = cursor.field("value")?.as_str()?.to_string();
    let stop_on_empty = cursor.lookup("stopOnEmptyResponse").as_bool().unwrap_or(false);
    Ok((value, stop_on_empty))
  }
}

/* --------------------------------- graphql -------------------------------- */

/// `graphql/<id>/<Operation>`: every tweet is self-contained under `data`
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphqlSchema;

/// where the instruction list sits, per operation
const INSTRUCTION_PATHS: [&[&str]; 3] = [
  &["user", "result", "timeline", "timeline", "instructions"],
  &["threaded_conversation_with_injections_v2", "instructions"],
  &["threaded_conversation_with_injections", "instructions"],
];

fn typename<'a>(node: Node<'a>) -> Option<&'a str> {
  node.lookup("__typename").as_str().ok()
}

fn is_item_wrapper(node: Node<'_>) -> bool {
  let item = Some("TimelineTimelineItem");
  node.lookup("itemType").as_str().ok() == item || node.lookup("entryType").as_str().ok() == item
}

impl GraphqlSchema {
  /// `Tweet` as is, `TweetWithVisibilityResults` wraps the tweet one level down
  fn unwrap_result<'a>(&self, result: Node<'a>) -> ScrapeResult<Node<'a>> {
    match typename(result) {
      Some("Tweet") | None => Ok(result),
      Some("TweetWithVisibilityResults") => result.field("tweet"),
      Some(other) => {
        let id = result.opt_str("rest_id")?.unwrap_or("?");
        Err(ScrapeError::skipped(id, format!("result type {other}")))
      },
    }
  }

  fn result_to_post(&self, result: Node<'_>, depth: usize) -> ScrapeResult<Post> {
    too_deep(depth, result)?;
    let result = self.unwrap_result(result)?;
    let legacy = result.field("legacy")?;
    if legacy.is_absent() {
      let id = result.opt_str("rest_id")?.unwrap_or("?");
      return Err(ScrapeError::skipped(id, "no legacy block"));
    }
    let tweet: RawTweet = legacy.decode()?;

    let user_result = result.path(&["core", "user_results", "result"])?;
    let user = if user_result.is_absent() {
      None
    } else {
      // unavailable authors come without a legacy block, keep the post with a bare user
      let user_legacy = user_result.field("legacy")?;
      let raw = if user_legacy.is_absent() { RawUser::default() } else { user_legacy.decode::<RawUser>()? };
      let mut user = build_user(&raw);
      if let Some(id) = parse_id(user_result.opt_str("rest_id")?) {
        user.id = id;
      }
      let label = user_result.path(&["affiliates_highlighted_label", "label"])?;
      if user.label.is_empty() && !label.is_absent() {
        user.label = parse_label(label);
      }
      Some(user)
    };

    let mut related = Related::default();
    let retweeted = legacy.path(&["retweeted_status_result", "result"])?;
    if !retweeted.is_absent() {
      match self.result_to_post(retweeted, depth + 1) {
        Ok(post) => related.retweeted = Some(post),
        Err(e) if e.is_skippable() => warn!(error = %e, "Leaving out unreadable retweet"),
        Err(e) => return Err(e),
      }
    }
    related.quote = self.quote(result, &tweet, depth)?;

    let card = result.lookup("card");
    let card = if card.is_absent() {
      None
    } else {
      let tweet_id = parse_id(tweet.id_str.as_deref()).unwrap_or(0);
      Some(build_card(card, ApiVariant::Graphql, tweet_id)?)
    };
    Ok(build_post(&tweet, user, card, related))
  }

  /// the embedded quote, or just its id when the quote is gone or unreadable
  fn quote(&self, result: Node<'_>, tweet: &RawTweet, depth: usize) -> ScrapeResult<Option<Quote>> {
    let by_id = || parse_id(tweet.quoted_status_id_str.as_deref())
      .map(|id| Quote::Reference(TweetReference::new(id)));

    let quoted = result.path(&["quoted_status_result", "result"])?;
    if !quoted.is_absent() {
      if typename(quoted) == Some("TweetTombstone") {
        return Ok(by_id());
      }
      return match self.result_to_post(quoted, depth + 1) {
        Ok(post) => Ok(Some(Quote::Post(Box::new(post)))),
        Err(e) if e.is_skippable() => {
          debug!(error = %e, "Quote unreadable, keeping its id");
          Ok(by_id())
        },
        Err(e) => Err(e),
      };
    }

    let reference = result.path(&["quotedRefResult", "result"])?;
    if !reference.is_absent() && typename(reference) != Some("TweetTombstone") {
      if let Some(id) = parse_id(reference.opt_str("rest_id")?) {
        return Ok(Some(Quote::Reference(TweetReference::new(id))));
      }
    }
    Ok(by_id())
  }
}

impl TimelineSchema for GraphqlSchema {
  fn variant(&self) -> ApiVariant {
    ApiVariant::Graphql
  }

  fn instructions<'a>(&self, page: Node<'a>) -> ScrapeResult<Vec<Node<'a>>> {
    let data = page.field("data")?;
    for path in INSTRUCTION_PATHS {
      let instructions = data.path(path)?;
      if !instructions.is_absent() {
        return instructions.as_seq();
      }
    }
    Err(ScrapeError::UnexpectedShape("no timeline instructions in graphql response".into()))
  }

  fn entries<'a>(&self, page: Node<'a>) -> ScrapeResult<Vec<Node<'a>>> {
    let mut found = Vec::new();
    for instruction in self.instructions(page)? {
      if instruction.opt_str("type")? != Some("TimelineAddEntries") {
        continue;
      }
      for entry in instruction.field("entries")?.as_seq()? {
        if entry.opt_str("entryId")?.map_or(false, |id| id.starts_with("tweet-")) {
          found.push(entry);
        }
      }
    }
    Ok(found)
  }

  fn record<'a>(&self, _page: Node<'a>, entry: Node<'a>) -> ScrapeResult<Node<'a>> {
    let entry_id = entry_id(entry)?;
    let content = entry.field("content")?;
    let entry_type = content.opt_str("entryType")?;
    let item_type = content.lookup("itemContent").opt_str("itemType")?;

    if entry_type != Some("TimelineTimelineItem") || item_type != Some("TimelineTweet") {
      return Err(ScrapeError::skipped(
        entry_id,
        format!("not a tweet item ({entry_type:?} / {item_type:?})"),
      ));
    }
    let result = content.path(&["itemContent", "tweet_results", "result"])?;
    if result.is_absent() {
      return Err(ScrapeError::skipped(entry_id, "empty tweet_results"));
    }
    Ok(result)
  }

  fn post(&self, _page: Node<'_>, record: Node<'_>) -> ScrapeResult<Post> {
    self.result_to_post(record, 0)
  }

  fn cursor_value(&self, entry: Node<'_>) -> ScrapeResult<(String, bool)> {
    let mut node = entry.field("content")?;
    // the cursor can sit under any number of item wrappers
    while is_item_wrapper(node) {
      node = node.field("itemContent")?;
    }
    let value = node.field("value")?.as_str()?.to_string();
    let stop_on_empty = node.lookup("stopOnEmptyResponse").as_bool().unwrap_or(false);
    Ok((value, stop_on_empty))
  }

  fn check_first_page(&self, page: Node<'_>) -> ScrapeResult<()> {
    for instruction in self.instructions(page)? {
      if instruction.opt_str("type")? == Some("TimelinePinEntry") {
        return Err(ScrapeError::Unsupported("pinned tweet on first page".into()));
      }
    }
    Ok(())
  }

  fn filters_by_date(&self) -> bool {
    true
  }
}
