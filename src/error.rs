use thiserror::Error;

/// everything that can go wrong between sending a request and handing a post
/// to the caller
#[derive(Error, Debug)]
pub enum ScrapeError {
  /// the http client itself failed (bad url, tls, body read)
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  /// the transport gave up on a request, either after running out of retries
  /// or because the response never passed validation
  #[error("request to {url} failed: {reason}")]
  Transport {
    url: String,
    status: Option<u16>,
    reason: String,
  },

  /// the body was not valid json
  #[error("received invalid JSON from Twitter: {0}")]
  Decode(#[from] serde_json::Error),

  /// the json was valid but the top level didn't look like a timeline
  #[error("unexpected response shape: {0}")]
  UnexpectedShape(String),

  #[error("expected {expected}, found {found}")]
  TypeMismatch {
    expected: &'static str,
    found: &'static str,
  },

  /// a single timeline entry couldn't be resolved. never aborts a page
  #[error("skipped entry {entry_id}: {reason}")]
  SkippedEntry { entry_id: String, reason: String },

  /// a structure twitter sends that we recognise but don't handle (pinned
  /// entries, newsletter cards, "show more threads" prompts)
  #[error("unsupported timeline structure: {0}")]
  Unsupported(String),

  #[error("guest token error: {0}")]
  Token(String),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("crawl cancelled")]
  Cancelled,

  #[error("page worker failed: {0}")]
  Worker(#[from] tokio::task::JoinError),
}

impl ScrapeError {
  pub(crate) fn skipped(entry_id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::SkippedEntry {
      entry_id: entry_id.into(),
      reason: reason.into(),
    }
  }

  /// problems with one entry's contents. they drop the entry (or the nested
  /// tweet) but never the page
  #[must_use]
  pub const fn is_skippable(&self) -> bool {
    matches!(
      self,
      Self::SkippedEntry { .. } | Self::TypeMismatch { .. } | Self::Decode(_) | Self::UnexpectedShape(_)
    )
  }

  #[must_use]
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Http(e) => e.status().map(|s| s.as_u16()),
      Self::Transport { status, .. } => *status,
      _ => None,
    }
  }

  /// 401/403 mean the guest token is no longer accepted
  #[must_use]
  pub fn is_auth_failure(&self) -> bool {
    matches!(self.status(), Some(401) | Some(403))
  }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
