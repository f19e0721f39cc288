use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};

const DATE_LAYOUT: &str = "%Y-%m-%d";

/// which of twitter's two response schemas an endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVariant {
  /// `2/search/adaptive.json` style: `globalObjects` + `timeline.instructions`
  Legacy,
  /// `graphql/<id>/<Operation>` style: everything under `data`
  Graphql,
}

/// language filter appended to search queries as `lang:<code>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lang {
  #[default]
  Indonesian,
  English,
  Any,
}

impl Lang {
  pub const fn code(self) -> Option<&'static str> {
    match self {
      Self::Indonesian => Some("id"),
      Self::English => Some("en"),
      Self::Any => None,
    }
  }
}

/// calendar-day window. `since` is the start of its day, `until` the end of
/// its day, both in utc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  since: NaiveDate,
  until: NaiveDate,
}

impl DateRange {
  pub fn new(since: NaiveDate, until: NaiveDate) -> ScrapeResult<Self> {
    if since > until {
      return Err(ScrapeError::Config(format!("since {since} is after until {until}")));
    }
    Ok(Self { since, until })
  }

  /// parse two `YYYY-MM-DD` strings
  pub fn parse(since: &str, until: &str) -> ScrapeResult<Self> {
    let since = NaiveDate::parse_from_str(since, DATE_LAYOUT)
      .map_err(|e| ScrapeError::Config(format!("since {since:?}: {e}")))?;
    let until = NaiveDate::parse_from_str(until, DATE_LAYOUT)
      .map_err(|e| ScrapeError::Config(format!("until {until:?}: {e}")))?;
    Self::new(since, until)
  }

  pub fn since(&self) -> NaiveDate {
    self.since
  }

  pub fn until(&self) -> NaiveDate {
    self.until
  }

  /// 00:00:00 on the first day
  pub fn start(&self) -> DateTime<Utc> {
    self.since.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
  }

  /// 23:59:59 on the last day
  pub fn end(&self) -> DateTime<Utc> {
    self.until.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc()
  }

  /// strictly inside the window, the bounds themselves are excluded
  pub fn contains(&self, date: &DateTime<Utc>) -> bool {
    *date > self.start() && *date < self.end()
  }

  /// the `until:... since:...` search operators
  pub fn search_operators(&self) -> String {
    format!("until:{} since:{}", self.until.format(DATE_LAYOUT), self.since.format(DATE_LAYOUT))
  }
}

/// per-crawl settings
#[derive(Debug, Clone)]
pub struct QueryConfig {
  pub date_range: Option<DateRange>,
  pub lang: Lang,
  /// stop after this many posts have been emitted
  pub max_results: usize,
  /// how many times the same cursor may come back with an empty page
  pub retries: u32,
  /// log and skip unsupported structures instead of ending the crawl on them
  pub skip_unsupported: bool,
}

impl QueryConfig {
  pub fn new(max_results: usize) -> ScrapeResult<Self> {
    if max_results == 0 {
      return Err(ScrapeError::Config("max_results must be positive".into()));
    }
    Ok(Self {
      date_range: None,
      lang: Lang::default(),
      max_results,
      retries: 3,
      skip_unsupported: false,
    })
  }

  #[must_use]
  pub fn with_date_range(mut self, range: DateRange) -> Self {
    self.date_range = Some(range);
    self
  }

  #[must_use]
  pub fn with_lang(mut self, lang: Lang) -> Self {
    self.lang = lang;
    self
  }

  #[must_use]
  pub fn with_retries(mut self, retries: u32) -> Self {
    self.retries = retries;
    self
  }

  #[must_use]
  pub fn skipping_unsupported(mut self) -> Self {
    self.skip_unsupported = true;
    self
  }
}

/// settings for one scraper instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
  #[serde(default)]
  pub transport: TransportConfig,

  #[serde(default = "default_accept_language")]
  pub accept_language: String,
}

fn default_accept_language() -> String {
  "en-US,en;q=0.5".into()
}

impl Default for ScraperConfig {
  fn default() -> Self {
    Self {
      transport: TransportConfig::default(),
      accept_language: default_accept_language(),
    }
  }
}

/// retry/backoff knobs for the http transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
  /// request timeout
  #[serde(default = "default_timeout", with = "duration_secs")]
  pub timeout: Duration,

  /// attempts per request, including the first
  #[serde(default = "default_attempts")]
  pub attempts: u32,

  /// wait before retry `n` is `backoff_base_ms * 2^n`
  #[serde(default = "default_backoff_base_ms")]
  pub backoff_base_ms: u64,
}

fn default_timeout() -> Duration {
  Duration::from_secs(10)
}

fn default_attempts() -> u32 {
  3
}

fn default_backoff_base_ms() -> u64 {
  1000
}

impl Default for TransportConfig {
  fn default() -> Self {
    Self {
      timeout: default_timeout(),
      attempts: default_attempts(),
      backoff_base_ms: default_backoff_base_ms(),
    }
  }
}

impl TransportConfig {
  pub fn backoff(&self, attempt: u32) -> Duration {
    Duration::from_millis(self.backoff_base_ms.saturating_mul(2_u64.saturating_pow(attempt)))
  }
}

mod duration_secs {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};
  use std::time::Duration;

  pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    duration.as_secs().serialize(serializer)
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
  where
    D: Deserializer<'de>,
  {
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
  }
}
