use async_trait::async_trait;
use reqwest::{
  header::{HeaderMap, CONTENT_TYPE},
  Method, StatusCode,
};
use tracing::{debug, info, warn};

use crate::{
  config::TransportConfig,
  error::{ScrapeError, ScrapeResult},
};

/// bearer token of the web client. public, baked into twitter's js bundle
pub const AUTHORIZATION: &str = "Bearer AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

pub const GUEST_ACTIVATE_URL: &str = "https://api.twitter.com/1.1/guest/activate.json";
pub const SEARCH_URL: &str = "https://api.twitter.com/2/search/adaptive.json";
pub const TRENDS_URL: &str = "https://twitter.com/i/api/2/guide.json";
pub const USER_BY_SCREEN_NAME_URL: &str = "https://twitter.com/i/api/graphql/7mjxD3-C6BxitPMVQ6w0-Q/UserByScreenName";
pub const USER_TWEETS_URL: &str = "https://twitter.com/i/api/graphql/BSKxQ9_IaCoVyIvQHQROIQ/UserTweetsAndReplies";

/// decides whether a response is worth reading. `Err` carries the reason and
/// makes the transport try again
pub type ResponseCheck = fn(StatusCode, &HeaderMap) -> Result<(), String>;

/// api responses: not blocked, json, 200
pub fn check_api_response(status: StatusCode, headers: &HeaderMap) -> Result<(), String> {
  if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
    return Err(format!("blocked ({})", status.as_u16()));
  }
  let content_type = headers.get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  if content_type.is_empty() {
    return Err("no content type".into());
  }
  let content_type = content_type.replace(' ', "").to_ascii_lowercase();
  if content_type != "application/json;charset=utf-8" {
    return Err(format!("content type is {content_type}, not json"));
  }
  if status != StatusCode::OK {
    return Err(format!("status {}", status.as_u16()));
  }
  Ok(())
}

/// guest token activation only has to come back 200
pub fn check_token_response(status: StatusCode, _headers: &HeaderMap) -> Result<(), String> {
  if status != StatusCode::OK {
    return Err(format!("status {}", status.as_u16()));
  }
  Ok(())
}

/// the http seam. everything above it deals in bodies, not responses
#[async_trait]
pub trait Transport: Send + Sync {
  async fn get(
    &self,
    url: &str,
    query: &[(String, String)],
    headers: &HeaderMap,
    check: ResponseCheck,
  ) -> ScrapeResult<String>;

  async fn post(
    &self,
    url: &str,
    query: &[(String, String)],
    headers: &HeaderMap,
    check: ResponseCheck,
  ) -> ScrapeResult<String>;
}

pub struct HttpTransport {
  client: reqwest::Client,
  config: TransportConfig,
}

impl HttpTransport {
  pub fn new(config: &TransportConfig) -> ScrapeResult<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.timeout)
      .redirect(reqwest::redirect::Policy::none())
      .cookie_store(true)
      .gzip(true).deflate(true).brotli(true)
      .build()?;
    Ok(Self { client, config: config.clone() })
  }

  async fn send(
    &self,
    method: Method,
    url: &str,
    query: &[(String, String)],
    headers: &HeaderMap,
    check: ResponseCheck,
  ) -> ScrapeResult<String> {
    let attempts = self.config.attempts.max(1);
    let mut status = None;
    let mut reason = String::new();

    for attempt in 0..attempts {
      if attempt > 0 {
        let delay = self.config.backoff(attempt - 1);
        info!(url, attempt, delay_ms = delay.as_millis() as u64, "Retrying request");
        tokio::time::sleep(delay).await;
      }
      debug!(%method, url, attempt, "Sending request");

      let sent = self.client.request(method.clone(), url)
        .query(query)
        .headers(headers.clone())
        .send().await;
      match sent {
        Ok(response) => {
          let code = response.status();
          match check(code, response.headers()) {
            Ok(()) => return Ok(response.text().await?),
            Err(why) => {
              warn!(url, status = code.as_u16(), reason = %why, "Response failed validation");
              status = Some(code.as_u16());
              reason = why;
            },
          }
        },
        Err(e) => {
          warn!(url, error = %e, "Request failed");
          status = e.status().map(|s| s.as_u16());
          reason = e.to_string();
        },
      }
    }

    Err(ScrapeError::Transport {
      url: url.to_string(),
      status,
      reason: format!("gave up after {attempts} attempts: {reason}"),
    })
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn get(
    &self,
    url: &str,
    query: &[(String, String)],
    headers: &HeaderMap,
    check: ResponseCheck,
  ) -> ScrapeResult<String> {
    self.send(Method::GET, url, query, headers, check).await
  }

  async fn post(
    &self,
    url: &str,
    query: &[(String, String)],
    headers: &HeaderMap,
    check: ResponseCheck,
  ) -> ScrapeResult<String> {
    self.send(Method::POST, url, query, headers, check).await
  }
}
