use std::sync::Arc;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION as AUTHORIZATION_HEADER, USER_AGENT};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
  config::{QueryConfig, ScraperConfig},
  error::{ScrapeError, ScrapeResult},
  fetch::{
    check_api_response, HttpTransport, Transport, AUTHORIZATION, SEARCH_URL, TRENDS_URL,
    USER_BY_SCREEN_NAME_URL, USER_TWEETS_URL,
  },
  token::{GuestTokenManager, TokenProvider},
  tweets::{
    query::{hashtag_query, search_params, search_query, trends_params},
    schema::{GraphqlSchema, LegacySchema},
    timeline::{Crawl, PageQuery},
    trends::parse_trends,
    user::{parse_user_lookup, user_lookup_params, user_tweets_variables},
  },
  types::{Trend, TweetResult},
};

/// 200 = guest token expired, 215 = guest token missing/invalid
const TOKEN_ERROR_CODES: [i64; 2] = [200, 215];

/// a chrome-on-windows user agent with randomised build numbers
pub fn random_user_agent() -> String {
  let mut rng = rand::thread_rng();
  format!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/79.0.3945.{} Safari/537.{}",
    rng.gen_range(0..10000),
    rng.gen_range(0..100),
  )
}

fn header_value(value: &str) -> ScrapeResult<HeaderValue> {
  HeaderValue::from_str(value).map_err(|e| ScrapeError::Config(format!("bad header value {value:?}: {e}")))
}

fn default_headers(config: &ScraperConfig) -> ScrapeResult<HeaderMap> {
  let mut headers = HeaderMap::new();
  headers.insert(AUTHORIZATION_HEADER, header_value(AUTHORIZATION)?);
  headers.insert(USER_AGENT, header_value(&random_user_agent())?);
  headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
  Ok(headers)
}

/// `errors[].code` of a response body that otherwise parsed fine
fn has_token_error(json: &Value) -> bool {
  json["errors"].as_array().map_or(false, |errors| {
    errors.iter().any(|e| e["code"].as_i64().map_or(false, |c| TOKEN_ERROR_CODES.contains(&c)))
  })
}

/// one guest session against twitter's private api. cheap to clone, clones
/// share the transport and the guest token
#[derive(Clone)]
pub struct Scraper {
  transport: Arc<dyn Transport>,
  token: Arc<dyn TokenProvider>,
  headers: HeaderMap,
}

impl Scraper {
  pub fn new(config: ScraperConfig) -> ScrapeResult<Self> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.transport)?);
    let headers = default_headers(&config)?;
    let token = Arc::new(GuestTokenManager::new(Arc::clone(&transport), headers.clone()));
    Ok(Self { transport, token, headers })
  }

  /// bring your own transport and token source
  pub fn with_parts(config: &ScraperConfig, transport: Arc<dyn Transport>, token: Arc<dyn TokenProvider>) -> ScrapeResult<Self> {
    Ok(Self {
      transport,
      token,
      headers: default_headers(config)?,
    })
  }

  async fn ensure_token(&self) -> ScrapeResult<String> {
    let token = self.token.current_token().await;
    if !token.is_empty() {
      return Ok(token);
    }
    self.token.refresh().await?;
    let token = self.token.current_token().await;
    if token.is_empty() {
      return Err(ScrapeError::Token("no guest token after refresh".into()));
    }
    Ok(token)
  }

  async fn get_json(&self, url: &str, query: &[(String, String)]) -> ScrapeResult<Value> {
    let token = self.ensure_token().await?;
    let mut headers = self.headers.clone();
    headers.insert("x-guest-token", header_value(&token)?);

    let body = match self.transport.get(url, query, &headers, check_api_response).await {
      Ok(body) => body,
      Err(e) => {
        if e.is_auth_failure() {
          self.token.reset().await;
        }
        return Err(e);
      },
    };
    Ok(serde_json::from_str(&body)?)
  }

  /// GET a private api endpoint as the guest. a body saying the token died
  /// gets one retry with a fresh token
  pub async fn api_json(&self, url: &str, query: &[(String, String)]) -> ScrapeResult<Value> {
    let json = self.get_json(url, query).await?;
    if !has_token_error(&json) {
      return Ok(json);
    }
    warn!(url, "Guest token rejected, retrying with a new one");
    self.token.reset().await;
    self.get_json(url, query).await
  }

  /* ------------------------------ timelines ------------------------------- */

  /// stream search results for `query`. has to be called inside a tokio
  /// runtime, the crawl runs on its own task
  pub fn search(&self, query: &str, config: QueryConfig, cancel: CancellationToken) -> mpsc::Receiver<TweetResult> {
    let q = search_query(query, &config);
    info!(q = %q, max_results = config.max_results, "Starting search");
    Crawl {
      scraper: self.clone(),
      schema: Arc::new(LegacySchema),
      endpoint: SEARCH_URL.to_string(),
      query: PageQuery::Params(search_params(&q)),
      config,
      cancel,
    }.spawn()
  }

  pub fn hashtag(&self, hashtag: &str, config: QueryConfig, cancel: CancellationToken) -> mpsc::Receiver<TweetResult> {
    self.search(&hashtag_query(hashtag), config, cancel)
  }

  /// stream a user's tweets and replies. an unavailable account gives a
  /// receiver that is already closed
  pub async fn user_tweets(
    &self,
    username: &str,
    config: QueryConfig,
    cancel: CancellationToken,
  ) -> ScrapeResult<mpsc::Receiver<TweetResult>> {
    let lookup = self.api_json(USER_BY_SCREEN_NAME_URL, &user_lookup_params(username)?).await?;
    let Some((user_id, user)) = parse_user_lookup(&lookup)? else {
      info!(username, "User unavailable");
      let (_, rx) = mpsc::channel(1);
      return Ok(rx);
    };
    info!(username = %user.username, user_id = %user_id, "Starting user timeline");

    Ok(Crawl {
      scraper: self.clone(),
      schema: Arc::new(GraphqlSchema),
      endpoint: USER_TWEETS_URL.to_string(),
      query: PageQuery::Variables(user_tweets_variables(&user_id)),
      config,
      cancel,
    }.spawn())
  }

  pub async fn trends(&self) -> ScrapeResult<Vec<Trend>> {
    let page = self.api_json(TRENDS_URL, &trends_params()).await?;
    parse_trends(&page)
  }
}
