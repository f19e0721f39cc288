use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
  error::{ScrapeError, ScrapeResult},
  fetch::{check_token_response, Transport, GUEST_ACTIVATE_URL},
};

/// twitter sets the `gt` cookie for three hours, after that the token is dead
const GUEST_TOKEN_LIFETIME: Duration = Duration::from_secs(3 * 60 * 60);

/// source of the "x-guest-token" header value
#[async_trait]
pub trait TokenProvider: Send + Sync {
  /// the token to send, empty when there isn't a usable one
  async fn current_token(&self) -> String;

  /// get a fresh token
  async fn refresh(&self) -> ScrapeResult<()>;

  /// forget the token so the next request gets a new one
  async fn reset(&self);
}

#[derive(Debug, Default)]
struct GuestToken {
  value: String,
  acquired_at: Option<Instant>,
}

/// guest tokens from `1.1/guest/activate.json`, one per scraper
pub struct GuestTokenManager {
  transport: Arc<dyn Transport>,
  headers: HeaderMap,
  activate_url: String,
  token: Mutex<GuestToken>,
}

impl GuestTokenManager {
  /// `headers` must carry the bearer authorization
  pub fn new(transport: Arc<dyn Transport>, headers: HeaderMap) -> Self {
    Self {
      transport,
      headers,
      activate_url: GUEST_ACTIVATE_URL.to_string(),
      token: Mutex::new(GuestToken::default()),
    }
  }

  /// activate against another host, e.g. a local mock
  #[must_use]
  pub fn with_activate_url(mut self, url: impl Into<String>) -> Self {
    self.activate_url = url.into();
    self
  }
}

#[async_trait]
impl TokenProvider for GuestTokenManager {
  async fn current_token(&self) -> String {
    let token = self.token.lock().await;
    match token.acquired_at {
      Some(at) if at.elapsed() < GUEST_TOKEN_LIFETIME => token.value.clone(),
      _ => String::new(),
    }
  }

  async fn refresh(&self) -> ScrapeResult<()> {
    let mut token = self.token.lock().await;
    let body = match self.transport.post(&self.activate_url, &[], &self.headers, check_token_response).await {
      Ok(body) => body,
      Err(e) => {
        *token = GuestToken::default();
        return Err(e);
      },
    };
    let json: Value = serde_json::from_str(&body)?;
    let Some(value) = json["guest_token"].as_str().filter(|t| !t.is_empty()) else {
      *token = GuestToken::default();
      warn!(body = %body, "Activation response had no guest token");
      return Err(ScrapeError::Token("no guest_token in activation response".into()));
    };
    info!("Acquired guest token");
    *token = GuestToken {
      value: value.to_string(),
      acquired_at: Some(Instant::now()),
    };
    Ok(())
  }

  async fn reset(&self) {
    *self.token.lock().await = GuestToken::default();
  }
}
