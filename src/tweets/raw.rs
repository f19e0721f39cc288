//! tweet and user objects as twitter sends them. both schemas use the same
//! "legacy" object for the tweet body and the user body, so one set of
//! structs covers both; anything with no stable shape stays a `Value`

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` reads as the default, same as an absent key
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTweet {
  pub id: Option<u64>,
  pub id_str: Option<String>,
  pub conversation_id: Option<u64>,
  pub conversation_id_str: Option<String>,
  pub created_at: Option<String>,
  #[serde(deserialize_with = "null_default")]
  pub full_text: String,
  #[serde(deserialize_with = "null_default")]
  pub favorite_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub reply_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub retweet_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub quote_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub lang: String,
  #[serde(deserialize_with = "null_default")]
  pub source: String,
  pub user_id_str: Option<String>,
  pub retweeted_status_id_str: Option<String>,
  pub quoted_status_id_str: Option<String>,
  pub in_reply_to_status_id_str: Option<String>,
  pub in_reply_to_user_id_str: Option<String>,
  pub in_reply_to_screen_name: Option<String>,
  #[serde(deserialize_with = "null_default")]
  pub entities: RawEntities,
  #[serde(deserialize_with = "null_default")]
  pub extended_entities: RawExtendedEntities,
  pub coordinates: Option<RawPoint>,
  pub geo: Option<RawPoint>,
  pub place: Option<RawPlace>,
  /// legacy-only: the card travels inside the tweet object
  pub card: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEntities {
  #[serde(deserialize_with = "null_default")]
  pub hashtags: Vec<RawTag>,
  #[serde(deserialize_with = "null_default")]
  pub symbols: Vec<RawTag>,
  #[serde(deserialize_with = "null_default")]
  pub urls: Vec<RawUrl>,
  #[serde(deserialize_with = "null_default")]
  pub user_mentions: Vec<RawMention>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTag {
  #[serde(deserialize_with = "null_default")]
  pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUrl {
  #[serde(deserialize_with = "null_default")]
  pub url: String,
  #[serde(deserialize_with = "null_default")]
  pub display_url: String,
  #[serde(deserialize_with = "null_default")]
  pub expanded_url: String,
  #[serde(deserialize_with = "null_default")]
  pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMention {
  pub id: Option<u64>,
  pub id_str: Option<String>,
  #[serde(deserialize_with = "null_default")]
  pub screen_name: String,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExtendedEntities {
  #[serde(deserialize_with = "null_default")]
  pub media: Vec<RawMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMedia {
  #[serde(rename = "type")]
  #[serde(deserialize_with = "null_default")]
  pub kind: String,
  #[serde(deserialize_with = "null_default")]
  pub media_url_https: String,
  #[serde(deserialize_with = "null_default")]
  pub video_info: RawVideoInfo,
  /// `{"mediaStats": {"r": {"ok": {"viewCount": "123"}}}}`
  pub ext: Value,
  /// graphql flattens the stats to `{"viewCount": 123}`
  #[serde(rename = "mediaStats")]
  pub media_stats: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVideoInfo {
  #[serde(deserialize_with = "null_default")]
  pub duration_millis: u64,
  #[serde(deserialize_with = "null_default")]
  pub variants: Vec<RawVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVariant {
  #[serde(deserialize_with = "null_default")]
  pub content_type: String,
  #[serde(deserialize_with = "null_default")]
  pub url: String,
  pub bitrate: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPoint {
  #[serde(deserialize_with = "null_default")]
  pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlace {
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(deserialize_with = "null_default")]
  pub full_name: String,
  #[serde(deserialize_with = "null_default")]
  pub place_type: String,
  #[serde(deserialize_with = "null_default")]
  pub country: String,
  #[serde(deserialize_with = "null_default")]
  pub country_code: String,
  pub bounding_box: Option<RawBoundingBox>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBoundingBox {
  #[serde(deserialize_with = "null_default")]
  pub coordinates: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUser {
  pub id: Option<u64>,
  pub id_str: Option<String>,
  pub created_at: Option<String>,
  #[serde(deserialize_with = "null_default")]
  pub description: String,
  #[serde(deserialize_with = "null_default")]
  pub entities: RawUserEntities,
  #[serde(deserialize_with = "null_default")]
  pub favourites_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub followers_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub friends_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub media_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub listed_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub statuses_count: u64,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(deserialize_with = "null_default")]
  pub screen_name: String,
  #[serde(deserialize_with = "null_default")]
  pub location: String,
  #[serde(deserialize_with = "null_default")]
  pub protected: bool,
  #[serde(deserialize_with = "null_default")]
  pub verified: bool,
  pub url: Option<String>,
  #[serde(deserialize_with = "null_default")]
  pub profile_image_url_https: String,
  #[serde(deserialize_with = "null_default")]
  pub profile_banner_url: String,
  pub ext: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUserEntities {
  #[serde(deserialize_with = "null_default")]
  pub description: RawUrlList,
  #[serde(deserialize_with = "null_default")]
  pub url: RawUrlList,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUrlList {
  #[serde(deserialize_with = "null_default")]
  pub urls: Vec<RawUrl>,
}
