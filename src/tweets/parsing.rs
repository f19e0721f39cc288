use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::{
  config::ApiVariant,
  error::{ScrapeError, ScrapeResult},
  node::Node,
  types::{
    Card, CardValue, CardValues, Coordinates, Gif, Media, Photo, Place, Post, Related, TextLink,
    User, UserLabel, Video, VideoVariant, PLATFORM_HOST,
  },
};
use super::raw::{RawMedia, RawTweet, RawUrl, RawUser};

/// `Wed Oct 10 20:19:24 +0000 2018`
const TWITTER_DATE_LAYOUT: &str = "%a %b %d %H:%M:%S %z %Y";

static SOURCE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href=['"]?([^'" >]+)"#).expect("valid regex"));
static SOURCE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r">([^<]*)<").expect("valid regex"));

/// cards twitter sends that we know about but can't map to a slot
const UNSUPPORTED_CARDS: [&str; 4] = [
  "3337203208:newsletter_publication",
  "3337203208:newsletter_issue",
  "amplify",
  "appplayer",
];

/* ---------------------------------- ids ---------------------------------- */

/// twitter sends ids both as a number and as a string. the number wins when
/// it's there, otherwise the string is parsed, otherwise 0
pub fn resolve_id(id: Option<u64>, id_str: Option<&str>) -> u64 {
  match id {
    Some(id) if id != 0 => id,
    _ => id_str.and_then(|s| s.parse().ok()).unwrap_or(0),
  }
}

fn parse_id(id_str: Option<&str>) -> Option<u64> {
  id_str.and_then(|s| s.parse().ok())
}

/* --------------------------------- text ---------------------------------- */

/// `None` for anything that isn't twitter's fixed date format. never an error
pub fn parse_date(date: Option<&str>) -> Option<DateTime<Utc>> {
  DateTime::parse_from_str(date?, TWITTER_DATE_LAYOUT)
    .ok()
    .map(|d| d.with_timezone(&Utc))
}

/// swap each t.co link in `text` for the url it expands to
pub fn render_text(text: &str, urls: &[RawUrl]) -> String {
  urls.iter().fold(text.to_string(), |rendered, url| {
    if url.url.is_empty() {
      return rendered;
    }
    let target = if url.expanded_url.is_empty() { &url.display_url } else { &url.expanded_url };
    rendered.replace(&url.url, target)
  })
}

/// pull the link and the visible label out of the `source` anchor. the two
/// are extracted independently, so a label-less anchor still gives a url
pub fn parse_source(source: &str) -> (Option<String>, Option<String>) {
  let url = SOURCE_LINK.captures(source).map(|c| c[1].to_string());
  let label = SOURCE_LABEL.captures(source).map(|c| c[1].to_string());
  (url, label)
}

fn parse_links(urls: &[RawUrl]) -> Vec<TextLink> {
  urls.iter().map(|u| TextLink {
    text: u.display_url.clone(),
    url: u.expanded_url.clone(),
    tco_url: u.url.clone(),
    indices: u.indices.clone(),
  }).collect()
}

/* --------------------------------- media --------------------------------- */

/// turn a photo url into a small/large pair. works on both the bare
/// `.../abc.jpg` form and the `...?format=jpg&name=...` form, so feeding the
/// output back in gives the same pair. only jpg and png are kept
pub fn parse_photo(url: &str) -> Option<Photo> {
  let (path, query) = match url.split_once('?') {
    Some((path, query)) => (path, Some(query)),
    None => (url, None),
  };
  let format_param = query.and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("format=")));

  let (base, format) = match format_param {
    Some(format) => (path, format),
    None => {
      let (base, ext) = path.rsplit_once('.')?;
      // the last dot was in the host, there's no extension
      if ext.contains('/') {
        return None;
      }
      (base, ext)
    },
  };
  if format != "jpg" && format != "png" {
    return None;
  }
  Some(Photo {
    preview_url: format!("{base}?format={format}&name=small"),
    full_url: format!("{base}?format={format}&name=large"),
  })
}

fn parse_variants(media: &RawMedia) -> Vec<VideoVariant> {
  media.video_info.variants.iter().map(|v| VideoVariant {
    content_type: v.content_type.clone(),
    url: v.url.clone(),
    bit_rate: v.bitrate,
  }).collect()
}

/// view count lives in `ext.mediaStats.r.ok.viewCount` on the legacy api and
/// `mediaStats.viewCount` on graphql, as either a string or a number
fn view_count(media: &RawMedia) -> Option<u64> {
  let legacy = Node::new(&media.ext).path(&["mediaStats", "r", "ok", "viewCount"]).ok()?;
  let count = if legacy.is_absent() {
    Node::new(&media.media_stats).lookup("viewCount")
  } else {
    legacy
  };
  count.as_u64().ok()
    .or_else(|| count.as_str().ok().and_then(|s| s.parse().ok()))
}

pub fn parse_media(tweet: &RawTweet) -> Media {
  let mut media = Media::default();
  for item in &tweet.extended_entities.media {
    match item.kind.as_str() {
      "photo" => {
        if let Some(photo) = parse_photo(&item.media_url_https) {
          media.photos.push(photo);
        }
      },
      "video" => media.videos.push(Video {
        thumbnail_url: item.media_url_https.clone(),
        variants: parse_variants(item),
        duration: (item.video_info.duration_millis / 1000) as f64,
        views: view_count(item),
      }),
      // only one entry in the variants array for gifs, but keep whatever's there
      "animated_gif" => media.gifs.push(Gif {
        thumbnail_url: item.media_url_https.clone(),
        variants: parse_variants(item),
      }),
      _ => {},
    }
  }
  media
}

/* ---------------------------------- geo ---------------------------------- */

fn point(coords: &[f64]) -> Option<(f64, f64)> {
  match coords {
    [a, b] => Some((*a, *b)),
    _ => None,
  }
}

/// explicit coordinates, then the geo block, then the first corner of the
/// place's bounding box. geojson (`coordinates`, `bounding_box`) is
/// `[longitude, latitude]`, the old `geo` block is `[latitude, longitude]`
pub fn parse_coordinates(tweet: &RawTweet) -> Option<Coordinates> {
  if let Some((longitude, latitude)) = tweet.coordinates.as_ref().and_then(|c| point(&c.coordinates)) {
    return Some(Coordinates { latitude, longitude });
  }
  if let Some((latitude, longitude)) = tweet.geo.as_ref().and_then(|g| point(&g.coordinates)) {
    return Some(Coordinates { latitude, longitude });
  }
  let corner = tweet.place.as_ref()
    .and_then(|p| p.bounding_box.as_ref())
    .and_then(|b| b.coordinates.first())
    .and_then(|ring| ring.first())
    .and_then(|c| point(c));
  corner.map(|(longitude, latitude)| Coordinates { latitude, longitude })
}

fn parse_place(tweet: &RawTweet) -> Option<Place> {
  tweet.place.as_ref().map(|p| Place {
    full_name: p.full_name.clone(),
    name: p.name.clone(),
    kind: p.place_type.clone(),
    country: p.country.clone(),
    country_code: p.country_code.clone(),
  })
}

/* ---------------------------------- post --------------------------------- */

/// build a `Post` out of one raw tweet. `related` carries the already built
/// retweet/quote, if any
pub fn build_post(tweet: &RawTweet, user: Option<User>, card: Option<Card>, related: Related) -> Post {
  let id = resolve_id(tweet.id, tweet.id_str.as_deref());
  let url = match &user {
    Some(user) if !user.username.is_empty() => format!("https://{PLATFORM_HOST}/{}/status/{id}", user.username),
    _ => format!("https://{PLATFORM_HOST}/i/web/status/{id}"),
  };
  let (source_url, source_label) = parse_source(&tweet.source);

  let mentioned_users: Vec<User> = tweet.entities.user_mentions.iter()
    .map(|m| User::reference(resolve_id(m.id, m.id_str.as_deref()), &m.screen_name, &m.name))
    .collect();

  // who is being replied to: someone mentioned in the tweet, the author
  // themselves (threads), or just the bare handle/id twitter gives us
  let in_reply_to_user = match (&tweet.in_reply_to_user_id_str, &tweet.in_reply_to_screen_name) {
    (None, None) => None,
    (reply_id, screen_name) => {
      let reply_id = parse_id(reply_id.as_deref()).unwrap_or(0);
      let mentioned = mentioned_users.iter().find(|u| u.id == reply_id && reply_id != 0);
      let author = user.as_ref().filter(|u| u.id == reply_id && reply_id != 0);
      Some(mentioned.or(author).cloned().unwrap_or_else(|| {
        User::reference(reply_id, screen_name.as_deref().unwrap_or_default(), "")
      }))
    },
  };

  Post {
    id,
    url,
    date: parse_date(tweet.created_at.as_deref()),
    content: tweet.full_text.clone(),
    rendered_content: render_text(&tweet.full_text, &tweet.entities.urls),
    reply_count: tweet.reply_count,
    retweet_count: tweet.retweet_count,
    like_count: tweet.favorite_count,
    quote_count: tweet.quote_count,
    conversation_id: resolve_id(tweet.conversation_id, tweet.conversation_id_str.as_deref()),
    lang: tweet.lang.clone(),
    source: tweet.source.clone(),
    source_url,
    source_label,
    links: parse_links(&tweet.entities.urls),
    media: parse_media(tweet),
    in_reply_to_tweet_id: parse_id(tweet.in_reply_to_status_id_str.as_deref()),
    in_reply_to_user,
    mentioned_users,
    coordinates: parse_coordinates(tweet),
    place: parse_place(tweet),
    hashtags: tweet.entities.hashtags.iter().map(|t| t.text.clone()).collect(),
    cash_tags: tweet.entities.symbols.iter().map(|t| t.text.clone()).collect(),
    card,
    user,
    retweeted_tweet: related.retweeted.map(Box::new),
    quote: related.quote,
  }
}

/* ---------------------------------- user --------------------------------- */

/// the affiliate badge block. missing pieces stay empty
pub fn parse_label(label: Node<'_>) -> UserLabel {
  let text = |names: &[&str]| -> String {
    label.path(names).ok()
      .and_then(|n| n.as_str().ok())
      .unwrap_or_default()
      .to_string()
  };
  let long_description = match text(&["longDescription", "text"]) {
    s if s.is_empty() => text(&["long_description", "text"]),
    s => s,
  };
  UserLabel {
    url: text(&["url", "url"]),
    badge: text(&["badge", "url"]),
    description: text(&["description"]),
    long_description,
  }
}

pub fn build_user(user: &RawUser) -> User {
  let expanded = render_text(&user.description, &user.entities.description.urls);
  let description = if expanded == user.description {
    expanded
  } else {
    format!("{} | {}", user.description, expanded)
  };
  let description_links = user.entities.description.urls.iter()
    .chain(&user.entities.url.urls)
    .map(|u| u.expanded_url.clone())
    .filter(|u| !u.is_empty())
    .collect();

  let label = Node::new(&user.ext).path(&["highlightedLabel", "r", "ok", "label"])
    .ok()
    .filter(|n| !n.is_absent())
    .map(parse_label)
    .unwrap_or_default();

  User {
    id: resolve_id(user.id, user.id_str.as_deref()),
    username: user.screen_name.clone(),
    display_name: user.name.clone(),
    description,
    raw_description: user.description.clone(),
    description_links,
    verified: user.verified,
    created: parse_date(user.created_at.as_deref()),
    followers_count: user.followers_count,
    friends_count: user.friends_count,
    statuses_count: user.statuses_count,
    favourites_count: user.favourites_count,
    listed_count: user.listed_count,
    media_count: user.media_count,
    location: user.location.clone(),
    protected: user.protected,
    profile_image_url: user.profile_image_url_https.clone(),
    profile_banner_url: user.profile_banner_url.clone(),
    label,
    url: user.url.clone().unwrap_or_default(),
  }
}

/* ---------------------------------- card --------------------------------- */

/// users a card's `USER` bindings point at, keyed by id string
fn card_users(card: Node<'_>, variant: ApiVariant) -> ScrapeResult<HashMap<String, User>> {
  let mut users = HashMap::new();
  match variant {
    ApiVariant::Legacy => {
      let refs = card.lookup("users");
      if refs.is_absent() {
        return Ok(users);
      }
      for (key, raw) in refs.members()? {
        users.insert(key.to_string(), build_user(&raw.decode::<RawUser>()?));
      }
    },
    ApiVariant::Graphql => {
      let refs = card.lookup("legacy").lookup("user_refs");
      if refs.is_absent() {
        return Ok(users);
      }
      for user_ref in refs.as_seq()? {
        let rest_id = user_ref.field("rest_id")?.as_str()?;
        // the same user can be referenced more than once
        if users.contains_key(rest_id) {
          continue;
        }
        let legacy = user_ref.lookup("legacy");
        let mut user = if legacy.is_absent() { User::default() } else { build_user(&legacy.decode::<RawUser>()?) };
        user.id = rest_id.parse().unwrap_or(user.id);
        users.insert(rest_id.to_string(), user);
      }
    },
  }
  Ok(users)
}

/// `(name, {"type": ..., "<type>_value": ...})` pairs, from either the legacy
/// map or the graphql `[{"key": ..., "value": ...}]` list
fn card_bindings<'a>(card: Node<'a>, variant: ApiVariant) -> ScrapeResult<Vec<(&'a str, Node<'a>)>> {
  match variant {
    ApiVariant::Legacy => {
      let values = card.lookup("binding_values");
      if values.is_absent() { Ok(Vec::new()) } else { values.members() }
    },
    ApiVariant::Graphql => {
      let values = card.lookup("legacy").lookup("binding_values");
      if values.is_absent() {
        return Ok(Vec::new());
      }
      values.as_seq()?.into_iter()
        .map(|b| Ok((b.field("key")?.as_str()?, b.field("value")?)))
        .collect()
    },
  }
}

/// interpret a card's typed binding values and route them to the summary,
/// app or player slot by card name
pub fn build_card(card: Node<'_>, variant: ApiVariant, tweet_id: u64) -> ScrapeResult<Card> {
  let name = match variant {
    ApiVariant::Legacy => card.field("name")?.as_str()?,
    ApiVariant::Graphql => card.path(&["legacy", "name"])?.as_str()?,
  };
  if UNSUPPORTED_CARDS.contains(&name) {
    return Err(ScrapeError::Unsupported(format!("card {name} on tweet {tweet_id}")));
  }

  let users = card_users(card, variant)?;
  let mut values = CardValues::new();
  for (key, binding) in card_bindings(card, variant)? {
    let Some(kind) = binding.opt_str("type")? else {
      continue;
    };
    let value = match kind {
      "STRING" => {
        let s = binding.field("string_value")?.as_str()?;
        match DateTime::parse_from_rfc3339(s) {
          Ok(date) if key.ends_with("_datetime_utc") => CardValue::DateTime(date.with_timezone(&Utc)),
          _ => CardValue::String(s.to_string()),
        }
      },
      "IMAGE" => CardValue::Image(binding.path(&["image_value", "url"])?.as_str()?.to_string()),
      "BOOLEAN" => CardValue::Boolean(binding.field("boolean_value")?.as_bool()?),
      "IMAGE_COLOR" => continue,
      "USER" => {
        let id = binding.path(&["user_value", "id_str"])?.as_str()?;
        let user = users.get(id).cloned()
          .unwrap_or_else(|| User { id: id.parse().unwrap_or(0), ..Default::default() });
        CardValue::User(Box::new(user))
      },
      other => {
        warn!(tweet_id, key, kind = other, "Unsupported card value type");
        continue;
      },
    };
    values.insert(key.to_string(), value);
  }

  let mut built = Card { name: name.to_string(), ..Default::default() };
  match name {
    "summary" | "summary_large_image" => built.summary = Some(values),
    "app" | "direct_store_link_app" => built.app = Some(values),
    "player" => built.player = Some(values),
    // polls, broadcasts and friends: keep the name, drop the values
    _ => {},
  }
  Ok(built)
}
