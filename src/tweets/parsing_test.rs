use serde_json::json;

use crate::{
  config::ApiVariant,
  error::ScrapeError,
  fixtures::{legacy_tweet, legacy_user},
  node::Node,
  types::{CardValue, Related, User},
};
use super::{
  parsing::*,
  raw::{RawTweet, RawUrl, RawUser},
};

fn raw_tweet(value: serde_json::Value) -> RawTweet {
  serde_json::from_value(value).unwrap()
}

#[test]
fn ids_prefer_the_number() {
  assert_eq!(resolve_id(Some(5), Some("7")), 5);
  assert_eq!(resolve_id(Some(0), Some("7")), 7);
  assert_eq!(resolve_id(None, Some("7")), 7);
  assert_eq!(resolve_id(None, Some("nope")), 0);
  assert_eq!(resolve_id(None, None), 0);
}

#[test]
fn dates_outside_the_format_are_none() {
  let date = parse_date(Some("Wed Oct 10 20:19:24 +0000 2018")).unwrap();
  assert_eq!(date.to_rfc3339(), "2018-10-10T20:19:24+00:00");
  assert!(parse_date(Some("2018-10-10")).is_none());
  assert!(parse_date(None).is_none());
}

#[test]
fn source_anchor_is_split() {
  println!("parse_source()  //  link and label come out separately");
  let (url, label) = parse_source(r#"<a href="https://x.com">X</a>"#);
  assert_eq!(url.as_deref(), Some("https://x.com"));
  assert_eq!(label.as_deref(), Some("X"));

  let (url, label) = parse_source("");
  assert!(url.is_none() && label.is_none());
}

#[test]
fn rendered_text_expands_tco_links() {
  let urls = vec![
    RawUrl {
      url: "https://t.co/abc".into(),
      display_url: "example.com/a".into(),
      expanded_url: "https://example.com/a".into(),
      indices: vec![6, 22],
    },
    RawUrl {
      url: "https://t.co/def".into(),
      display_url: "example.com/b".into(),
      expanded_url: String::new(),
      indices: vec![23, 39],
    },
  ];
  assert_eq!(
    render_text("look: https://t.co/abc https://t.co/def", &urls),
    "look: https://example.com/a example.com/b",
  );
}

#[test]
fn photos_keep_jpg_and_png_only() {
  let photo = parse_photo("https://pbs.twimg.com/media/FaBc.jpg").unwrap();
  assert_eq!(photo.preview_url, "https://pbs.twimg.com/media/FaBc?format=jpg&name=small");
  assert_eq!(photo.full_url, "https://pbs.twimg.com/media/FaBc?format=jpg&name=large");
  assert!(parse_photo("https://pbs.twimg.com/media/FaBc.png").is_some());
  assert!(parse_photo("https://pbs.twimg.com/media/FaBc.webp").is_none());
  assert!(parse_photo("https://pbs.twimg.com/media/FaBc").is_none());
}

#[test]
fn photo_parsing_is_idempotent() {
  let once = parse_photo("https://pbs.twimg.com/media/FaBc.png").unwrap();
  let twice = parse_photo(&once.full_url).unwrap();
  assert_eq!(once, twice);
}

#[test]
fn media_sorts_photos_videos_and_gifs() {
  let mut tweet = legacy_tweet(1, 1, "media");
  tweet["extended_entities"] = json!({ "media": [
    { "type": "photo", "media_url_https": "https://pbs.twimg.com/media/p.jpg" },
    {
      "type": "video",
      "media_url_https": "https://pbs.twimg.com/ext_tw_video_thumb/v.jpg",
      "video_info": { "duration_millis": 12500, "variants": [
        { "content_type": "application/x-mpegURL", "url": "https://video.twimg.com/v.m3u8" },
        { "content_type": "video/mp4", "url": "https://video.twimg.com/v.mp4", "bitrate": 832000 },
      ] },
      "ext": { "mediaStats": { "r": { "ok": { "viewCount": "1234" } } } },
    },
    {
      "type": "video",
      "media_url_https": "https://pbs.twimg.com/ext_tw_video_thumb/w.jpg",
      "mediaStats": { "viewCount": 99 },
    },
    {
      "type": "animated_gif",
      "media_url_https": "https://pbs.twimg.com/tweet_video_thumb/g.jpg",
      "video_info": { "variants": [{ "content_type": "video/mp4", "url": "https://video.twimg.com/g.mp4", "bitrate": 0 }] },
    },
  ] });
  let media = parse_media(&raw_tweet(tweet));

  assert_eq!(media.photos.len(), 1);
  assert_eq!(media.videos.len(), 2);
  assert_eq!(media.gifs.len(), 1);

  let video = &media.videos[0];
  assert_eq!(video.duration, 12.0);
  assert_eq!(video.views, Some(1234));
  assert_eq!(video.variants[0].bit_rate, None);
  assert_eq!(video.variants[1].bit_rate, Some(832000));
  assert_eq!(media.videos[1].views, Some(99));
  assert_eq!(media.gifs[0].variants.len(), 1);
}

#[test]
fn coordinates_prefer_point_then_geo_then_place() {
  let mut tweet = legacy_tweet(1, 1, "geo");
  tweet["coordinates"] = json!({ "type": "Point", "coordinates": [106.8, -6.2] });
  tweet["geo"] = json!({ "type": "Point", "coordinates": [-7.0, 110.0] });
  tweet["place"] = json!({
    "full_name": "Jakarta, Indonesia",
    "name": "Jakarta",
    "place_type": "city",
    "country": "Indonesia",
    "country_code": "ID",
    "bounding_box": { "type": "Polygon", "coordinates": [[[100.0, -1.0], [101.0, -1.0]]] },
  });

  // geojson order is [lon, lat]; reading index 0 as the latitude is wrong here
  let c = parse_coordinates(&raw_tweet(tweet.clone())).unwrap();
  assert_eq!((c.latitude, c.longitude), (-6.2, 106.8));

  tweet["coordinates"] = json!(null);
  let c = parse_coordinates(&raw_tweet(tweet.clone())).unwrap();
  assert_eq!((c.latitude, c.longitude), (-7.0, 110.0));

  tweet["geo"] = json!(null);
  let c = parse_coordinates(&raw_tweet(tweet.clone())).unwrap();
  assert_eq!((c.latitude, c.longitude), (-1.0, 100.0));

  tweet["place"] = json!(null);
  assert!(parse_coordinates(&raw_tweet(tweet)).is_none());
}

#[test]
fn reply_user_falls_back_through_mentions_author_and_handle() {
  let author = User::reference(1, "alice", "Alice");

  let mut tweet = legacy_tweet(10, 1, "@bob hi");
  tweet["entities"]["user_mentions"] = json!([{ "id_str": "2", "screen_name": "bob", "name": "Bob" }]);
  tweet["in_reply_to_user_id_str"] = json!("2");
  tweet["in_reply_to_screen_name"] = json!("bob");
  tweet["in_reply_to_status_id_str"] = json!("9");
  let post = build_post(&raw_tweet(tweet), Some(author.clone()), None, Related::default());
  let reply_to = post.in_reply_to_user.unwrap();
  assert_eq!(reply_to.display_name, "Bob");
  assert_eq!(post.in_reply_to_tweet_id, Some(9));

  // a thread: replying to yourself
  let mut tweet = legacy_tweet(11, 1, "more");
  tweet["in_reply_to_user_id_str"] = json!("1");
  let post = build_post(&raw_tweet(tweet), Some(author.clone()), None, Related::default());
  assert_eq!(post.in_reply_to_user.unwrap().display_name, "Alice");

  // nobody we know
  let mut tweet = legacy_tweet(12, 1, "hm");
  tweet["in_reply_to_user_id_str"] = json!("3");
  tweet["in_reply_to_screen_name"] = json!("carol");
  let post = build_post(&raw_tweet(tweet), Some(author), None, Related::default());
  let reply_to = post.in_reply_to_user.unwrap();
  assert_eq!((reply_to.id, reply_to.username.as_str()), (3, "carol"));

  let post = build_post(&raw_tweet(legacy_tweet(13, 1, "plain")), None, None, Related::default());
  assert!(post.in_reply_to_user.is_none());
  assert_eq!(post.url, "https://twitter.com/i/web/status/13");
}

#[test]
fn post_carries_links_tags_and_counts() {
  let mut tweet = legacy_tweet(20, 1, "read https://t.co/x #rust $TSLA");
  tweet["entities"]["urls"] = json!([{
    "url": "https://t.co/x",
    "display_url": "blog.rust-lang.org",
    "expanded_url": "https://blog.rust-lang.org",
    "indices": [5, 19],
  }]);
  tweet["entities"]["hashtags"] = json!([{ "text": "rust", "indices": [20, 25] }]);
  tweet["entities"]["symbols"] = json!([{ "text": "TSLA", "indices": [26, 31] }]);
  let post = build_post(&raw_tweet(tweet), None, None, Related::default());

  assert_eq!(post.rendered_content, "read https://blog.rust-lang.org #rust $TSLA");
  assert_eq!(post.links[0].tco_url, "https://t.co/x");
  assert_eq!(post.links[0].indices, vec![5, 19]);
  assert_eq!(post.hashtags, vec!["rust"]);
  assert_eq!(post.cash_tags, vec!["TSLA"]);
  assert_eq!(post.reply_count, 1);
  assert_eq!(post.retweet_count, 2);
  assert_eq!(post.conversation_id, 20);
}

#[test]
fn user_description_and_label() {
  let mut raw = legacy_user(5, "dave");
  raw["description"] = json!("site: https://t.co/q");
  raw["entities"]["description"]["urls"] = json!([{
    "url": "https://t.co/q",
    "display_url": "dave.dev",
    "expanded_url": "https://dave.dev",
  }]);
  raw["ext"] = json!({ "highlightedLabel": { "r": { "ok": { "label": {
    "url": { "url": "https://twitter.com/acme" },
    "badge": { "url": "https://pbs.twimg.com/badge.png" },
    "description": "Acme Corp",
  } } } } });
  let user = build_user(&serde_json::from_value::<RawUser>(raw.clone()).unwrap());

  assert_eq!(user.id, 5);
  assert_eq!(user.raw_description, "site: https://t.co/q");
  assert_eq!(user.description, "site: https://t.co/q | site: https://dave.dev");
  assert_eq!(user.description_links, vec!["https://dave.dev"]);
  assert_eq!(user.label.description, "Acme Corp");
  assert_eq!(user.label.badge, "https://pbs.twimg.com/badge.png");
  assert!(user.created.is_some());

  raw["ext"] = json!(null);
  let user = build_user(&serde_json::from_value::<RawUser>(raw).unwrap());
  assert!(user.label.is_empty());
}

#[test]
fn label_reads_either_long_description_spelling() {
  let camel = json!({ "description": "d", "longDescription": { "text": "camel" } });
  let snake = json!({ "description": "d", "long_description": { "text": "snake" } });
  assert_eq!(parse_label(Node::new(&camel)).long_description, "camel");
  assert_eq!(parse_label(Node::new(&snake)).long_description, "snake");
}

#[test]
fn legacy_card_routes_values_to_summary() {
  let card = json!({
    "name": "summary_large_image",
    "users": { "77": legacy_user(77, "site_owner") },
    "binding_values": {
      "title": { "type": "STRING", "string_value": "A headline" },
      "end_datetime_utc": { "type": "STRING", "string_value": "2022-01-31T10:00:00Z" },
      "thumbnail_image": { "type": "IMAGE", "image_value": { "url": "https://pbs.twimg.com/card.jpg", "width": 100 } },
      "thumbnail_image_color": { "type": "IMAGE_COLOR", "image_color_value": { "palette": [] } },
      "is_vertical": { "type": "BOOLEAN", "boolean_value": false },
      "site": { "type": "USER", "user_value": { "id_str": "77", "path": [] } },
      "creator": { "type": "USER", "user_value": { "id_str": "78", "path": [] } },
      "weird": { "type": "SOMETHING_NEW" },
    },
  });
  let card = build_card(Node::new(&card), ApiVariant::Legacy, 1).unwrap();
  assert_eq!(card.name, "summary_large_image");
  assert!(card.app.is_none() && card.player.is_none());

  let values = card.summary.unwrap();
  assert_eq!(values["title"], CardValue::String("A headline".into()));
  assert!(matches!(values["end_datetime_utc"], CardValue::DateTime(_)));
  assert_eq!(values["thumbnail_image"], CardValue::Image("https://pbs.twimg.com/card.jpg".into()));
  assert_eq!(values["is_vertical"], CardValue::Boolean(false));
  assert!(!values.contains_key("thumbnail_image_color"));
  assert!(!values.contains_key("weird"));
  match &values["site"] {
    CardValue::User(user) => assert_eq!(user.username, "site_owner"),
    other => panic!("expected a user, got {other:?}"),
  }
  // not in the users map, so only the id is known
  match &values["creator"] {
    CardValue::User(user) => assert_eq!((user.id, user.username.as_str()), (78, "")),
    other => panic!("expected a user, got {other:?}"),
  }
}

#[test]
fn graphql_card_uses_key_value_list() {
  let card = json!({
    "rest_id": "card://1",
    "legacy": {
      "name": "player",
      "binding_values": [
        { "key": "player_url", "value": { "type": "STRING", "string_value": "https://youtube.com/embed/x" } },
        { "key": "site", "value": { "type": "USER", "user_value": { "id_str": "10" } } },
      ],
      "user_refs": [
        { "rest_id": "10", "legacy": legacy_user(10, "youtube") },
        { "rest_id": "10", "legacy": legacy_user(10, "youtube") },
      ],
    },
  });
  let card = build_card(Node::new(&card), ApiVariant::Graphql, 1).unwrap();
  let values = card.player.unwrap();
  assert_eq!(values["player_url"], CardValue::String("https://youtube.com/embed/x".into()));
  assert!(matches!(&values["site"], CardValue::User(u) if u.username == "youtube"));
}

#[test]
fn other_cards_keep_only_their_name() {
  let card = json!({ "name": "poll2choice_text_only", "binding_values": {
    "choice1_label": { "type": "STRING", "string_value": "yes" },
  } });
  let card = build_card(Node::new(&card), ApiVariant::Legacy, 1).unwrap();
  assert_eq!(card.name, "poll2choice_text_only");
  assert!(card.summary.is_none() && card.app.is_none() && card.player.is_none());
}

#[test]
fn unsupported_cards_are_reported() {
  let card = json!({ "name": "3337203208:newsletter_publication", "binding_values": {} });
  let err = build_card(Node::new(&card), ApiVariant::Legacy, 1).unwrap_err();
  assert!(matches!(err, ScrapeError::Unsupported(_)));
}
