use crate::config::QueryConfig;

/// the full `q` for a search: the query, the language filter, then the date
/// operators. e.g. `jokowi lang:id until:2022-01-31 since:2022-01-01 `
pub fn search_query(query: &str, config: &QueryConfig) -> String {
  let mut q = query.trim().to_string();
  if let Some(code) = config.lang.code() {
    q.push_str(&format!(" lang:{code}"));
  }
  if let Some(range) = &config.date_range {
    q.push_str(&format!(" {} ", range.search_operators()));
  }
  q
}

/// `#tag` for a hashtag, whether or not the caller already wrote the `#`
pub fn hashtag_query(hashtag: &str) -> String {
  format!("#{}", hashtag.trim().trim_start_matches('#'))
}

/// query parameters of `2/search/adaptive.json` for an already built `q`
pub fn search_params(q: &str) -> Vec<(String, String)> {
  let parameters = [
    ("include_profile_interstitial_type", "1"), // 1 = include "profile_interstitial_type" attribute in each user object
    ("include_blocking", "1"), // 1 = include "blocking" attribute in each user object
    ("include_blocked_by", "1"), // 1 = include "blocked_by" attribute in each user object
    ("include_followed_by", "1"), // 1 = include "followed_by" attribute in each user object
    ("include_want_retweets", "1"), // 1 = include "want_retweets" attribute in each user object
    ("include_mute_edge", "1"), // 1 = include "muting" attribute in each user object
    ("include_can_dm", "1"), // 1 = include "can_dm" attribute in each user object
    ("include_can_media_tag", "1"),
    ("include_ext_has_nft_avatar", "1"), // 1 = include "ext_has_nft_avatar" attribute in each user object
    ("skip_status", "1"),
    ("cards_platform", "Web-12"),
    ("include_cards", "1"), // needed for the "card" object on tweets
    ("include_ext_alt_text", "true"),
    ("include_quote_count", "true"), // true = include "quote_count" in tweet objects
    ("include_reply_count", "1"), // 1 = include "reply_count" in tweet objects
    ("tweet_mode", "extended"), // full_text instead of a truncated text
    ("include_entities", "true"),
    ("include_user_entities", "true"), // needed to expand the links in user bios
    ("include_ext_media_color", "true"),
    ("include_ext_media_availability", "true"),
    ("include_ext_sensitive_media_warning", "true"),
    ("include_ext_trusted_friends_metadata", "true"),
    ("send_error_codes", "true"), // error codes 200/215 are how we know the guest token died
    ("simple_quoted_tweets", "true"),
    ("q", q),
    ("tweet_search_mode", "live"),
    ("count", "100"),
    ("query_source", "typed_query"),
    ("pc", "1"),
    ("spelling_corrections", "1"),
    ("include_ext_edit_control", "true"),
    ("ext", "mediaStats,highlightedLabel,hasNftAvatar,voiceInfo,enrichments,superFollowMetadata,unmentionInfo,editControl,collab_control,vibe"), // mediaStats = video views, highlightedLabel = affiliate badge
    ("f", "top"),
  ];
  parameters.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// query parameters of `2/guide.json`, the explore page's trends tab
pub fn trends_params() -> Vec<(String, String)> {
  let parameters = [
    ("include_profile_interstitial_type", "1"),
    ("include_blocking", "1"),
    ("include_blocked_by", "1"),
    ("include_followed_by", "1"),
    ("include_want_retweets", "1"),
    ("include_mute_edge", "1"),
    ("include_can_dm", "1"),
    ("include_can_media_tag", "1"),
    ("include_ext_has_nft_avatar", "1"),
    ("skip_status", "1"),
    ("cards_platform", "Web-12"),
    ("include_cards", "1"),
    ("include_ext_alt_text", "true"),
    ("include_quote_count", "true"),
    ("include_reply_count", "1"),
    ("tweet_mode", "extended"),
    ("include_entities", "true"),
    ("include_user_entities", "true"),
    ("include_ext_media_color", "true"),
    ("include_ext_media_availability", "true"),
    ("include_ext_sensitive_media_warning", "true"),
    ("include_ext_trusted_friends_metadata", "true"),
    ("send_error_codes", "true"),
    ("simple_quoted_tweets", "true"),
    ("count", "20"),
    ("candidate_source", "trends"), // the trends tab rather than "for you"
    ("include_page_configuration", "false"),
    ("entity_tokens", "false"),
    ("ext", "mediaStats,highlightedLabel,hasNftAvatar,voiceInfo,enrichments,superFollowMetadata,unmentionInfo"),
  ];
  parameters.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
