use serde_json::{json, Map, Value};

use crate::{
  error::{ScrapeError, ScrapeResult},
  node::Node,
  types::User,
};
use super::{parsing::build_user, raw::RawUser};

/// `variables` of the UserByScreenName lookup
pub fn user_lookup_params(screen_name: &str) -> ScrapeResult<Vec<(String, String)>> {
  let variables = json!({
    "screen_name": screen_name.trim_start_matches('@'),
    "withSafetyModeUserFields": true, // adds "safety_mode_block_restrictions"
    "withSuperFollowsUserFields": true,
  });
  Ok(vec![("variables".into(), serde_json::to_string(&variables)?)])
}

/// the first-page `variables` of UserTweetsAndReplies, minus the cursor
pub fn user_tweets_variables(user_id: &str) -> Map<String, Value> {
  let variables = json!({
    "userId": user_id,
    "count": "100",
    "includePromotedContent": true, // promoted entries are dropped anyway, but false changes nothing
    "withCommunity": true,
    "withSuperFollowsUserFields": true,
    "withDownvotePerspective": false, // true = ACCESS DENIED on a guest token
    "withReactionsMetadata": false, // true = ACCESS DENIED on a guest token
    "withReactionsPerspective": false, // true = ACCESS DENIED on a guest token
    "withSuperFollowsTweetFields": true,
    "withVoice": true,
    "withV2Timeline": false, // v2 moves the instructions, the schema reads v1
  });
  match variables {
    Value::Object(map) => map,
    _ => Map::new(),
  }
}

/// the looked up account, as `(rest_id, profile)`. `None` when twitter says
/// the account is unavailable (suspended, deactivated, never existed)
pub fn parse_user_lookup(page: &Value) -> ScrapeResult<Option<(String, User)>> {
  let result = Node::new(page).path(&["data", "user", "result"])?;
  if result.is_absent() {
    return Ok(None);
  }
  match result.opt_str("__typename")? {
    Some("UserUnavailable") => Ok(None),
    _ => {
      let rest_id = result.field("rest_id")?.as_str()?;
      let legacy = result.field("legacy")?;
      if legacy.is_absent() {
        return Err(ScrapeError::UnexpectedShape(format!("user {rest_id} has no legacy block")));
      }
      let mut user = build_user(&legacy.decode::<RawUser>()?);
      user.id = rest_id.parse().unwrap_or(user.id);
      Ok(Some((rest_id.to_string(), user)))
    },
  }
}
