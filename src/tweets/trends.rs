use reqwest::Url;
use serde_json::Value;

use crate::{
  error::ScrapeResult,
  node::Node,
  types::{Trend, PLATFORM_HOST},
};
use super::schema::{instruction_entries, LegacySchema, TimelineSchema};

/// trends out of a `2/guide.json` page. they sit in the module entry with id
/// `trends`, everything else on the page is ignored
pub fn parse_trends(page: &Value) -> ScrapeResult<Vec<Trend>> {
  let page = Node::new(page);
  let mut trends = Vec::new();

  for instruction in LegacySchema.instructions(page)? {
    for entry in instruction_entries(instruction)?.unwrap_or_default() {
      if entry.opt_str("entryId")? != Some("trends") {
        continue;
      }
      let items = entry.path(&["content", "timelineModule", "items"])?;
      if items.is_absent() {
        continue;
      }
      for item in items.as_seq()? {
        let trend = item.path(&["item", "content", "trend"])?;
        if trend.is_absent() {
          continue;
        }
        let name = trend.field("name")?.as_str()?;
        let metadata = trend.lookup("trendMetadata");
        let url = Url::parse_with_params(&format!("https://{PLATFORM_HOST}/search"), &[("q", name)])
          .map(|u| u.to_string())
          .unwrap_or_default();
        trends.push(Trend {
          name: name.to_string(),
          meta_description: metadata.opt_str("metaDescription")?.map(str::to_string),
          domain_context: metadata.opt_str("domainContext")?.unwrap_or_default().to_string(),
          url,
        });
      }
    }
  }
  Ok(trends)
}
