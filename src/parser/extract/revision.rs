use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static REVISION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"and revision id (\d+)").unwrap());

/// Revision id from the parser-cache comment MediaWiki leaves in the page.
/// The last matching comment wins; empty if there is none.
pub fn extract(doc: &Html) -> String {
    doc.tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_comment())
        .filter_map(|comment| REVISION_RE.captures(comment))
        .last()
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}
