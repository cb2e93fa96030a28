use std::sync::LazyLock;

use scraper::{Html, Selector};

static WIKIBASE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#t-wikibase").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const ENTITY_PAGE: &str = "Special:EntityPage/";

/// Wikidata item id from the sidebar's "Wikidata item" link.
///
/// `None` when the sidebar entry is missing; an empty string when the entry
/// exists but does not point at an entity page.
pub fn extract(doc: &Html) -> Option<String> {
    let item = doc.select(&WIKIBASE_SEL).next()?;
    let id = item
        .select(&LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| href.split_once(ENTITY_PAGE).map(|(_, id)| id.to_string()))
        .unwrap_or_default();
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id() {
        let doc = Html::parse_document(
            r#"<ul><li id="t-wikibase" class="mw-list-item"><a href="https://www.wikidata.org/wiki/Special:EntityPage/Q567" title="Link zum verbundenen Objekt im Datenrepositorium [g]"><span>Wikidata-Datenobjekt</span></a></li></ul>"#,
        );
        assert_eq!(extract(&doc).as_deref(), Some("Q567"));
    }

    #[test]
    fn missing_entry() {
        assert_eq!(extract(&Html::parse_document("<ul><li id=\"t-info\"></li></ul>")), None);
    }

    #[test]
    fn entry_without_entity_link() {
        let doc = Html::parse_document(r#"<li id="t-wikibase"><a href="/wiki/Wikidata">x</a></li>"#);
        assert_eq!(extract(&doc).as_deref(), Some(""));
    }
}
