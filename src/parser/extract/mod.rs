pub mod article_id;
pub mod categories;
pub mod norm_data;
pub mod revision;

use scraper::Html;
use tracing::debug;

use categories::Category;
use norm_data::NormData;

/// Auxiliary fields of an article, each extracted independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub categories: Option<Vec<Category>>,
    pub revision_id: String,
    pub article_id: Option<String>,
    pub norm_data: Option<NormData>,
}

pub fn extract_all(doc: &Html, article: &str) -> Metadata {
    let article_id = article_id::extract(doc);
    if article_id.is_none() {
        debug!("No article id for {}", article);
    }

    Metadata {
        categories: categories::extract(doc),
        revision_id: revision::extract(doc),
        article_id,
        norm_data: norm_data::extract(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(fixture: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
        Html::parse_document(&html)
    }

    #[test]
    fn merkel_metadata() {
        let meta = extract_all(&parse("angela_merkel"), "Angela Merkel");
        let cats = meta.categories.unwrap();
        assert_eq!(cats.len(), 3);
        assert_eq!(cats[0].display_name, "Bundeskanzler (Deutschland)");
        assert_eq!(meta.revision_id, "192345678");
        assert_eq!(meta.article_id.as_deref(), Some("Q567"));
        let nd = meta.norm_data.unwrap();
        assert_eq!(nd.subject.as_deref(), Some("Person"));
        assert_eq!(nd.entries.len(), 2);
    }

    #[test]
    fn user_page_has_no_categories() {
        let meta = extract_all(&parse("user_page"), "Benutzer:Beispiel");
        assert!(meta.categories.is_none());
        assert!(meta.norm_data.is_none());
        assert_eq!(meta.article_id, None);
        assert_eq!(meta.revision_id, "");
    }
}
