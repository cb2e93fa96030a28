use serde::Serialize;
use serde_json::Value;

use super::document::{Document, Paragraph};
use super::extract::categories::Category;
use super::extract::norm_data::NormData;
use super::links::Link;

/// Everything kept for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub document: Document,
    pub categories: Vec<Category>,
    pub revision_id: String,
    pub article_id: Option<String>,
    pub norm_data: Option<NormData>,
    pub redirects: Vec<String>,
    pub raw_html: String,
}

#[derive(Serialize)]
struct RecordWire<'a> {
    headings: Value,
    paragraphs: Vec<ParagraphWire<'a>>,
    categories: &'a [Category],
    revision_id: &'a str,
    article_id: Option<&'a str>,
    norm_data: Option<Value>,
    redirects: &'a [String],
    raw_html: &'a str,
}

#[derive(Serialize)]
struct ParagraphWire<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    h1: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h2: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h3: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h4: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h5: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h6: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<&'a [Link]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_list: Option<bool>,
    is_skippable: bool,
}

impl Record {
    /// Redirect set: the title with underscores first, then the supplied
    /// redirects in order, without duplicates.
    pub fn redirect_set(title: &str, supplied: &[String]) -> Vec<String> {
        let mut redirects = vec![title.replace(' ', "_")];
        for r in supplied {
            if !redirects.contains(r) {
                redirects.push(r.clone());
            }
        }
        redirects
    }

    /// Serialize to JSON; `pretty` indents by four spaces. With
    /// `paragraph_links` each paragraph also carries `links` and `is_list`.
    pub fn to_json(&self, pretty: bool, paragraph_links: bool) -> serde_json::Result<String> {
        let wire = RecordWire {
            headings: self.document.outline.to_value(),
            paragraphs: self
                .document
                .paragraphs
                .iter()
                .map(|p| self.paragraph_wire(p, paragraph_links))
                .collect(),
            categories: &self.categories,
            revision_id: &self.revision_id,
            article_id: self.article_id.as_deref(),
            norm_data: self.norm_data.as_ref().map(NormData::to_value),
            redirects: &self.redirects,
            raw_html: &self.raw_html,
        };

        if pretty {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            wire.serialize(&mut ser)?;
            // serde_json only ever writes valid UTF-8
            Ok(String::from_utf8_lossy(&buf).into_owned())
        } else {
            serde_json::to_string(&wire)
        }
    }

    fn paragraph_wire<'a>(&'a self, p: &'a Paragraph, paragraph_links: bool) -> ParagraphWire<'a> {
        let h = |level: usize| -> Option<&'a str> { self.document.heading_text(p, level) };
        ParagraphWire {
            text: &p.text,
            h1: h(1),
            h2: h(2),
            h3: h(3),
            h4: h(4),
            h5: h(5),
            h6: h(6),
            links: paragraph_links.then_some(p.links.as_slice()),
            is_list: paragraph_links.then_some(p.is_list),
            is_skippable: p.is_skippable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::Block;
    use crate::parser::document::DocumentBuilder;
    use crate::parser::skip::{Language, SkipPolicy};

    fn sample() -> Record {
        let policy = SkipPolicy::default();
        let blocks = [
            Block::Heading { level: 2, text: "Leben".into() },
            Block::Paragraph { text: "Hallo Welt.".into(), anchors: Vec::new() },
            Block::Heading { level: 2, text: "Weblinks".into() },
            Block::Paragraph { text: "Siehe hier.".into(), anchors: Vec::new() },
        ];
        let document = DocumentBuilder::new(&policy, Language::De).build("Test Artikel", &blocks).unwrap();
        Record {
            document,
            categories: vec![Category {
                link: "/wiki/Kategorie:Test".into(),
                category_name: "Kategorie:Test".into(),
                display_name: "Test".into(),
            }],
            revision_id: "42".into(),
            article_id: None,
            norm_data: None,
            redirects: Record::redirect_set("Test Artikel", &["Testartikel".to_string()]),
            raw_html: "<html></html>".into(),
        }
    }

    #[test]
    fn top_level_keys() {
        let json = sample().to_json(false, false).unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();
        let mut keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["article_id", "categories", "headings", "norm_data", "paragraphs", "raw_html", "redirects", "revision_id"]
        );
        assert!(v["article_id"].is_null());
        assert!(v["norm_data"].is_null());
    }

    #[test]
    fn paragraph_keys() {
        let v: Value = serde_json::from_str(&sample().to_json(false, false).unwrap()).unwrap();
        let p = &v["paragraphs"][1];
        let keys: Vec<&str> = p.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["text", "h1", "h2", "is_skippable"]);
        assert_eq!(p["h2"], "Weblinks");
        assert_eq!(p["is_skippable"], true);
        assert_eq!(v["headings"]["h2_headings"][0]["h2_heading"], "Leben");
    }

    #[test]
    fn optional_paragraph_links() {
        let v: Value = serde_json::from_str(&sample().to_json(false, true).unwrap()).unwrap();
        assert_eq!(v["paragraphs"][0]["links"], serde_json::json!([]));
        assert_eq!(v["paragraphs"][0]["is_list"], false);
    }

    #[test]
    fn compact_and_pretty_agree() {
        let record = sample();
        let compact = record.to_json(false, false).unwrap();
        let pretty = record.to_json(true, false).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains("\n    \"headings\": {"));
        let a: Value = serde_json::from_str(&compact).unwrap();
        let b: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn redirects_deduplicated() {
        let r = Record::redirect_set("Angela Merkel", &["Angela_Merkel".into(), "Merkel".into()]);
        assert_eq!(r, ["Angela_Merkel", "Merkel"]);
    }

    #[test]
    fn non_ascii_kept_verbatim() {
        let mut record = sample();
        record.raw_html = "Größe".into();
        assert!(record.to_json(false, false).unwrap().contains("Größe"));
    }
}
