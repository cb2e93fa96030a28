use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

static NORMDATEN_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#normdaten").unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static KIND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Normdaten.\((.*?)\):").unwrap());

/// One authority-control entry (e.g. GND, VIAF).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub link: String,
}

/// Authority-control block of an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormData {
    /// Subject type from the container label, e.g. "Person".
    pub subject: Option<String>,
    pub entries: Vec<NormEntry>,
}

impl NormData {
    /// Wire form: an optional leading `{"norm_data_type": …}` followed by the
    /// entries.
    pub fn to_value(&self) -> serde_json::Value {
        let mut items = Vec::with_capacity(self.entries.len() + 1);
        if let Some(subject) = &self.subject {
            items.push(serde_json::json!({ "norm_data_type": subject }));
        }
        items.extend(self.entries.iter().map(|e| serde_json::json!(e)));
        serde_json::Value::Array(items)
    }
}

/// `None` when the article has no norm data container, or when its anchors
/// don't form (type, value) pairs.
pub fn extract(doc: &Html) -> Option<NormData> {
    let container = doc.select(&NORMDATEN_SEL).next()?;

    let anchors: Vec<ElementRef> = container
        .select(&ANCHOR_SEL)
        .filter(|a| !is_metadata(a) && !is_help_link(a))
        .collect();
    if anchors.len() % 2 != 0 {
        return None;
    }

    let visible: String = container
        .descendants()
        .filter(|node| {
            !node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| is_metadata_span(&el))
        })
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    let subject = KIND_RE.captures(&visible).map(|c| c[1].to_string());

    let entries = anchors
        .chunks(2)
        .map(|pair| NormEntry {
            kind: pair[0].text().collect(),
            value: pair[1].text().collect(),
            link: pair[1].value().attr("href").unwrap_or_default().to_string(),
        })
        .collect();

    Some(NormData { subject, entries })
}

fn is_metadata_span(el: &ElementRef) -> bool {
    el.value().name() == "span"
        && el.value().classes().any(|c| c == "metadata" || c == "noprint")
}

fn is_metadata(a: &ElementRef) -> bool {
    a.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| is_metadata_span(&el))
}

fn is_help_link(a: &ElementRef) -> bool {
    a.value()
        .attr("title")
        .is_some_and(|t| t.starts_with("Hilfe:") || t.starts_with("Help:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERKEL: &str = r#"<div id="normdaten" class="catlinks normdaten-typ-p"><a href="/wiki/Hilfe:Normdaten" title="Hilfe:Normdaten">Normdaten</a> (Person): <a href="/wiki/Gemeinsame_Normdatei" title="Gemeinsame Normdatei">GND</a>: <a rel="nofollow" class="external text" href="https://d-nb.info/gnd/11858071X">11858071X</a> <span class="metadata noprint">(<a rel="nofollow" class="external text" href="https://lobid.org/gnd/11858071X">OGND</a>)</span> | <a href="/wiki/Library_of_Congress_Control_Number" title="Library of Congress Control Number">LCCN</a>: <a rel="nofollow" class="external text" href="https://id.loc.gov/authorities/names/n94112934">n94112934</a></div>"#;

    #[test]
    fn pairs_and_subject() {
        let nd = extract(&Html::parse_document(MERKEL)).unwrap();
        assert_eq!(nd.subject.as_deref(), Some("Person"));
        assert_eq!(
            nd.entries,
            vec![
                NormEntry {
                    kind: "GND".into(),
                    value: "11858071X".into(),
                    link: "https://d-nb.info/gnd/11858071X".into(),
                },
                NormEntry {
                    kind: "LCCN".into(),
                    value: "n94112934".into(),
                    link: "https://id.loc.gov/authorities/names/n94112934".into(),
                },
            ]
        );
    }

    #[test]
    fn wire_form() {
        let nd = extract(&Html::parse_document(MERKEL)).unwrap();
        let v = nd.to_value();
        assert_eq!(v[0], serde_json::json!({ "norm_data_type": "Person" }));
        assert_eq!(v[1]["type"], "GND");
        assert_eq!(v.as_array().unwrap().len(), 3);
    }

    #[test]
    fn absent_container() {
        assert!(extract(&Html::parse_document("<div id=\"catlinks\"></div>")).is_none());
    }

    #[test]
    fn unpaired_anchors() {
        let doc = Html::parse_document(
            r#"<div id="normdaten">Normdaten (Sachbegriff): <a href="/wiki/GND" title="GND">GND</a>: <a href="https://d-nb.info/gnd/1">1</a> | <a href="/wiki/VIAF" title="VIAF">VIAF</a></div>"#,
        );
        assert!(extract(&doc).is_none());
    }
}
