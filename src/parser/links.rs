use serde::Serialize;
use tracing::debug;

/// Anchor titles that are never recorded as links (IPA help pages).
const EXCLUDED_TITLES: &[&str] = &["Liste der IPA-Zeichen", "Help:IPA"];

/// An `<a>` as found in the uncleaned block HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: String,
    pub title: String,
}

impl Anchor {
    pub fn new(text: &str, href: &str, title: &str) -> Self {
        Anchor {
            text: text.to_string(),
            href: href.to_string(),
            title: title.to_string(),
        }
    }
}

/// A hyperlink located in a paragraph's cleaned text. `start`/`end` are
/// character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    #[serde(rename = "link")]
    pub url: String,
    #[serde(rename = "display_name")]
    pub display_text: String,
    #[serde(rename = "article_name")]
    pub target_title: String,
    pub start: usize,
    pub end: usize,
}

/// Map anchors onto `text`, keeping DOM order.
///
/// Each anchor resolves to the first occurrence of its display text, so a
/// phrase linked twice yields two links with the same offsets. Anchors whose
/// text does not occur are dropped.
pub fn align(anchors: &[Anchor], text: &str, article: &str) -> Vec<Link> {
    let mut links = Vec::with_capacity(anchors.len());

    for anchor in anchors {
        if EXCLUDED_TITLES.contains(&anchor.title.as_str()) {
            continue;
        }
        let Some(byte_idx) = text.find(anchor.text.as_str()) else {
            debug!(
                "Skipping link {:?} in {}: display text not in paragraph",
                anchor.text, article
            );
            continue;
        };
        let start = text[..byte_idx].chars().count();
        let end = start + anchor.text.chars().count();
        links.push(Link {
            url: anchor.href.clone(),
            display_text: anchor.text.clone(),
            target_title: anchor.title.clone(),
            start,
            end,
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slice(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn locates_anchor() {
        let text = "Angela Merkel ist eine deutsche Politikerin.";
        let anchors = [Anchor::new("Politikerin", "/wiki/Politiker", "Politiker")];
        let links = align(&anchors, text, "Test");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].start, 32);
        assert_eq!(links[0].end, 43);
        assert_eq!(slice(text, links[0].start, links[0].end), "Politikerin");
    }

    #[test]
    fn offsets_count_characters() {
        let text = "Die Größe von München";
        let links = align(&[Anchor::new("München", "/wiki/München", "München")], text, "Test");
        assert_eq!(links[0].start, 14);
        assert_eq!(links[0].end, 21);
    }

    #[test]
    fn missing_text_dropped() {
        let text = "Siehe hier.";
        let links = align(&[Anchor::new("[1]", "#cite_note-1", "Fußnote")], text, "Test");
        assert!(links.is_empty());
    }

    #[test]
    fn ipa_link_excluded() {
        let text = "Aussprache: a";
        let links = align(&[Anchor::new("a", "/wiki/IPA", "Liste der IPA-Zeichen")], text, "Test");
        assert!(links.is_empty());
    }

    #[test]
    fn duplicates_resolve_to_first_occurrence() {
        let text = "Berlin und noch einmal Berlin";
        let a = Anchor::new("Berlin", "/wiki/Berlin", "Berlin");
        let links = align(&[a.clone(), a], text, "Test");
        assert_eq!(links.len(), 2);
        assert_eq!((links[0].start, links[0].end), (0, 6));
        assert_eq!((links[1].start, links[1].end), (0, 6));
    }

    #[test]
    fn serializes_with_link_keys() {
        let links = align(&[Anchor::new("x", "/wiki/X", "X")], "x", "Test");
        let v = serde_json::to_value(&links[0]).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["link", "display_name", "article_name", "start", "end"]);
    }

    proptest! {
        #[test]
        fn offsets_slice_back_to_display_text(
            before in "[a-zäöß ]{0,20}",
            display in "[A-ZÄÖÜ][a-zäöü]{0,10}",
            after in "[a-zäöß ]{0,20}",
        ) {
            let text = format!("{before}{display}{after}");
            let links = align(&[Anchor::new(&display, "/wiki/x", "x")], &text, "Test");
            prop_assert_eq!(links.len(), 1);
            let link = &links[0];
            prop_assert!(link.start <= link.end && link.end <= text.chars().count());
            prop_assert_eq!(slice(&text, link.start, link.end), display);
        }
    }
}
