use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::links::Anchor;

static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#mw-content-text .mw-parser-output").unwrap());
static CONTENT_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".mw-parser-output").unwrap());
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.firstHeading, h1#firstHeading").unwrap());
static INNER_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, h5, h6").unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[title]").unwrap());

const EDIT_MARKERS: &[&str] = &[
    "[Bearbeiten | Quelltext bearbeiten]",
    "[Bearbeiten]",
    "[edit | edit source]",
    "[edit]",
];

/// A top-level element of the article body that takes part in the
/// heading/paragraph structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String, anchors: Vec<Anchor> },
    List { text: String, anchors: Vec<Anchor> },
}

/// Blocks of the article body in document order. `None` when the page has
/// no parser output container at all.
///
/// Page status indicators carry their own parser output container ahead of
/// the body, so the one under `#mw-content-text` is preferred.
pub fn collect_blocks(doc: &Html) -> Option<Vec<Block>> {
    let content = doc
        .select(&BODY_SEL)
        .next()
        .or_else(|| doc.select(&CONTENT_SEL).next())?;
    Some(
        content
            .children()
            .filter_map(ElementRef::wrap)
            .filter_map(classify)
            .collect(),
    )
}

/// Text of the article's title heading, if the page has one.
pub fn title_heading(doc: &Html) -> Option<String> {
    doc.select(&TITLE_SEL)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn classify(el: ElementRef) -> Option<Block> {
    match el.value().name() {
        "p" => Some(Block::Paragraph {
            text: el.text().collect(),
            anchors: anchors(el),
        }),
        "ul" => Some(Block::List {
            text: el.text().collect(),
            anchors: anchors(el),
        }),
        "div" if el.value().classes().any(|c| c == "mw-heading") => {
            el.select(&INNER_HEADING_SEL).next().and_then(classify)
        }
        name => heading_level(name).map(|level| Block::Heading {
            level,
            text: heading_text(el),
        }),
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Visible heading text without the section edit links.
fn heading_text(el: ElementRef) -> String {
    let mut text = String::new();
    for node in el.descendants() {
        let Some(t) = node.value().as_text() else {
            continue;
        };
        let in_edit_section = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().classes().any(|c| c == "mw-editsection"));
        if !in_edit_section {
            text.push_str(t);
        }
    }
    strip_edit_markers(&text)
}

fn strip_edit_markers(text: &str) -> String {
    EDIT_MARKERS
        .iter()
        .fold(text.to_string(), |acc, m| acc.replace(m, ""))
        .trim()
        .to_string()
}

fn anchors(el: ElementRef) -> Vec<Anchor> {
    el.select(&ANCHOR_SEL)
        .filter_map(|a| {
            let title = a.value().attr("title").filter(|t| !t.is_empty())?;
            let href = a.value().attr("href")?;
            Some(Anchor::new(&a.text().collect::<String>(), href, title))
        })
        .collect()
}
