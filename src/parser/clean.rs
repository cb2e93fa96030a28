use std::sync::LazyLock;

use regex::Regex;

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\[\d+\])+").unwrap());
static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[\r\n]+\s*").unwrap());
static PHONETIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:/|\[)\.mw.*?\.IPA.*?\}.*?(?:/|\])").unwrap());

/// Normalize the raw text of a paragraph or list block.
///
/// Link offsets are computed against the output of this function, so it must
/// run before alignment.
pub fn clean(raw: &str) -> String {
    let mut text = clean_pass(raw);
    // a pass can expose new markup, e.g. `[1[2]]` leaves `[1]`
    loop {
        let next = clean_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn clean_pass(raw: &str) -> String {
    let text = CITATION_RE.replace_all(raw, "");
    let text = text.replace("\\n", "");
    let text = LINE_BREAK_RE.replace_all(&text, " ");
    let text = strip_serialization_frame(&text);
    let text = PHONETIC_RE.replace_all(text, "");
    text.trim().to_string()
}

/// Strip the serialization artifacts left by the HTML-to-text conversion
/// step: text rendered from a byte string arrives framed as `b'…'`, a fixed
/// two leading and one trailing character.
fn strip_serialization_frame(text: &str) -> &str {
    for quote in ["'", "\""] {
        let prefix = format!("b{quote}");
        if text.len() >= 3 && text.starts_with(&prefix) && text.ends_with(quote) {
            return &text[2..text.len() - 1];
        }
    }
    text
}
