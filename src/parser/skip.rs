use std::collections::HashMap;

use tracing::debug;

/// Wikipedia language edition. Unknown codes fall back to German.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    De,
    En,
}

impl Language {
    pub fn from_code(code: &str) -> Language {
        match code.trim().to_lowercase().as_str() {
            "de" => Language::De,
            "en" => Language::En,
            other => {
                debug!("Unsupported language {:?}, using German tables", other);
                Language::De
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
        }
    }
}

const GERMAN_MARKERS: &[&str] = &[
    "Einzelnachweis", "Einzelnachweise", "Weblink", "Weblinks", "Literatur",
    "Persönlichkeit", "Persönlichkeiten", "Zitat", "Medien", "Film", "Filme",
    "Filmographie", "Hochschulschriften", "Schriften", "Preis", "Preise",
    "Quelle", "Quellen", "Siehe auch", "Auszeichnung", "Auszeichnungen",
    "Diskographie", "Diskografie", "Werk", "Werke",
    "Weiterführende Informationen", "Weiterführende Informationenen",
    "Ehrung", "Ehrungen", "Veröffentlichungen", "Veröffentlichung",
];

const ENGLISH_MARKERS: &[&str] = &[
    "References", "Notes", "External links", "Further reading", "See also",
    "Bibliography", "Works", "Awards", "Sources", "Citations", "Filmography",
    "Discography",
];

/// Heading markers that flag the content below them as non-narrative.
///
/// Built once and shared by reference; lookups never mutate it.
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    tables: HashMap<Language, Vec<String>>,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        let mut tables = HashMap::new();
        tables.insert(Language::De, with_suffixes(GERMAN_MARKERS, "(Auswahl)"));
        tables.insert(Language::En, with_suffixes(ENGLISH_MARKERS, "(selection)"));
        SkipPolicy { tables }
    }
}

impl SkipPolicy {
    /// True if any marker of the language's table occurs in `heading`.
    pub fn is_skippable(&self, language: Language, heading: &str) -> bool {
        self.markers(language).iter().any(|m| heading.contains(m.as_str()))
    }

    fn markers(&self, language: Language) -> &[String] {
        self.tables
            .get(&language)
            .or_else(|| self.tables.get(&Language::De))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Each marker, plus the marker followed by `suffix` with and without a space.
fn with_suffixes(markers: &[&str], suffix: &str) -> Vec<String> {
    let bare = markers.iter().map(|m| m.to_string());
    let tight = markers.iter().map(|m| format!("{m}{suffix}"));
    let spaced = markers.iter().map(|m| format!("{m} {suffix}"));
    bare.chain(tight).chain(spaced).collect()
}
