use std::ops::Range;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::info;

/// A title to fetch plus the redirects that point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEntry {
    pub title: String,
    pub redirects: Vec<String>,
}

pub fn load(path: &Path) -> Result<Vec<TitleEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read title list {}", path.display()))?;
    let entries = parse(&content)?;
    info!("Loaded {} titles from {}", entries.len(), path.display());
    Ok(entries)
}

/// Either a JSON object `{title: [redirect, …]}` (key order kept) or one
/// title per line.
pub fn parse(content: &str) -> Result<Vec<TitleEntry>> {
    if content.trim_start().starts_with('{') {
        let map: Map<String, Value> = serde_json::from_str(content).context("Invalid title mapping")?;
        map.into_iter()
            .map(|(title, redirects)| {
                let redirects = match redirects {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|v| match v {
                            Value::String(s) => Ok(s),
                            other => bail!("Redirect of {} is not a string: {}", title, other),
                        })
                        .collect::<Result<Vec<_>>>()?,
                    Value::Null => Vec::new(),
                    other => bail!("Redirects of {} must be a list, got {}", title, other),
                };
                Ok(TitleEntry { title, redirects })
            })
            .collect()
    } else {
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|title| TitleEntry {
                title: title.to_string(),
                redirects: Vec::new(),
            })
            .collect())
    }
}

/// Contiguous share of `n_titles` for worker `worker` (0-based) out of
/// `workers`. Shares are disjoint and together cover every title.
pub fn slice_for_worker(n_titles: usize, worker: usize, workers: usize) -> Range<usize> {
    if workers == 0 || worker >= workers {
        return 0..0;
    }
    let start = n_titles * worker / workers;
    let end = n_titles * (worker + 1) / workers;
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mapping_keeps_order() {
        let entries = parse(r#"{"Zebra": ["Zebras"], "Angela_Merkel": ["Merkel", "Angela Kasner"], "Alan_Smithee": []}"#)
            .unwrap();
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Zebra", "Angela_Merkel", "Alan_Smithee"]);
        assert_eq!(entries[1].redirects, ["Merkel", "Angela Kasner"]);
        assert!(entries[2].redirects.is_empty());
    }

    #[test]
    fn plain_lines() {
        let entries = parse("Angela_Merkel\n\n  Berlin \n").unwrap();
        assert_eq!(
            entries,
            vec![
                TitleEntry { title: "Angela_Merkel".into(), redirects: vec![] },
                TitleEntry { title: "Berlin".into(), redirects: vec![] },
            ]
        );
    }

    #[test]
    fn bad_redirect_value() {
        assert!(parse(r#"{"A": "B"}"#).is_err());
        assert!(parse(r#"{"A": [1]}"#).is_err());
    }

    #[test]
    fn slices_are_disjoint_and_cover() {
        for n in [0usize, 1, 7, 10, 101] {
            for workers in 1..=6 {
                let mut next = 0;
                for w in 0..workers {
                    let r = slice_for_worker(n, w, workers);
                    assert_eq!(r.start, next);
                    next = r.end;
                }
                assert_eq!(next, n);
            }
        }
    }

    #[test]
    fn out_of_range_worker() {
        assert_eq!(slice_for_worker(10, 3, 3), 0..0);
        assert_eq!(slice_for_worker(10, 0, 0), 0..0);
    }
}
