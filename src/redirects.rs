use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

const PAGE_INSERT: &str = "INSERT INTO `page` VALUES ";
const REDIRECT_INSERT: &str = "INSERT INTO `redirect` VALUES ";

/// A single column value of a dumped row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

impl SqlValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Target title → titles redirecting to it.
pub type RedirectMap = BTreeMap<String, Vec<String>>;

/// Build the redirect mapping from a `page` and a `redirect` table dump.
pub fn build_mapping(page_dump: impl BufRead, redirect_dump: impl BufRead) -> Result<RedirectMap> {
    let titles = page_titles(page_dump)?;
    info!("Read {} page titles", titles.len());

    let mut mapping = RedirectMap::new();
    for (n, line) in redirect_dump.lines().enumerate() {
        let line = line.context("Failed to read redirect dump")?;
        let Some(values) = line.strip_prefix(REDIRECT_INSERT) else {
            continue;
        };
        for row in parse_rows(values).with_context(|| format!("redirect dump line {}", n + 1))? {
            let (Some(from), Some(target)) = (row.first().and_then(SqlValue::as_int), row.get(2).and_then(SqlValue::as_str))
            else {
                bail!("redirect dump line {}: malformed row {:?}", n + 1, row);
            };
            match titles.get(&from) {
                Some(title) => mapping.entry(target.to_string()).or_default().push(title.clone()),
                None => debug!("Redirect source page {} not in page dump", from),
            }
        }
    }
    info!("Mapped redirects for {} titles", mapping.len());
    Ok(mapping)
}

fn page_titles(page_dump: impl BufRead) -> Result<HashMap<i64, String>> {
    let mut titles = HashMap::new();
    for (n, line) in page_dump.lines().enumerate() {
        let line = line.context("Failed to read page dump")?;
        let Some(values) = line.strip_prefix(PAGE_INSERT) else {
            continue;
        };
        for row in parse_rows(values).with_context(|| format!("page dump line {}", n + 1))? {
            let (Some(id), Some(title)) = (row.first().and_then(SqlValue::as_int), row.get(2).and_then(SqlValue::as_str))
            else {
                bail!("page dump line {}: malformed row {:?}", n + 1, row);
            };
            if titles.insert(id, title.to_string()).is_some() {
                bail!("Page id {} occurs more than once", id);
            }
        }
    }
    Ok(titles)
}

/// Parse the `(…),(…);` tail of an extended INSERT statement.
pub fn parse_rows(input: &str) -> Result<Vec<Vec<SqlValue>>> {
    let mut rows = Vec::new();
    let mut chars = input.trim_end().chars().peekable();

    loop {
        match chars.next() {
            Some('(') => {}
            Some(';') | None => break,
            Some(c) => bail!("expected '(' but found {:?}", c),
        }

        let mut row = Vec::new();
        loop {
            row.push(parse_value(&mut chars)?);
            match chars.next() {
                Some(',') => continue,
                Some(')') => break,
                other => bail!("expected ',' or ')' but found {:?}", other),
            }
        }
        rows.push(row);

        match chars.next() {
            Some(',') => continue,
            Some(';') | None => break,
            Some(c) => bail!("expected ',' or ';' after row but found {:?}", c),
        }
    }
    Ok(rows)
}

fn parse_value(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<SqlValue> {
    match chars.peek() {
        Some('\'') => {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some('\\') => {
                        let escaped = chars.next().ok_or_else(|| anyhow!("unterminated escape"))?;
                        s.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                    }
                    Some('\'') => break,
                    Some(c) => s.push(c),
                    None => bail!("unterminated string"),
                }
            }
            Ok(SqlValue::Str(s))
        }
        Some(_) => {
            let mut raw = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' || c == ')' {
                    break;
                }
                raw.push(c);
                chars.next();
            }
            let raw = raw.trim();
            if raw == "NULL" {
                Ok(SqlValue::Null)
            } else if let Ok(n) = raw.parse::<i64>() {
                Ok(SqlValue::Int(n))
            } else {
                raw.parse::<f64>()
                    .map(SqlValue::Float)
                    .map_err(|_| anyhow!("unexpected token {:?}", raw))
            }
        }
        None => bail!("unexpected end of input"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGES: &str = "-- MySQL dump\n\
INSERT INTO `page` VALUES (1,0,'Alan_Smithee','',0,0,0.0864337124735431,'20190824111515','20190824111815',183851697,7788,'wikitext',NULL),(8,0,'Anschluss','',1,0,0.5,'20190101000000',NULL,1,10,'wikitext',NULL),(9,0,'O\\'Brien','',1,0,0.5,'20190101000000',NULL,1,10,'wikitext',NULL);\n\
INSERT INTO `page` VALUES (12,0,'Smithee','',1,0,0.1,'20190101000000',NULL,1,10,'wikitext',NULL);\n";

    const REDIRECTS: &str = "INSERT INTO `redirect` VALUES (8,0,'Anschluss_(Soziologie)','',''),(12,0,'Alan_Smithee','',''),(9,0,'Alan_Smithee','',''),(99,0,'Alan_Smithee','','');\n";

    #[test]
    fn rows_and_values() {
        let rows = parse_rows("(1,0,'a\\'b',NULL,0.5),(2,0,'c,d)',-3,1e3);").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                SqlValue::Int(1),
                SqlValue::Int(0),
                SqlValue::Str("a'b".into()),
                SqlValue::Null,
                SqlValue::Float(0.5)
            ]
        );
        assert_eq!(rows[1][2], SqlValue::Str("c,d)".into()));
        assert_eq!(rows[1][3], SqlValue::Int(-3));
        assert_eq!(rows[1][4], SqlValue::Float(1000.0));
    }

    #[test]
    fn malformed_rows() {
        assert!(parse_rows("(1,'open").is_err());
        assert!(parse_rows("1,2").is_err());
        assert!(parse_rows("(1,foo)").is_err());
    }

    #[test]
    fn mapping_from_dumps() {
        let mapping = build_mapping(PAGES.as_bytes(), REDIRECTS.as_bytes()).unwrap();
        assert_eq!(mapping["Anschluss_(Soziologie)"], ["Anschluss"]);
        assert_eq!(mapping["Alan_Smithee"], ["Smithee", "O'Brien"]);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn duplicate_page_id() {
        let pages = "INSERT INTO `page` VALUES (1,0,'A'),(1,0,'B');\n";
        assert!(build_mapping(pages.as_bytes(), "".as_bytes()).is_err());
    }
}
