use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;

static CATLINKS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#mw-normal-catlinks ul").unwrap());
static ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li > a").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub link: String,
    pub category_name: String,
    pub display_name: String,
}

/// Visible categories of the article. `None` if the page has no category
/// list or the list is empty; such pages are not articles.
pub fn extract(doc: &Html) -> Option<Vec<Category>> {
    let list = doc.select(&CATLINKS_SEL).next()?;
    let categories: Vec<Category> = list
        .select(&ITEM_SEL)
        .filter_map(|a| {
            let link = a.value().attr("href")?;
            let display_name: String = a.text().collect();
            let category_name = a.value().attr("title").unwrap_or(display_name.as_str()).to_string();
            Some(Category {
                link: link.to_string(),
                category_name,
                display_name,
            })
        })
        .collect();

    if categories.is_empty() {
        None
    } else {
        Some(categories)
    }
}
