pub mod blocks;
pub mod clean;
pub mod document;
pub mod extract;
pub mod headings;
pub mod links;
pub mod record;
pub mod skip;

use scraper::Html;
use tracing::warn;

use crate::error::TransformError;
use document::DocumentBuilder;
use record::Record;
use skip::{Language, SkipPolicy};

/// HTML → record pipeline for one language edition.
///
/// Holds no per-article state; one instance can serve any number of
/// articles and threads.
#[derive(Debug, Clone)]
pub struct Transformer {
    language: Language,
    policy: SkipPolicy,
    paragraph_links: bool,
}

impl Transformer {
    pub fn new(language: Language, policy: SkipPolicy) -> Self {
        Transformer {
            language,
            policy,
            paragraph_links: false,
        }
    }

    /// Also serialize each paragraph's `links` and `is_list`.
    pub fn with_paragraph_links(mut self, enabled: bool) -> Self {
        self.paragraph_links = enabled;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Serialized record for the article, or `None` if the article should be
    /// skipped. The reason is logged.
    pub fn transform(
        &self,
        title: &str,
        raw_html: &str,
        redirects: &[String],
        pretty: bool,
    ) -> Option<String> {
        match self.try_transform(title, raw_html, redirects, pretty) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Skipping whole article {}: {}", title, e);
                None
            }
        }
    }

    /// Like [`transform`](Self::transform) but hands the skip reason back
    /// instead of logging it.
    pub fn try_transform(
        &self,
        title: &str,
        raw_html: &str,
        redirects: &[String],
        pretty: bool,
    ) -> Result<String, TransformError> {
        self.assemble(title, raw_html, redirects)?
            .to_json(pretty, self.paragraph_links)
            .map_err(|e| TransformError::Serialization(e.to_string()))
    }

    /// Parse and assemble the record for one article.
    pub fn assemble(
        &self,
        title: &str,
        raw_html: &str,
        redirects: &[String],
    ) -> Result<Record, TransformError> {
        let doc = Html::parse_document(raw_html);

        let heading = blocks::title_heading(&doc)
            .unwrap_or_else(|| title.replace('_', " ").trim().to_string());
        let blocks = blocks::collect_blocks(&doc).ok_or(TransformError::MissingContent)?;
        let document = DocumentBuilder::new(&self.policy, self.language).build(&heading, &blocks)?;

        let meta = extract::extract_all(&doc, title);
        let categories = meta.categories.ok_or(TransformError::MissingCategories)?;

        Ok(Record {
            redirects: Record::redirect_set(&heading, redirects),
            document,
            categories,
            revision_id: meta.revision_id,
            article_id: meta.article_id,
            norm_data: meta.norm_data,
            raw_html: raw_html.to_string(),
        })
    }
}
