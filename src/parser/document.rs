use tracing::debug;

use super::blocks::Block;
use super::clean::clean;
use super::headings::{HeadingChain, HeadingTree, Outline};
use super::links::{align, Anchor, Link};
use super::skip::{Language, SkipPolicy};
use crate::error::TransformError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub headings: HeadingChain,
    pub links: Vec<Link>,
    pub is_list: bool,
    pub is_skippable: bool,
}

/// Paragraphs of an article plus the heading outline they refer into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub outline: Outline,
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    /// Heading text of `paragraph` at `level` (1..=6), if one was open.
    pub fn heading_text(&self, paragraph: &Paragraph, level: usize) -> Option<&str> {
        paragraph
            .headings
            .get(level.checked_sub(1)?)
            .copied()
            .flatten()
            .map(|id| self.outline.text(id))
    }
}

/// Single pass over an article's blocks.
pub struct DocumentBuilder<'a> {
    policy: &'a SkipPolicy,
    language: Language,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(policy: &'a SkipPolicy, language: Language) -> Self {
        DocumentBuilder { policy, language }
    }

    pub fn build(&self, title: &str, blocks: &[Block]) -> Result<Document, TransformError> {
        if title.trim().is_empty() {
            return Err(TransformError::MissingTitle);
        }
        if blocks.is_empty() {
            return Err(TransformError::MissingContent);
        }

        let mut tree = HeadingTree::new(title);
        let mut paragraphs = Vec::new();

        for block in blocks {
            match block {
                Block::Heading { level, text } => {
                    tree.observe(*level, text)?;
                }
                Block::Paragraph { text, anchors } => {
                    if let Some(p) = self.paragraph(&tree, title, text, anchors, false) {
                        paragraphs.push(p);
                    }
                }
                Block::List { text, anchors } => {
                    if let Some(p) = self.paragraph(&tree, title, text, anchors, true) {
                        paragraphs.push(p);
                    }
                }
            }
        }

        debug!("{}: {} paragraphs from {} blocks", title, paragraphs.len(), blocks.len());
        Ok(Document {
            outline: tree.finish(),
            paragraphs,
        })
    }

    fn paragraph(
        &self,
        tree: &HeadingTree,
        title: &str,
        raw: &str,
        anchors: &[Anchor],
        is_list: bool,
    ) -> Option<Paragraph> {
        let text = clean(raw);
        if text.is_empty() {
            return None;
        }

        let headings = tree.snapshot();
        let outline = tree.outline();
        let is_skippable = headings[1..]
            .iter()
            .flatten()
            .any(|id| self.policy.is_skippable(self.language, outline.text(*id)));

        Some(Paragraph {
            links: align(anchors, &text, title),
            text,
            headings,
            is_list,
            is_skippable,
        })
    }
}
