use thiserror::Error;

/// Whole-article failures. Any of these means the article is skipped and
/// nothing is persisted for it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("h{level} heading {heading:?} has no open parent heading")]
    Structural { level: u8, heading: String },

    #[error("no category list")]
    MissingCategories,

    #[error("no article content")]
    MissingContent,

    #[error("no title heading")]
    MissingTitle,

    #[error("serialization failed: {0}")]
    Serialization(String),
}
