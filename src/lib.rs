pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod redirects;
pub mod titles;

pub use error::TransformError;
pub use parser::skip::{Language, SkipPolicy};
pub use parser::Transformer;
