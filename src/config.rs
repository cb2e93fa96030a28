use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::parser::skip::{Language, SkipPolicy};
use crate::parser::Transformer;

const CONFIG_FILE: &str = "wiki_scraper";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub language: String,
    pub db_path: String,
    pub user_agent: String,
    pub maintenance_wait_secs: u64,
    pub max_maintenance_retries: u32,
    pub paragraph_links: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            language: "de".into(),
            db_path: "data/wiki.sqlite".into(),
            user_agent: concat!("wiki_scraper/", env!("CARGO_PKG_VERSION")).into(),
            maintenance_wait_secs: 10,
            max_maintenance_retries: 3,
            paragraph_links: false,
        }
    }
}

impl Settings {
    /// Defaults, then `wiki_scraper.toml` if present, then `WIKI_*` variables.
    pub fn load() -> Result<Settings> {
        Self::from_builder(
            Config::builder().add_source(File::with_name(CONFIG_FILE).required(false)),
        )
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Settings> {
        let d = Settings::default();
        builder
            .set_default("language", d.language)?
            .set_default("db_path", d.db_path)?
            .set_default("user_agent", d.user_agent)?
            .set_default("maintenance_wait_secs", d.maintenance_wait_secs as i64)?
            .set_default("max_maintenance_retries", i64::from(d.max_maintenance_retries))?
            .set_default("paragraph_links", d.paragraph_links)?
            .add_source(Environment::with_prefix("WIKI").try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn language(&self) -> Language {
        Language::from_code(&self.language)
    }

    pub fn transformer(&self) -> Transformer {
        Transformer::new(self.language(), SkipPolicy::default()).with_paragraph_links(self.paragraph_links)
    }
}
