use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use wiki_scraper::config::Settings;
use wiki_scraper::db::Store;
use wiki_scraper::fetch::{self, HttpFetcher, RunOptions};
use wiki_scraper::{redirects, titles};

#[derive(Parser)]
#[command(name = "wiki_scraper", about = "Wikipedia article scraper and structured record builder")]
struct Cli {
    /// Wikipedia language edition (overrides the configured one)
    #[arg(short, long, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a title list into the queue
    Init {
        /// JSON object title -> redirects, or one title per line
        #[arg(short, long)]
        titles: PathBuf,
    },
    /// Build the title -> redirects mapping from SQL dumps
    Redirects {
        /// `page` table dump
        #[arg(long)]
        pages: PathBuf,
        /// `redirect` table dump
        #[arg(long)]
        redirect: PathBuf,
        /// Output JSON file (usable with `init`)
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Fetch and transform queued titles
    Run {
        /// Number of workers the title list is split across
        #[arg(short, long, default_value = "1")]
        workers: usize,
        /// Only run this worker's share (0-based)
        #[arg(long)]
        worker: Option<usize>,
        /// Max titles per worker share in this run, counted from its checkpoint
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Indent records by four spaces
        #[arg(long)]
        pretty: bool,
    },
    /// Transform a directory of saved .html files (title = file name)
    Process {
        #[arg(short, long)]
        dir: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Transform one HTML file and print the record
    Transform {
        #[arg(long)]
        html: PathBuf,
        #[arg(short, long)]
        title: String,
        /// Redirect title (repeatable)
        #[arg(short, long)]
        redirect: Vec<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Write stored records to <out>/<title>.json
    Export {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Show progress statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(language) = cli.language {
        settings.language = language;
    }
    info!("Language: {}, database: {}", settings.language().code(), settings.db_path);

    let result = match cli.command {
        Commands::Init { titles: path } => {
            let store = Store::connect(&settings.db_path)?;
            let entries = titles::load(&path)?;
            let inserted = store.insert_titles(&entries)?;
            println!("Inserted {} new titles ({} in list)", inserted, entries.len());
            Ok(())
        }
        Commands::Redirects { pages, redirect, out } => {
            let page_dump = BufReader::new(File::open(&pages).with_context(|| format!("Failed to open {}", pages.display()))?);
            let redirect_dump =
                BufReader::new(File::open(&redirect).with_context(|| format!("Failed to open {}", redirect.display()))?);
            let mapping = redirects::build_mapping(page_dump, redirect_dump)?;
            std::fs::write(&out, serde_json::to_string(&mapping)?)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote redirects for {} titles to {}", mapping.len(), out.display());
            Ok(())
        }
        Commands::Run { workers, worker, limit, pretty } => {
            let store = Store::connect(&settings.db_path)?;
            let queue = store.load_titles()?;
            if queue.is_empty() {
                println!("No titles queued. Run 'init' first.");
                return Ok(());
            }
            let fetcher = Arc::new(HttpFetcher::new(&settings, settings.language())?);
            let transformer = Arc::new(settings.transformer());
            let opts = RunOptions {
                workers: workers.max(1),
                only_worker: worker,
                limit,
                pretty,
            };
            let stats = fetch::run_workers(fetcher, transformer, &store, &queue, &opts).await?;
            println!(
                "Done: {} titles ({} saved, {} skipped, {} failed).",
                stats.total, stats.saved, stats.skipped, stats.failed
            );
            Ok(())
        }
        Commands::Process { dir, pretty } => {
            let store = Store::connect(&settings.db_path)?;
            let files = fetch::html_files(&dir)?;
            if files.is_empty() {
                println!("No .html files in {}.", dir.display());
                return Ok(());
            }
            let redirects: HashMap<String, Vec<String>> = store
                .load_titles()?
                .into_iter()
                .map(|e| (e.title, e.redirects))
                .collect();
            println!("Processing {} files...", files.len());
            let stats = fetch::process_files(&files, &settings.transformer(), &store, &redirects, pretty)?;
            println!("Saved {} records, skipped {} articles.", stats.saved, stats.skipped);
            Ok(())
        }
        Commands::Transform { html, title, redirect, pretty } => {
            let raw = std::fs::read_to_string(&html).with_context(|| format!("Failed to read {}", html.display()))?;
            match settings.transformer().try_transform(&title, &raw, &redirect, pretty) {
                Ok(record) => println!("{}", record),
                Err(e) => println!("Skipped {}: {}", title, e),
            }
            Ok(())
        }
        Commands::Export { out } => {
            let store = Store::connect(&settings.db_path)?;
            let written = store.export(&out)?;
            println!("Exported {} records to {}", written, out.display());
            Ok(())
        }
        Commands::Stats => {
            let store = Store::connect(&settings.db_path)?;
            let s = store.stats()?;
            println!("Titles:    {}", s.total);
            println!("Saved:     {}", s.saved);
            println!("Skipped:   {}", s.skipped);
            println!("Remaining: {}", s.remaining);
            println!("Workers:   {}", s.workers);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
