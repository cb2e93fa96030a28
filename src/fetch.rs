use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use reqwest::{StatusCode, Url};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::db::{CheckpointStore, RecordSink, Store};
use crate::parser::skip::Language;
use crate::parser::Transformer;
use crate::titles::{slice_for_worker, TitleEntry};

/// Body text Wikipedia serves instead of the article while it is down.
pub const MAINTENANCE_MESSAGE: &str = "Our servers are currently under maintenance or experiencing";

const CHANNEL_CAPACITY: usize = 64;
const CHUNK_SIZE: usize = 500;

/// Source of raw article HTML.
pub trait Fetcher: Send + Sync + 'static {
    /// Page HTML, or `None` if the wiki has no page with this title.
    fn fetch(&self, title: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
    maintenance_wait: Duration,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(settings: &Settings, language: Language) -> Result<HttpFetcher> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        let base = Url::parse(&format!("https://{}.wikipedia.org/wiki/", language.code()))?;
        Ok(HttpFetcher {
            client,
            base,
            maintenance_wait: Duration::from_secs(settings.maintenance_wait_secs),
            max_retries: settings.max_maintenance_retries,
        })
    }

    pub fn article_url(&self, title: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be a base URL", self.base))?
            .pop_if_empty()
            .push(title);
        Ok(url)
    }

    async fn fetch_once(&self, url: &Url) -> Result<Option<String>> {
        let response = self.client.get(url.clone()).send().await?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(None);
        }
        let body = response.error_for_status()?.text().await?;
        Ok(Some(body))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, title: &str) -> Result<Option<String>> {
        let url = self.article_url(title)?;
        debug!("GET {}", url);
        retry_on_maintenance(title, self.maintenance_wait, self.max_retries, || self.fetch_once(&url)).await
    }
}

/// Re-run `attempt` while the body is the maintenance page, waiting `wait`
/// between tries. Gives up after `max_retries` retries.
pub async fn retry_on_maintenance<F, Fut>(
    title: &str,
    wait: Duration,
    max_retries: u32,
    mut attempt: F,
) -> Result<Option<String>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    for n in 0..=max_retries {
        let page = attempt().await?;
        if !page.as_deref().is_some_and(|body| body.contains(MAINTENANCE_MESSAGE)) {
            return Ok(page);
        }
        if n < max_retries {
            warn!(
                "Wikipedia under maintenance while fetching {} (retry {}/{}), waiting {:.1}s",
                title,
                n + 1,
                max_retries,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }
    bail!("{}: still under maintenance after {} retries", title, max_retries)
}

// ── Worker pipeline ──

pub struct RunOptions {
    pub workers: usize,
    /// Run only this worker's share (0-based).
    pub only_worker: Option<usize>,
    /// Max titles per worker in this run, counted after its checkpoint.
    pub limit: Option<usize>,
    pub pretty: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Saved(String),
    Skipped(String),
    Failed(String),
}

struct Message {
    worker: usize,
    title: String,
    outcome: Outcome,
}

/// Fetch and transform every title, one tokio task per worker share.
///
/// Workers send results to a single writer (this function) which owns the
/// store. Saved, skipped and nonexistent articles advance the worker's
/// checkpoint; a fetch failure stops that worker so a rerun resumes at the
/// failed title.
pub async fn run_workers<F, S>(
    fetcher: Arc<F>,
    transformer: Arc<Transformer>,
    store: &S,
    titles: &[TitleEntry],
    opts: &RunOptions,
) -> Result<RunStats>
where
    F: Fetcher,
    S: CheckpointStore + RecordSink,
{
    let workers: Vec<usize> = match opts.only_worker {
        Some(w) if w >= opts.workers => bail!("worker {} out of range (0..{})", w, opts.workers),
        Some(w) => vec![w],
        None => (0..opts.workers).collect(),
    };

    let mut shares = Vec::with_capacity(workers.len());
    for w in workers {
        let share = &titles[slice_for_worker(titles.len(), w, opts.workers)];
        let start = resume_index(share, store.last_completed(w)?.as_deref(), w);
        let pending = &share[start..];
        let take = opts.limit.unwrap_or(pending.len()).min(pending.len());
        shares.push((w, pending[..take].to_vec()));
    }
    let total: usize = shares.iter().map(|(_, s)| s.len()).sum();
    info!(
        "{} titles to process across {} workers ({} wikipedia)",
        total,
        shares.len(),
        transformer.language().code()
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);

    for (worker, share) in shares {
        let fetcher = Arc::clone(&fetcher);
        let transformer = Arc::clone(&transformer);
        let tx = tx.clone();
        let pretty = opts.pretty;

        tokio::spawn(async move {
            for entry in share {
                let outcome = match fetcher.fetch(&entry.title).await {
                    Ok(Some(html)) => transform_blocking(Arc::clone(&transformer), &entry, html, pretty).await,
                    Ok(None) => {
                        warn!("Skipping {}: no such page", entry.title);
                        Outcome::Skipped("not found".to_string())
                    }
                    Err(e) => Outcome::Failed(format!("{:#}", e)),
                };
                let stop = matches!(outcome, Outcome::Failed(_));
                let msg = Message {
                    worker,
                    title: entry.title,
                    outcome,
                };
                if tx.send(msg).await.is_err() || stop {
                    return;
                }
            }
        });
    }

    // rx closes once every worker task has dropped its sender
    drop(tx);

    let mut stats = RunStats {
        total,
        ..RunStats::default()
    };
    while let Some(msg) = rx.recv().await {
        match msg.outcome {
            Outcome::Saved(record) => {
                store.save(&msg.title, &record)?;
                store.mark_completed(msg.worker, &msg.title)?;
                stats.saved += 1;
            }
            Outcome::Skipped(reason) => {
                store.skip(&msg.title, &reason)?;
                store.mark_completed(msg.worker, &msg.title)?;
                stats.skipped += 1;
            }
            Outcome::Failed(err) => {
                warn!("Worker {} stopped at {}: {}", msg.worker, msg.title, err);
                stats.failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Processed {} titles ({} saved, {} skipped, {} failed)",
        stats.saved + stats.skipped + stats.failed,
        stats.saved,
        stats.skipped,
        stats.failed
    );
    Ok(stats)
}

async fn transform_blocking(transformer: Arc<Transformer>, entry: &TitleEntry, html: String, pretty: bool) -> Outcome {
    let title = entry.title.clone();
    let redirects = entry.redirects.clone();
    let result =
        tokio::task::spawn_blocking(move || transformer.try_transform(&title, &html, &redirects, pretty)).await;
    match result {
        Ok(Ok(record)) => Outcome::Saved(record),
        Ok(Err(e)) => {
            warn!("Skipping whole article {}: {}", entry.title, e);
            Outcome::Skipped(e.to_string())
        }
        Err(e) => Outcome::Failed(format!("transform task failed: {}", e)),
    }
}

/// Index in `share` to resume from, given the worker's checkpoint.
fn resume_index(share: &[TitleEntry], checkpoint: Option<&str>, worker: usize) -> usize {
    let Some(last) = checkpoint else {
        return 0;
    };
    match share.iter().position(|e| e.title == last) {
        Some(i) => {
            info!("Worker {} resuming after {}", worker, last);
            i + 1
        }
        None => {
            warn!("Worker {} checkpoint {} not in its share, starting over", worker, last);
            0
        }
    }
}

// ── Offline processing ──

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub saved: usize,
    pub skipped: usize,
}

/// `.html` files of `dir`, sorted by name.
pub fn html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "html") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Transform saved HTML files (title = file stem) in parallel and store the
/// results chunk by chunk.
pub fn process_files(
    files: &[PathBuf],
    transformer: &Transformer,
    store: &Store,
    redirects: &HashMap<String, Vec<String>>,
    pretty: bool,
) -> Result<ProcessStats> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut stats = ProcessStats::default();
    for chunk in files.chunks(CHUNK_SIZE) {
        let results: Vec<(String, Result<String, String>)> = chunk
            .par_iter()
            .map(|path| {
                let title = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let result = std::fs::read_to_string(path)
                    .map_err(|e| format!("unreadable: {}", e))
                    .and_then(|html| {
                        let supplied = redirects.get(&title).map(Vec::as_slice).unwrap_or_default();
                        transformer
                            .try_transform(&title, &html, supplied, pretty)
                            .map_err(|e| e.to_string())
                    });
                (title, result)
            })
            .collect();

        let mut records = Vec::new();
        for (title, result) in results {
            match result {
                Ok(record) => records.push((title, record)),
                Err(reason) => {
                    warn!("Skipping whole article {}: {}", title, reason);
                    store.skip(&title, &reason)?;
                    stats.skipped += 1;
                }
            }
        }
        stats.saved += records.len();
        store.save_many(&records)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(stats)
}
