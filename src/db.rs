use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;

use crate::titles::TitleEntry;

/// Last title a worker finished, so a restarted worker can resume after it.
pub trait CheckpointStore {
    fn last_completed(&self, worker: usize) -> Result<Option<String>>;
    fn mark_completed(&self, worker: usize, title: &str) -> Result<()>;
}

/// Where serialized records (and the reasons articles were skipped) go.
pub trait RecordSink {
    fn save(&self, title: &str, record: &str) -> Result<()>;
    fn skip(&self, title: &str, reason: &str) -> Result<()>;
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn connect(path: &str) -> Result<Store> {
        if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let conn = Connection::open(path).with_context(|| format!("Failed to open database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Store> {
        let store = Store {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS titles (
                id         INTEGER PRIMARY KEY,
                title      TEXT UNIQUE NOT NULL,
                redirects  TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS checkpoints (
                worker     INTEGER PRIMARY KEY,
                title      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS articles (
                title      TEXT PRIMARY KEY,
                record     TEXT NOT NULL,
                saved_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS skipped (
                title      TEXT PRIMARY KEY,
                reason     TEXT NOT NULL,
                skipped_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Title queue ──

    pub fn insert_titles(&self, entries: &[TitleEntry]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO titles (title, redirects) VALUES (?1, ?2)")?;
            for e in entries {
                let redirects = serde_json::to_string(&e.redirects)?;
                count += stmt.execute(rusqlite::params![e.title, redirects])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    /// All titles in insertion order.
    pub fn load_titles(&self) -> Result<Vec<TitleEntry>> {
        let mut stmt = self.conn.prepare("SELECT title, redirects FROM titles ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(title, redirects)| {
                let redirects = serde_json::from_str(&redirects)
                    .with_context(|| format!("Bad redirects stored for {}", title))?;
                Ok(TitleEntry { title, redirects })
            })
            .collect()
    }

    // ── Records ──

    /// Save many records in one transaction.
    pub fn save_many(&self, records: &[(String, String)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO articles (title, record, saved_at) VALUES (?1, ?2, ?3)",
            )?;
            let now = Utc::now().to_rfc3339();
            for (title, record) in records {
                stmt.execute(rusqlite::params![title, record, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn record(&self, title: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT record FROM articles WHERE title = ?1")?;
        let mut rows = stmt.query_map([title], |row| row.get(0))?;
        Ok(rows.next().transpose()?)
    }

    pub fn skip_reason(&self, title: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT reason FROM skipped WHERE title = ?1")?;
        let mut rows = stmt.query_map([title], |row| row.get(0))?;
        Ok(rows.next().transpose()?)
    }

    // ── Export ──

    /// Write every stored record to `<dir>/<title>.json`. Returns the number
    /// of files written.
    pub fn export(&self, dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let mut stmt = self.conn.prepare("SELECT title, record FROM articles ORDER BY title")?;
        let mut rows = stmt.query([])?;
        let mut count = 0;
        while let Some(row) = rows.next()? {
            let title: String = row.get(0)?;
            let record: String = row.get(1)?;
            let path = dir.join(export_file_name(&title));
            std::fs::write(&path, record).with_context(|| format!("Failed to write {}", path.display()))?;
            count += 1;
        }
        Ok(count)
    }

    // ── Stats ──

    pub fn stats(&self) -> Result<Stats> {
        let count = |sql: &str| -> Result<usize> { Ok(self.conn.query_row(sql, [], |r| r.get(0))?) };
        let total = count("SELECT COUNT(*) FROM titles")?;
        let saved = count("SELECT COUNT(*) FROM articles")?;
        let skipped = count("SELECT COUNT(*) FROM skipped")?;
        let workers = count("SELECT COUNT(*) FROM checkpoints")?;
        Ok(Stats {
            total,
            saved,
            skipped,
            remaining: total.saturating_sub(saved + skipped),
            workers,
        })
    }
}

impl CheckpointStore for Store {
    fn last_completed(&self, worker: usize) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT title FROM checkpoints WHERE worker = ?1")?;
        let mut rows = stmt.query_map([worker as i64], |row| row.get(0))?;
        Ok(rows.next().transpose()?)
    }

    fn mark_completed(&self, worker: usize, title: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO checkpoints (worker, title, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(worker) DO UPDATE SET title = excluded.title, updated_at = excluded.updated_at",
            rusqlite::params![worker as i64, title, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl RecordSink for Store {
    fn save(&self, title: &str, record: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO articles (title, record, saved_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![title, record, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn skip(&self, title: &str, reason: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO skipped (title, reason, skipped_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![title, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

pub struct Stats {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
    pub remaining: usize,
    pub workers: usize,
}

/// File name for an exported record: `/` becomes `-`, capped at 255
/// characters including the extension.
pub fn export_file_name(title: &str) -> String {
    const EXT: &str = ".json";
    let stem: String = title.replace('/', "-").chars().take(255 - EXT.len()).collect();
    format!("{}{}", stem, EXT)
}
