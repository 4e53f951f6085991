//! Persisted record of every article already reported.
//!
//! The store maps a URL fingerprint to the metadata captured when the article
//! was first accepted. It is loaded once at startup, written to by the crawler
//! as articles are accepted, and flushed once at the end of the run. Entries
//! are never evicted, so re-running against unchanged listing pages reports
//! nothing new.
//!
//! On disk the store is a JSON document:
//!
//! ```json
//! {
//!   "last_run": "2025-05-06T08:00:00+08:00",
//!   "articles": {
//!     "<sha256 of url>": {
//!       "title": "...", "url": "...", "source": "...",
//!       "fetched_at": "...", "content_hash": "..."
//!     }
//!   }
//! }
//! ```

use crate::error::Result;
use crate::models::Article;
use crate::utils::sha256_hex;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Metadata remembered for an accepted article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryEntry {
    pub title: String,
    pub url: String,
    pub source: String,
    pub fetched_at: String,
    /// SHA-256 of the body text; empty when only the title was available.
    #[serde(default)]
    pub content_hash: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct HistoryFile {
    #[serde(default)]
    last_run: Option<String>,
    #[serde(default)]
    articles: BTreeMap<String, HistoryEntry>,
}

/// Deterministic dedup key for a canonical article URL.
pub fn fingerprint(url: &str) -> String {
    sha256_hex(url)
}

fn read_history(path: &Path) -> Result<HistoryFile> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Fingerprint-keyed history backed by a JSON file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    data: HistoryFile,
}

impl HistoryStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store (first run). An unreadable or
    /// malformed file is logged and also yields an empty store: losing dedup
    /// state is preferable to not running at all.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            match read_history(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!(error = %e, "History file unusable; starting with empty history");
                    HistoryFile::default()
                }
            }
        } else {
            info!("No history file yet; every article counts as new");
            HistoryFile::default()
        };
        info!(entries = data.articles.len(), last_run = ?data.last_run, "Loaded history");
        Self { path, data }
    }

    /// `true` iff the article's fingerprint has never been recorded.
    pub fn is_new(&self, article: &Article) -> bool {
        !self.data.articles.contains_key(&fingerprint(&article.url))
    }

    /// Remember `article` as seen, overwriting any previous entry.
    pub fn record(&mut self, article: &Article, body: &str) {
        let fp = fingerprint(&article.url);
        let entry = HistoryEntry {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source_name.clone(),
            fetched_at: Local::now().to_rfc3339(),
            content_hash: if body.is_empty() {
                String::new()
            } else {
                sha256_hex(body)
            },
        };
        debug!(fingerprint = %fp, url = %article.url, "Recorded article in history");
        self.data.articles.insert(fp, entry);
    }

    #[cfg(test)]
    pub fn get(&self, url: &str) -> Option<&HistoryEntry> {
        self.data.articles.get(&fingerprint(url))
    }

    pub fn len(&self) -> usize {
        self.data.articles.len()
    }

    pub fn last_run(&self) -> Option<&str> {
        self.data.last_run.as_deref()
    }

    /// Stamp `last_run` and write the whole map to disk.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub fn flush(&mut self) -> Result<()> {
        self.data.last_run = Some(Local::now().to_rfc3339());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)?;
        info!(entries = self.data.articles.len(), "Flushed history");
        Ok(())
    }
}
