use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::modules::feeds::{LinkItem, LinkSource};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub last_visit: i64, // Unix timestamp in seconds
    pub visit_count: u64,
}

/// Browsing history behind the history section.
///
/// Append-only JSON-lines log: each visit appends a full snapshot of the
/// entry and replay keeps the last snapshot per URL. `compact` rewrites the
/// log with one line per URL.
pub struct HistoryStore {
    index: Mutex<HashMap<String, HistoryEntry>>,
    log_path: PathBuf,
}

impl HistoryStore {
    pub fn open(app_data_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(app_data_dir) {
            log::warn!("[History] Failed to create {:?}: {}", app_data_dir, e);
        }

        let store = HistoryStore {
            index: Mutex::new(HashMap::new()),
            log_path: app_data_dir.join("history.log"),
        };

        match store.load_from_log() {
            Ok(count) => log::info!("[History] Loaded {} entries", count),
            Err(e) => log::error!("[History] Failed to load history: {}", e),
        }

        store
    }

    fn index(&self) -> MutexGuard<'_, HashMap<String, HistoryEntry>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_from_log(&self) -> Result<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = fs::File::open(&self.log_path)?;
        let reader = std::io::BufReader::new(file);
        let mut index = self.index();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => {
                    index.insert(entry.url.clone(), entry);
                }
                Err(e) => log::warn!("[History] Skipping bad log line: {}", e),
            }
        }
        Ok(index.len())
    }

    pub fn add_visit(&self, url: &str, title: Option<&str>) {
        self.add_visit_at(url, title, Utc::now().timestamp());
    }

    pub fn add_visit_at(&self, url: &str, title: Option<&str>, at: i64) {
        let normalized = normalize_url(url);

        let entry_snapshot = {
            let mut index = self.index();

            let entry = index.entry(normalized.clone()).or_insert(HistoryEntry {
                url: normalized,
                title: String::new(),
                last_visit: 0,
                visit_count: 0,
            });

            entry.last_visit = at;
            entry.visit_count += 1;
            // Keep the old title unless a non-empty one comes in.
            if let Some(t) = title.filter(|t| !t.is_empty()) {
                entry.title = t.to_string();
            }

            entry.clone()
        };

        if let Err(e) = self.append(&entry_snapshot) {
            log::error!("[History] Failed to write to history log: {}", e);
        }
    }

    fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Most recently visited first.
    pub fn recent_entries(&self, max: usize) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self.index().values().cloned().collect();
        entries.sort_by(|a, b| b.last_visit.cmp(&a.last_visit).then_with(|| a.url.cmp(&b.url)));
        entries.truncate(max);
        entries
    }

    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn compact(&self) -> Result<()> {
        let index = self.index();
        // Atomic write: write to .tmp then rename
        let tmp_path = self.log_path.with_extension("log.tmp");

        {
            let mut file = fs::File::create(&tmp_path)?;
            for entry in index.values() {
                let json = serde_json::to_string(entry)?;
                writeln!(file, "{}", json)?;
            }
            file.sync_all()?;
        }

        fs::rename(tmp_path, &self.log_path)?;
        log::info!("[History] Compacted log to {} entries", index.len());
        Ok(())
    }
}

impl LinkSource for HistoryStore {
    fn recent(&self, max: usize) -> Vec<LinkItem> {
        self.recent_entries(max)
            .into_iter()
            .map(|entry| LinkItem::new(&entry.url, &entry.title))
            .collect()
    }
}

fn normalize_url(url: &str) -> String {
    // The parser adds the root slash and lowercases the host, so
    // "https://Example.com" and "https://example.com/" share an entry.
    match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}
