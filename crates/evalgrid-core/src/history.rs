//! Persistence of completed run records.
//!
//! `RunHistory` is the read-side abstraction the analyzer and the conflict
//! check depend on. The filesystem backend reads the JSON result files the
//! external harness writes; the in-memory fake backs unit tests.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::record::RunRecord;

/// Errors surfaced by a run-history backend.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for history operations
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Read access to previously completed runs.
///
/// Guarantees:
/// - `recent(limit)` returns at most `limit` records, newest first.
/// - `known_names()` covers every record the backend can see, not just
///   the most recent window.
/// - Unreadable or malformed records are skipped, never fatal.
#[async_trait]
pub trait RunHistory: Send + Sync {
    /// The most recent records, newest first.
    async fn recent(&self, limit: usize) -> HistoryResult<Vec<RunRecord>>;

    /// Every configuration name that appears in the stored records.
    async fn known_names(&self) -> HistoryResult<HashSet<String>>;
}

// ---------------------------------------------------------------------------
// FsRunHistory — JSON result files on disk
// ---------------------------------------------------------------------------

/// Filesystem-backed history reading `*.json` result files from one
/// directory. Files the harness is still writing, or that fail to parse,
/// are logged at `warn` and skipped.
#[derive(Debug, Clone)]
pub struct FsRunHistory {
    dir: PathBuf,
}

impl FsRunHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load every parseable record in the directory, unsorted.
    async fn load_all(&self) -> HistoryResult<Vec<RunRecord>> {
        let mut records = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // A missing directory just means no runs have completed yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                    continue;
                }
            };
            match serde_json::from_str::<RunRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed record");
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl RunHistory for FsRunHistory {
    async fn recent(&self, limit: usize) -> HistoryResult<Vec<RunRecord>> {
        let mut records = self.load_all().await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        Ok(records)
    }

    async fn known_names(&self) -> HistoryResult<HashSet<String>> {
        let records = self.load_all().await?;
        Ok(records.into_iter().map(|r| r.config.name).collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryRunHistory — in-memory fake (testing only)
// ---------------------------------------------------------------------------

/// In-memory history satisfying the trait contract without touching disk.
#[derive(Debug, Default)]
pub struct MemoryRunHistory {
    records: Mutex<Vec<RunRecord>>,
}

impl MemoryRunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: RunRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl RunHistory for MemoryRunHistory {
    async fn recent(&self, limit: usize) -> HistoryResult<Vec<RunRecord>> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        Ok(records)
    }

    async fn known_names(&self) -> HistoryResult<HashSet<String>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().map(|r| r.config.name.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::Target;
    use crate::domain::record::RecordConfig;
    use chrono::{Duration, TimeZone, Utc};

    fn record(name: &str, age_hours: i64) -> RunRecord {
        RunRecord {
            id: format!("res-{name}"),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap()
                - Duration::hours(age_hours),
            config: RecordConfig {
                name: name.to_string(),
            },
            target: Target {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                temp_extraction: 0.2,
                temp_dedup: 0.1,
                temp_impact: 0.3,
                temp_proposal: 0.5,
                embeddings_model: None,
                dedup_threshold: None,
            },
            overall_score: 0.7,
            suites: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_memory_history_orders_newest_first() {
        let history = MemoryRunHistory::new();
        history.push(record("old", 5));
        history.push(record("new", 1));
        history.push(record("mid", 3));

        let recent = history.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].config.name, "new");
        assert_eq!(recent[1].config.name, "mid");
    }

    #[tokio::test]
    async fn test_memory_history_known_names() {
        let history = MemoryRunHistory::new();
        history.push(record("a", 1));
        history.push(record("b", 2));
        history.push(record("a", 3));

        let names = history.known_names().await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("a"));
        assert!(names.contains("b"));
    }
}
