//! Persisted record of reports already downloaded

use briefing_core::{BriefingError, ReportId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk entry; older ledgers stored `"{date}_{title}"` strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Id(ReportId),
    Legacy(String),
}

impl StoredEntry {
    fn into_id(self) -> Option<ReportId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Legacy(raw) => {
                let (date, title) = raw.split_once('_')?;
                Some(ReportId {
                    date: date.to_string(),
                    title: title.to_string(),
                })
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct StoredLedger {
    #[serde(default)]
    downloaded: Vec<StoredEntry>,
}

#[derive(Serialize)]
struct LedgerView<'a> {
    downloaded: &'a [ReportId],
}

/// Append-only set of `(date, title)` identifiers
///
/// Insertion order is kept so the file diffs cleanly between runs.
#[derive(Debug)]
pub struct DownloadLedger {
    path: PathBuf,
    entries: Vec<ReportId>,
    seen: HashSet<ReportId>,
}

impl DownloadLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger at {}, starting empty", path.display());
                return Ok(Self::empty(path));
            }
            Err(e) => {
                return Err(BriefingError::Ledger {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let stored: StoredLedger = if raw.trim().is_empty() {
            StoredLedger::default()
        } else {
            serde_json::from_str(&raw).map_err(|e| BriefingError::Ledger {
                path: path.clone(),
                reason: e.to_string(),
            })?
        };

        let mut ledger = Self::empty(path);
        for entry in stored.downloaded {
            match entry.into_id() {
                Some(id) => {
                    ledger.insert(id);
                }
                None => warn!("Ignoring unreadable ledger entry in {}", ledger.path.display()),
            }
        }
        Ok(ledger)
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &ReportId) -> bool {
        self.seen.contains(id)
    }

    pub fn entries(&self) -> &[ReportId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, id: ReportId) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.entries.push(id);
        true
    }

    /// Add `id` and persist immediately
    ///
    /// Returns `false` without touching the file when `id` was already known.
    pub async fn record(&mut self, id: ReportId) -> Result<bool> {
        if !self.insert(id) {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    /// Rewrite the file through a temporary sibling
    pub async fn save(&self) -> Result<()> {
        let ledger_error = |reason: String| BriefingError::Ledger {
            path: self.path.clone(),
            reason,
        };

        let json = serde_json::to_string_pretty(&LedgerView {
            downloaded: &self.entries,
        })
        .map_err(|e| ledger_error(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ledger_error(e.to_string()))?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ledger.json".to_string());
        let staging = self.path.with_file_name(format!(".{file_name}.tmp"));

        tokio::fs::write(&staging, json.as_bytes())
            .await
            .map_err(|e| ledger_error(e.to_string()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| ledger_error(e.to_string()))?;

        debug!("Ledger saved with {} entries", self.entries.len());
        Ok(())
    }
}
