//! Age and size bounded cleanup of a single output directory.
//!
//! There is no index: every operation rescans the directory, and a file that disappears between
//! listing and deletion counts as already handled. Writers and the cleaner share the directory
//! without locking each other out.

use std::{
    io,
    path::{Path, PathBuf},
    sync::{Mutex, TryLockError},
    time::Duration,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::foundation::error::{CardcastError, CardcastResult};

const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Retention limits applied by [`StorageManager::reclaim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoragePolicy {
    pub max_age: Duration,
    pub max_total_bytes: u64,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 3600),
            max_total_bytes: 5 * BYTES_PER_GB,
        }
    }
}

/// Snapshot of one file taken during a scan.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StoredFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    /// `now - modified` at scan time, clamped at zero.
    pub age_secs: f64,
}

impl StoredFile {
    pub fn age(&self) -> Duration {
        Duration::from_secs_f64(self.age_secs.max(0.0))
    }
}

/// Outcome of one purge pass.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
    pub freed_bytes: u64,
    pub errors: Vec<String>,
}

impl PurgeReport {
    fn absorb_removal(&mut self, file: &StoredFile, reason: &str) {
        match std::fs::remove_file(&file.path) {
            Ok(()) => {
                info!(
                    name = %file.name,
                    size_bytes = file.size_bytes,
                    age_hours = file.age_secs / 3600.0,
                    reason,
                    "deleted stored file"
                );
                self.deleted.push(file.name.clone());
                self.freed_bytes += file.size_bytes;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(name = %file.name, "file already gone");
            }
            Err(e) => {
                warn!(name = %file.name, error = %e, "failed to delete stored file");
                self.errors.push(format!("{}: {e}", file.name));
            }
        }
    }
}

/// Combined result of [`StorageManager::reclaim`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ReclaimReport {
    pub deleted_count: usize,
    pub freed_bytes: u64,
    pub remaining_size: u64,
    pub timestamp: DateTime<Utc>,
    pub errors: Vec<String>,
    pub age: PurgeReport,
    pub size: PurgeReport,
}

/// Aggregate view of the directory. All fields are zero when it is empty.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct StorageStats {
    pub file_count: usize,
    pub total_size: u64,
    pub oldest_age_secs: f64,
    pub newest_age_secs: f64,
    pub average_size: f64,
    pub count_over_age_threshold: usize,
    pub usage_percent: f64,
    pub max_age_secs: u64,
    pub max_total_bytes: u64,
}

#[derive(Debug)]
pub struct StorageManager {
    dir: PathBuf,
    policy: StoragePolicy,
    reclaim_lock: Mutex<()>,
}

impl StorageManager {
    /// Manage `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>, policy: StoragePolicy) -> CardcastResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create storage directory '{}'", dir.display()))?;
        Ok(Self {
            dir,
            policy,
            reclaim_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> StoragePolicy {
        self.policy
    }

    pub fn scan(&self) -> CardcastResult<Vec<StoredFile>> {
        self.scan_at(Utc::now())
    }

    /// List regular files with ages relative to `now`. Entries that vanish or cannot be stat'ed
    /// mid-scan are skipped.
    pub fn scan_at(&self, now: DateTime<Utc>) -> CardcastResult<Vec<StoredFile>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CardcastError::storage(format!(
                    "list '{}': {e}",
                    self.dir.display()
                )));
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let path = entry.path();
            let meta = match std::fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }
            let Ok(modified) = meta.modified() else {
                continue;
            };
            let modified = DateTime::<Utc>::from(modified);
            let age_secs = (now - modified).num_milliseconds().max(0) as f64 / 1000.0;

            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                size_bytes: meta.len(),
                created: meta.created().ok().map(DateTime::<Utc>::from),
                modified,
                age_secs,
            });
        }
        Ok(files)
    }

    pub fn total_size(&self) -> CardcastResult<u64> {
        Ok(self.scan()?.iter().map(|f| f.size_bytes).sum())
    }

    pub fn purge_by_age(&self, max_age: Duration) -> CardcastResult<PurgeReport> {
        self.purge_by_age_at(Utc::now(), max_age)
    }

    /// Delete every file strictly older than `max_age` at `now`.
    pub fn purge_by_age_at(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> CardcastResult<PurgeReport> {
        let max_age_secs = max_age.as_secs_f64();
        let mut report = PurgeReport::default();
        for file in self.scan_at(now)? {
            if file.age_secs > max_age_secs {
                report.absorb_removal(&file, "age");
            }
        }
        Ok(report)
    }

    /// Delete oldest-modified files first until the directory holds at most `target_bytes`.
    ///
    /// The total is recomputed from a fresh scan after every deletion.
    pub fn purge_by_size(&self, target_bytes: u64) -> CardcastResult<PurgeReport> {
        let mut report = PurgeReport::default();
        let mut files = self.scan()?;
        let mut total: u64 = files.iter().map(|f| f.size_bytes).sum();
        if total <= target_bytes {
            return Ok(report);
        }

        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        for file in &files {
            if total <= target_bytes {
                break;
            }
            report.absorb_removal(file, "size");
            total = match self.total_size() {
                Ok(total) => total,
                Err(e) => {
                    report.errors.push(e.to_string());
                    break;
                }
            };
        }
        if total > target_bytes {
            warn!(total, target_bytes, "storage still above size cap after purge");
        }
        Ok(report)
    }

    /// Age purge followed by size purge. Concurrent callers run one after another.
    ///
    /// Never fails: directory and per-file errors are collected in the report.
    pub fn reclaim(&self) -> ReclaimReport {
        self.reclaim_at(Utc::now())
    }

    /// Like [`reclaim`](Self::reclaim) but returns `None` when another reclaim is running.
    pub fn try_reclaim(&self) -> Option<ReclaimReport> {
        let _guard = match self.reclaim_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("reclaim already running, skipping");
                return None;
            }
        };
        Some(self.reclaim_locked(Utc::now()))
    }

    /// Clock-injected [`reclaim`](Self::reclaim); waits for any running reclaim first.
    pub fn reclaim_at(&self, now: DateTime<Utc>) -> ReclaimReport {
        let _guard = self
            .reclaim_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.reclaim_locked(now)
    }

    fn reclaim_locked(&self, now: DateTime<Utc>) -> ReclaimReport {
        let mut errors = Vec::new();
        let age = fold_purge(self.purge_by_age_at(now, self.policy.max_age), &mut errors);
        let size = fold_purge(self.purge_by_size(self.policy.max_total_bytes), &mut errors);
        let remaining_size = self.total_size().unwrap_or_else(|e| {
            errors.push(e.to_string());
            0
        });

        let report = ReclaimReport {
            deleted_count: age.deleted.len() + size.deleted.len(),
            freed_bytes: age.freed_bytes + size.freed_bytes,
            remaining_size,
            timestamp: now,
            errors,
            age,
            size,
        };
        info!(
            deleted = report.deleted_count,
            freed_bytes = report.freed_bytes,
            remaining_size = report.remaining_size,
            errors = report.errors.len(),
            "storage reclaim finished"
        );
        report
    }

    pub fn stats(&self) -> CardcastResult<StorageStats> {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> CardcastResult<StorageStats> {
        let files = self.scan_at(now)?;
        let mut stats = StorageStats {
            max_age_secs: self.policy.max_age.as_secs(),
            max_total_bytes: self.policy.max_total_bytes,
            ..StorageStats::default()
        };
        if files.is_empty() {
            return Ok(stats);
        }

        let max_age_secs = self.policy.max_age.as_secs_f64();
        stats.file_count = files.len();
        stats.total_size = files.iter().map(|f| f.size_bytes).sum();
        stats.oldest_age_secs = files.iter().map(|f| f.age_secs).fold(0.0, f64::max);
        stats.newest_age_secs = files
            .iter()
            .map(|f| f.age_secs)
            .fold(f64::INFINITY, f64::min);
        stats.average_size = stats.total_size as f64 / stats.file_count as f64;
        stats.count_over_age_threshold = files.iter().filter(|f| f.age_secs > max_age_secs).count();
        if self.policy.max_total_bytes > 0 {
            stats.usage_percent =
                stats.total_size as f64 / self.policy.max_total_bytes as f64 * 100.0;
        }
        Ok(stats)
    }
}

fn fold_purge(result: CardcastResult<PurgeReport>, errors: &mut Vec<String>) -> PurgeReport {
    match result {
        Ok(report) => {
            errors.extend(report.errors.iter().cloned());
            report
        }
        Err(e) => {
            errors.push(e.to_string());
            PurgeReport::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/manager.rs"]
mod tests;
