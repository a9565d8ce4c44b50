//! Persistent ledger of improvement implementation status.
//!
//! The ledger is a single JSON file. Every mutation reloads it, applies the
//! change and writes it back while holding an exclusive advisory lock on a
//! sidecar `<file>.lock`, so concurrent invocations serialize instead of
//! losing each other's updates. Writes go through a temporary file and a
//! rename.

use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::{normalize_dir_path, ComparisonResult, DirectoryStatus, Improvement};
use crate::errors::{Error, Result};
use crate::io;

pub const STATUS_FILE_VERSION: &str = "1.0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImplementationStatus {
    Implemented,
    Partial,
    NotYetImplemented,
    IntentionallySkipped,
}

impl ImplementationStatus {
    pub const ALL: [ImplementationStatus; 4] = [
        ImplementationStatus::Implemented,
        ImplementationStatus::Partial,
        ImplementationStatus::NotYetImplemented,
        ImplementationStatus::IntentionallySkipped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImplementationStatus::Implemented => "IMPLEMENTED",
            ImplementationStatus::Partial => "PARTIAL",
            ImplementationStatus::NotYetImplemented => "NOT_YET_IMPLEMENTED",
            ImplementationStatus::IntentionallySkipped => "INTENTIONALLY_SKIPPED",
        }
    }
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImplementationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "IMPLEMENTED" | "DONE" => Ok(ImplementationStatus::Implemented),
            "PARTIAL" => Ok(ImplementationStatus::Partial),
            "NOT_YET_IMPLEMENTED" | "PENDING" | "TODO" => {
                Ok(ImplementationStatus::NotYetImplemented)
            }
            "INTENTIONALLY_SKIPPED" | "SKIPPED" => Ok(ImplementationStatus::IntentionallySkipped),
            _ => Err(Error::validation(format!("unknown status '{}'", s))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub improvement_id: String,
    pub category: String,
    pub status: ImplementationStatus,
    /// Set exactly when `status` is IMPLEMENTED.
    pub completion_date: Option<String>,
    /// Set exactly when `status` is INTENTIONALLY_SKIPPED.
    pub skip_reason: Option<String>,
    pub last_updated: String,
}

impl StatusEntry {
    pub fn new(improvement_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            improvement_id: improvement_id.into(),
            category: category.into(),
            status: ImplementationStatus::NotYetImplemented,
            completion_date: None,
            skip_reason: None,
            last_updated: timestamp(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFile {
    pub version: String,
    pub last_comparison_date: Option<String>,
    #[serde(default)]
    pub entries: BTreeMap<String, StatusEntry>,
}

impl Default for StatusFile {
    fn default() -> Self {
        Self {
            version: STATUS_FILE_VERSION.to_string(),
            last_comparison_date: None,
            entries: BTreeMap::new(),
        }
    }
}

/// ISO-8601 UTC with a trailing `Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Pure: move `entry` to `status`, keeping the date and reason invariants.
pub fn apply_status(
    entry: &mut StatusEntry,
    status: ImplementationStatus,
    reason: Option<&str>,
    now: &str,
) -> Result<()> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if status == ImplementationStatus::IntentionallySkipped && reason.is_none() {
        return Err(Error::validation(format!(
            "skip_reason is required when marking {} as INTENTIONALLY_SKIPPED",
            entry.improvement_id
        )));
    }

    match status {
        ImplementationStatus::Implemented => {
            if entry.status != ImplementationStatus::Implemented || entry.completion_date.is_none()
            {
                entry.completion_date = Some(now.to_string());
            }
            entry.skip_reason = None;
        }
        ImplementationStatus::IntentionallySkipped => {
            entry.completion_date = None;
            entry.skip_reason = reason.map(str::to_string);
        }
        _ => {
            entry.completion_date = None;
            entry.skip_reason = None;
        }
    }
    entry.status = status;
    entry.last_updated = now.to_string();
    Ok(())
}

/// Pure: status implied by the comparison for one improvement, or `None`
/// when none of its directories were compared.
pub fn derive_status(
    improvement: &Improvement,
    comparison: &ComparisonResult,
) -> Option<ImplementationStatus> {
    let statuses: Vec<DirectoryStatus> = improvement
        .related_directories
        .iter()
        .filter_map(|dir| {
            let wanted = normalize_dir_path(dir);
            comparison
                .directory_statuses
                .iter()
                .find(|(path, _)| normalize_dir_path(path) == wanted)
                .map(|(_, status)| *status)
        })
        .collect();

    if statuses.is_empty() {
        return None;
    }
    let status = if statuses.iter().all(|s| *s == DirectoryStatus::Implemented) {
        ImplementationStatus::Implemented
    } else if statuses
        .iter()
        .any(|s| matches!(s, DirectoryStatus::Implemented | DirectoryStatus::Partial))
    {
        ImplementationStatus::Partial
    } else {
        ImplementationStatus::NotYetImplemented
    };
    Some(status)
}

pub struct StatusTracker {
    path: PathBuf,
    status: StatusFile,
}

impl StatusTracker {
    /// I/O: open the ledger at `path`, starting empty if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let mut tracker = Self {
            path: path.into(),
            status: StatusFile::default(),
        };
        tracker.load_status()?;
        Ok(tracker)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status_file(&self) -> &StatusFile {
        &self.status
    }

    pub fn entries(&self) -> &BTreeMap<String, StatusEntry> {
        &self.status.entries
    }

    pub fn get_entry(&self, improvement_id: &str) -> Option<&StatusEntry> {
        self.status.entries.get(improvement_id)
    }

    /// I/O: replace the in-memory ledger with the file's contents.
    pub fn load_status(&mut self) -> Result<()> {
        self.status = read_status_file(&self.path)?;
        Ok(())
    }

    /// I/O: write the in-memory ledger as a whole.
    pub fn save_status(&self) -> Result<()> {
        let _lock = LedgerLock::acquire(&self.path)?;
        write_status_file(&self.path, &self.status)
    }

    pub fn update_improvement_status(
        &mut self,
        improvement_id: &str,
        category: &str,
        status: ImplementationStatus,
        skip_reason: Option<&str>,
    ) -> Result<StatusEntry> {
        let now = timestamp();
        self.mutate(|file| {
            let entry = file
                .entries
                .entry(improvement_id.to_string())
                .or_insert_with(|| StatusEntry::new(improvement_id, category));
            if !category.trim().is_empty() {
                entry.category = category.to_string();
            }
            apply_status(entry, status, skip_reason, &now)?;
            Ok(entry.clone())
        })
    }

    pub fn mark_as_skipped(
        &mut self,
        improvement_id: &str,
        category: &str,
        reason: &str,
    ) -> Result<StatusEntry> {
        if reason.trim().is_empty() {
            return Err(Error::validation(
                "a non-blank reason must be provided to skip an improvement",
            ));
        }
        self.update_improvement_status(
            improvement_id,
            category,
            ImplementationStatus::IntentionallySkipped,
            Some(reason),
        )
    }

    /// Replace the reason of an already skipped entry; nothing else changes.
    pub fn update_skip_reason(&mut self, improvement_id: &str, reason: &str) -> Result<StatusEntry> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::validation("a non-blank reason must be provided"));
        }
        self.mutate(|file| {
            let entry = file.entries.get_mut(improvement_id).ok_or_else(|| {
                Error::validation(format!("improvement {} not found", improvement_id))
            })?;
            if entry.status != ImplementationStatus::IntentionallySkipped {
                return Err(Error::validation(format!(
                    "improvement {} is not marked as INTENTIONALLY_SKIPPED",
                    improvement_id
                )));
            }
            entry.skip_reason = Some(reason.to_string());
            Ok(entry.clone())
        })
    }

    pub fn get_skipped_improvements(&self) -> Vec<&StatusEntry> {
        self.status
            .entries
            .values()
            .filter(|e| e.status == ImplementationStatus::IntentionallySkipped)
            .collect()
    }

    /// Align entries with a fresh comparison. Skipped entries are left
    /// alone; improvements without compared directories only get an entry
    /// when they have none.
    pub fn sync_from_comparison(
        &mut self,
        improvements: &[Improvement],
        comparison: &ComparisonResult,
    ) -> Result<usize> {
        let now = timestamp();
        let updated = self.mutate(|file| {
            let mut changed = 0;
            for improvement in improvements {
                let id = improvement.id();
                let entry = file
                    .entries
                    .entry(id.clone())
                    .or_insert_with(|| StatusEntry::new(id.as_str(), improvement.category.as_str()));
                if entry.status == ImplementationStatus::IntentionallySkipped {
                    continue;
                }
                if let Some(status) = derive_status(improvement, comparison) {
                    if status != entry.status {
                        apply_status(entry, status, None, &now)?;
                        changed += 1;
                    }
                }
            }
            file.last_comparison_date = Some(now.clone());
            Ok(changed)
        })?;
        log::info!(
            "Status ledger {}: {} entries updated",
            self.path.display(),
            updated
        );
        Ok(updated)
    }

    /// Locked read-modify-write. The in-memory copy is refreshed from disk
    /// first and only replaced once the write succeeded.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut StatusFile) -> Result<T>) -> Result<T> {
        let _lock = LedgerLock::acquire(&self.path)?;
        let mut file = read_status_file(&self.path)?;
        let result = change(&mut file)?;
        write_status_file(&self.path, &file)?;
        self.status = file;
        Ok(result)
    }
}

/// Exclusive lock on `<path>.lock`, released on drop.
struct LedgerLock {
    file: std::fs::File,
}

impl LedgerLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path(path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            io::ensure_dir(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::file_system("Failed to open lock file", &lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| Error::file_system("Failed to lock status file", &lock_path, e))?;
        Ok(Self { file })
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release status lock: {}", err);
        }
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "status.json".into());
    name.push(".lock");
    path.with_file_name(name)
}

fn read_status_file(path: &Path) -> Result<StatusFile> {
    if !io::file_exists(path) {
        return Ok(StatusFile::default());
    }
    let content = io::read_file(path)?;
    if content.trim().is_empty() {
        return Ok(StatusFile::default());
    }
    let file: StatusFile = serde_json::from_str(&content)?;
    if file.version != STATUS_FILE_VERSION {
        log::warn!(
            "Status file {} has version {}, expected {}",
            path.display(),
            file.version,
            STATUS_FILE_VERSION
        );
    }
    Ok(file)
}

fn write_status_file(path: &Path, file: &StatusFile) -> Result<()> {
    let json = serde_json::to_string_pretty(file)?;
    io::write_file_atomic(path, &json)
}
