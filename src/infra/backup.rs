//! Timestamped backups taken before a note is overwritten or deleted.

use crate::domain::NoteName;
use crate::infra::fs::{AtomicWriter, FsError, read_file, remove_file};
use crate::infra::layout::{
    StorageLayout, format_backup_timestamp, parse_backup_file_name, parse_backup_timestamp,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A historical snapshot of a note file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    original_name: NoteName,
    timestamp: DateTime<Utc>,
    path: PathBuf,
}

impl BackupRecord {
    pub fn original_name(&self) -> &NoteName {
        &self.original_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The timestamp as it appears in the file name; accepted by [`BackupSelector`].
    pub fn label(&self) -> String {
        format_backup_timestamp(self.timestamp)
    }
}

/// Which backup of a note to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupSelector {
    Latest,
    At(DateTime<Utc>),
}

impl fmt::Display for BackupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupSelector::Latest => write!(f, "latest"),
            BackupSelector::At(ts) => write!(f, "{}", format_backup_timestamp(*ts)),
        }
    }
}

/// Error returned when parsing an invalid backup selector.
#[derive(Debug, Clone, Error)]
#[error("invalid backup selector '{0}': expected 'latest' or a timestamp like 20240115T103000000000Z")]
pub struct ParseBackupSelectorError(String);

impl FromStr for BackupSelector {
    type Err = ParseBackupSelectorError;

    /// Accepts `latest`, a backup file timestamp, or an RFC 3339 timestamp.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(BackupSelector::Latest);
        }
        parse_backup_timestamp(s)
            .or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            })
            .map(BackupSelector::At)
            .ok_or_else(|| ParseBackupSelectorError(s.to_string()))
    }
}

/// Errors from backup operations.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("no backup of note '{name}' matches {selector}")]
    NotFound {
        name: NoteName,
        selector: BackupSelector,
    },

    #[error("failed to list backups in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Copies note files into `backups/` and finds them again.
///
/// Callers must hold the note's write lock: timestamp uniqueness is only
/// guaranteed between backups of the same name taken one after another.
pub struct BackupManager {
    layout: StorageLayout,
    writer: Arc<dyn AtomicWriter>,
}

impl BackupManager {
    pub fn new(layout: StorageLayout, writer: Arc<dyn AtomicWriter>) -> Self {
        Self { layout, writer }
    }

    /// Snapshots the file at `current` as a backup of `name`.
    ///
    /// Returns `Ok(None)` when there is no current file: creation has no prior
    /// version to protect.
    pub fn backup(
        &self,
        name: &NoteName,
        current: &Path,
    ) -> Result<Option<BackupRecord>, BackupError> {
        let bytes = match read_file(current) {
            Ok(bytes) => bytes,
            Err(FsError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let timestamp = self.unique_timestamp(name, Utc::now());
        let path = self.layout.backup_path(name, timestamp);
        self.writer.write(&path, &bytes)?;
        debug!(name = %name, path = %path.display(), "backup written");

        Ok(Some(BackupRecord {
            original_name: name.clone(),
            timestamp,
            path,
        }))
    }

    /// Truncates to the microsecond precision file names carry, then steps
    /// forward until no backup of `name` uses that timestamp.
    fn unique_timestamp(&self, name: &NoteName, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut ts = now
            .with_nanosecond(now.nanosecond() / 1_000 * 1_000)
            .unwrap_or(now);
        while self.layout.backup_path(name, ts).exists() {
            ts += Duration::microseconds(1);
        }
        ts
    }

    /// Lists the backups of `name`, oldest first.
    pub fn list(&self, name: &NoteName) -> Result<Vec<BackupRecord>, BackupError> {
        let dir = self.layout.backups_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackupError::List { path: dir, source: e }),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BackupError::List {
                path: dir.clone(),
                source: e,
            })?;
            let file_name = entry.file_name();
            let Some((original_name, timestamp)) =
                file_name.to_str().and_then(parse_backup_file_name)
            else {
                continue;
            };
            if &original_name == name {
                records.push(BackupRecord {
                    original_name,
                    timestamp,
                    path: entry.path(),
                });
            }
        }

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    /// Finds the backup `selector` refers to.
    pub fn find(
        &self,
        name: &NoteName,
        selector: BackupSelector,
    ) -> Result<BackupRecord, BackupError> {
        let records = self.list(name)?;
        let found = match selector {
            BackupSelector::Latest => records.into_iter().last(),
            BackupSelector::At(ts) => records.into_iter().find(|r| r.timestamp == ts),
        };
        found.ok_or_else(|| BackupError::NotFound {
            name: name.clone(),
            selector,
        })
    }

    /// Reads a backup's bytes.
    pub fn read(&self, record: &BackupRecord) -> Result<Vec<u8>, BackupError> {
        Ok(read_file(&record.path)?)
    }

    /// Deletes all but the newest `keep` backups of `name`.
    ///
    /// Backups are never removed implicitly; this is the only way they go away.
    /// Returns the records that were deleted.
    pub fn prune(&self, name: &NoteName, keep: usize) -> Result<Vec<BackupRecord>, BackupError> {
        let records = self.list(name)?;
        let excess = records.len().saturating_sub(keep);
        let doomed: Vec<_> = records.into_iter().take(excess).collect();
        for record in &doomed {
            remove_file(&record.path)?;
        }
        Ok(doomed)
    }
}
