//! On-disk layout: where notes, backups, and the index live under the root.
//!
//! ```text
//! <root>/notes/index.json
//! <root>/notes/data/<year>/<month>/<name>.json
//! <root>/notes/backups/<name>.<timestamp>.bak
//! ```

use crate::domain::NoteName;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const NOTES_DIR: &str = "notes";
pub const DATA_DIR: &str = "data";
pub const BACKUPS_DIR: &str = "backups";
pub const INDEX_FILE: &str = "index.json";
pub const NOTE_EXTENSION: &str = "json";
pub const BACKUP_EXTENSION: &str = "bak";

/// Backup timestamps: UTC, microsecond precision, lexically sortable.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%6fZ";

static BACKUP_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9_-]+)\.(?P<ts>\d{8}T\d{12}Z)\.bak$")
        .expect("backup file pattern is valid")
});

/// Resolves note names to storage paths under a root directory.
///
/// Pure path arithmetic; only [`StorageLayout::ensure_dirs`] touches the disk.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    notes_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let notes_dir = root.join(NOTES_DIR);
        Self { root, notes_dir }
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `<root>/notes`, the base for index-relative paths.
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.notes_dir.join(DATA_DIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.notes_dir.join(BACKUPS_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.notes_dir.join(INDEX_FILE)
    }

    /// Partition path relative to the notes directory: `data/<year>/<month>/<name>.json`.
    ///
    /// The partition comes from the creation time, which never changes, so a
    /// note stays in the same place for its whole life.
    pub fn relative_data_path(&self, name: &NoteName, created_at: DateTime<Utc>) -> PathBuf {
        PathBuf::from(DATA_DIR)
            .join(created_at.format("%Y").to_string())
            .join(created_at.format("%m").to_string())
            .join(format!("{}.{}", name, NOTE_EXTENSION))
    }

    /// Absolute data path for a note.
    pub fn data_path(&self, name: &NoteName, created_at: DateTime<Utc>) -> PathBuf {
        self.resolve(&self.relative_data_path(name, created_at))
    }

    /// Resolves an index-relative path against the notes directory.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.notes_dir.join(relative)
    }

    /// Backup path: `backups/<name>.<timestamp>.bak`.
    pub fn backup_path(&self, name: &NoteName, timestamp: DateTime<Utc>) -> PathBuf {
        self.backups_dir().join(format!(
            "{}.{}.{}",
            name,
            format_backup_timestamp(timestamp),
            BACKUP_EXTENSION
        ))
    }

    /// Creates the directory skeleton if it does not exist.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.backups_dir())
    }
}

/// Formats a timestamp the way backup file names carry it.
pub fn format_backup_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(BACKUP_TIMESTAMP_FORMAT).to_string()
}

/// Parses a backup timestamp such as `20240115T103000123456Z`.
pub fn parse_backup_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != 22 || !s.is_ascii() || !s.ends_with('Z') {
        return None;
    }
    let seconds = NaiveDateTime::parse_from_str(&s[..15], "%Y%m%dT%H%M%S").ok()?;
    let micros: u32 = s[15..21].parse().ok()?;
    let naive = seconds.with_nanosecond(micros * 1_000)?;
    Some(naive.and_utc())
}

/// Splits a backup file name into the note name and backup timestamp.
///
/// Returns `None` for anything that is not exactly `<name>.<timestamp>.bak`.
pub fn parse_backup_file_name(file_name: &str) -> Option<(NoteName, DateTime<Utc>)> {
    let caps = BACKUP_FILE_RE.captures(file_name)?;
    let name = NoteName::new(&caps["name"]).ok()?;
    let timestamp = parse_backup_timestamp(&caps["ts"])?;
    Some((name, timestamp))
}

/// Recovers the note name from a data file path (`.../<name>.json`).
pub fn note_name_from_path(path: &Path) -> Option<NoteName> {
    if path.extension()? != NOTE_EXTENSION {
        return None;
    }
    NoteName::new(path.file_stem()?.to_str()?).ok()
}
