//! Rebuilds index entries by scanning note files on disk.

use crate::domain::NoteName;
use crate::index::IndexEntry;
use crate::infra::fs::{is_temp_file_name, read_file};
use crate::infra::layout::{NOTE_EXTENSION, note_name_from_path};
use crate::infra::{StorageLayout, note_file};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ===========================================
// BuildError Type
// ===========================================

/// Problems found with individual note files during a scan.
#[derive(Debug)]
pub enum BuildError {
    /// The file stem is not a valid note name.
    InvalidName { path: PathBuf },
    /// Reading the file (or walking to it) failed.
    Io { path: PathBuf, message: String },
    /// The file is not a valid note document.
    Parse { path: PathBuf, message: String },
    /// The content does not match the stored checksum.
    Integrity { path: PathBuf, name: NoteName },
    /// Another file already claimed this name; the newer one was kept.
    Duplicate {
        path: PathBuf,
        name: NoteName,
        kept: PathBuf,
    },
}

impl BuildError {
    /// Returns the path of the file that caused the error.
    pub fn path(&self) -> &Path {
        match self {
            BuildError::InvalidName { path }
            | BuildError::Io { path, .. }
            | BuildError::Parse { path, .. }
            | BuildError::Integrity { path, .. }
            | BuildError::Duplicate { path, .. } => path,
        }
    }

    /// Returns a human-readable description.
    pub fn message(&self) -> String {
        match self {
            BuildError::InvalidName { .. } => "file name is not a valid note name".to_string(),
            BuildError::Io { message, .. } | BuildError::Parse { message, .. } => message.clone(),
            BuildError::Integrity { name, .. } => {
                format!("checksum mismatch for note '{}'", name)
            }
            BuildError::Duplicate { name, kept, .. } => format!(
                "duplicate note '{}' (kept {})",
                name,
                kept.display()
            ),
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path().display(), self.message())
    }
}

impl std::error::Error for BuildError {}

// ===========================================
// BuildResult
// ===========================================

/// Outcome of a scan: the entries that could be built and what went wrong.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Entries for every valid note file, name ascending.
    pub entries: Vec<IndexEntry>,
    /// Files that were skipped.
    pub errors: Vec<BuildError>,
}

// ===========================================
// IndexBuilder
// ===========================================

/// Walks `notes/data/` and builds an index entry for each valid note file.
///
/// Used to recover from a corrupt index and to check the index against the
/// files on disk. Corrupt files are reported, never indexed.
pub struct IndexBuilder {
    layout: StorageLayout,
}

impl IndexBuilder {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Scans every note file under the data directory.
    pub fn scan(&self) -> BuildResult {
        let data_dir = self.layout.data_dir();
        let mut result = BuildResult::default();
        if !data_dir.exists() {
            return result;
        }

        let mut by_name: HashMap<NoteName, IndexEntry> = HashMap::new();

        for item in WalkDir::new(&data_dir).sort_by_file_name() {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    result.errors.push(BuildError::Io {
                        path: e.path().unwrap_or(&data_dir).to_path_buf(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_note_file(entry.path()) {
                continue;
            }

            let indexed = match self.index_file(entry.path()) {
                Ok(indexed) => indexed,
                Err(e) => {
                    result.errors.push(e);
                    continue;
                }
            };

            match by_name.remove(indexed.name()) {
                None => {
                    by_name.insert(indexed.name().clone(), indexed);
                }
                Some(existing) => {
                    let (kept, dropped) = if indexed.modified_at() > existing.modified_at() {
                        (indexed, existing)
                    } else {
                        (existing, indexed)
                    };
                    result.errors.push(BuildError::Duplicate {
                        path: self.layout.resolve(dropped.relative_path()),
                        name: dropped.name().clone(),
                        kept: self.layout.resolve(kept.relative_path()),
                    });
                    by_name.insert(kept.name().clone(), kept);
                }
            }
        }

        result.entries = by_name.into_values().collect();
        result.entries.sort_by(|a, b| a.name().cmp(b.name()));
        result
    }

    fn index_file(&self, path: &Path) -> Result<IndexEntry, BuildError> {
        let name = note_name_from_path(path).ok_or_else(|| BuildError::InvalidName {
            path: path.to_path_buf(),
        })?;

        let bytes = read_file(path).map_err(|e| BuildError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let note = note_file::parse(name, &bytes).map_err(|e| BuildError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if !note.verify_checksum() {
            return Err(BuildError::Integrity {
                path: path.to_path_buf(),
                name: note.name().clone(),
            });
        }

        let relative = path
            .strip_prefix(self.layout.notes_dir())
            .unwrap_or(path)
            .to_path_buf();
        Ok(IndexEntry::from_note(&note, relative))
    }
}

fn is_note_file(path: &Path) -> bool {
    let is_temp = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_temp_file_name);
    !is_temp && path.extension().is_some_and(|e| e == NOTE_EXTENSION)
}
