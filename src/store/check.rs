//! Index versus disk consistency report.

use crate::domain::NoteName;
use crate::index::{BuildError, BuildResult, IndexEntry};
use crate::infra::StorageLayout;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// One inconsistency between the index and the note files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckIssue {
    /// Indexed, but the note file is gone.
    MissingFile { name: NoteName, path: PathBuf },
    /// The note file's content does not match its own checksum.
    ChecksumMismatch { name: NoteName, path: PathBuf },
    /// The file is intact but the index holds a different checksum.
    StaleEntry { name: NoteName, path: PathBuf },
    /// A valid note file the index does not point at.
    Orphan { name: NoteName, path: PathBuf },
    /// A file under the data directory that could not be read as a note.
    Unreadable { path: PathBuf, message: String },
}

impl fmt::Display for CheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckIssue::MissingFile { name, path } => {
                write!(f, "{}: indexed but file is missing ({})", name, path.display())
            }
            CheckIssue::ChecksumMismatch { name, path } => {
                write!(f, "{}: checksum mismatch ({})", name, path.display())
            }
            CheckIssue::StaleEntry { name, path } => write!(
                f,
                "{}: index checksum differs from file ({})",
                name,
                path.display()
            ),
            CheckIssue::Orphan { name, path } => {
                write!(f, "{}: file is not indexed ({})", name, path.display())
            }
            CheckIssue::Unreadable { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
        }
    }
}

/// Result of [`NoteStore::check`](crate::store::NoteStore::check).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    /// Number of index entries examined.
    pub checked: usize,
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    /// Returns true if the index and the files agree.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

pub(crate) fn build_report(
    layout: &StorageLayout,
    indexed: &[IndexEntry],
    scan: BuildResult,
) -> CheckReport {
    let mut issues = Vec::new();
    let by_name: HashMap<&NoteName, &IndexEntry> = indexed.iter().map(|e| (e.name(), e)).collect();

    for entry in indexed {
        let path = layout.resolve(entry.relative_path());
        if !path.exists() {
            issues.push(CheckIssue::MissingFile {
                name: entry.name().clone(),
                path,
            });
        }
    }

    for found in &scan.entries {
        let path = layout.resolve(found.relative_path());
        match by_name.get(found.name()) {
            Some(entry) if entry.relative_path() != found.relative_path() => {
                issues.push(CheckIssue::Orphan {
                    name: found.name().clone(),
                    path,
                });
            }
            Some(entry) if entry.checksum() != found.checksum() => {
                issues.push(CheckIssue::StaleEntry {
                    name: found.name().clone(),
                    path,
                });
            }
            Some(_) => {}
            None => issues.push(CheckIssue::Orphan {
                name: found.name().clone(),
                path,
            }),
        }
    }

    for error in scan.errors {
        issues.push(match error {
            BuildError::Integrity { path, name } => CheckIssue::ChecksumMismatch { name, path },
            BuildError::Duplicate { path, name, .. } => CheckIssue::Orphan { name, path },
            other => CheckIssue::Unreadable {
                path: other.path().to_path_buf(),
                message: other.message(),
            },
        });
    }

    CheckReport {
        checked: indexed.len(),
        issues,
    }
}
