use crate::domain::{NoteName, ParseNoteNameError, ParseTagError};
use crate::index::IndexError;
use crate::infra::{BackupError, BackupSelector, FsError, NoteFileError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`NoteStore`](crate::store::NoteStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note '{0}' not found")]
    NotFound(NoteName),

    #[error("note '{0}' already exists")]
    AlreadyExists(NoteName),

    /// Stored checksum and content disagree. The content is withheld.
    #[error("integrity check failed for note '{name}': {reason}")]
    Integrity { name: NoteName, reason: String },

    /// The atomic write of a note file failed; the previous file is intact.
    #[error("failed to write note '{name}': {source}")]
    Write {
        name: NoteName,
        #[source]
        source: FsError,
    },

    #[error("no backup of note '{name}' matches {selector}")]
    BackupNotFound {
        name: NoteName,
        selector: BackupSelector,
    },

    #[error("index file {path} is corrupt (set recover_corrupt_index to rebuild it)")]
    IndexCorrupt {
        path: PathBuf,
        #[source]
        source: IndexError,
    },

    #[error(transparent)]
    InvalidName(#[from] ParseNoteNameError),

    #[error(transparent)]
    InvalidTag(#[from] ParseTagError),

    /// Taking a backup failed, so nothing was modified.
    #[error("failed to back up note '{name}': {source}")]
    Backup {
        name: NoteName,
        #[source]
        source: BackupError,
    },

    /// Persisting the index failed; the in-memory index was rolled back.
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Io(#[from] FsError),

    #[error("invalid note file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: NoteFileError,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Stable, coarse classification of a [`StoreError`] for callers that map
/// errors onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Integrity,
    Write,
    BackupNotFound,
    IndexCorrupt,
    InvalidInput,
    Backup,
    Index,
    Io,
    Format,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Write => "write",
            ErrorKind::BackupNotFound => "backup_not_found",
            ErrorKind::IndexCorrupt => "index_corrupt",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Backup => "backup",
            ErrorKind::Index => "index",
            ErrorKind::Io => "io",
            ErrorKind::Format => "format",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StoreError::Integrity { .. } => ErrorKind::Integrity,
            StoreError::Write { .. } => ErrorKind::Write,
            StoreError::BackupNotFound { .. } => ErrorKind::BackupNotFound,
            StoreError::IndexCorrupt { .. } => ErrorKind::IndexCorrupt,
            StoreError::InvalidName(_) | StoreError::InvalidTag(_) => ErrorKind::InvalidInput,
            StoreError::Backup { .. } => ErrorKind::Backup,
            StoreError::Index(_) => ErrorKind::Index,
            StoreError::Io(_) => ErrorKind::Io,
            StoreError::Format { .. } => ErrorKind::Format,
        }
    }

    /// Wraps a backup failure, surfacing a missing backup as `BackupNotFound`.
    pub(crate) fn from_backup(name: &NoteName, error: BackupError) -> Self {
        match error {
            BackupError::NotFound { name, selector } => {
                StoreError::BackupNotFound { name, selector }
            }
            source => StoreError::Backup {
                name: name.clone(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> NoteName {
        NoteName::new(s).unwrap()
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(StoreError::NotFound(name("a")).kind(), ErrorKind::NotFound);
        assert_eq!(ErrorKind::BackupNotFound.as_str(), "backup_not_found");
        let invalid: StoreError = NoteName::new("a b").unwrap_err().into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn missing_backup_maps_to_backup_not_found() {
        let err = StoreError::from_backup(
            &name("todo"),
            BackupError::NotFound {
                name: name("todo"),
                selector: BackupSelector::Latest,
            },
        );
        assert_eq!(err.kind(), ErrorKind::BackupNotFound);
        assert_eq!(err.to_string(), "no backup of note 'todo' matches latest");
    }

    #[test]
    fn other_backup_failures_map_to_backup() {
        let err = StoreError::from_backup(
            &name("todo"),
            BackupError::Fs(FsError::NotFound {
                path: PathBuf::from("/x"),
            }),
        );
        assert_eq!(err.kind(), ErrorKind::Backup);
    }
}
