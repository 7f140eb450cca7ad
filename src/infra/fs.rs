//! Atomic file writes and the low-level file helpers built on them.

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use tempfile::{Builder, PersistError};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Prefix of the temporary files created next to their destination.
pub const TEMP_PREFIX: &str = ".pin-";

/// Suffix of the temporary files created next to their destination.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Errors during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path has no parent directory: {path}")]
    ParentNotFound { path: PathBuf },
}

impl FsError {
    /// Creates an appropriate FsError from an io::Error.
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }

    /// Returns the path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            FsError::NotFound { path }
            | FsError::PermissionDenied { path }
            | FsError::Io { path, .. }
            | FsError::AtomicWrite { path, .. }
            | FsError::ParentNotFound { path } => path,
        }
    }
}

/// Writes whole files so that readers only ever see the old or the new bytes.
///
/// Everything the store persists (note files, backups, the index) goes
/// through this trait, which is also the seam tests use to inject failures.
pub trait AtomicWriter: Send + Sync {
    /// Replaces the file at `path` with `bytes`.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FsError>;
}

/// Write-temp-then-rename on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl AtomicWriter for FsWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FsError> {
        write_atomic(path, bytes)
    }
}

/// Writes `bytes` to `path` atomically.
///
/// The payload goes to a temporary file in the destination directory, is
/// synced, and is then renamed over `path`. Missing parent directories are
/// created. If anything fails before the rename, the original file is
/// untouched and the temporary file is removed.
///
/// # Errors
///
/// Returns `FsError::ParentNotFound` if `path` has no parent.
/// Returns `FsError::AtomicWrite` if the final rename fails.
/// Returns `FsError::Io` (or a more specific variant) for other I/O failures.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FsError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| FsError::ParentNotFound { path: path.into() })?;

    fs::create_dir_all(parent).map_err(|e| FsError::from_io(parent, e))?;

    let mut temp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| FsError::from_io(parent, e))?;

    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| FsError::Io {
            path: path.into(),
            source: e,
        })?;

    if let Err(PersistError { error, file }) = temp.persist(path) {
        let temp_path = file.path().to_path_buf();
        if let Err(cleanup) = file.close() {
            warn!(
                temp = %temp_path.display(),
                error = %cleanup,
                "failed to remove temp file after failed rename"
            );
        }
        return Err(FsError::AtomicWrite {
            path: path.into(),
            source: error,
        });
    }

    sync_dir(parent);
    Ok(())
}

/// Makes a completed rename durable. Failures only cost durability, not
/// consistency, so they are logged and ignored.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "directory sync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

/// Reads a whole file.
pub fn read_file(path: &Path) -> Result<Vec<u8>, FsError> {
    fs::read(path).map_err(|e| FsError::from_io(path, e))
}

/// Removes a file.
pub fn remove_file(path: &Path) -> Result<(), FsError> {
    fs::remove_file(path).map_err(|e| FsError::from_io(path, e))
}

/// Returns true for names produced by [`write_atomic`]'s temporary files.
pub fn is_temp_file_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// Removes temporary files orphaned by a crash between write and rename.
///
/// Best-effort: failures are logged and skipped. Must not run while writes
/// are in flight under `root`, since it cannot tell orphaned temp files from
/// live ones. Returns the number of files removed.
pub fn sweep_temp_files(root: &Path) -> usize {
    let mut removed = 0;
    let orphans = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(is_temp_file_name));

    for entry in orphans {
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(path = %entry.path().display(), "removed orphaned temp file");
                removed += 1;
            }
            Err(e) => warn!(
                path = %entry.path().display(),
                error = %e,
                "failed to remove orphaned temp file"
            ),
        }
    }
    removed
}
