//! Test doubles shared by unit tests.

use crate::infra::{AtomicWriter, FsError, write_atomic};
use std::io;
use std::path::Path;
use std::sync::Mutex;

/// Writes through to disk unless the path contains an armed fragment.
#[derive(Default)]
pub(crate) struct FlakyWriter {
    failing: Mutex<Vec<String>>,
}

impl FlakyWriter {
    /// Makes every later write to a path containing `fragment` fail.
    pub(crate) fn fail_paths_containing(&self, fragment: &str) {
        self.failing.lock().unwrap().push(fragment.to_string());
    }

    /// Stops injecting failures.
    pub(crate) fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

impl AtomicWriter for FlakyWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FsError> {
        let display = path.to_string_lossy();
        let armed = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|f| display.contains(f.as_str()));
        if armed {
            return Err(FsError::AtomicWrite {
                path: path.into(),
                source: io::Error::other("injected failure"),
            });
        }
        write_atomic(path, bytes)
    }
}
