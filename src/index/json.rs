//! JSON-file index: the whole index lives in memory and is rewritten
//! atomically on every change.

use crate::domain::NoteName;
use crate::index::{IndexEntry, IndexError, IndexRepository, IndexResult};
use crate::infra::fs::read_file;
use crate::infra::{AtomicWriter, FsError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Current index file format version.
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct IndexFile {
    format_version: u32,
    #[serde(default)]
    notes: BTreeMap<NoteName, IndexEntry>,
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    format_version: u32,
    notes: &'a BTreeMap<NoteName, IndexEntry>,
}

/// Index backed by a single JSON file.
///
/// Not synchronized; the store wraps it in a lock.
pub struct JsonIndex {
    path: PathBuf,
    entries: BTreeMap<NoteName, IndexEntry>,
    writer: Arc<dyn AtomicWriter>,
}

impl JsonIndex {
    /// Loads the index at `path`, creating an empty one if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Corrupt` if the file exists but cannot be parsed.
    /// Returns `IndexError::UnsupportedVersion` if it was written by a newer version.
    pub fn load(path: impl Into<PathBuf>, writer: Arc<dyn AtomicWriter>) -> IndexResult<Self> {
        let path = path.into();
        let bytes = match read_file(&path) {
            Ok(bytes) => bytes,
            Err(FsError::NotFound { .. }) => {
                debug!(path = %path.display(), "no index file, starting empty");
                let index = Self::empty(path, writer);
                index.persist()?;
                return Ok(index);
            }
            Err(e) => return Err(e.into()),
        };

        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|source| {
            IndexError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;

        if file.format_version > INDEX_FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                path,
                found: file.format_version,
            });
        }

        // Key by each entry's own name, whatever the map key said.
        let entries = file
            .notes
            .into_values()
            .map(|e| (e.name().clone(), e))
            .collect();

        Ok(Self {
            path,
            entries,
            writer,
        })
    }

    /// Creates an empty, not yet persisted index at `path`.
    pub fn empty(path: impl Into<PathBuf>, writer: Arc<dyn AtomicWriter>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            writer,
        }
    }

    /// Returns the index file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> IndexResult<()> {
        let file = IndexFileRef {
            format_version: INDEX_FORMAT_VERSION,
            notes: &self.entries,
        };
        let mut bytes = serde_json::to_vec_pretty(&file).map_err(IndexError::Serialize)?;
        bytes.push(b'\n');
        self.writer.write(&self.path, &bytes)?;
        Ok(())
    }
}

impl IndexRepository for JsonIndex {
    fn upsert(&mut self, entry: IndexEntry) -> IndexResult<()> {
        let name = entry.name().clone();
        let previous = self.entries.insert(name.clone(), entry);

        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.entries.insert(name, old),
                None => self.entries.remove(&name),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, name: &NoteName) -> IndexResult<Option<IndexEntry>> {
        let Some(previous) = self.entries.remove(name) else {
            return Ok(None);
        };

        if let Err(e) = self.persist() {
            self.entries.insert(name.clone(), previous);
            return Err(e);
        }
        Ok(Some(previous))
    }

    fn replace_all(&mut self, entries: Vec<IndexEntry>) -> IndexResult<()> {
        let next = entries
            .into_iter()
            .map(|e| (e.name().clone(), e))
            .collect();
        let previous = std::mem::replace(&mut self.entries, next);

        if let Err(e) = self.persist() {
            self.entries = previous;
            return Err(e);
        }
        Ok(())
    }

    fn lookup(&self, name: &NoteName) -> Option<&IndexEntry> {
        self.entries.get(name)
    }

    fn list(&self) -> Vec<IndexEntry> {
        self.entries.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
