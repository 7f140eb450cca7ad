//! The note store: durable notes with backups, integrity checks, and an index.
//!
//! Every mutation follows the same shape: take the note's write lock, back up
//! whatever is about to be replaced or removed, write atomically, then update
//! the index. A failure at any step leaves the previous state readable.

mod check;
mod error;
mod locks;
mod summary;

pub use check::{CheckIssue, CheckReport};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use summary::SummaryStyle;

use crate::domain::{Note, NoteChanges, NoteName, Tag};
use crate::index::{
    BuildResult, IndexBuilder, IndexEntry, IndexError, IndexRepository, JsonIndex, SearchQuery,
    sort_by_recency,
};
use crate::infra::fs::{read_file, remove_file};
use crate::infra::layout::{INDEX_FILE, format_backup_timestamp};
use crate::infra::{
    AtomicWriter, BackupManager, BackupRecord, BackupSelector, FsError, FsWriter, StorageLayout,
    note_file, sweep_temp_files,
};
use chrono::Utc;
use locks::LockTable;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use summary::SummaryItem;
use tracing::{debug, info, warn};

/// Settings for [`NoteStore::open`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Storage root; notes live under `<root>/notes`.
    pub root: PathBuf,
    /// Rebuild the index from note files if it cannot be parsed.
    pub recover_corrupt_index: bool,
    /// Remove temp files left behind by interrupted writes.
    pub sweep_temp_on_open: bool,
}

impl StoreOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recover_corrupt_index: false,
            sweep_temp_on_open: true,
        }
    }

    pub fn recover_corrupt_index(mut self, recover: bool) -> Self {
        self.recover_corrupt_index = recover;
        self
    }

    pub fn sweep_temp_on_open(mut self, sweep: bool) -> Self {
        self.sweep_temp_on_open = sweep;
        self
    }
}

/// File-backed note storage, safe to share between threads.
///
/// One process owns a storage root at a time; concurrent callers within the
/// process are coordinated by per-note locks.
pub struct NoteStore {
    layout: StorageLayout,
    writer: Arc<dyn AtomicWriter>,
    backups: BackupManager,
    index: RwLock<JsonIndex>,
    locks: LockTable,
}

impl NoteStore {
    /// Opens (or initializes) the store at `options.root`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IndexCorrupt` if the index cannot be parsed and
    /// recovery is disabled.
    pub fn open(options: StoreOptions) -> StoreResult<Self> {
        Self::open_with_writer(options, Arc::new(FsWriter))
    }

    /// Opens the store, routing every file write through `writer`.
    pub fn open_with_writer(
        options: StoreOptions,
        writer: Arc<dyn AtomicWriter>,
    ) -> StoreResult<Self> {
        let layout = StorageLayout::new(&options.root);
        layout
            .ensure_dirs()
            .map_err(|e| FsError::from_io(layout.notes_dir(), e))?;

        if options.sweep_temp_on_open {
            let removed = sweep_temp_files(layout.notes_dir());
            if removed > 0 {
                info!(removed, "removed orphaned temp files");
            }
        }

        let index = match JsonIndex::load(layout.index_path(), writer.clone()) {
            Ok(index) => index,
            Err(source @ IndexError::Corrupt { .. }) => {
                if !options.recover_corrupt_index {
                    return Err(StoreError::IndexCorrupt {
                        path: layout.index_path(),
                        source,
                    });
                }
                warn!(error = %source, "index is corrupt, rebuilding from note files");
                recover_index(&layout, writer.clone())?
            }
            Err(e) => return Err(e.into()),
        };

        debug!(root = %layout.root().display(), notes = index.len(), "store opened");

        Ok(Self {
            backups: BackupManager::new(layout.clone(), writer.clone()),
            layout,
            writer,
            index: RwLock::new(index),
            locks: LockTable::default(),
        })
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    // ===========================================
    // Create / Read / Update / Delete
    // ===========================================

    /// Creates a new note.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the name is taken.
    pub fn create(
        &self,
        name: &NoteName,
        content: impl Into<String>,
        tags: Vec<Tag>,
        description: Option<String>,
    ) -> StoreResult<Note> {
        let lock = self.locks.get(name);
        let _guard = lock.write();

        if self.index_read().lookup(name).is_some() {
            return Err(StoreError::AlreadyExists(name.clone()));
        }

        let note = Note::new(name.clone(), content, Utc::now())
            .with_tags(tags)
            .with_description(description);
        let relative = self.layout.relative_data_path(name, note.created_at());
        let path = self.layout.resolve(&relative);

        // An unindexed file may already sit at this path; keep a copy of it.
        self.backups
            .backup(name, &path)
            .map_err(|e| StoreError::from_backup(name, e))?;

        self.write_note(&note, &path)?;

        let persisted = self.index_write().upsert(IndexEntry::from_note(&note, relative));
        if let Err(e) = persisted {
            self.rollback_file(name, &path, None);
            return Err(e.into());
        }

        info!(name = %name, "note created");
        Ok(note)
    }

    /// Reads a note, verifying its checksum.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the note is not indexed, and
    /// `StoreError::Integrity` if the file does not match its checksum or the
    /// index.
    pub fn read(&self, name: &NoteName) -> StoreResult<Note> {
        let lock = self.locks.get(name);
        let _guard = lock.read();

        let entry = self.entry(name)?;
        self.load_note(&entry)
    }

    /// Applies `changes` to an existing note.
    ///
    /// The current version is backed up first; if that fails nothing is
    /// written.
    pub fn update(&self, name: &NoteName, changes: NoteChanges) -> StoreResult<Note> {
        let lock = self.locks.get(name);
        let _guard = lock.write();

        let entry = self.entry(name)?;
        let current = self.load_note(&entry)?;
        let path = self.layout.resolve(entry.relative_path());

        let record = self
            .backups
            .backup(name, &path)
            .map_err(|e| StoreError::from_backup(name, e))?;
        let last_backup_at = record
            .as_ref()
            .map(BackupRecord::timestamp)
            .or(current.metadata().last_backup_at());

        let next = current
            .apply(&changes, Utc::now())
            .with_last_backup_at(last_backup_at);
        self.write_note(&next, &path)?;

        let updated = IndexEntry::from_note(&next, entry.relative_path().to_path_buf());
        let persisted = self.index_write().upsert(updated);
        if let Err(e) = persisted {
            self.rollback_file(name, &path, record.as_ref());
            return Err(e.into());
        }

        info!(name = %name, "note updated");
        Ok(next)
    }

    /// Deletes a note after backing it up. Returns the backup taken, if the
    /// file still existed.
    pub fn delete(&self, name: &NoteName) -> StoreResult<Option<BackupRecord>> {
        let lock = self.locks.get(name);
        let _guard = lock.write();

        let entry = self.entry(name)?;
        let path = self.layout.resolve(entry.relative_path());

        let record = self
            .backups
            .backup(name, &path)
            .map_err(|e| StoreError::from_backup(name, e))?;

        match remove_file(&path) {
            Ok(()) => {}
            Err(FsError::NotFound { .. }) => {
                warn!(name = %name, path = %path.display(), "note file already missing, dropping index entry");
            }
            Err(e) => return Err(e.into()),
        }

        let removed = self.index_write().remove(name);
        if let Err(e) = removed {
            if record.is_some() {
                self.rollback_file(name, &path, record.as_ref());
            }
            return Err(e.into());
        }

        info!(name = %name, "note deleted");
        Ok(record)
    }

    // ===========================================
    // Listing and search
    // ===========================================

    /// Lists all notes (index entries only), name ascending.
    pub fn list(&self) -> Vec<IndexEntry> {
        self.index_read().list()
    }

    /// Searches notes; results are newest first.
    ///
    /// Entries are matched against the index first. Notes whose content was
    /// cut off in the index preview are then read in full and matched again.
    pub fn search(&self, query: &SearchQuery) -> Vec<IndexEntry> {
        let (mut hits, truncated): (Vec<_>, Vec<_>) = {
            let index = self.index_read();
            index
                .list()
                .into_iter()
                .filter(|e| query.matches(e) || query.needs_content(e))
                .partition(|e| query.matches(e))
        };

        for entry in truncated {
            match self.read(entry.name()) {
                Ok(note) if query.matches_content(note.content()) => hits.push(entry),
                Ok(_) => {}
                Err(e) => debug!(name = %entry.name(), error = %e, "skipped note during search"),
            }
        }

        sort_by_recency(&mut hits);
        hits
    }

    // ===========================================
    // Backups
    // ===========================================

    /// Restores a note from one of its backups.
    ///
    /// The live version, if any, is backed up first. The restored note's
    /// `modified_at` is never earlier than the version it replaces.
    pub fn restore(&self, name: &NoteName, selector: BackupSelector) -> StoreResult<Note> {
        let lock = self.locks.get(name);
        let _guard = lock.write();

        let record = self
            .backups
            .find(name, selector)
            .map_err(|e| StoreError::from_backup(name, e))?;
        let bytes = self
            .backups
            .read(&record)
            .map_err(|e| StoreError::from_backup(name, e))?;
        let restored =
            note_file::parse(name.clone(), &bytes).map_err(|source| StoreError::Format {
                path: record.path().to_path_buf(),
                source,
            })?;
        if !restored.verify_checksum() {
            return Err(StoreError::Integrity {
                name: name.clone(),
                reason: format!("backup {} does not match its checksum", record.label()),
            });
        }

        let live = self.index_read().lookup(name).cloned();
        let live_path = live.as_ref().map(|e| self.layout.resolve(e.relative_path()));
        let pre_restore = match &live_path {
            Some(p) => self
                .backups
                .backup(name, p)
                .map_err(|e| StoreError::from_backup(name, e))?,
            None => None,
        };

        let now = Utc::now();
        let floor = live.as_ref().map_or(now, |e| e.modified_at().max(now));
        let last_backup_at = pre_restore
            .as_ref()
            .map(BackupRecord::timestamp)
            .or(restored.metadata().last_backup_at());
        let restored = restored.touch(floor).with_last_backup_at(last_backup_at);

        let relative = self.layout.relative_data_path(name, restored.created_at());
        let path = self.layout.resolve(&relative);
        self.write_note(&restored, &path)?;

        let replaced_in_place = live_path.as_deref() == Some(path.as_path());
        let persisted = self.index_write().upsert(IndexEntry::from_note(&restored, relative));
        if let Err(e) = persisted {
            let previous = if replaced_in_place { pre_restore.as_ref() } else { None };
            self.rollback_file(name, &path, previous);
            return Err(e.into());
        }

        if let Some(old) = live_path.filter(|_| !replaced_in_place) {
            match remove_file(&old) {
                Ok(()) | Err(FsError::NotFound { .. }) => {}
                Err(e) => warn!(name = %name, error = %e, "failed to remove replaced note file"),
            }
        }

        info!(name = %name, backup = %record.label(), "note restored");
        Ok(restored)
    }

    /// Lists a note's backups, oldest first. Works for deleted notes too.
    pub fn backups(&self, name: &NoteName) -> StoreResult<Vec<BackupRecord>> {
        self.backups
            .list(name)
            .map_err(|e| StoreError::from_backup(name, e))
    }

    /// Deletes all but the newest `keep` backups of a note.
    pub fn prune_backups(&self, name: &NoteName, keep: usize) -> StoreResult<Vec<BackupRecord>> {
        let lock = self.locks.get(name);
        let _guard = lock.write();

        let removed = self
            .backups
            .prune(name, keep)
            .map_err(|e| StoreError::from_backup(name, e))?;
        info!(name = %name, removed = removed.len(), keep, "backups pruned");
        Ok(removed)
    }

    // ===========================================
    // Maintenance
    // ===========================================

    /// Compares the index with the note files on disk.
    pub fn check(&self) -> CheckReport {
        let indexed = self.index_read().list();
        let scan = IndexBuilder::new(self.layout.clone()).scan();
        check::build_report(&self.layout, &indexed, scan)
    }

    /// Replaces the index with a fresh scan of the note files.
    ///
    /// Files that fail to parse or verify are left out and reported. The scan
    /// runs without the index lock; a note written while it runs may need
    /// another rebuild to appear.
    pub fn rebuild_index(&self) -> StoreResult<BuildResult> {
        let result = IndexBuilder::new(self.layout.clone()).scan();
        self.index_write().replace_all(result.entries.clone())?;
        for error in &result.errors {
            warn!(error = %error, "skipped note file during rebuild");
        }
        info!(
            notes = result.entries.len(),
            skipped = result.errors.len(),
            "index rebuilt"
        );
        Ok(result)
    }

    /// Renders a plain-text summary of every note.
    ///
    /// Detailed summaries read each note; one that fails to load is listed
    /// without its content.
    pub fn summarize(&self, style: SummaryStyle) -> String {
        let entries = self.list();
        let items: Vec<SummaryItem<'_>> = match style {
            SummaryStyle::Brief => entries.iter().map(SummaryItem::Brief).collect(),
            SummaryStyle::Detailed => entries
                .iter()
                .map(|entry| SummaryItem::Detailed {
                    entry,
                    content: self
                        .read(entry.name())
                        .map(|note| note.content().to_string())
                        .map_err(|e| e.to_string()),
                })
                .collect(),
        };
        summary::render(style, &items)
    }

    // ===========================================
    // Internals
    // ===========================================

    fn index_read(&self) -> RwLockReadGuard<'_, JsonIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn index_write(&self) -> RwLockWriteGuard<'_, JsonIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, name: &NoteName) -> StoreResult<IndexEntry> {
        self.index_read()
            .lookup(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }

    /// Loads the file behind `entry`, checking it against its own checksum
    /// and against the index.
    fn load_note(&self, entry: &IndexEntry) -> StoreResult<Note> {
        let name = entry.name();
        let path = self.layout.resolve(entry.relative_path());
        let bytes = match read_file(&path) {
            Ok(bytes) => bytes,
            Err(FsError::NotFound { .. }) => {
                return Err(StoreError::Integrity {
                    name: name.clone(),
                    reason: format!("note file {} is missing", path.display()),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let note = note_file::parse(name.clone(), &bytes)
            .map_err(|source| StoreError::Format { path, source })?;

        if !note.verify_checksum() {
            return Err(StoreError::Integrity {
                name: name.clone(),
                reason: "content does not match the stored checksum".to_string(),
            });
        }
        if note.checksum() != entry.checksum() {
            return Err(StoreError::Integrity {
                name: name.clone(),
                reason: "file checksum does not match the index".to_string(),
            });
        }
        Ok(note)
    }

    fn write_note(&self, note: &Note, path: &Path) -> StoreResult<()> {
        let bytes = note_file::serialize(note).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        self.writer
            .write(path, &bytes)
            .map_err(|source| StoreError::Write {
                name: note.name().clone(),
                source,
            })?;
        debug!(name = %note.name(), path = %path.display(), "note file written");
        Ok(())
    }

    /// Puts `path` back the way it was before a failed operation: the bytes
    /// of `previous` if given, otherwise no file at all. Best-effort.
    fn rollback_file(&self, name: &NoteName, path: &Path, previous: Option<&BackupRecord>) {
        let result = match previous {
            Some(record) => self
                .backups
                .read(record)
                .map_err(|e| e.to_string())
                .and_then(|bytes| self.writer.write(path, &bytes).map_err(|e| e.to_string())),
            None => match remove_file(path) {
                Ok(()) | Err(FsError::NotFound { .. }) => Ok(()),
                Err(e) => Err(e.to_string()),
            },
        };
        match result {
            Ok(()) => debug!(name = %name, path = %path.display(), "rolled back note file"),
            Err(error) => warn!(
                name = %name,
                path = %path.display(),
                error = %error,
                "failed to roll back note file"
            ),
        }
    }
}

/// Moves the corrupt index aside and rebuilds it from the note files.
fn recover_index(layout: &StorageLayout, writer: Arc<dyn AtomicWriter>) -> StoreResult<JsonIndex> {
    let path = layout.index_path();
    let aside = path.with_file_name(format!(
        "{}.corrupt-{}",
        INDEX_FILE,
        format_backup_timestamp(Utc::now())
    ));
    std::fs::rename(&path, &aside).map_err(|e| FsError::from_io(&path, e))?;
    warn!(path = %aside.display(), "moved corrupt index aside");

    let result = IndexBuilder::new(layout.clone()).scan();
    for error in &result.errors {
        warn!(error = %error, "skipped note file during index recovery");
    }

    let mut index = JsonIndex::empty(path, writer);
    let recovered = result.entries.len();
    index.replace_all(result.entries)?;
    info!(notes = recovered, "index recovered");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchField;
    use crate::testing::FlakyWriter;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{OnceLock, Weak};
    use tempfile::TempDir;

    fn name(s: &str) -> NoteName {
        NoteName::new(s).unwrap()
    }

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    fn open(dir: &TempDir) -> NoteStore {
        NoteStore::open(StoreOptions::new(dir.path())).unwrap()
    }

    fn open_flaky(dir: &TempDir) -> (NoteStore, Arc<FlakyWriter>) {
        let writer = Arc::new(FlakyWriter::default());
        let store =
            NoteStore::open_with_writer(StoreOptions::new(dir.path()), writer.clone()).unwrap();
        (store, writer)
    }

    fn content_change(content: &str) -> NoteChanges {
        NoteChanges {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn note_path(store: &NoteStore, n: &str) -> PathBuf {
        let entry = store.index_read().lookup(&name(n)).cloned().unwrap();
        store.layout.resolve(entry.relative_path())
    }

    // ===========================================
    // open
    // ===========================================

    #[test]
    fn open_creates_layout_and_index() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        assert!(store.layout.data_dir().is_dir());
        assert!(store.layout.backups_dir().is_dir());
        assert!(store.layout.index_path().is_file());
        assert_eq!(store.root(), dir.path());
    }

    #[test]
    fn open_sweeps_temp_files() {
        let dir = TempDir::new().unwrap();
        drop(open(&dir));
        let orphan = dir.path().join("notes/data/.pin-abc.tmp");
        fs::write(&orphan, "partial").unwrap();

        drop(open(&dir));

        assert!(!orphan.exists());
    }

    #[test]
    fn corrupt_index_is_an_error_without_recovery() {
        let dir = TempDir::new().unwrap();
        drop(open(&dir));
        fs::write(dir.path().join("notes/index.json"), "{ nope").unwrap();

        let result = NoteStore::open(StoreOptions::new(dir.path()));

        assert!(matches!(result, Err(StoreError::IndexCorrupt { .. })));
    }

    #[test]
    fn corrupt_index_is_rebuilt_with_recovery() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "buy milk", vec![tag("home")], None).unwrap();
        drop(store);
        fs::write(dir.path().join("notes/index.json"), "{ nope").unwrap();

        let store =
            NoteStore::open(StoreOptions::new(dir.path()).recover_corrupt_index(true)).unwrap();

        assert_eq!(store.read(&name("todo")).unwrap().content(), "buy milk");
        let moved_aside = fs::read_dir(dir.path().join("notes"))
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("index.json.corrupt-"));
        assert!(moved_aside);
    }

    // ===========================================
    // create / read
    // ===========================================

    #[test]
    fn create_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        let created = store
            .create(&name("todo"), "buy milk", vec![tag("home")], Some("groceries".into()))
            .unwrap();
        let read = store.read(&name("todo")).unwrap();

        assert_eq!(read, created);
        assert_eq!(read.description(), Some("groceries"));
    }

    #[test]
    fn create_duplicate_is_already_exists() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "a", vec![], None).unwrap();

        let result = store.create(&name("todo"), "b", vec![], None);

        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "a");
    }

    #[test]
    fn create_with_failed_index_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_flaky(&dir);

        writer.fail_paths_containing("index.json");
        let result = store.create(&name("todo"), "a", vec![], None);
        writer.heal();

        assert!(matches!(result, Err(StoreError::Index(_))));
        assert!(store.list().is_empty());
        assert!(IndexBuilder::new(store.layout.clone()).scan().entries.is_empty());
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        assert!(matches!(
            store.read(&name("ghost")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn read_detects_tampered_content() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "buy milk", vec![], None).unwrap();
        let path = note_path(&store, "todo");
        let tampered = fs::read_to_string(&path).unwrap().replace("buy milk", "buy beer");
        fs::write(&path, tampered).unwrap();

        let err = store.read(&name("todo")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(!err.to_string().contains("beer"));
    }

    #[test]
    fn read_detects_file_swapped_behind_index() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "buy milk", vec![], None).unwrap();
        let path = note_path(&store, "todo");
        let other = Note::new(name("todo"), "something else", Utc::now());
        fs::write(&path, note_file::serialize(&other).unwrap()).unwrap();

        let err = store.read(&name("todo")).unwrap_err();

        assert!(matches!(err, StoreError::Integrity { .. }));
    }

    // ===========================================
    // update
    // ===========================================

    #[test]
    fn update_backs_up_previous_version() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        let updated = store.update(&name("todo"), content_change("v2")).unwrap();

        let backups = store.backups(&name("todo")).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            updated.metadata().last_backup_at(),
            Some(backups[0].timestamp())
        );
        let old = note_file::parse(name("todo"), &fs::read(backups[0].path()).unwrap()).unwrap();
        assert_eq!(old.content(), "v1");
    }

    #[test]
    fn update_keeps_fields_not_changed() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let created = store
            .create(&name("todo"), "v1", vec![tag("home")], Some("d".into()))
            .unwrap();

        let updated = store.update(&name("todo"), content_change("v2")).unwrap();

        assert_eq!(updated.tags(), &[tag("home")]);
        assert_eq!(updated.description(), Some("d"));
        assert_eq!(updated.created_at(), created.created_at());
        assert!(updated.modified_at() >= created.modified_at());
    }

    #[test]
    fn update_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let result = store.update(&name("ghost"), content_change("x"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn failed_backup_aborts_update() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_flaky(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        writer.fail_paths_containing("backups");
        let result = store.update(&name("todo"), content_change("v2"));
        writer.heal();

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Backup);
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v1");
    }

    #[test]
    fn failed_write_leaves_previous_content() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_flaky(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        writer.fail_paths_containing("todo.json");
        let result = store.update(&name("todo"), content_change("v2"));
        writer.heal();

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v1");
    }

    #[test]
    fn failed_index_write_rolls_update_back() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_flaky(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        writer.fail_paths_containing("index.json");
        let result = store.update(&name("todo"), content_change("v2"));
        writer.heal();

        assert!(matches!(result, Err(StoreError::Index(_))));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v1");
    }

    #[test]
    fn update_refuses_corrupt_note() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "buy milk", vec![], None).unwrap();
        let path = note_path(&store, "todo");
        let tampered = fs::read_to_string(&path).unwrap().replace("milk", "beer");
        fs::write(&path, tampered).unwrap();

        let result = store.update(&name("todo"), content_change("x"));

        assert!(matches!(result, Err(StoreError::Integrity { .. })));
        assert!(store.backups(&name("todo")).unwrap().is_empty());
    }

    // ===========================================
    // delete
    // ===========================================

    #[test]
    fn delete_backs_up_and_removes() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();
        let path = note_path(&store, "todo");

        let record = store.delete(&name("todo")).unwrap().unwrap();

        assert!(!path.exists());
        assert!(record.path().exists());
        assert!(matches!(
            store.read(&name("todo")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn delete_with_missing_file_drops_entry() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();
        fs::remove_file(note_path(&store, "todo")).unwrap();

        assert_eq!(store.delete(&name("todo")).unwrap(), None);
        assert!(store.list().is_empty());
    }

    #[test]
    fn failed_index_write_restores_deleted_file() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_flaky(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        writer.fail_paths_containing("index.json");
        let result = store.delete(&name("todo"));
        writer.heal();

        assert!(matches!(result, Err(StoreError::Index(_))));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v1");
    }

    // ===========================================
    // restore
    // ===========================================

    #[test]
    fn restore_after_delete_brings_note_back() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "v1", vec![tag("home")], None).unwrap();
        store.delete(&name("todo")).unwrap();

        let restored = store.restore(&name("todo"), BackupSelector::Latest).unwrap();

        assert_eq!(restored.content(), "v1");
        assert_eq!(restored.tags(), &[tag("home")]);
        assert_eq!(store.read(&name("todo")).unwrap(), restored);
    }

    #[test]
    fn restore_over_live_note_backs_it_up_and_advances_time() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();
        let v2 = store.update(&name("todo"), content_change("v2")).unwrap();

        let restored = store.restore(&name("todo"), BackupSelector::Latest).unwrap();

        assert_eq!(restored.content(), "v1");
        assert!(restored.modified_at() >= v2.modified_at());
        let backups = store.backups(&name("todo")).unwrap();
        assert_eq!(backups.len(), 2);
        let latest = note_file::parse(name("todo"), &fs::read(backups[1].path()).unwrap()).unwrap();
        assert_eq!(latest.content(), "v2");
    }

    #[test]
    fn restore_without_backup_is_backup_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let err = store
            .restore(&name("todo"), BackupSelector::Latest)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackupNotFound);
    }

    #[test]
    fn restore_rejects_tampered_backup() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "buy milk", vec![], None).unwrap();
        let record = store.delete(&name("todo")).unwrap().unwrap();
        let tampered = fs::read_to_string(record.path())
            .unwrap()
            .replace("milk", "beer");
        fs::write(record.path(), tampered).unwrap();

        let result = store.restore(&name("todo"), BackupSelector::Latest);

        assert!(matches!(result, Err(StoreError::Integrity { .. })));
        assert!(store.list().is_empty());
    }

    // ===========================================
    // search
    // ===========================================

    #[test]
    fn search_finds_text_beyond_index_preview() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let long = format!("{} eggs", "x".repeat(200));
        store.create(&name("long"), long, vec![], None).unwrap();
        store.create(&name("short"), "buy milk", vec![], None).unwrap();

        let hits = store.search(&SearchQuery::new().text("eggs"));

        let names: Vec<_> = hits.iter().map(|e| e.name().as_str()).collect();
        assert_eq!(names, vec!["long"]);
    }

    #[test]
    fn search_trims_padded_text() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "buy eggs", vec![], None).unwrap();

        assert_eq!(store.search(&SearchQuery::new().text(" eggs ")).len(), 1);
    }

    #[test]
    fn search_fields_limit_full_content_matching() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let long = format!("{} eggs", "x".repeat(200));
        store
            .create(&name("long"), long, vec![], Some("shopping".to_string()))
            .unwrap();

        let description_only = SearchQuery::new()
            .text("eggs")
            .fields(vec![SearchField::Description]);
        assert!(store.search(&description_only).is_empty());

        let by_description = SearchQuery::new()
            .text("shop")
            .fields(vec![SearchField::Description]);
        assert_eq!(store.search(&by_description).len(), 1);
    }

    #[test]
    fn search_merges_full_content_hits_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store
            .create(&name("old"), format!("{} eggs", "x".repeat(200)), vec![], None)
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.create(&name("new"), "eggs", vec![], None).unwrap();

        let hits = store.search(&SearchQuery::new().text("eggs"));

        let names: Vec<_> = hits.iter().map(|e| e.name().as_str()).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[test]
    fn search_skips_unreadable_long_notes() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store
            .create(&name("long"), format!("{} eggs", "x".repeat(200)), vec![], None)
            .unwrap();
        let path = note_path(&store, "long");
        let text = fs::read_to_string(&path).unwrap().replace("eggs", "eels");
        fs::write(&path, text).unwrap();

        assert!(store.search(&SearchQuery::new().text("eels")).is_empty());
    }

    // ===========================================
    // index lock scope
    // ===========================================

    /// Records whether the index lock was free whenever a note file was
    /// written, and can fail index writes on demand.
    #[derive(Default)]
    struct LockWatchingWriter {
        store: OnceLock<Weak<NoteStore>>,
        fail_index: AtomicBool,
        index_locked_during_note_write: AtomicBool,
    }

    impl AtomicWriter for LockWatchingWriter {
        fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FsError> {
            if path.ends_with(INDEX_FILE) && self.fail_index.load(Ordering::SeqCst) {
                return Err(FsError::AtomicWrite {
                    path: path.into(),
                    source: std::io::Error::other("injected failure"),
                });
            }
            let is_note = path.components().any(|c| c.as_os_str() == "data");
            let store = self.store.get().and_then(Weak::upgrade);
            let index_busy = store.is_some_and(|s| s.index.try_write().is_err());
            if is_note && index_busy {
                self.index_locked_during_note_write
                    .store(true, Ordering::SeqCst);
            }
            crate::infra::write_atomic(path, bytes)
        }
    }

    fn open_watched(dir: &TempDir) -> (Arc<NoteStore>, Arc<LockWatchingWriter>) {
        let writer = Arc::new(LockWatchingWriter::default());
        let store = Arc::new(
            NoteStore::open_with_writer(StoreOptions::new(dir.path()), writer.clone()).unwrap(),
        );
        writer.store.set(Arc::downgrade(&store)).unwrap();
        (store, writer)
    }

    #[test]
    fn update_rollback_runs_without_index_lock() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_watched(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        writer.fail_index.store(true, Ordering::SeqCst);
        let result = store.update(&name("todo"), content_change("v2"));
        writer.fail_index.store(false, Ordering::SeqCst);

        assert!(matches!(result, Err(StoreError::Index(_))));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v1");
        assert!(!writer.index_locked_during_note_write.load(Ordering::SeqCst));
    }

    #[test]
    fn delete_rollback_runs_without_index_lock() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_watched(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();

        writer.fail_index.store(true, Ordering::SeqCst);
        let result = store.delete(&name("todo"));
        writer.fail_index.store(false, Ordering::SeqCst);

        assert!(matches!(result, Err(StoreError::Index(_))));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v1");
        assert!(!writer.index_locked_during_note_write.load(Ordering::SeqCst));
    }

    #[test]
    fn restore_rollback_runs_without_index_lock() {
        let dir = TempDir::new().unwrap();
        let (store, writer) = open_watched(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();
        store.update(&name("todo"), content_change("v2")).unwrap();

        writer.fail_index.store(true, Ordering::SeqCst);
        let result = store.restore(&name("todo"), BackupSelector::Latest);
        writer.fail_index.store(false, Ordering::SeqCst);

        assert!(matches!(result, Err(StoreError::Index(_))));
        assert_eq!(store.read(&name("todo")).unwrap().content(), "v2");
        assert!(!writer.index_locked_during_note_write.load(Ordering::SeqCst));
    }

    #[test]
    fn rebuild_index_alongside_reads_and_writes() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open(&dir));
        for i in 0..20 {
            store
                .create(&name(&format!("n{i}")), format!("body {i}"), vec![], None)
                .unwrap();
        }

        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(store.list().len(), 20);
                    store.read(&name("n3")).unwrap();
                }
            })
        };
        for _ in 0..5 {
            let result = store.rebuild_index().unwrap();
            assert_eq!(result.entries.len(), 20);
        }
        reader.join().unwrap();

        assert!(store.check().is_ok());
    }

    // ===========================================
    // prune / check / rebuild / summarize
    // ===========================================

    #[test]
    fn prune_keeps_newest_backups() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("todo"), "v1", vec![], None).unwrap();
        for v in ["v2", "v3", "v4"] {
            store.update(&name("todo"), content_change(v)).unwrap();
        }

        let removed = store.prune_backups(&name("todo"), 1).unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(store.backups(&name("todo")).unwrap().len(), 1);
    }

    #[test]
    fn check_reports_orphans_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("kept"), "x", vec![], None).unwrap();
        store.create(&name("lost"), "y", vec![], None).unwrap();
        fs::remove_file(note_path(&store, "lost")).unwrap();
        let orphan = Note::new(name("stray"), "z", Utc::now());
        let orphan_path = store.layout.data_path(orphan.name(), orphan.created_at());
        fs::write(&orphan_path, note_file::serialize(&orphan).unwrap()).unwrap();

        let report = store.check();

        assert_eq!(report.checked, 2);
        assert_eq!(
            report.issues,
            vec![
                CheckIssue::MissingFile {
                    name: name("lost"),
                    path: store.layout.data_path(&name("lost"), store.list()[1].created_at()),
                },
                CheckIssue::Orphan {
                    name: name("stray"),
                    path: orphan_path,
                },
            ]
        );
    }

    #[test]
    fn rebuild_index_matches_files() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.create(&name("a"), "x", vec![], None).unwrap();
        store.create(&name("b"), "y", vec![], None).unwrap();
        let before = store.list();
        store.index_write().replace_all(Vec::new()).unwrap();

        let result = store.rebuild_index().unwrap();

        assert!(result.errors.is_empty());
        assert_eq!(store.list(), before);
        assert!(store.check().is_ok());
    }

    #[test]
    fn summarize_lists_every_note() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        assert_eq!(store.summarize(SummaryStyle::Brief), "No notes to summarize.");
        store.create(&name("todo"), "buy milk", vec![], None).unwrap();

        let brief = store.summarize(SummaryStyle::Brief);
        let detailed = store.summarize(SummaryStyle::Detailed);

        assert_eq!(brief, "Brief summary of 1 notes:\n\n- todo: buy milk");
        assert!(detailed.contains("Content: buy milk"));
    }
}
