//! Checksums, atomic file I/O, on-disk layout, the note file codec, backups

pub mod backup;
mod content_hash;
pub mod fs;
pub mod layout;
pub mod note_file;

pub use backup::{BackupError, BackupManager, BackupRecord, BackupSelector};
pub use content_hash::{ContentHash, ContentHashError};
pub use fs::{AtomicWriter, FsError, FsWriter, sweep_temp_files, write_atomic};
pub use layout::StorageLayout;
pub use note_file::NoteFileError;
