//! Isolated test environment with temp directory.

// Allow dead code since not every test binary uses every helper
#![allow(dead_code)]

use super::{PinCommand, TestNote};
use pinthepiece::domain::Note;
use pinthepiece::store::{NoteStore, StoreOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment with a temporary storage root.
///
/// Creates a temp directory that is automatically cleaned up on drop. The
/// CLI's config directory also points inside it, so a developer's own
/// config never leaks into tests.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    /// Storage root passed as `--dir`
    root: PathBuf,
    /// Stand-in for `$XDG_CONFIG_HOME`
    config_home: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("store");
        let config_home = temp_dir.path().join("config");
        std::fs::create_dir_all(&root).expect("Failed to create store root");
        std::fs::create_dir_all(&config_home).expect("Failed to create config dir");
        Self {
            _temp_dir: temp_dir,
            root,
            config_home,
        }
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.root.join("notes").join("index.json")
    }

    /// Returns the directory holding note files.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("notes").join("data")
    }

    /// Returns the directory holding backups.
    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("notes").join("backups")
    }

    /// Opens a store on this environment's root.
    pub fn open_store(&self) -> NoteStore {
        NoteStore::open(StoreOptions::new(&self.root)).expect("Failed to open store")
    }

    /// Adds a test note through the store and returns it.
    pub fn add_note(&self, test_note: &TestNote) -> Note {
        self.open_store()
            .create(
                test_note.name(),
                test_note.get_content(),
                test_note.tags().to_vec(),
                test_note.get_description().map(str::to_string),
            )
            .expect("Failed to create test note")
    }

    /// Writes `config.toml` where the CLI will look for it.
    pub fn write_config(&self, contents: &str) -> PathBuf {
        let dir = self.config_home.join("pinthepiece");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).expect("Failed to write config");
        path
    }

    /// Creates a PinCommand configured for this test environment.
    pub fn cmd(&self) -> PinCommand {
        PinCommand::new()
            .env("XDG_CONFIG_HOME", &self.config_home)
            .dir(&self.root)
    }

    /// Writes a file relative to the storage root and returns its path.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Lists the file names in the backups directory, sorted.
    pub fn backup_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.backups_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.root().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_add_note_creates_file() {
        let env = TestEnv::new();
        let note = env.add_note(&TestNote::new("todo").content("buy milk"));

        assert_eq!(note.content(), "buy milk");
        assert!(env.index_path().exists());
        assert!(env.data_dir().is_dir());
    }
}
