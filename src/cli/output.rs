//! Output format types for CLI commands.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::domain::Note;
use crate::index::IndexEntry;
use crate::infra::BackupRecord;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
pub struct NoteListing {
    pub name: String,
    pub uri: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub checksum: String,
}

impl From<&IndexEntry> for NoteListing {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            name: entry.name().to_string(),
            uri: entry.name().uri(),
            tags: entry.tags().iter().map(|t| t.to_string()).collect(),
            description: entry.description().map(str::to_string),
            created_at: entry.created_at(),
            modified_at: entry.modified_at(),
            checksum: entry.checksum().to_string(),
        }
    }
}

/// A full note, as printed by `show --format json`.
#[derive(Debug, Serialize)]
pub struct NoteView {
    pub name: String,
    pub uri: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub checksum: String,
    pub last_backup_at: Option<DateTime<Utc>>,
}

impl From<&Note> for NoteView {
    fn from(note: &Note) -> Self {
        Self {
            name: note.name().to_string(),
            uri: note.name().uri(),
            content: note.content().to_string(),
            tags: note.tags().iter().map(|t| t.to_string()).collect(),
            description: note.description().map(str::to_string),
            created_at: note.created_at(),
            modified_at: note.modified_at(),
            checksum: note.checksum().to_string(),
            last_backup_at: note.metadata().last_backup_at(),
        }
    }
}

/// A backup in listing output.
#[derive(Debug, Serialize)]
pub struct BackupListing {
    pub name: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

impl From<&BackupRecord> for BackupListing {
    fn from(record: &BackupRecord) -> Self {
        Self {
            name: record.original_name().to_string(),
            label: record.label(),
            timestamp: record.timestamp(),
            path: record.path().to_string_lossy().to_string(),
        }
    }
}
