//! Note file codec: the JSON document stored at a note's data path.
//!
//! ```json
//! {
//!   "content": "buy milk",
//!   "created_at": "2024-01-15T10:30:00Z",
//!   "modified_at": "2024-01-15T10:30:00Z",
//!   "tags": ["home"],
//!   "description": null,
//!   "metadata": { "format_version": 1, "last_backup_at": null, "checksum": "…" }
//! }
//! ```
//!
//! Files are upgraded on load through an explicit chain of per-version
//! migrations; see [`parse`].

use crate::domain::{FORMAT_VERSION, Note, NoteMetadata, NoteName, Tag};
use crate::infra::ContentHash;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Errors decoding a note file.
#[derive(Debug, Error)]
pub enum NoteFileError {
    #[error("invalid note JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported note format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("invalid legacy note: {0}")]
    Legacy(String),

    #[error("legacy note checksum does not match its content")]
    LegacyChecksumMismatch,
}

#[derive(Serialize, Deserialize)]
struct NoteFile {
    content: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    description: Option<String>,
    metadata: NoteFileMetadata,
}

#[derive(Serialize, Deserialize)]
struct NoteFileMetadata {
    format_version: u32,
    #[serde(default)]
    last_backup_at: Option<DateTime<Utc>>,
    checksum: ContentHash,
}

/// Serializes a note to its on-disk bytes (pretty JSON, trailing newline).
///
/// The name is not stored; it is the file stem.
pub fn serialize(note: &Note) -> Result<Vec<u8>, NoteFileError> {
    let file = NoteFile {
        content: note.content().to_string(),
        created_at: note.created_at(),
        modified_at: note.modified_at(),
        tags: note.tags().to_vec(),
        description: note.description().map(str::to_string),
        metadata: NoteFileMetadata {
            format_version: FORMAT_VERSION,
            last_backup_at: note.metadata().last_backup_at(),
            checksum: note.checksum().clone(),
        },
    };
    let mut bytes = serde_json::to_vec_pretty(&file)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses note file bytes, migrating older formats to the current one.
///
/// The stored checksum is carried through unverified so the caller can tell
/// corruption apart from a parse failure with [`Note::verify_checksum`].
///
/// # Errors
///
/// Returns `NoteFileError::Json` for malformed JSON or missing fields.
/// Returns `NoteFileError::UnsupportedVersion` for files newer than this build.
/// Returns `NoteFileError::Legacy` / `LegacyChecksumMismatch` when a legacy
/// file cannot be migrated.
pub fn parse(name: NoteName, bytes: &[u8]) -> Result<Note, NoteFileError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let version = detect_version(&value);
    let value = migrate(value, version)?;
    let file: NoteFile = serde_json::from_value(value)?;

    Ok(Note::from_parts(
        name,
        file.content,
        file.created_at,
        file.modified_at,
        file.tags,
        file.description,
        NoteMetadata::new(file.metadata.checksum, file.metadata.last_backup_at),
    ))
}

/// Reads the format version. Version 0 is the legacy layout, which used a
/// semver string (or no version at all) instead of an integer.
fn detect_version(value: &Value) -> u64 {
    value
        .get("metadata")
        .and_then(|m| m.get("format_version"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn migrate(mut value: Value, from: u64) -> Result<Value, NoteFileError> {
    let supported = u64::from(FORMAT_VERSION);
    if from > supported {
        return Err(NoteFileError::UnsupportedVersion {
            found: from,
            supported: FORMAT_VERSION,
        });
    }

    for version in from..supported {
        value = match version {
            0 => migrate_v0_to_v1(value)?,
            found => {
                return Err(NoteFileError::UnsupportedVersion {
                    found,
                    supported: FORMAT_VERSION,
                });
            }
        };
    }
    Ok(value)
}

/// Legacy files keyed timestamps as `created`/`modified` (naive, local-less
/// ISO strings), stored `metadata.last_backup`, and checksummed
/// `content + created + modified` instead of the content alone.
fn migrate_v0_to_v1(value: Value) -> Result<Value, NoteFileError> {
    let str_field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| NoteFileError::Legacy(format!("missing string field '{}'", key)))
    };

    let content = str_field("content")?;
    let created = str_field("created")?;
    let modified = str_field("modified")?;
    let metadata = value.get("metadata");

    if let Some(stored) = metadata
        .and_then(|m| m.get("checksum"))
        .and_then(Value::as_str)
    {
        let expected = ContentHash::compute(format!("{content}{created}{modified}").as_bytes());
        if !stored.eq_ignore_ascii_case(expected.as_str()) {
            return Err(NoteFileError::LegacyChecksumMismatch);
        }
    }

    let last_backup_at = metadata
        .and_then(|m| m.get("last_backup"))
        .and_then(Value::as_str)
        .map(parse_legacy_timestamp)
        .transpose()?;

    let tags: Vec<Tag> = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .filter_map(legacy_tag)
                .collect()
        })
        .unwrap_or_default();

    Ok(json!({
        "content": content,
        "created_at": parse_legacy_timestamp(created)?,
        "modified_at": parse_legacy_timestamp(modified)?,
        "tags": tags,
        "description": value.get("description").and_then(Value::as_str),
        "metadata": {
            "format_version": 1,
            "last_backup_at": last_backup_at,
            "checksum": ContentHash::compute(content.as_bytes()),
        },
    }))
}

/// Accepts RFC 3339 or a naive ISO timestamp, which is taken to be UTC.
fn parse_legacy_timestamp(s: &str) -> Result<DateTime<Utc>, NoteFileError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    s.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| NoteFileError::Legacy(format!("invalid timestamp '{}': {}", s, e)))
}

/// Legacy tags were free text; characters a tag may not hold become `-`.
fn legacy_tag(raw: &str) -> Option<Tag> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    Tag::new(&cleaned).ok()
}
