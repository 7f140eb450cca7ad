//! Note struct: content plus the metadata that travels with it on disk.

use crate::domain::tag::normalize_tags;
use crate::domain::{NoteName, Tag};
use crate::infra::ContentHash;
use chrono::{DateTime, Utc};

/// Current on-disk note format version.
pub const FORMAT_VERSION: u32 = 1;

/// Integrity and versioning metadata stored alongside a note's content.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteMetadata {
    format_version: u32,
    last_backup_at: Option<DateTime<Utc>>,
    checksum: ContentHash,
}

impl NoteMetadata {
    /// Creates metadata for the current format version.
    pub fn new(checksum: ContentHash, last_backup_at: Option<DateTime<Utc>>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            last_backup_at,
            checksum,
        }
    }

    /// Returns the format version the note was written with.
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Returns when the note was last backed up, if ever.
    pub fn last_backup_at(&self) -> Option<DateTime<Utc>> {
        self.last_backup_at
    }

    /// Returns the stored content checksum.
    pub fn checksum(&self) -> &ContentHash {
        &self.checksum
    }
}

/// A named text record with tags and integrity metadata.
///
/// The checksum held in [`NoteMetadata`] is whatever was persisted; for notes
/// built in memory it always matches the content. Notes loaded from disk may
/// not, which is what [`Note::verify_checksum`] detects.
///
/// # Examples
///
/// ```
/// use pinthepiece::domain::{Note, NoteName};
/// use chrono::Utc;
///
/// let note = Note::new(NoteName::new("todo").unwrap(), "buy milk", Utc::now());
/// assert!(note.verify_checksum());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    name: NoteName,
    content: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    tags: Vec<Tag>,
    description: Option<String>,
    metadata: NoteMetadata,
}

/// Partial update applied by [`Note::apply`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteChanges {
    pub content: Option<String>,
    pub tags: Option<Vec<Tag>>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
}

impl NoteChanges {
    /// Returns true if no field would change.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.tags.is_none() && self.description.is_none()
    }
}

impl Note {
    /// Creates a fresh note whose timestamps are both `now`.
    pub fn new(name: NoteName, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        let content = content.into();
        let checksum = ContentHash::compute(content.as_bytes());
        Self {
            name,
            content,
            created_at: now,
            modified_at: now,
            tags: Vec::new(),
            description: None,
            metadata: NoteMetadata::new(checksum, None),
        }
    }

    /// Reassembles a note from persisted parts without recomputing the checksum.
    pub(crate) fn from_parts(
        name: NoteName,
        content: String,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
        tags: Vec<Tag>,
        description: Option<String>,
        metadata: NoteMetadata,
    ) -> Self {
        Self {
            name,
            content,
            created_at,
            modified_at,
            tags: normalize_tags(tags),
            description: normalize_description(description),
            metadata,
        }
    }

    /// Sets the tag set.
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    /// Sets the description. Empty or whitespace-only strings become `None`.
    pub fn with_description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = normalize_description(description.map(Into::into));
        self
    }

    /// Records when the note was last backed up.
    pub fn with_last_backup_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.metadata.last_backup_at = at;
        self
    }

    /// Returns a copy with `changes` applied and `modified_at` advanced to `now`.
    ///
    /// `modified_at` never moves backwards, even if the clock does. The
    /// checksum is recomputed from the new content.
    pub fn apply(&self, changes: &NoteChanges, now: DateTime<Utc>) -> Note {
        let mut next = self.clone();
        if let Some(content) = &changes.content {
            next.content = content.clone();
        }
        if let Some(tags) = &changes.tags {
            next.tags = normalize_tags(tags.clone());
        }
        if let Some(description) = &changes.description {
            next.description = normalize_description(Some(description.clone()));
        }
        next.touch(now)
    }

    /// Advances `modified_at` to `at` (never backwards) and refreshes the
    /// checksum and format version.
    pub fn touch(mut self, at: DateTime<Utc>) -> Note {
        self.modified_at = self.modified_at.max(at);
        self.metadata = NoteMetadata::new(
            ContentHash::compute(self.content.as_bytes()),
            self.metadata.last_backup_at,
        );
        self
    }

    /// Returns true if the stored checksum matches the content.
    pub fn verify_checksum(&self) -> bool {
        self.metadata.checksum.verify(self.content.as_bytes())
    }

    /// Returns the checksum the content actually hashes to.
    pub fn computed_checksum(&self) -> ContentHash {
        ContentHash::compute(self.content.as_bytes())
    }

    pub fn name(&self) -> &NoteName {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Returns the tags in canonical (sorted) order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn metadata(&self) -> &NoteMetadata {
        &self.metadata
    }

    /// Returns the stored checksum.
    pub fn checksum(&self) -> &ContentHash {
        &self.metadata.checksum
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
