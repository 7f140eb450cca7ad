//! IndexRepository trait and the types it stores and returns.

use crate::domain::{Note, NoteName, Tag};
use crate::infra::{ContentHash, FsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of content characters kept in each entry for text search.
pub const PREVIEW_CHARS: usize = 160;

// ===========================================
// IndexError
// ===========================================

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index file exists but cannot be parsed.
    #[error("index file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The index file was written by a newer version.
    #[error("index file {path} has unsupported format version {found}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    /// The index could not be serialized.
    #[error("failed to serialize index: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Reading or writing the index file failed.
    #[error("index I/O failed: {0}")]
    Fs(#[from] FsError),
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

// ===========================================
// IndexEntry
// ===========================================

/// A note as stored in the index: enough to list and search without
/// opening note files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    name: NoteName,
    #[serde(default)]
    tags: Vec<Tag>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    relative_path: PathBuf,
    checksum: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    preview: String,
}

impl IndexEntry {
    /// Builds the entry for `note` stored at `relative_path`.
    pub fn from_note(note: &Note, relative_path: PathBuf) -> Self {
        Self {
            name: note.name().clone(),
            tags: note.tags().to_vec(),
            created_at: note.created_at(),
            modified_at: note.modified_at(),
            relative_path,
            checksum: note.checksum().clone(),
            description: note.description().map(str::to_string),
            preview: preview_of(note.content()),
        }
    }

    pub fn name(&self) -> &NoteName {
        &self.name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Returns the note file path relative to the notes directory.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn checksum(&self) -> &ContentHash {
        &self.checksum
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the first [`PREVIEW_CHARS`] characters of the content.
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

fn preview_of(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

// ===========================================
// SearchQuery
// ===========================================

/// A note field that free-text search looks in. The name is always searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Content,
    Tags,
    Description,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [
        SearchField::Content,
        SearchField::Tags,
        SearchField::Description,
    ];
}

/// Tag and text filter over index entries.
///
/// Tags must all be present (or any one of them with
/// [`SearchQuery::match_any_tags`]). Text matches the name or any selected
/// [`SearchField`], case-insensitively. An empty query matches everything.
///
/// The index only holds a content preview, so [`SearchQuery::matches`] can
/// miss text further into a note. Callers holding the full content use
/// [`SearchQuery::needs_content`] and [`SearchQuery::matches_content`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    tags: Vec<Tag>,
    text: Option<String>,
    fields: Vec<SearchField>,
    match_any_tags: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            text: None,
            fields: SearchField::ALL.to_vec(),
            match_any_tags: false,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires these tags.
    pub fn tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Requires a case-insensitive substring. Blank text is ignored.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let text = text.trim();
        self.text = (!text.is_empty()).then(|| text.to_lowercase());
        self
    }

    /// Restricts text search to `fields`. An empty list means all fields.
    pub fn fields(mut self, fields: Vec<SearchField>) -> Self {
        self.fields = if fields.is_empty() {
            SearchField::ALL.to_vec()
        } else {
            fields
        };
        self
    }

    /// Matches entries carrying any requested tag instead of all of them.
    pub fn match_any_tags(mut self, any: bool) -> Self {
        self.match_any_tags = any;
        self
    }

    /// Returns true if `entry` satisfies the query using indexed data alone.
    pub fn matches(&self, entry: &IndexEntry) -> bool {
        self.matches_tags(entry) && self.matches_text(entry)
    }

    /// Returns true if `entry` fails [`SearchQuery::matches`] only because its
    /// content was cut off in the preview.
    pub fn needs_content(&self, entry: &IndexEntry) -> bool {
        self.text.is_some()
            && self.searches(SearchField::Content)
            && entry.preview.chars().count() >= PREVIEW_CHARS
            && self.matches_tags(entry)
            && !self.matches_text(entry)
    }

    /// Returns true if the text appears in `content`.
    pub fn matches_content(&self, content: &str) -> bool {
        match &self.text {
            Some(needle) => {
                self.searches(SearchField::Content) && content.to_lowercase().contains(needle)
            }
            None => true,
        }
    }

    fn searches(&self, field: SearchField) -> bool {
        self.fields.contains(&field)
    }

    fn matches_tags(&self, entry: &IndexEntry) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        let have: HashSet<&Tag> = entry.tags.iter().collect();
        if self.match_any_tags {
            self.tags.iter().any(|t| have.contains(t))
        } else {
            self.tags.iter().all(|t| have.contains(t))
        }
    }

    fn matches_text(&self, entry: &IndexEntry) -> bool {
        let Some(needle) = &self.text else {
            return true;
        };
        entry.name.as_str().to_lowercase().contains(needle.as_str())
            || (self.searches(SearchField::Description)
                && entry
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(needle.as_str())))
            || (self.searches(SearchField::Tags)
                && entry.tags.iter().any(|t| t.as_str().contains(needle.as_str())))
            || (self.searches(SearchField::Content)
                && entry.preview.to_lowercase().contains(needle.as_str()))
    }
}

/// Orders entries most-recently-modified first, ties by name ascending.
pub fn sort_by_recency(entries: &mut [IndexEntry]) {
    entries.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.name.cmp(&b.name))
    });
}

// ===========================================
// IndexRepository
// ===========================================

/// Repository trait for the note index.
///
/// Every mutation is persisted before it returns. If persisting fails the
/// mutation is undone in memory too, so a returned error means nothing
/// changed.
pub trait IndexRepository {
    /// Inserts or replaces the entry for `entry.name()`.
    fn upsert(&mut self, entry: IndexEntry) -> IndexResult<()>;

    /// Removes the entry for `name`, returning it if it existed.
    fn remove(&mut self, name: &NoteName) -> IndexResult<Option<IndexEntry>>;

    /// Replaces the whole index (used after a rescan).
    fn replace_all(&mut self, entries: Vec<IndexEntry>) -> IndexResult<()>;

    /// Looks up one entry.
    fn lookup(&self, name: &NoteName) -> Option<&IndexEntry>;

    /// Lists all entries, name ascending.
    fn list(&self) -> Vec<IndexEntry>;

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns true if the index has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns matching entries, most recently modified first.
    fn search(&self, query: &SearchQuery) -> Vec<IndexEntry> {
        let mut hits: Vec<_> = self
            .list()
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        sort_by_recency(&mut hits);
        hits
    }
}
