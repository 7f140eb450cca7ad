//! Case-insensitive tag type for categorizing notes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A case-insensitive tag attached to a note.
///
/// Tags are normalized to lowercase, so `Home`, `home`, and `HOME` are the same
/// tag. A note's tags form a set: the order they were given in carries no
/// meaning, and [`normalize_tags`] puts them in a canonical sorted order.
///
/// # Validation Rules
/// - Non-empty after trimming
/// - Only ASCII alphanumerics, hyphens, and underscores
///
/// # Examples
///
/// ```
/// use pinthepiece::domain::Tag;
///
/// let tag = Tag::new(" Home ").unwrap();
/// assert_eq!(tag.as_str(), "home");
/// assert_eq!(tag, Tag::new("HOME").unwrap());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

/// Error returned when parsing an invalid tag.
#[derive(Debug, Clone)]
pub struct ParseTagError(String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl Tag {
    /// Creates a new Tag, trimming and lowercasing the input.
    ///
    /// # Errors
    ///
    /// Returns `ParseTagError` if the tag is empty or contains characters other
    /// than ASCII alphanumerics, hyphens, and underscores.
    pub fn new(s: &str) -> Result<Self, ParseTagError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ParseTagError("tag cannot be empty".to_string()));
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ParseTagError(format!(
                "invalid tag '{}': tags may contain only alphanumeric characters, hyphens, and underscores",
                normalized
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized tag value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sorts tags and removes duplicates, giving a tag set one canonical form.
pub fn normalize_tags(mut tags: Vec<Tag>) -> Vec<Tag> {
    tags.sort();
    tags.dedup();
    tags
}

/// Parses a list of raw strings into a normalized tag set.
pub fn parse_tags<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Tag>, ParseTagError> {
    let tags = raw
        .iter()
        .map(|s| Tag::new(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize_tags(tags))
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self.0)
    }
}

impl FromStr for Tag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
