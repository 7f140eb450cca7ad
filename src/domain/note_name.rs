//! Note names: the business key and filename stem of every note.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a note name, in characters.
pub const MAX_NAME_LEN: usize = 128;

/// URI scheme the protocol layer uses to address notes.
pub const NOTE_URI_SCHEME: &str = "note://";

/// A validated note name.
///
/// The name doubles as the file stem on disk, so it is restricted to
/// characters that are safe in every filesystem and never contain a `.`
/// (which keeps `<name>.<timestamp>.bak` unambiguous). Names are
/// case-sensitive.
///
/// # Examples
///
/// ```
/// use pinthepiece::domain::NoteName;
///
/// let name = NoteName::new("todo").unwrap();
/// assert_eq!(name.as_str(), "todo");
/// assert!(NoteName::new("../etc/passwd").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteName(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseNoteNameErrorKind {
    Empty,
    TooLong(usize),
    InvalidChar(char),
}

/// Error returned when parsing an invalid note name.
#[derive(Debug, Clone)]
pub struct ParseNoteNameError {
    input: String,
    kind: ParseNoteNameErrorKind,
}

impl fmt::Display for ParseNoteNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseNoteNameErrorKind::Empty => write!(f, "invalid note name: name cannot be empty"),
            ParseNoteNameErrorKind::TooLong(len) => write!(
                f,
                "invalid note name: {} characters exceeds the maximum of {}",
                len, MAX_NAME_LEN
            ),
            ParseNoteNameErrorKind::InvalidChar(c) => write!(
                f,
                "invalid note name '{}': character '{}' is not allowed (use letters, digits, '-' or '_')",
                self.input, c
            ),
        }
    }
}

impl std::error::Error for ParseNoteNameError {}

impl NoteName {
    /// Creates a note name from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ParseNoteNameError` if the name is empty, longer than
    /// [`MAX_NAME_LEN`], or contains anything but ASCII alphanumerics, `-`, `_`.
    pub fn new(s: &str) -> Result<Self, ParseNoteNameError> {
        let trimmed = s.trim();
        let err = |kind| ParseNoteNameError {
            input: trimmed.to_string(),
            kind,
        };

        if trimmed.is_empty() {
            return Err(err(ParseNoteNameErrorKind::Empty));
        }

        let len = trimmed.chars().count();
        if len > MAX_NAME_LEN {
            return Err(err(ParseNoteNameErrorKind::TooLong(len)));
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(err(ParseNoteNameErrorKind::InvalidChar(bad)));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Parses a user-supplied reference: either a bare name or a `note://<name>` URI.
    pub fn parse_ref(s: &str) -> Result<Self, ParseNoteNameError> {
        let trimmed = s.trim();
        Self::new(trimmed.strip_prefix(NOTE_URI_SCHEME).unwrap_or(trimmed))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `note://` URI for this name.
    pub fn uri(&self) -> String {
        format!("{}{}", NOTE_URI_SCHEME, self.0)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteName(\"{}\")", self.0)
    }
}

impl FromStr for NoteName {
    type Err = ParseNoteNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NoteName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NoteName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
