//! Content checksums for integrity verification.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// SHA-256 checksum of a note's content.
///
/// Stored as a 64-character lowercase hex string. The digest covers only the
/// content bytes, so re-tagging a note or touching its timestamps never
/// changes its checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    hex: String,
}

/// Errors when parsing a checksum from a hex string.
#[derive(Debug, Error)]
pub enum ContentHashError {
    #[error("invalid checksum: expected 64 hex characters, got {0} characters")]
    InvalidLength(usize),

    #[error("invalid checksum character at position {position}: '{character}'")]
    InvalidCharacter { position: usize, character: char },
}

impl ContentHash {
    /// Computes the SHA-256 checksum of the given bytes.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hex = format!("{:x}", hasher.finalize());
        Self { hex }
    }

    /// Recomputes the checksum of `bytes` and compares it to this one.
    pub fn verify(&self, bytes: &[u8]) -> bool {
        Self::compute(bytes) == *self
    }

    /// Parses a checksum from a hex string, normalizing it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `ContentHashError::InvalidLength` if the string is not 64 characters.
    /// Returns `ContentHashError::InvalidCharacter` if it contains non-hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, ContentHashError> {
        if hex.len() != 64 {
            return Err(ContentHashError::InvalidLength(hex.len()));
        }

        if let Some((position, character)) =
            hex.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit())
        {
            return Err(ContentHashError::InvalidCharacter {
                position,
                character,
            });
        }

        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// Returns the checksum as a 64-character lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Returns the first 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.hex[..12]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.hex)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
