//! SHA-1 content identifiers.

use serde::{Deserialize, Deserializer, Serialize};
use sha1::{Digest, Sha1};

/// Errors produced when a string is not a well-formed SHA-1 identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Sha1HashError {
    /// The string is not exactly 40 characters long.
    #[error("Invalid SHA1 length: expected 40 hex chars, got {0}")]
    InvalidLength(usize),

    /// The string contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid SHA1 digest: contains non-hex characters in '{0}'")]
    NonHex(String),
}

/// A content identifier: the lower-case hex SHA-1 digest of a file's bytes.
///
/// Local packages and registry entries are both keyed by this value, so it is
/// validated on construction and on deserialization. Upper-case input is
/// normalized to lower case to keep equality byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Sha1Hash(String);

impl Sha1Hash {
    /// Length of a hex-encoded SHA-1 digest.
    pub const HEX_LEN: usize = 40;

    /// Create a validated `Sha1Hash` from a hex string.
    ///
    /// # Errors
    ///
    /// Returns [`Sha1HashError`] if `s` is not exactly 40 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, Sha1HashError> {
        let s = s.into();
        if s.len() != Self::HEX_LEN {
            return Err(Sha1HashError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Sha1HashError::NonHex(s));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Compute the identifier of an in-memory byte slice.
    pub fn compute(data: &[u8]) -> Self {
        Self::from_digest(&Sha1::digest(data))
    }

    /// Build an identifier from a finished SHA-1 digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 12 hex characters).
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl<'de> Deserialize<'de> for Sha1Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha1Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
