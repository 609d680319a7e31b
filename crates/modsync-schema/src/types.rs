//! Registry wire types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::hash::Sha1Hash;

/// A normalized loader name (e.g. `fabric`, `forge`, `quilt`).
///
/// Loaders are the compatibility dimension updates are partitioned by; the
/// registry reports them in lower case, and the name is normalized so a
/// mixed-case entry cannot split a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct LoaderName(String);

impl LoaderName {
    /// Create a new loader name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LoaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LoaderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LoaderName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LoaderName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LoaderName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// Registry metadata for the version a local file belongs to.
///
/// Deserialized from the version objects returned by the bulk details lookup.
/// Only `loaders` drives decisions; the rest is carried for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDetails {
    /// Registry id of the version.
    #[serde(default)]
    pub id: String,
    /// Registry id of the project the version belongs to.
    #[serde(default)]
    pub project_id: String,
    /// Human readable version title.
    #[serde(default)]
    pub name: String,
    /// Version number as published by the author (e.g. `0.5.8+1.20.1`).
    #[serde(default)]
    pub version_number: String,
    /// Loaders this version supports, in registry order.
    #[serde(default)]
    pub loaders: Vec<LoaderName>,
    /// Game versions this version supports.
    #[serde(default)]
    pub game_versions: Vec<String>,
}

impl RemoteDetails {
    /// The loader updates are looked up under.
    ///
    /// The registry gives no ranking between loaders, so the first listed one
    /// is taken as authoritative. Returns `None` only for an empty list.
    pub fn primary_loader(&self) -> Option<&LoaderName> {
        self.loaders.first()
    }
}

/// Hashes the registry publishes for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    /// SHA-1 of the file; comparable with a local [`Sha1Hash`].
    pub sha1: Sha1Hash,
    /// SHA-512 of the file, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,
}

/// A downloadable file attached to a registry version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Direct download URL.
    pub url: String,
    /// File name the content should be stored under.
    pub filename: String,
    /// Published hashes of the content.
    pub hashes: FileHashes,
    /// Whether the registry flags this as the primary file of the version.
    #[serde(default)]
    pub primary: bool,
    /// Size in bytes, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// The newest version the registry proposes for a file under a loader and
/// game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCandidate {
    /// Registry id of the proposed version.
    #[serde(default)]
    pub id: String,
    /// Version number of the proposed version.
    #[serde(default)]
    pub version_number: String,
    /// Files of the proposed version, in registry order.
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl UpdateCandidate {
    /// The file selected as the replacement.
    ///
    /// As with loaders, the first listed file is authoritative; the `primary`
    /// flag is not consulted.
    pub fn primary_file(&self) -> Option<&FileRef> {
        self.files.first()
    }
}

/// Error payload returned by the registry on a failed bulk call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Short machine-readable error name.
    pub error: String,
    /// Longer human-readable description.
    #[serde(default)]
    pub description: String,
}
