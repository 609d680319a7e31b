//! Registry collaborator.
//!
//! The engine only needs two bulk lookups, both keyed by content identifier.
//! [`ModrinthClient`] speaks the real HTTP API; [`MemoryRegistry`] answers
//! from in-memory tables and exists for tests.

pub mod memory;
pub mod modrinth;

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

pub use memory::MemoryRegistry;
pub use modrinth::ModrinthClient;

use crate::types::{LoaderName, RemoteDetails, Sha1Hash, UpdateCandidate};

/// Details keyed by the identifier they were looked up with.
pub type DetailsMap = HashMap<Sha1Hash, RemoteDetails>;

/// Update candidates keyed by the identifier they were looked up with.
pub type CandidateMap = HashMap<Sha1Hash, UpdateCandidate>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry returned an error: {error}: {description}")]
    Api { error: String, description: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed registry response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Bulk lookups against a package registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Look up the version each identifier belongs to.
    ///
    /// Identifiers unknown to the registry are absent from the result.
    async fn get_multiple_details(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
    ) -> Result<DetailsMap, RegistryError>;

    /// Look up the newest version for each identifier that supports
    /// `game_version` under `loader`.
    ///
    /// Identifiers without such a version are absent from the result.
    async fn get_multiple_update_info(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
        game_version: &str,
        loader: &LoaderName,
    ) -> Result<CandidateMap, RegistryError>;
}
