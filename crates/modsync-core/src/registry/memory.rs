//! In-memory registry for tests.
//!
//! [`MemoryRegistry`] is a public test double: the binary never uses it, but
//! integration tests and downstream crates can drive [`crate::run`] against
//! it without a network. It answers bulk lookups from tables filled in up
//! front and records every update lookup it serves, so callers can check how
//! often each loader was queried.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use super::{CandidateMap, DetailsMap, RegistryClient, RegistryError};
use crate::types::{ApiErrorBody, LoaderName, RemoteDetails, Sha1Hash, UpdateCandidate};

/// A [`RegistryClient`] backed by fixed tables, for tests.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    details: DetailsMap,
    updates: HashMap<(LoaderName, String), CandidateMap>,
    details_error: Option<ApiErrorBody>,
    update_errors: HashMap<LoaderName, ApiErrorBody>,
    update_calls: Mutex<Vec<(LoaderName, Vec<Sha1Hash>)>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `identifier` as belonging to a version with `loaders`.
    pub fn with_details(mut self, identifier: &Sha1Hash, loaders: &[&str]) -> Self {
        let details = RemoteDetails {
            id: format!("version-{}", identifier.short()),
            project_id: format!("project-{}", identifier.short()),
            name: String::new(),
            version_number: String::new(),
            loaders: loaders.iter().map(|l| LoaderName::new(l)).collect(),
            game_versions: Vec::new(),
        };
        self.details.insert(identifier.clone(), details);
        self
    }

    /// Register the candidate proposed for `identifier` under `loader` and
    /// `game_version`.
    pub fn with_update(
        mut self,
        loader: &str,
        game_version: &str,
        identifier: &Sha1Hash,
        candidate: UpdateCandidate,
    ) -> Self {
        self.updates
            .entry((LoaderName::new(loader), game_version.to_string()))
            .or_default()
            .insert(identifier.clone(), candidate);
        self
    }

    /// Make the details lookup fail with `error`.
    pub fn failing_details(mut self, error: &str) -> Self {
        self.details_error = Some(ApiErrorBody {
            error: error.to_string(),
            description: String::new(),
        });
        self
    }

    /// Make update lookups for `loader` fail with `error`.
    pub fn failing_updates(mut self, loader: &str, error: &str) -> Self {
        self.update_errors.insert(
            LoaderName::new(loader),
            ApiErrorBody {
                error: error.to_string(),
                description: String::new(),
            },
        );
        self
    }

    /// Every update lookup served so far, as `(loader, identifiers)`.
    pub fn update_calls(&self) -> Vec<(LoaderName, Vec<Sha1Hash>)> {
        self.update_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn to_error(body: &ApiErrorBody) -> RegistryError {
    RegistryError::Api {
        error: body.error.clone(),
        description: body.description.clone(),
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn get_multiple_details(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
    ) -> Result<DetailsMap, RegistryError> {
        if let Some(body) = &self.details_error {
            return Err(to_error(body));
        }
        Ok(identifiers
            .iter()
            .filter_map(|id| self.details.get(id).map(|d| (id.clone(), d.clone())))
            .collect())
    }

    async fn get_multiple_update_info(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
        game_version: &str,
        loader: &LoaderName,
    ) -> Result<CandidateMap, RegistryError> {
        self.update_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((loader.clone(), identifiers.iter().cloned().collect()));

        if let Some(body) = self.update_errors.get(loader) {
            return Err(to_error(body));
        }
        let Some(table) = self
            .updates
            .get(&(loader.clone(), game_version.to_string()))
        else {
            return Ok(CandidateMap::new());
        };
        Ok(identifiers
            .iter()
            .filter_map(|id| table.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }
}
