//! Update resolution.
//!
//! Each stage is a pure function of the previous stage's output:
//! identifiers → [`DetailsMap`] → [`LoaderPartition`] → [`UpdatesByLoader`]
//! → one [`UpdateDecision`] per local package. Registry failures abort the
//! whole stage; there is no partial resolution.

use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::indexer::LocalPackage;
use crate::registry::{CandidateMap, DetailsMap, RegistryClient, RegistryError};
use crate::types::{FileRef, LoaderName, Sha1Hash};

/// Identifiers grouped by the loader their updates are looked up under.
pub type LoaderPartition = BTreeMap<LoaderName, BTreeSet<Sha1Hash>>;

/// Update candidates per loader.
pub type UpdatesByLoader = HashMap<LoaderName, CandidateMap>;

/// What should happen to a single local package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// The selected candidate is the file already installed.
    UpToDate,
    /// A different file is proposed as the replacement.
    UpdateAvailable(FileRef),
    /// The registry does not know this file.
    NoRegistryMatch,
    /// The registry knows the file but has no version for the target game
    /// version under its loader.
    NoVersionForTarget,
}

impl UpdateDecision {
    pub fn is_update(&self) -> bool {
        matches!(self, Self::UpdateAvailable(_))
    }

    /// Short label for logs and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::UpdateAvailable(_) => "update available",
            Self::NoRegistryMatch => "not found in registry",
            Self::NoVersionForTarget => "no version for target",
        }
    }
}

/// A local package together with its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub package: LocalPackage,
    pub decision: UpdateDecision,
}

/// Group identifiers by their primary loader.
///
/// Details without a loader are left out of every group.
pub fn partition_by_loader(details: &DetailsMap) -> LoaderPartition {
    let mut partition = LoaderPartition::new();
    for (identifier, entry) in details {
        if let Some(loader) = entry.primary_loader() {
            partition
                .entry(loader.clone())
                .or_default()
                .insert(identifier.clone());
        }
    }
    partition
}

/// Decide what to do with `package`.
///
/// 1. Unknown to the registry (or known without a loader) → `NoRegistryMatch`
/// 2. No candidate under its primary loader, or a candidate without files →
///    `NoVersionForTarget`
/// 3. First candidate file has the same SHA-1 → `UpToDate`
/// 4. Otherwise → `UpdateAvailable` with that file
pub fn resolve(
    package: &LocalPackage,
    details: &DetailsMap,
    updates: &UpdatesByLoader,
) -> UpdateDecision {
    let Some(loader) = details
        .get(&package.identifier)
        .and_then(|d| d.primary_loader())
    else {
        return UpdateDecision::NoRegistryMatch;
    };

    let Some(file) = updates
        .get(loader)
        .and_then(|candidates| candidates.get(&package.identifier))
        .and_then(|candidate| candidate.primary_file())
    else {
        return UpdateDecision::NoVersionForTarget;
    };

    if file.hashes.sha1 == package.identifier {
        UpdateDecision::UpToDate
    } else {
        UpdateDecision::UpdateAvailable(file.clone())
    }
}

/// Runs the bulk lookups for one target game version.
pub struct UpdateResolver<'a> {
    registry: &'a dyn RegistryClient,
    target_version: &'a str,
}

impl std::fmt::Debug for UpdateResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateResolver")
            .field("target_version", &self.target_version)
            .finish_non_exhaustive()
    }
}

impl<'a> UpdateResolver<'a> {
    pub fn new(registry: &'a dyn RegistryClient, target_version: &'a str) -> Self {
        Self {
            registry,
            target_version,
        }
    }

    /// Single bulk details lookup.
    ///
    /// Entries the registry returns for identifiers that were not asked for
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Propagates the registry's error unchanged.
    pub async fn fetch_details(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
    ) -> Result<DetailsMap, RegistryError> {
        if identifiers.is_empty() {
            return Ok(DetailsMap::new());
        }
        let mut details = self.registry.get_multiple_details(identifiers).await?;
        details.retain(|id, _| identifiers.contains(id));
        tracing::debug!(
            "registry knows {} of {} identifiers",
            details.len(),
            identifiers.len()
        );
        Ok(details)
    }

    /// One bulk update lookup per loader group, issued concurrently.
    ///
    /// # Errors
    ///
    /// Fails as soon as any loader's lookup fails.
    pub async fn fetch_updates(
        &self,
        partition: &LoaderPartition,
    ) -> Result<UpdatesByLoader, RegistryError> {
        let lookups = partition.iter().map(|(loader, identifiers)| async move {
            let candidates = self
                .registry
                .get_multiple_update_info(identifiers, self.target_version, loader)
                .await?;
            tracing::debug!(
                "{loader}: {} of {} identifiers have a version for {}",
                candidates.len(),
                identifiers.len(),
                self.target_version
            );
            Ok::<_, RegistryError>((loader.clone(), candidates))
        });

        Ok(try_join_all(lookups).await?.into_iter().collect())
    }

    /// Resolve every package: details, partition, updates, then decisions.
    ///
    /// Returns exactly one [`ResolvedPackage`] per input package, in input
    /// order.
    ///
    /// # Errors
    ///
    /// Fails if either bulk stage fails.
    pub async fn resolve_all(
        &self,
        packages: &[LocalPackage],
    ) -> Result<Vec<ResolvedPackage>, RegistryError> {
        let identifiers: BTreeSet<Sha1Hash> =
            packages.iter().map(|p| p.identifier.clone()).collect();

        let details = self.fetch_details(&identifiers).await?;
        let partition = partition_by_loader(&details);
        tracing::debug!(
            "loader groups: {:?}",
            partition
                .iter()
                .map(|(l, ids)| (l.as_str(), ids.len()))
                .collect::<Vec<_>>()
        );
        let updates = self.fetch_updates(&partition).await?;

        Ok(packages
            .iter()
            .map(|package| ResolvedPackage {
                decision: resolve(package, &details, &updates),
                package: package.clone(),
            })
            .collect())
    }
}
