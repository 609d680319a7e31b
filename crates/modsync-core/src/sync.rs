//! Applying update decisions to the package directory.
//!
//! Downloads run on a bounded pool. Failures are split into two kinds: a
//! [`FailureKind::Recoverable`] failure is recorded and the run goes on, a
//! [`FailureKind::Fatal`] one cancels every in-flight download and ends the
//! run with an error.

use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::Reporter;
use crate::indexer::LocalPackage;
use crate::io::download::{DownloadError, DownloadRequest};
use crate::resolver::{ResolvedPackage, UpdateDecision};
use crate::types::{FileRef, Sha1Hash};

/// Whether a failed sync lets the run continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-level or bad registry data; counted, the run continues.
    Recoverable,
    /// Local filesystem or internal failure; the run aborts.
    Fatal,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Download of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Downloaded {filename} does not match the registry hash: expected {expected}, got {actual}")]
    HashMismatch {
        filename: String,
        expected: Sha1Hash,
        actual: Sha1Hash,
    },

    #[error("Refusing to write registry-supplied file name {0:?}")]
    InvalidFilename(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::HashMismatch { .. } | Self::InvalidFilename(_) => {
                FailureKind::Recoverable
            }
            Self::Io { .. } | Self::Task(_) => FailureKind::Fatal,
        }
    }
}

/// Why a package was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UpToDate,
    NoRegistryMatch,
    NoVersionForTarget,
    /// An update was available but the run only reports.
    DryRun,
    /// The target file name belongs to another installed package, or another
    /// scheduled update already writes or removes it.
    DuplicateTarget,
    /// Old files are kept but the update has the same file name, so writing
    /// it would destroy the file that should be kept.
    KeepOldSameName,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Updated {
        /// Where the replacement was written.
        new_path: PathBuf,
        /// The superseded file, if it was removed.
        removed: Option<PathBuf>,
    },
    Skipped(SkipReason),
    Failed(SyncError),
}

impl SkipReason {
    /// The reason a decision needs no download, or `None` for an update.
    pub fn for_decision(decision: &UpdateDecision) -> Option<Self> {
        match decision {
            UpdateDecision::UpToDate => Some(Self::UpToDate),
            UpdateDecision::NoRegistryMatch => Some(Self::NoRegistryMatch),
            UpdateDecision::NoVersionForTarget => Some(Self::NoVersionForTarget),
            UpdateDecision::UpdateAvailable(_) => None,
        }
    }
}

impl SyncOutcome {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// A package, its decision, and what syncing it did.
#[derive(Debug)]
pub struct PackageReport {
    pub package: LocalPackage,
    pub decision: UpdateDecision,
    pub outcome: SyncOutcome,
}

/// Registry file names are written verbatim into the package directory, so
/// anything that could escape it is rejected.
fn validate_filename(filename: &str) -> Result<(), SyncError> {
    let unsafe_name = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
        || filename.contains('\0');
    if unsafe_name {
        return Err(SyncError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Downloads replacements into a package directory and removes what they
/// supersede.
#[derive(Clone)]
pub struct SyncExecutor {
    client: Client,
    package_dir: PathBuf,
    reporter: Arc<dyn Reporter>,
    concurrency: usize,
}

impl std::fmt::Debug for SyncExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncExecutor")
            .field("package_dir", &self.package_dir)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl SyncExecutor {
    pub fn new(
        client: Client,
        package_dir: PathBuf,
        reporter: Arc<dyn Reporter>,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            package_dir,
            reporter,
            concurrency: concurrency.max(1),
        }
    }

    /// Apply one decision.
    ///
    /// Only `UpdateAvailable` has side effects: the candidate is downloaded
    /// next to the old file, then the old file is removed unless `keep_old`
    /// is set or the candidate was written over it. With `keep_old`, an
    /// update with the old file's name is skipped without downloading.
    pub async fn apply(
        &self,
        package: &LocalPackage,
        decision: &UpdateDecision,
        keep_old: bool,
    ) -> SyncOutcome {
        let UpdateDecision::UpdateAvailable(file) = decision else {
            return SyncOutcome::Skipped(
                SkipReason::for_decision(decision).unwrap_or(SkipReason::UpToDate),
            );
        };
        if keep_old && file.filename == package.filename {
            tracing::debug!(
                "Skipping {}: update has the same file name and old files are kept",
                package.filename
            );
            return SyncOutcome::Skipped(SkipReason::KeepOldSameName);
        }
        match self.replace(package, file, keep_old).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!("{}: {err}", package.filename);
                self.reporter.failed(&package.filename, &err.to_string());
                SyncOutcome::Failed(err)
            }
        }
    }

    async fn replace(
        &self,
        package: &LocalPackage,
        file: &FileRef,
        keep_old: bool,
    ) -> Result<SyncOutcome, SyncError> {
        validate_filename(&file.filename)?;
        let dest = self.package_dir.join(&file.filename);
        tracing::info!("Updating {} to {}", package.filename, file.filename);

        DownloadRequest {
            client: &self.client,
            url: &file.url,
            dest: &dest,
            expected_hash: &file.hashes.sha1,
            label: &package.filename,
            reporter: self.reporter.as_ref(),
        }
        .execute()
        .await
        .map_err(|err| match err {
            DownloadError::Http(source) => SyncError::Transport {
                url: file.url.clone(),
                source,
            },
            DownloadError::Io(source) => SyncError::Io {
                path: dest.clone(),
                source,
            },
            DownloadError::HashMismatch { expected, actual } => SyncError::HashMismatch {
                filename: file.filename.clone(),
                expected,
                actual,
            },
        })?;

        // Same name means the download already replaced the old bytes
        let removed = if keep_old || file.filename == package.filename {
            None
        } else {
            self.reporter.removing(&package.filename);
            tokio::fs::remove_file(&package.path)
                .await
                .map_err(|source| SyncError::Io {
                    path: package.path.clone(),
                    source,
                })?;
            tracing::info!("Deleted old file: {}", package.filename);
            Some(package.path.clone())
        };

        self.reporter
            .done(&package.filename, &format!("-> {}", file.filename));
        Ok(SyncOutcome::Updated {
            new_path: dest,
            removed,
        })
    }

    /// Apply every decision, downloading on a bounded pool.
    ///
    /// An update claims both its target file name and the name of the file it
    /// supersedes. It is skipped as `DuplicateTarget` when its target is
    /// another installed package's file, or when either name was already
    /// claimed by an earlier (in input order) update. Reports come back in
    /// input order regardless of completion order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`SyncError`]; all other in-flight work is
    /// cancelled and no reports are returned.
    pub async fn apply_all(
        &self,
        resolved: Vec<ResolvedPackage>,
        keep_old: bool,
    ) -> Result<Vec<PackageReport>, SyncError> {
        let cancel = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut outcomes: Vec<Option<SyncOutcome>> = resolved.iter().map(|_| None).collect();
        let mut claimed: HashSet<String> = HashSet::new();
        let installed: HashSet<&str> = resolved
            .iter()
            .map(|item| item.package.filename.as_str())
            .collect();
        let mut set = JoinSet::new();

        for (idx, item) in resolved.iter().enumerate() {
            let UpdateDecision::UpdateAvailable(file) = &item.decision else {
                outcomes[idx] = Some(self.apply(&item.package, &item.decision, keep_old).await);
                continue;
            };

            let overwrites_installed = file.filename != item.package.filename
                && installed.contains(file.filename.as_str());
            let claims = [file.filename.clone(), item.package.filename.clone()];
            if overwrites_installed || claims.iter().any(|name| claimed.contains(name)) {
                tracing::debug!(
                    "Skipping {}: {} is already taken by another package",
                    item.package.filename,
                    file.filename
                );
                outcomes[idx] = Some(SyncOutcome::Skipped(SkipReason::DuplicateTarget));
                continue;
            }
            claimed.extend(claims);

            let executor = self.clone();
            let package = item.package.clone();
            let decision = item.decision.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                let outcome = tokio::select! {
                    () = cancel.cancelled() => None,
                    outcome = async {
                        let _permit = semaphore.acquire_owned().await.ok()?;
                        Some(executor.apply(&package, &decision, keep_old).await)
                    } => outcome,
                };
                (idx, outcome)
            });
        }

        let mut fatal: Option<SyncError> = None;
        while let Some(joined) = set.join_next().await {
            let error = match joined {
                Ok((idx, Some(outcome))) => {
                    if outcome.failure_kind() != Some(FailureKind::Fatal) {
                        outcomes[idx] = Some(outcome);
                        continue;
                    }
                    let SyncOutcome::Failed(err) = outcome else {
                        continue;
                    };
                    err
                }
                Ok((_, None)) => continue,
                Err(err) if err.is_cancelled() => continue,
                Err(err) => SyncError::Task(err),
            };

            if fatal.is_none() {
                tracing::debug!("Aborting sync: {error}");
                cancel.cancel();
                set.abort_all();
                fatal = Some(error);
            }
        }

        if let Some(err) = fatal {
            return Err(err);
        }

        Ok(resolved
            .into_iter()
            .zip(outcomes)
            .filter_map(|(item, outcome)| {
                Some(PackageReport {
                    package: item.package,
                    decision: item.decision,
                    outcome: outcome?,
                })
            })
            .collect())
    }
}
