//! One reconciliation run, start to finish.

use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::indexer::{self, IndexError};
use crate::registry::{RegistryClient, RegistryError};
use crate::reporter::Reporter;
use crate::resolver::UpdateResolver;
use crate::sync::{PackageReport, SkipReason, SyncError, SyncExecutor, SyncOutcome};

/// Input to [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Game version every package should be brought up to.
    pub target_version: String,
    /// Directory holding the installed packages.
    pub package_dir: PathBuf,
    /// Keep superseded files next to their replacements.
    pub keep_old: bool,
    /// Resolve decisions but leave the directory untouched.
    pub dry_run: bool,
    /// Upper bound on concurrent hashing and download tasks.
    pub concurrency: usize,
}

impl RunConfig {
    pub fn new(target_version: impl Into<String>, package_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_version: target_version.into(),
            package_dir: package_dir.into(),
            keep_old: false,
            dry_run: false,
            concurrency: num_cpus::get(),
        }
    }

    pub fn keep_old(mut self, keep_old: bool) -> Self {
        self.keep_old = keep_old;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Clamped to at least one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Aggregate counts over a run. Every package lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub up_to_date: usize,
    /// Unknown to the registry, or no version for the target.
    pub no_update: usize,
    pub failed: usize,
    /// Dry-run, duplicate-target and keep-old conflicts.
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[PackageReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match &report.outcome {
                SyncOutcome::Updated { .. } => summary.updated += 1,
                SyncOutcome::Failed(_) => summary.failed += 1,
                SyncOutcome::Skipped(SkipReason::UpToDate) => summary.up_to_date += 1,
                SyncOutcome::Skipped(
                    SkipReason::NoRegistryMatch | SkipReason::NoVersionForTarget,
                ) => summary.no_update += 1,
                SyncOutcome::Skipped(
                    SkipReason::DryRun
                    | SkipReason::DuplicateTarget
                    | SkipReason::KeepOldSameName,
                ) => {
                    summary.skipped += 1;
                }
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.updated + self.up_to_date + self.no_update + self.failed + self.skipped
    }
}

/// Everything a completed run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summary: RunSummary,
    /// One entry per package, sorted by filename.
    pub packages: Vec<PackageReport>,
    /// Directory entries that were not packages.
    pub ignored: Vec<String>,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Package directory does not exist: {0}")]
    MissingPackageDir(PathBuf),

    #[error(transparent)]
    Index(IndexError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Sync aborted: {0}")]
    Aborted(#[source] SyncError),
}

impl From<IndexError> for RunError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::MissingDir(path) => Self::MissingPackageDir(path),
            other => Self::Index(other),
        }
    }
}

/// Scan, resolve and sync one package directory.
///
/// # Errors
///
/// Fails if the directory cannot be scanned, if either registry phase fails,
/// or if syncing hits a fatal error. Recoverable download failures are
/// reported per package instead.
pub async fn run(
    config: &RunConfig,
    registry: &dyn RegistryClient,
    client: Client,
    reporter: Arc<dyn Reporter>,
) -> Result<RunReport, RunError> {
    let concurrency = config.concurrency.max(1);

    reporter.section("Scanning");
    let inventory = indexer::scan_package_dir(&config.package_dir, concurrency).await?;
    for name in &inventory.ignored {
        reporter.ignored(name);
    }
    tracing::info!(
        "Found {} packages in {}",
        inventory.packages.len(),
        config.package_dir.display()
    );

    if inventory.is_empty() {
        return Ok(RunReport {
            ignored: inventory.ignored,
            ..RunReport::default()
        });
    }

    reporter.section("Resolving");
    let resolved = UpdateResolver::new(registry, &config.target_version)
        .resolve_all(&inventory.packages)
        .await?;
    for item in &resolved {
        tracing::debug!("{}: {}", item.package.filename, item.decision.label());
    }

    let packages = if config.dry_run {
        resolved
            .into_iter()
            .map(|item| PackageReport {
                outcome: SyncOutcome::Skipped(
                    SkipReason::for_decision(&item.decision).unwrap_or(SkipReason::DryRun),
                ),
                package: item.package,
                decision: item.decision,
            })
            .collect()
    } else {
        reporter.section("Syncing");
        SyncExecutor::new(client, config.package_dir.clone(), reporter, concurrency)
            .apply_all(resolved, config.keep_old)
            .await
            .map_err(RunError::Aborted)?
    };

    let summary = RunSummary::from_reports(&packages);
    tracing::info!(
        "Run finished: {} updated, {} up to date, {} without update, {} failed, {} skipped",
        summary.updated,
        summary.up_to_date,
        summary.no_update,
        summary.failed,
        summary.skipped
    );

    Ok(RunReport {
        summary,
        packages,
        ignored: inventory.ignored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::registry::MemoryRegistry;
    use crate::types::Sha1Hash;
    use std::fs;

    #[test]
    fn config_defaults() {
        let config = RunConfig::new("1.20.1", "/mods");
        assert!(!config.keep_old);
        assert!(!config.dry_run);
        assert!(config.concurrency >= 1);
        assert_eq!(RunConfig::new("1.20.1", "/mods").concurrency(0).concurrency, 1);
    }

    #[tokio::test]
    async fn missing_directory_is_reported_before_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new("1.20.1", dir.path().join("mods"));

        let err = run(
            &config,
            &MemoryRegistry::new().failing_details("must not be called"),
            Client::new(),
            Arc::new(NullReporter),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RunError::MissingPackageDir(_)));
    }

    #[tokio::test]
    async fn empty_directory_skips_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let config = RunConfig::new("1.20.1", dir.path());

        let report = run(
            &config,
            &MemoryRegistry::new().failing_details("must not be called"),
            Client::new(),
            Arc::new(NullReporter),
        )
        .await
        .unwrap();

        assert_eq!(report.summary, RunSummary::default());
        assert!(report.packages.is_empty());
        assert_eq!(report.ignored, vec!["notes.txt".to_string()]);
    }

    #[tokio::test]
    async fn registry_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jar"), "a").unwrap();
        let config = RunConfig::new("1.20.1", dir.path());

        let err = run(
            &config,
            &MemoryRegistry::new().failing_details("ratelimited"),
            Client::new(),
            Arc::new(NullReporter),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RunError::Registry(RegistryError::Api { .. })));
    }

    #[tokio::test]
    async fn unknown_packages_count_as_no_update() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jar"), "a").unwrap();
        fs::write(dir.path().join("b.jar"), "b").unwrap();
        let registry = MemoryRegistry::new().with_details(&Sha1Hash::compute(b"a"), &["fabric"]);
        let config = RunConfig::new("1.20.1", dir.path());

        let report = run(&config, &registry, Client::new(), Arc::new(NullReporter))
            .await
            .unwrap();

        assert_eq!(report.summary.no_update, 2);
        assert_eq!(report.summary.total(), 2);
        assert_eq!(report.packages[0].package.filename, "a.jar");
    }
}
