//! End-to-end runs against a temp package directory, an in-memory registry
//! and a mock download host.

use mockito::{Mock, Server, ServerGuard};
use modsync_core::indexer::IndexError;
use modsync_core::registry::MemoryRegistry;
use modsync_core::types::{FileHashes, FileRef, Sha1Hash, UpdateCandidate};
use modsync_core::{
    FailureKind, NullReporter, RunConfig, RunError, SkipReason, SyncOutcome, UpdateDecision, run,
};
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const TARGET: &str = "1.20.1";

fn candidate(server: &ServerGuard, filename: &str, data: &[u8]) -> UpdateCandidate {
    UpdateCandidate {
        id: format!("version-{filename}"),
        version_number: "2.0.0".to_string(),
        files: vec![FileRef {
            url: format!("{}/cdn/{filename}", server.url()),
            filename: filename.to_string(),
            hashes: FileHashes {
                sha1: Sha1Hash::compute(data),
                sha512: None,
            },
            primary: true,
            size: Some(data.len() as u64),
        }],
    }
}

/// `sodium` has an update, `lithium` is current, `mystery` is unknown and
/// `legacy` has no build for the target.
///
/// The returned mock must stay alive for the download to be served.
async fn fixture(server: &mut ServerGuard, dir: &Path) -> (MemoryRegistry, Mock) {
    fs::write(dir.join("sodium-1.0.jar"), "sodium v1").unwrap();
    fs::write(dir.join("lithium-1.0.jar"), "lithium v1").unwrap();
    fs::write(dir.join("mystery.jar"), "mystery").unwrap();
    fs::write(dir.join("legacy-0.1.jar"), "legacy").unwrap();
    fs::write(dir.join("options.txt"), "not a package").unwrap();

    let download = server
        .mock("GET", "/cdn/sodium-2.0.jar")
        .with_body("sodium v2")
        .create_async()
        .await;

    let sodium_v1 = Sha1Hash::compute(b"sodium v1");
    let sodium_v2 = Sha1Hash::compute(b"sodium v2");
    let lithium = Sha1Hash::compute(b"lithium v1");
    let legacy = Sha1Hash::compute(b"legacy");
    let update = candidate(server, "sodium-2.0.jar", b"sodium v2");

    let registry = MemoryRegistry::new()
        .with_details(&sodium_v1, &["fabric", "quilt"])
        .with_details(&sodium_v2, &["fabric", "quilt"])
        .with_details(&lithium, &["fabric"])
        .with_details(&legacy, &["forge"])
        .with_update("fabric", TARGET, &sodium_v1, update.clone())
        .with_update("fabric", TARGET, &sodium_v2, update)
        .with_update(
            "fabric",
            TARGET,
            &lithium,
            candidate(server, "lithium-1.0.jar", b"lithium v1"),
        );
    (registry, download)
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn run_updates_and_counts_every_package() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let (registry, _download) = fixture(&mut server, dir.path()).await;

    let report = run(
        &RunConfig::new(TARGET, dir.path()).concurrency(2),
        &registry,
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.up_to_date, 1);
    assert_eq!(report.summary.no_update, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.total(), 4);
    assert_eq!(report.ignored, vec!["options.txt".to_string()]);

    let names: Vec<&str> = report
        .packages
        .iter()
        .map(|p| p.package.filename.as_str())
        .collect();
    assert_eq!(
        names,
        ["legacy-0.1.jar", "lithium-1.0.jar", "mystery.jar", "sodium-1.0.jar"]
    );
    assert_eq!(report.packages[0].decision, UpdateDecision::NoVersionForTarget);
    assert_eq!(report.packages[2].decision, UpdateDecision::NoRegistryMatch);

    assert!(!dir.path().join("sodium-1.0.jar").exists());
    assert_eq!(
        fs::read(dir.path().join("sodium-2.0.jar")).unwrap(),
        b"sodium v2"
    );

    // One update lookup per loader group; forge and fabric are distinct
    let mut loaders: Vec<String> = registry
        .update_calls()
        .into_iter()
        .map(|(loader, _)| loader.as_str().to_string())
        .collect();
    loaders.sort();
    assert_eq!(loaders, ["fabric", "forge"]);
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let (registry, _download) = fixture(&mut server, dir.path()).await;
    let config = RunConfig::new(TARGET, dir.path());

    let first = run(&config, &registry, Client::new(), Arc::new(NullReporter))
        .await
        .unwrap();
    assert_eq!(first.summary.updated, 1);

    let second = run(&config, &registry, Client::new(), Arc::new(NullReporter))
        .await
        .unwrap();
    assert_eq!(second.summary.updated, 0);
    assert_eq!(second.summary.up_to_date, 2);
    assert_eq!(second.summary.total(), 4);
}

#[tokio::test]
async fn keep_old_grows_directory_by_update_count() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let (registry, _download) = fixture(&mut server, dir.path()).await;
    let before = entries(dir.path());

    let report = run(
        &RunConfig::new(TARGET, dir.path()).keep_old(true),
        &registry,
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap();

    assert_eq!(entries(dir.path()), before + report.summary.updated);
    assert!(dir.path().join("sodium-1.0.jar").exists());
}

#[tokio::test]
async fn dry_run_leaves_directory_untouched() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let (registry, _download) = fixture(&mut server, dir.path()).await;
    let before = entries(dir.path());

    let report = run(
        &RunConfig::new(TARGET, dir.path()).dry_run(true),
        &registry,
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.updated, 0);
    assert_eq!(report.summary.skipped, 1);
    let sodium = &report.packages[3];
    assert!(sodium.decision.is_update());
    assert!(matches!(
        sodium.outcome,
        SyncOutcome::Skipped(SkipReason::DryRun)
    ));
    assert_eq!(entries(dir.path()), before);
}

#[tokio::test]
async fn failed_download_is_counted_and_run_completes() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a-1.jar"), "a v1").unwrap();
    fs::write(dir.path().join("b-1.jar"), "b v1").unwrap();

    let _a = server
        .mock("GET", "/cdn/a-2.jar")
        .with_status(404)
        .create_async()
        .await;
    let _b = server
        .mock("GET", "/cdn/b-2.jar")
        .with_body("b v2")
        .create_async()
        .await;

    let a = Sha1Hash::compute(b"a v1");
    let b = Sha1Hash::compute(b"b v1");
    let registry = MemoryRegistry::new()
        .with_details(&a, &["fabric"])
        .with_details(&b, &["fabric"])
        .with_update("fabric", TARGET, &a, candidate(&server, "a-2.jar", b"a v2"))
        .with_update("fabric", TARGET, &b, candidate(&server, "b-2.jar", b"b v2"));

    let report = run(
        &RunConfig::new(TARGET, dir.path()),
        &registry,
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(
        report.packages[0].outcome.failure_kind(),
        Some(FailureKind::Recoverable)
    );
    assert!(dir.path().join("a-1.jar").exists());
    assert!(!dir.path().join("a-2.jar").exists());
    assert!(dir.path().join("b-2.jar").exists());
}

#[tokio::test]
async fn corrupt_download_is_rejected() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a-1.jar"), "a v1").unwrap();

    let _a = server
        .mock("GET", "/cdn/a-2.jar")
        .with_body("tampered")
        .create_async()
        .await;

    let a = Sha1Hash::compute(b"a v1");
    let registry = MemoryRegistry::new()
        .with_details(&a, &["fabric"])
        .with_update("fabric", TARGET, &a, candidate(&server, "a-2.jar", b"a v2"));

    let report = run(
        &RunConfig::new(TARGET, dir.path()),
        &registry,
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.failed, 1);
    assert!(dir.path().join("a-1.jar").exists());
    assert!(!dir.path().join("a-2.jar").exists());
}

#[tokio::test]
async fn update_lookup_failure_fails_the_whole_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.jar"), "a").unwrap();
    let a = Sha1Hash::compute(b"a");
    let registry = MemoryRegistry::new()
        .with_details(&a, &["forge"])
        .failing_updates("forge", "internal_error");

    let err = run(
        &RunConfig::new(TARGET, dir.path()),
        &registry,
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RunError::Registry(_)));
    assert!(dir.path().join("a.jar").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_package_aborts_before_any_registry_call() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.jar"), "a").unwrap();
    let locked = dir.path().join("locked.jar");
    fs::write(&locked, "locked").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        // Permission bits do not bind this user (running as root)
        return;
    }

    let err = run(
        &RunConfig::new(TARGET, dir.path()),
        &MemoryRegistry::new().failing_details("must not be called"),
        Client::new(),
        Arc::new(NullReporter),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, RunError::Index(IndexError::Read { ref path, .. }) if *path == locked),
        "unexpected error: {err}"
    );
    assert!(dir.path().join("a.jar").exists());
}
