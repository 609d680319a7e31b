//! Unified UI output interface.
//!
//! [`Output`] is the handle commands and the engine use to print. It is the
//! CLI's [`Reporter`], so live sync progress and the final report go through
//! the same actor.

use super::actor::{LineKind, UiEvent};
use modsync_core::{Reporter, RunReport, SkipReason, SyncOutcome, UpdateDecision};
use std::sync::mpsc;

/// A cloneable handle for sending UI events to the terminal actor.
#[derive(Debug, Clone)]
pub struct Output {
    sender: mpsc::Sender<UiEvent>,
}

impl Output {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }

    pub fn info(&self, msg: &str) {
        self.send(UiEvent::Info(msg.to_string()));
    }

    pub fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }

    /// Print the packages that were not already reported live, then the
    /// counts.
    pub fn report(&self, report: &RunReport, target_version: &str, dry_run: bool) {
        if report.packages.is_empty() {
            self.warning("No packages found");
            return;
        }

        let lines: Vec<UiEvent> = report
            .packages
            .iter()
            .filter_map(|entry| {
                let (kind, detail) = match (&entry.outcome, &entry.decision) {
                    // Already printed while syncing
                    (SyncOutcome::Updated { .. } | SyncOutcome::Failed(_), _) => return None,
                    (
                        SyncOutcome::Skipped(SkipReason::DryRun),
                        UpdateDecision::UpdateAvailable(file),
                    ) => (
                        LineKind::Skipped,
                        format!("update available: {}", file.filename),
                    ),
                    (SyncOutcome::Skipped(reason), _) => describe_skip(*reason, target_version),
                };
                Some(UiEvent::Line {
                    kind,
                    filename: entry.package.filename.clone(),
                    detail,
                })
            })
            .collect();

        if !lines.is_empty() {
            self.section("Packages");
        }
        for line in lines {
            self.send(line);
        }

        self.send(UiEvent::Summary {
            summary: report.summary,
            dry_run,
        });
    }
}

fn describe_skip(reason: SkipReason, target_version: &str) -> (LineKind, String) {
    match reason {
        SkipReason::UpToDate => (LineKind::Unchanged, "up to date".to_string()),
        SkipReason::NoRegistryMatch => (LineKind::Skipped, "not found on the registry".to_string()),
        SkipReason::NoVersionForTarget => (
            LineKind::Skipped,
            format!("no version for {target_version}"),
        ),
        SkipReason::DryRun => (LineKind::Skipped, "update available".to_string()),
        SkipReason::DuplicateTarget => (
            LineKind::Skipped,
            "skipped: the new file name is taken by another package".to_string(),
        ),
        SkipReason::KeepOldSameName => (
            LineKind::Skipped,
            "skipped: the update has the same file name as the kept one".to_string(),
        ),
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.send(UiEvent::Header {
            title: title.to_string(),
        });
    }

    fn ignored(&self, filename: &str) {
        self.send(UiEvent::Ignored {
            filename: filename.to_string(),
        });
    }

    fn downloading(&self, filename: &str, current: u64, total: Option<u64>) {
        self.send(UiEvent::Downloading {
            filename: filename.to_string(),
            current,
            total,
        });
    }

    fn removing(&self, filename: &str) {
        self.send(UiEvent::Removing {
            filename: filename.to_string(),
        });
    }

    fn done(&self, filename: &str, detail: &str) {
        self.send(UiEvent::Done {
            filename: filename.to_string(),
            detail: detail.to_string(),
        });
    }

    fn failed(&self, filename: &str, reason: &str) {
        self.send(UiEvent::Failed {
            filename: filename.to_string(),
            reason: reason.to_string(),
        });
    }
}
