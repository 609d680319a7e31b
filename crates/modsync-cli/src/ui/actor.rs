//! UI Actor - single-threaded event processing
//!
//! Sync tasks report from many tokio workers at once. They only ever send
//! [`UiEvent`]s; the actor thread owns stdout and prints one event at a time.

use super::theme::{Theme, format_size};
use crossterm::style::Stylize;
use modsync_core::RunSummary;
use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;

/// How a finished package is rendered in the final listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Unchanged,
    Skipped,
}

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    /// Print a section header
    Header { title: String },
    /// A directory entry that is not a package
    Ignored { filename: String },
    /// Download progress for a package
    Downloading {
        filename: String,
        current: u64,
        total: Option<u64>,
    },
    /// A superseded file is being deleted
    Removing { filename: String },
    /// A package finished syncing
    Done { filename: String, detail: String },
    /// A package failed to sync
    Failed { filename: String, reason: String },
    /// One row of the final package listing
    Line {
        kind: LineKind,
        filename: String,
        detail: String,
    },
    Info(String),
    Warning(String),
    /// Final counts
    Summary { summary: RunSummary, dry_run: bool },
    /// Stop the actor
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl UiActor {
    /// Spawn a new UI actor thread
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || run_event_loop(&receiver));
        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }

    /// Print everything queued so far, then stop the thread.
    pub fn finish(mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
    }
}

fn run_event_loop(receiver: &mpsc::Receiver<UiEvent>) {
    let theme = Theme::default();
    let colors = &theme.colors;
    let icons = &theme.icons;
    // Progress arrives per chunk; only the first event per file is printed
    let mut downloading: HashSet<String> = HashSet::new();

    while let Ok(event) = receiver.recv() {
        match event {
            UiEvent::Header { title } => {
                println!();
                println!("{}", title.bold());
            }
            UiEvent::Ignored { filename } => {
                println!(
                    "  {} {} {}",
                    icons.pending.with(colors.secondary),
                    filename.with(colors.secondary),
                    "(not a package)".with(colors.secondary)
                );
            }
            UiEvent::Downloading {
                filename,
                current: _,
                total,
            } => {
                if downloading.insert(filename.clone()) {
                    let size = total.map(format_size).unwrap_or_default();
                    println!(
                        "  {} {} {}",
                        icons.active.with(colors.active),
                        filename.with(colors.package_name),
                        format!("downloading {size}").trim_end().with(colors.secondary)
                    );
                }
            }
            UiEvent::Removing { filename } => {
                println!(
                    "  {} {} {}",
                    icons.active.with(colors.active),
                    filename.with(colors.package_name),
                    "removing old file".with(colors.secondary)
                );
            }
            UiEvent::Done { filename, detail } => {
                downloading.remove(&filename);
                println!(
                    "  {} {} {}",
                    icons.success.with(colors.success),
                    filename.with(colors.package_name),
                    detail.with(colors.secondary)
                );
            }
            UiEvent::Failed { filename, reason } => {
                downloading.remove(&filename);
                println!(
                    "  {} {} {}",
                    icons.error.with(colors.error),
                    filename.with(colors.package_name),
                    reason.with(colors.error)
                );
            }
            UiEvent::Line {
                kind,
                filename,
                detail,
            } => {
                let icon = match kind {
                    LineKind::Unchanged => icons.pending.with(colors.secondary),
                    LineKind::Skipped => icons.warning.with(colors.warning),
                };
                println!(
                    "  {icon} {} {}",
                    filename.with(colors.package_name),
                    detail.with(colors.secondary)
                );
            }
            UiEvent::Info(msg) => {
                println!("  {} {msg}", icons.info);
            }
            UiEvent::Warning(msg) => {
                println!(
                    "{} {}",
                    icons.warning.with(colors.warning),
                    msg.with(colors.warning)
                );
            }
            UiEvent::Summary { summary, dry_run } => {
                let updated = if dry_run {
                    format!("{} would update", summary.skipped)
                } else {
                    format!("{} updated", summary.updated)
                };
                println!();
                println!(
                    "{}  {}  {}  {}",
                    updated.with(colors.success).bold(),
                    format!("{} up to date", summary.up_to_date).with(colors.secondary),
                    format!("{} without update", summary.no_update).with(colors.warning),
                    format!("{} failed", summary.failed).with(if summary.failed > 0 {
                        colors.error
                    } else {
                        colors.secondary
                    }),
                );
            }
            UiEvent::Shutdown => break,
        }
    }
}
