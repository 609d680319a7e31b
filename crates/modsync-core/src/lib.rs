//! modsync core: reconciles a local package directory against a remote registry.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`indexer`] hashes every installable file into a [`LocalPackage`].
//! 2. [`resolver`] looks the identifiers up in bulk, partitions them by
//!    loader, fetches update candidates per loader and decides an
//!    [`UpdateDecision`] per package.
//! 3. [`sync`] downloads replacements and removes superseded files.
//!
//! [`run::run`] threads the stages together and returns a [`RunReport`];
//! nothing in this crate prints. Progress is surfaced through [`Reporter`].

pub mod indexer;
pub mod io;
pub mod paths;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod run;
pub mod sync;
pub mod types;

pub use indexer::{Inventory, LocalPackage};
pub use paths::*;
pub use registry::{RegistryClient, RegistryError};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{UpdateDecision, UpdateResolver};
pub use run::{RunConfig, RunError, RunReport, RunSummary, run};
pub use sync::{FailureKind, PackageReport, SkipReason, SyncError, SyncExecutor, SyncOutcome};

/// User Agent string sent with every registry and download request
pub const USER_AGENT: &str = concat!(
    "modsync/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/modsync/modsync)"
);
