//! Local package inventory.
//!
//! Builds the set of [`LocalPackage`]s a run operates on. Hashing is
//! independent per file and runs on a bounded pool of blocking tasks; the
//! inventory is only handed out once every file has been hashed, because a
//! partial inventory would make every later decision untrustworthy.

pub mod hashing;
pub mod walk;

use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use hashing::hash_file;
pub use walk::{DirListing, list_package_dir};

use crate::types::Sha1Hash;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Package directory does not exist: {0}")]
    MissingDir(PathBuf),

    #[error("Failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An installable file found in the package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    /// Content identifier of the file's bytes.
    pub identifier: Sha1Hash,
    /// File name inside the package directory.
    pub filename: String,
    /// Full path of the file.
    pub path: PathBuf,
}

/// Everything a scan found.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Hashed packages, sorted by filename.
    pub packages: Vec<LocalPackage>,
    /// Directory entries that are not packages.
    pub ignored: Vec<String>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Scan a package directory and hash every package in it.
///
/// At most `concurrency` files are hashed at once. The first read failure
/// aborts the scan.
///
/// # Errors
///
/// Returns [`IndexError::MissingDir`] if `dir` is not a directory,
/// [`IndexError::List`] if it cannot be listed, and [`IndexError::Read`] if
/// any package file cannot be read.
pub async fn scan_package_dir(dir: &Path, concurrency: usize) -> Result<Inventory, IndexError> {
    if !dir.is_dir() {
        return Err(IndexError::MissingDir(dir.to_path_buf()));
    }

    let listing = list_package_dir(dir).map_err(|source| IndexError::List {
        path: dir.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        packages = listing.packages.len(),
        ignored = listing.ignored.len(),
        dir = %dir.display(),
        "listed package directory"
    );

    let mut packages: Vec<LocalPackage> = stream::iter(listing.packages)
        .map(|(filename, path)| async move {
            let (path, result) = tokio::task::spawn_blocking(move || {
                let result = hash_file(&path);
                (path, result)
            })
            .await?;
            match result {
                Ok(identifier) => Ok::<_, IndexError>(LocalPackage {
                    identifier,
                    filename,
                    path,
                }),
                Err(source) => Err(IndexError::Read { path, source }),
            }
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    packages.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(Inventory {
        packages,
        ignored: listing.ignored,
    })
}
