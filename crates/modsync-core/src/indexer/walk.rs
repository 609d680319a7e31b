//! Package directory traversal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::PACKAGE_EXTENSION;

/// Entries of a package directory, split by whether they are packages.
#[derive(Debug, Default)]
pub struct DirListing {
    /// `(filename, path)` of every installable package file, sorted by filename.
    pub packages: Vec<(String, PathBuf)>,
    /// Names of every other entry, sorted.
    pub ignored: Vec<String>,
}

/// List a package directory (non-recursive).
///
/// Only regular files with the package extension are packages; anything
/// else, directories included, is reported as ignored.
///
/// # Errors
///
/// Returns an error if the directory or an entry's metadata cannot be read.
pub fn list_package_dir(dir: &Path) -> io::Result<DirListing> {
    let mut listing = DirListing::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_package = entry.file_type()?.is_file()
            && path.extension().is_some_and(|ext| ext == PACKAGE_EXTENSION);
        if is_package {
            listing.packages.push((name, path));
        } else {
            listing.ignored.push(name);
        }
    }
    listing.packages.sort();
    listing.ignored.sort();
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_packages_from_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jar"), b"b").unwrap();
        fs::write(dir.path().join("a.jar"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("c.JAR"), b"c").unwrap();
        fs::create_dir(dir.path().join("nested.jar")).unwrap();

        let listing = list_package_dir(dir.path()).unwrap();
        let names: Vec<&str> = listing.packages.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.jar", "b.jar"]);
        assert_eq!(listing.ignored, vec!["c.JAR", "nested.jar", "notes.txt"]);
    }
}
