//! Streaming content identifiers for local files.

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::types::Sha1Hash;

/// Read size used when folding a file into its digest.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the SHA-1 identifier of a file without loading it into memory.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> io::Result<Sha1Hash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    let hash = Sha1Hash::from_digest(&hasher.finalize());
    tracing::trace!(path = %path.display(), %hash, "hashed file");
    Ok(hash)
}
