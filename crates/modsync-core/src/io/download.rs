//! Streaming download with on-the-fly SHA-1 verification.
//!
//! Bytes are staged in `<dest>.part` and only renamed over `dest` once the
//! hash matches, so a failed download never leaves a truncated package (or
//! clobbers the file it was meant to replace).

use futures::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;
use crate::types::Sha1Hash;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Sha1Hash, actual: Sha1Hash },
}

/// Request for a download operation
pub struct DownloadRequest<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub dest: &'a Path,
    pub expected_hash: &'a Sha1Hash,
    pub label: &'a str,
    pub reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for DownloadRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("url", &self.url)
            .field("dest", &self.dest)
            .field("expected_hash", &self.expected_hash)
            .finish_non_exhaustive()
    }
}

impl DownloadRequest<'_> {
    /// Stream the body into `dest`, hashing as it goes.
    ///
    /// # Errors
    ///
    /// [`DownloadError::Http`] for connection, status and body-stream
    /// failures; [`DownloadError::Io`] for local write failures;
    /// [`DownloadError::HashMismatch`] when the bytes do not hash to
    /// `expected_hash`. `dest` is untouched on every error.
    pub async fn execute(self) -> Result<Sha1Hash, DownloadError> {
        let staging = staging_path(self.dest);
        match self.stream_to(&staging).await {
            Ok(hash) => {
                if let Err(err) = tokio::fs::rename(&staging, self.dest).await {
                    tokio::fs::remove_file(&staging).await.ok();
                    return Err(err.into());
                }
                tracing::debug!("downloaded {}", self.dest.display());
                Ok(hash)
            }
            Err(err) => {
                tokio::fs::remove_file(&staging).await.ok();
                Err(err)
            }
        }
    }

    async fn stream_to(&self, staging: &Path) -> Result<Sha1Hash, DownloadError> {
        let response = self
            .client
            .get(self.url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let total_size = response.content_length();
        self.reporter.downloading(self.label, 0, total_size);

        let mut file = File::create(staging).await?;
        let mut stream = response.bytes_stream();
        let mut hasher = Sha1::new();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            self.reporter.downloading(self.label, downloaded, total_size);
        }

        file.flush().await?;
        drop(file);
        let actual_hash = Sha1Hash::from_digest(&hasher.finalize());

        if &actual_hash != self.expected_hash {
            return Err(DownloadError::HashMismatch {
                expected: self.expected_hash.clone(),
                actual: actual_hash,
            });
        }

        tracing::trace!("{} bytes verified for {}", downloaded, self.label);
        Ok(actual_hash)
    }
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use mockito::Server;

    #[tokio::test]
    async fn writes_and_verifies() {
        let mut server = Server::new_async().await;
        let body = b"new mod bytes".to_vec();
        let _m = server
            .mock("GET", "/mod.jar")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mod.jar");
        let expected = Sha1Hash::compute(&body);
        let url = format!("{}/mod.jar", server.url());

        let hash = DownloadRequest {
            client: &Client::new(),
            url: &url,
            dest: &dest,
            expected_hash: &expected,
            label: "mod.jar",
            reporter: &NullReporter,
        }
        .execute()
        .await
        .unwrap();

        assert_eq!(hash, expected);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn mismatch_removes_the_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/mod.jar")
            .with_status(200)
            .with_body("tampered")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mod.jar");
        let expected = Sha1Hash::compute(b"original");
        let url = format!("{}/mod.jar", server.url());

        let err = DownloadRequest {
            client: &Client::new(),
            url: &url,
            dest: &dest,
            expected_hash: &expected,
            label: "mod.jar",
            reporter: &NullReporter,
        }
        .execute()
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::HashMismatch { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn mismatch_keeps_existing_destination() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/mod.jar")
            .with_body("tampered")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mod.jar");
        std::fs::write(&dest, "installed").unwrap();
        let expected = Sha1Hash::compute(b"update");
        let url = format!("{}/mod.jar", server.url());

        let result = DownloadRequest {
            client: &Client::new(),
            url: &url,
            dest: &dest,
            expected_hash: &expected,
            label: "mod.jar",
            reporter: &NullReporter,
        }
        .execute()
        .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"installed");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn staging_sits_next_to_destination() {
        assert_eq!(
            staging_path(Path::new("/mods/sodium.jar")),
            Path::new("/mods/sodium.jar.part")
        );
    }

    #[tokio::test]
    async fn error_status_is_http_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/gone.jar")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gone.jar");
        let expected = Sha1Hash::compute(b"x");
        let url = format!("{}/gone.jar", server.url());

        let err = DownloadRequest {
            client: &Client::new(),
            url: &url,
            dest: &dest,
            expected_hash: &expected,
            label: "gone.jar",
            reporter: &NullReporter,
        }
        .execute()
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::Http(_)));
        assert!(!dest.exists());
    }
}
