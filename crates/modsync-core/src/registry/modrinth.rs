//! Modrinth v2 bulk endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

use super::{CandidateMap, DetailsMap, RegistryClient, RegistryError};
use crate::types::{ApiErrorBody, LoaderName, Sha1Hash};

/// Public Modrinth API root.
pub const DEFAULT_BASE_URL: &str = "https://api.modrinth.com/v2";

const HASH_ALGORITHM: &str = "sha1";

#[derive(Serialize)]
struct DetailsRequest<'a> {
    hashes: Vec<&'a str>,
    algorithm: &'static str,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    hashes: Vec<&'a str>,
    algorithm: &'static str,
    loaders: [&'a str; 1],
    game_versions: [&'a str; 1],
}

/// HTTP client for the Modrinth API.
#[derive(Debug, Clone)]
pub struct ModrinthClient {
    client: Client,
    base_url: String,
}

impl ModrinthClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, RegistryError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice::<ApiErrorBody>(&bytes).unwrap_or_else(|_| {
                ApiErrorBody {
                    error: status.to_string(),
                    description: String::from_utf8_lossy(&bytes).into_owned(),
                }
            });
            return Err(api_error(body));
        }

        decode_payload(&bytes)
    }
}

fn api_error(body: ApiErrorBody) -> RegistryError {
    RegistryError::Api {
        error: body.error,
        description: body.description,
    }
}

/// Decode a successful response, surfacing an in-band error payload.
///
/// Result maps are keyed by 40-char hashes, so a top-level string `error`
/// field can only be an error payload.
fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RegistryError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    if value.get("error").is_some_and(serde_json::Value::is_string) {
        let body: ApiErrorBody = serde_json::from_value(value)?;
        return Err(api_error(body));
    }
    Ok(serde_json::from_value(value)?)
}

fn hash_strs(identifiers: &BTreeSet<Sha1Hash>) -> Vec<&str> {
    identifiers.iter().map(Sha1Hash::as_str).collect()
}

#[async_trait]
impl RegistryClient for ModrinthClient {
    async fn get_multiple_details(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
    ) -> Result<DetailsMap, RegistryError> {
        if identifiers.is_empty() {
            return Ok(DetailsMap::new());
        }

        let request = DetailsRequest {
            hashes: hash_strs(identifiers),
            algorithm: HASH_ALGORITHM,
        };
        let mut details: DetailsMap = self.post("/version_files", &request).await?;

        details.retain(|hash, entry| {
            if entry.loaders.is_empty() {
                tracing::warn!("Registry lists no loaders for {hash}; treating it as unknown");
                false
            } else {
                true
            }
        });
        Ok(details)
    }

    async fn get_multiple_update_info(
        &self,
        identifiers: &BTreeSet<Sha1Hash>,
        game_version: &str,
        loader: &LoaderName,
    ) -> Result<CandidateMap, RegistryError> {
        if identifiers.is_empty() {
            return Ok(CandidateMap::new());
        }

        let request = UpdateRequest {
            hashes: hash_strs(identifiers),
            algorithm: HASH_ALGORITHM,
            loaders: [loader.as_str()],
            game_versions: [game_version],
        };
        self.post("/version_files/update", &request).await
    }
}
