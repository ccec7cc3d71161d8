//! Minimal CurseForge API client.
//!
//! Packwiz manifests for CurseForge mods carry no download URL; it has to be
//! requested from the API with the project and file ids.

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Production API endpoint.
pub const CURSEFORGE_API_BASE: &str = "https://api.curseforge.com";

#[derive(Debug, Error)]
pub enum CurseForgeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CurseForge API returned status {status} for project {project_id} file {file_id}")]
    Status {
        status: reqwest::StatusCode,
        project_id: u64,
        file_id: u64,
    },
    #[error("Failed to parse CurseForge response: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    data: Option<String>,
}

/// Authenticated client for the CurseForge API.
pub struct CurseForgeClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl CurseForgeClient {
    /// Creates a client for `base_url` (usually [`CURSEFORGE_API_BASE`]).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    /// Creates a client reusing an existing HTTP connection pool.
    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Asks the API where a file can be downloaded from.
    ///
    /// Returns `Ok(None)` when the API answers with an empty body or a null
    /// `data` field, which happens for files whose authors disabled
    /// third-party distribution.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures, non-success statuses, or a body
    /// that is not the expected JSON.
    pub async fn download_url(&self, project_id: u64, file_id: u64) -> Result<Option<String>, CurseForgeError> {
        let url = format!(
            "{}/v1/mods/{}/files/{}/download-url",
            self.base_url, project_id, file_id
        );
        debug!(project_id, file_id, "requesting CurseForge download url");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CurseForgeError::Status {
                status,
                project_id,
                file_id,
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        let parsed: DownloadUrlResponse = serde_json::from_slice(&body)?;
        Ok(parsed.data.filter(|url| !url.is_empty()))
    }
}
