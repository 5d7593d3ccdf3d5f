//! Remote data supply: version manifest lookup and server-archive download.
//!
//! Archives are cached under the configured cache directory as
//! `server_<version>.jar` and reused without re-fetching. Downloads land in a
//! `.part` file first so an interrupted fetch never leaves a truncated archive
//! under the cached name.

use crate::config::BuildConfig;
use crate::schema::{VersionDocument, VersionManifest};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Upstream manifest of every published release.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("version {0} not found in manifest")]
    VersionNotFound(String),
    #[error("version {0} has no server download")]
    NoServerDownload(String),
    #[error("cannot write archive cache {path}: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ===========================================================================
// VersionFetcher
// ===========================================================================

#[derive(Debug, Clone)]
pub struct VersionFetcher {
    client: Client,
    manifest_url: String,
    cache_dir: PathBuf,
}

impl VersionFetcher {
    pub fn new(config: &BuildConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            manifest_url: config.manifest_url.clone(),
            cache_dir: config.cache_dir.clone(),
        })
    }

    /// Where the archive for `version` is cached.
    pub fn cached_archive_path(&self, version: &str) -> PathBuf {
        self.cache_dir.join(format!("server_{version}.jar"))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    pub async fn manifest(&self) -> Result<VersionManifest, FetchError> {
        self.get_json(&self.manifest_url).await
    }

    /// Resolve `version` through the manifest to its server-archive URL.
    pub async fn server_archive_url(&self, version: &str) -> Result<String, FetchError> {
        let manifest = self.manifest().await?;
        let entry = manifest
            .find(version)
            .ok_or_else(|| FetchError::VersionNotFound(version.to_string()))?;
        let document: VersionDocument = self.get_json(&entry.url).await?;
        document
            .downloads
            .server
            .map(|download| download.url)
            .ok_or_else(|| FetchError::NoServerDownload(version.to_string()))
    }

    /// Return the cached archive for `version`, downloading it first if the
    /// cache has no copy.
    pub async fn fetch_archive(&self, version: &str) -> Result<PathBuf, FetchError> {
        let path = self.cached_archive_path(version);
        if path.is_file() {
            tracing::info!(version, path = %path.display(), "using cached server archive");
            return Ok(path);
        }

        let url = self.server_archive_url(version).await?;
        tracing::info!(version, %url, "downloading server archive");
        let bytes = self
            .get(&url)
            .await?
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let cache_error = |source| FetchError::Cache {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(cache_error)?;
        let partial = path.with_extension("jar.part");
        tokio::fs::write(&partial, &bytes).await.map_err(cache_error)?;
        tokio::fs::rename(&partial, &path).await.map_err(cache_error)?;

        tracing::info!(version, bytes = bytes.len(), path = %path.display(), "cached server archive");
        Ok(path)
    }
}
