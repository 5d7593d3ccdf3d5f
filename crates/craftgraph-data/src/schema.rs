//! Serde structs for the remote version manifest and per-version documents.
//!
//! Only the fields the fetcher needs are modeled; everything else in the
//! upstream JSON is ignored.

use serde::{Deserialize, Serialize};

// ===========================================================================
// Manifest
// ===========================================================================

/// Top-level version manifest listing every published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// One manifest row: a version id and the URL of its version document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub release_type: Option<String>,
    pub url: String,
}

impl VersionManifest {
    pub fn find(&self, version: &str) -> Option<&ManifestEntry> {
        self.versions.iter().find(|entry| entry.id == version)
    }
}

// ===========================================================================
// Version document
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDocument {
    pub id: String,
    #[serde(default)]
    pub downloads: Downloads,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downloads {
    #[serde(default)]
    pub server: Option<Download>,
    #[serde(default)]
    pub client: Option<Download>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}
