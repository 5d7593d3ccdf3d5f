//! Server-archive reading.
//!
//! A data release ships as a zip archive whose `data/` tree holds the raw tag
//! and loot-table JSON. Newer releases wrap the real server archive inside a
//! bootstrap archive; [`DataArchive::open_with_fallback`] looks for that
//! nested archive when the outer one has no `data/` root.

use craftgraph_core::loot::table_id_from_path;
use craftgraph_core::tag::{RawTagMap, tag_id_from_path, tag_values};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

const DATA_ROOT: &str = "data/";
const NESTED_DIR: &str = "META-INF/versions/";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("{path} has no data/ root and no nested server archive for {version}")]
    MissingArchiveLayout { path: PathBuf, version: String },
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// DataArchive
// ===========================================================================

/// An in-memory zip archive.
pub struct DataArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl std::fmt::Debug for DataArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataArchive")
            .field("entries", &self.zip.len())
            .finish()
    }
}

/// Nested-archive locations tried before the generic `META-INF/versions/` scan.
fn nested_candidates(version: &str) -> [String; 3] {
    [
        format!("{NESTED_DIR}{version}/server-{version}.jar"),
        format!("versions/{version}/server-{version}.jar"),
        format!("server-{version}.jar"),
    ]
}

impl DataArchive {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Open `path`, descending into its nested server archive when the outer
    /// archive has no `data/` root.
    pub fn open_with_fallback(path: &Path, version: &str) -> Result<Self, ArchiveError> {
        let missing = || ArchiveError::MissingArchiveLayout {
            path: path.to_path_buf(),
            version: version.to_string(),
        };

        let mut outer = Self::open(path)?;
        if outer.has_data_root() {
            return Ok(outer);
        }
        let Some(nested) = outer.find_nested(version) else {
            return Err(missing());
        };
        tracing::debug!(archive = %path.display(), nested = %nested, "using nested server archive");

        let inner = Self::from_bytes(outer.read_entry(&nested)?)?;
        if inner.has_data_root() {
            Ok(inner)
        } else {
            Err(missing())
        }
    }

    pub fn has_data_root(&self) -> bool {
        self.zip.file_names().any(|name| name.starts_with(DATA_ROOT))
    }

    /// Name of the nested server archive for `version`, if present.
    pub fn find_nested(&self, version: &str) -> Option<String> {
        let names: Vec<&str> = self.zip.file_names().collect();
        if let Some(found) = nested_candidates(version)
            .into_iter()
            .find(|candidate| names.contains(&candidate.as_str()))
        {
            return Some(found);
        }
        names
            .into_iter()
            .filter(|name| name.starts_with(NESTED_DIR) && name.ends_with(".jar"))
            .min()
            .map(str::to_string)
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut entry = self.zip.by_name(name)?;
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Entries whose path maps to an id under `id_of`, parsed as JSON, in
    /// sorted id order. Unparseable entries are skipped.
    fn json_entries(
        &mut self,
        id_of: fn(&str) -> Option<String>,
    ) -> Result<BTreeMap<String, Value>, ArchiveError> {
        let mut matched: Vec<(String, String)> = self
            .zip
            .file_names()
            .filter_map(|name| id_of(name).map(|id| (id, name.to_string())))
            .collect();
        matched.sort();

        let mut docs = BTreeMap::new();
        for (id, name) in matched {
            let bytes = self.read_entry(&name)?;
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(doc) => {
                    docs.insert(id, doc);
                }
                Err(error) => tracing::warn!(entry = %name, %error, "skipping malformed JSON"),
            }
        }
        Ok(docs)
    }

    /// Raw item-tag definitions from `data/<ns>/tags/items/**.json`.
    pub fn item_tags(&mut self) -> Result<RawTagMap, ArchiveError> {
        let tags: RawTagMap = self
            .json_entries(tag_id_from_path)?
            .into_iter()
            .map(|(id, doc)| (id, tag_values(&doc)))
            .collect();
        tracing::debug!(tags = tags.len(), "read item tags");
        Ok(tags)
    }

    /// Raw loot tables from `data/<ns>/loot_tables/**.json`.
    pub fn loot_tables(&mut self) -> Result<BTreeMap<String, Value>, ArchiveError> {
        let tables = self.json_entries(table_id_from_path)?;
        tracing::debug!(tables = tables.len(), "read loot tables");
        Ok(tables)
    }
}
