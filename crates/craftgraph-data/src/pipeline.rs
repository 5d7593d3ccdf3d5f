//! Per-version build pipeline.
//!
//! fetch archive -> extract raw tags and loot tables -> expand tags -> resolve
//! loot -> write `catalog.json` and `loot_index.json` -> build
//! `full_graph.jsonl`. Everything lands in `<output_root>/<version>/`. A
//! directory that already holds `full_graph.jsonl` is skipped before any
//! network or file work happens.

use crate::archive::{ArchiveError, DataArchive};
use crate::config::BuildConfig;
use crate::fetch::{FetchError, VersionFetcher};
use craftgraph_core::builder::{BuildError, BuildOutcome, GraphInput, build_to_dir};
use craftgraph_core::catalog::{Catalog, CatalogSnapshot};
use craftgraph_core::loot::resolve_all;
use craftgraph_core::tag::TagExpander;
use craftgraph_core::writer;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "catalog.json";
pub const LOOT_INDEX_FILE: &str = "loot_index.json";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn skipped(out_dir: &Path) -> BuildOutcome {
    let marker = writer::graph_path(out_dir);
    tracing::info!(path = %marker.display(), "graph already built, skipping");
    BuildOutcome::Skipped { marker }
}

fn write_json<T: Serialize>(path: PathBuf, value: &T) -> Result<(), PipelineError> {
    let bytes = match serde_json::to_vec_pretty(value) {
        Ok(bytes) => bytes,
        Err(source) => return Err(PipelineError::Serialize { path, source }),
    };
    if let Some(parent) = path.parent() {
        if let Err(source) = std::fs::create_dir_all(parent) {
            return Err(PipelineError::Output { path, source });
        }
    }
    std::fs::write(&path, bytes).map_err(|source| PipelineError::Output { path, source })
}

/// Fetch (or reuse) the archive for `version` and build its graph.
pub async fn build_version(
    config: &BuildConfig,
    fetcher: &VersionFetcher,
    version: &str,
    catalog: &Catalog,
) -> Result<BuildOutcome, PipelineError> {
    let out_dir = config.version_dir(version);
    if writer::is_complete(&out_dir) {
        return Ok(skipped(&out_dir));
    }
    let archive_path = fetcher.fetch_archive(version).await?;
    build_from_archive(&archive_path, &out_dir, version, catalog)
}

/// Build every output for `version` from a local archive.
pub fn build_from_archive(
    archive_path: &Path,
    out_dir: &Path,
    version: &str,
    catalog: &Catalog,
) -> Result<BuildOutcome, PipelineError> {
    if writer::is_complete(out_dir) {
        return Ok(skipped(out_dir));
    }

    let mut archive = DataArchive::open_with_fallback(archive_path, version)?;
    let raw_tags = archive.item_tags()?;
    let raw_tables = archive.loot_tables()?;

    let tags = TagExpander::new(&raw_tags).expand_all();
    let loot = resolve_all(&raw_tables, &tags);
    let snapshot = CatalogSnapshot::from_catalog(version, catalog);

    write_json(out_dir.join(CATALOG_FILE), &snapshot)?;
    write_json(out_dir.join(LOOT_INDEX_FILE), &loot)?;

    let outcome = build_to_dir(
        out_dir,
        GraphInput {
            catalog: &snapshot,
            loot: &loot,
        },
    )?;
    if let BuildOutcome::Built(summary) = &outcome {
        tracing::info!(
            version,
            operations = summary.operations,
            valid = summary.is_valid(),
            dir = %out_dir.display(),
            "version built"
        );
    }
    Ok(outcome)
}
