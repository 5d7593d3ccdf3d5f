//! Build the production graph for one version.
//!
//! Settings come from the environment:
//! - `CRAFTGRAPH_VERSION` (default `1.20.4`)
//! - `CRAFTGRAPH_CATALOG_DIR` (default `assets/catalog/<version>`)
//! - `CRAFTGRAPH_CONFIG`, an optional TOML file for [`BuildConfig`]

use craftgraph_core::builder::BuildOutcome;
use craftgraph_data::{BuildConfig, VersionFetcher, build_version, init_tracing, load_catalog};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = std::env::var("CRAFTGRAPH_VERSION").unwrap_or_else(|_| "1.20.4".to_string());
    let catalog_dir = std::env::var("CRAFTGRAPH_CATALOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("assets/catalog").join(&version));
    let config = match std::env::var("CRAFTGRAPH_CONFIG") {
        Ok(path) => BuildConfig::load(Path::new(&path))?,
        Err(_) => BuildConfig::default(),
    };

    let catalog = load_catalog(&catalog_dir)?;
    let fetcher = VersionFetcher::new(&config)?;

    match build_version(&config, &fetcher, &version, &catalog).await? {
        BuildOutcome::Skipped { marker } => {
            tracing::info!(marker = %marker.display(), "nothing to do");
        }
        BuildOutcome::Built(summary) => {
            for error in summary.report.errors() {
                tracing::warn!(%error, "unresolved reference");
            }
            tracing::info!(
                objects = summary.objects,
                operations = summary.operations,
                valid = summary.is_valid(),
                "done"
            );
        }
    }
    Ok(())
}
