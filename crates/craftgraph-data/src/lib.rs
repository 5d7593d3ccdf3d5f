//! Craftgraph Data -- raw data supply and the per-version build pipeline.
//!
//! Loads catalogs from RON/JSON/TOML files, fetches and caches server
//! archives, extracts raw tag and loot-table definitions from them, and runs
//! the `craftgraph-core` graph build for one version at a time.

pub mod archive;
pub mod config;
pub mod fetch;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod schema;

pub use archive::{ArchiveError, DataArchive};
pub use config::{BuildConfig, ConfigError};
pub use fetch::{FetchError, VersionFetcher};
pub use loader::{DataLoadError, load_catalog};
pub use logging::init_tracing;
pub use pipeline::{PipelineError, build_from_archive, build_version};
