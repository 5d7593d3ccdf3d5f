//! Craftgraph Core -- the production-graph construction engine.
//!
//! Turns static game-definition data (item and block catalogs, crafting
//! recipes, item tags, loot tables) into a bipartite graph of **objects**
//! (items, blocks, world-state preconditions) and **operations** (craft,
//! mine, kill, loot, ...) that consume and produce them.
//!
//! # Build Pipeline
//!
//! 1. **Tags** -- [`tag::TagExpander`] resolves nested `#tag` references into
//!    concrete item sets, memoized and cycle-safe.
//! 2. **Loot** -- [`loot::resolve_all`] classifies every loot-table node,
//!    computes each table's transitive item closure, and records provenance.
//! 3. **Catalog** -- [`catalog::CatalogSnapshot`] resolves recipe ingredients
//!    to names and infers the crafting-table precondition.
//! 4. **Graph** -- [`builder::GraphBuilder`] registers objects and stations,
//!    ingests recipes and loot closures as operations, and streams one record
//!    per operation through [`writer::GraphWriter`].
//! 5. **Validation** -- every edge is checked against the registered ids and
//!    failures accumulate in a [`validation::ValidationReport`].
//!
//! # Idempotence
//!
//! The operation stream (`full_graph.jsonl`) only appears once the writer is
//! closed. Its presence marks the build as complete and
//! [`builder::build_to_dir`] skips any target that already has it.
//!
//! This crate is synchronous and does no network I/O. Fetching and unpacking
//! the remote data archive lives in `craftgraph-data`.

pub mod builder;
pub mod catalog;
pub mod id;
pub mod loot;
pub mod model;
pub mod tag;
pub mod validation;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
