//! Graph construction.
//!
//! [`GraphBuilder`] registers objects and operations under deterministic ids,
//! records require/produce edges, and streams each assembled operation through
//! a [`GraphWriter`]. Registration is first-writer-wins. Edges naming an id
//! that is not registered yet are kept and reported in the
//! [`ValidationReport`] rather than rejected.

use crate::catalog::CatalogSnapshot;
use crate::id::{Identifier, ObjectKey, OpKey};
use crate::loot::{LootIndex, SourceType};
use crate::model::{Object, ObjectKind, OpKind, Operation, ProduceEdge, RequireEdge, Role, Station};
use crate::validation::{EdgeKind, MissingRef, ReferentialError, ValidationReport};
use crate::writer::{self, GraphWriter, WriteError};
use serde::Serialize;
use serde_json::json;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("cannot {action} while the builder is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: BuildPhase,
    },
}

// ---------------------------------------------------------------------------
// Phases and results
// ---------------------------------------------------------------------------

/// Builder lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildPhase {
    Empty,
    /// Objects registered; no operations yet.
    Populated,
    /// Operations are being emitted.
    Ingesting,
    Closed,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildPhase::Empty => "empty",
            BuildPhase::Populated => "populated",
            BuildPhase::Ingesting => "ingesting",
            BuildPhase::Closed => "closed",
        })
    }
}

/// Everything the builder ingests.
#[derive(Debug, Clone, Copy)]
pub struct GraphInput<'a> {
    pub catalog: &'a CatalogSnapshot,
    pub loot: &'a LootIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub objects: usize,
    pub operations: usize,
    pub requires: usize,
    pub produces: usize,
    pub report: ValidationReport,
}

impl BuildSummary {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The output directory already held a completed graph.
    Skipped { marker: PathBuf },
    Built(BuildSummary),
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GraphBuilder {
    phase: BuildPhase,
    objects: SlotMap<ObjectKey, Object>,
    object_index: HashMap<String, ObjectKey>,
    ops: SlotMap<OpKey, Operation>,
    op_index: HashMap<String, OpKey>,
    /// Keyed by op id so edges on unregistered ops are still kept.
    requires: HashMap<String, Vec<RequireEdge>>,
    produces: HashMap<String, Vec<ProduceEdge>>,
    produced_by: HashMap<String, Vec<String>>,
    report: ValidationReport,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            phase: BuildPhase::Empty,
            objects: SlotMap::with_key(),
            object_index: HashMap::new(),
            ops: SlotMap::with_key(),
            op_index: HashMap::new(),
            requires: HashMap::new(),
            produces: HashMap::new(),
            produced_by: HashMap::new(),
            report: ValidationReport::new(),
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register an object as `<kind>:<name>` and return its id. Registering
    /// an existing id is a no-op.
    pub fn add_object(&mut self, kind: ObjectKind, name: &str, meta: serde_json::Value) -> String {
        let id = kind.object_id(name);
        if !self.object_index.contains_key(&id) {
            let key = self.objects.insert(Object {
                id: id.clone(),
                kind,
                name: name.to_string(),
                meta,
            });
            self.object_index.insert(id.clone(), key);
        }
        if self.phase == BuildPhase::Empty {
            self.phase = BuildPhase::Populated;
        }
        id
    }

    /// Register an operation under its own id. Registering an existing id is
    /// a no-op.
    pub fn add_op(&mut self, op: Operation) -> String {
        let id = op.id.clone();
        if !self.op_index.contains_key(&id) {
            let key = self.ops.insert(op);
            self.op_index.insert(id.clone(), key);
        }
        id
    }

    /// Report each unregistered end of an edge. An edge missing both ends
    /// yields two errors, operation first.
    fn check_edge(&mut self, edge: EdgeKind, op_id: &str, obj_id: &str) {
        let missing_op = !self.op_index.contains_key(op_id);
        let missing_obj = !self.object_index.contains_key(obj_id);
        let missing = [
            (missing_op, MissingRef::Operation),
            (missing_obj, MissingRef::Object),
        ];
        for (_, missing) in missing.into_iter().filter(|(absent, _)| *absent) {
            self.report.push(ReferentialError {
                edge,
                op_id: op_id.to_string(),
                obj_id: obj_id.to_string(),
                missing,
            });
        }
    }

    pub fn add_require(&mut self, op_id: &str, obj_id: &str, count: u32, role: Role) {
        self.record_require(RequireEdge::new(op_id, obj_id, count, role));
    }

    pub fn add_produce(&mut self, op_id: &str, obj_id: &str, count: u32) {
        self.record_produce(ProduceEdge::new(op_id, obj_id, count));
    }

    fn record_require(&mut self, edge: RequireEdge) {
        self.check_edge(EdgeKind::Require, &edge.op_id, &edge.obj_id);
        self.requires
            .entry(edge.op_id.clone())
            .or_default()
            .push(edge);
    }

    fn record_produce(&mut self, edge: ProduceEdge) {
        self.check_edge(EdgeKind::Produce, &edge.op_id, &edge.obj_id);
        self.produced_by
            .entry(edge.obj_id.clone())
            .or_default()
            .push(edge.op_id.clone());
        self.produces
            .entry(edge.op_id.clone())
            .or_default()
            .push(edge);
    }

    /// Write one assembled operation, then register it and replay its edges.
    /// Returns `false` if the op id was already emitted.
    fn emit<W: Write>(
        &mut self,
        writer: &mut GraphWriter<W>,
        op: Operation,
        requirements: Vec<RequireEdge>,
        productions: Vec<ProduceEdge>,
    ) -> Result<bool, BuildError> {
        if self.op_index.contains_key(&op.id) {
            tracing::debug!(op = %op.id, "duplicate operation skipped");
            return Ok(false);
        }
        writer.write_op_record(&op, &requirements, &productions)?;
        self.add_op(op);
        for edge in requirements {
            self.record_require(edge);
        }
        for edge in productions {
            self.record_produce(edge);
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// Register the catalog and stations, then emit every craft and
    /// loot-derived operation.
    pub fn build_graph<W: Write>(
        &mut self,
        input: GraphInput<'_>,
        writer: &mut GraphWriter<W>,
    ) -> Result<BuildSummary, BuildError> {
        if self.phase > BuildPhase::Populated {
            return Err(BuildError::InvalidPhase {
                action: "build",
                phase: self.phase,
            });
        }

        self.register_catalog(input.catalog);
        self.register_stations();
        tracing::debug!(objects = self.objects.len(), "registered objects");

        self.phase = BuildPhase::Ingesting;
        self.ingest_recipes(input.catalog, writer)?;
        self.ingest_loot(input.loot, writer)?;

        let summary = self.summary();
        tracing::info!(
            objects = summary.objects,
            operations = summary.operations,
            requires = summary.requires,
            produces = summary.produces,
            errors = summary.report.len(),
            "graph built"
        );
        Ok(summary)
    }

    fn register_catalog(&mut self, catalog: &CatalogSnapshot) {
        for (name, item) in &catalog.items {
            self.add_object(ObjectKind::Item, name, json!({"id": item.id}));
        }
        for (name, block) in &catalog.blocks {
            self.add_object(ObjectKind::Block, name, json!({"id": block.id}));
        }
    }

    fn register_stations(&mut self) {
        for station in Station::ALL {
            let serves: Vec<&str> = station.serves().iter().map(|kind| kind.as_str()).collect();
            self.add_object(ObjectKind::State, station.name(), json!({"serves": serves}));
        }
    }

    fn ingest_recipes<W: Write>(
        &mut self,
        catalog: &CatalogSnapshot,
        writer: &mut GraphWriter<W>,
    ) -> Result<(), BuildError> {
        for (output, variants) in &catalog.recipes {
            for recipe in variants {
                let op = Operation::new(
                    OpKind::Craft,
                    &format!("{output}#{}", recipe.variant),
                    output.as_str(),
                    json!({"variant": recipe.variant, "requiresTable": recipe.requires_table}),
                );

                let mut requirements = Vec::with_capacity(recipe.ingredients.len() + 1);
                if recipe.requires_table {
                    requirements.push(RequireEdge::new(
                        &op.id,
                        Station::CraftingTable.object_id(),
                        1,
                        Role::Precond,
                    ));
                }
                for (ingredient, &count) in &recipe.ingredients {
                    requirements.push(RequireEdge::new(
                        &op.id,
                        ObjectKind::Item.object_id(ingredient),
                        count,
                        Role::Consumed,
                    ));
                }
                let productions = vec![ProduceEdge::new(
                    &op.id,
                    ObjectKind::Item.object_id(output),
                    recipe.result_count,
                )];

                self.emit(writer, op, requirements, productions)?;
            }
        }
        Ok(())
    }

    /// One operation per loot table: `kill:` for entity tables, `mine:` for
    /// block tables, `loot:` for everything else. A table with an empty
    /// closure still gets an operation, with no productions.
    ///
    /// Beyond the produced items, a `mine:` operation also requires its
    /// source block as a precondition when that block is in the catalog.
    fn ingest_loot<W: Write>(
        &mut self,
        loot: &LootIndex,
        writer: &mut GraphWriter<W>,
    ) -> Result<(), BuildError> {
        for (table_id, items) in &loot.table_to_items {
            let source_type = loot
                .table_meta
                .get(table_id)
                .map_or_else(|| SourceType::from_table_id(table_id), |meta| meta.source_type);
            let meta = json!({"tableId": table_id, "sourceType": source_type});

            let source = Identifier::parse(table_id).and_then(|id| id.strip_first_segment());
            let op = match (source_type, &source) {
                (SourceType::Entity, Some(entity)) => Operation::new(
                    OpKind::Kill,
                    &entity.to_string(),
                    entity.object_name(),
                    meta,
                ),
                (SourceType::Block, Some(block)) => Operation::new(
                    OpKind::Mine,
                    &block.to_string(),
                    block.object_name(),
                    meta,
                ),
                _ => Operation::new(OpKind::Loot, table_id, table_id.as_str(), meta),
            };

            let mut requirements = Vec::new();
            if op.kind == OpKind::Mine {
                let block_id = ObjectKind::Block.object_id(&op.name);
                if self.object_index.contains_key(&block_id) {
                    requirements.push(RequireEdge::new(&op.id, block_id, 1, Role::Precond));
                }
            }

            let productions = items
                .iter()
                .filter_map(|item| Identifier::parse(item))
                .map(|item| ProduceEdge::new(&op.id, ObjectKind::Item.object_id(&item.object_name()), 1))
                .collect();

            self.emit(writer, op, requirements, productions)?;
        }
        Ok(())
    }

    /// Finish the build and close the stream.
    pub fn close<W: Write>(&mut self, writer: GraphWriter<W>) -> Result<W, BuildError> {
        if self.phase == BuildPhase::Closed {
            return Err(BuildError::InvalidPhase {
                action: "close",
                phase: self.phase,
            });
        }
        let inner = writer.close()?;
        self.phase = BuildPhase::Closed;
        Ok(inner)
    }

    // -----------------------------------------------------------------------
    // Validation and queries
    // -----------------------------------------------------------------------

    /// True iff no edge referenced an unregistered id.
    pub fn validate_graph(&self) -> bool {
        self.report.is_valid()
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            objects: self.objects.len(),
            operations: self.ops.len(),
            requires: self.requires.values().map(Vec::len).sum(),
            produces: self.produces.values().map(Vec::len).sum(),
            report: self.report.clone(),
        }
    }

    pub fn object(&self, id: &str) -> Option<&Object> {
        self.object_index.get(id).and_then(|&key| self.objects.get(key))
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.op_index.get(id).and_then(|&key| self.ops.get(key))
    }

    /// Registered objects in registration order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// Registered operations in emission order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.ops.values()
    }

    /// Ids of every operation producing `obj_id`, in emission order.
    pub fn producers_of(&self, obj_id: &str) -> &[String] {
        self.produced_by.get(obj_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn requirements_of(&self, op_id: &str) -> &[RequireEdge] {
        self.requires.get(op_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn productions_of(&self, op_id: &str) -> &[ProduceEdge] {
        self.produces.get(op_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }
}

// ---------------------------------------------------------------------------
// Directory builds
// ---------------------------------------------------------------------------

/// Build into `out_dir` unless it already holds a completed graph.
pub fn build_to_dir(out_dir: &Path, input: GraphInput<'_>) -> Result<BuildOutcome, BuildError> {
    if writer::is_complete(out_dir) {
        let marker = writer::graph_path(out_dir);
        tracing::info!(path = %marker.display(), "graph already built, skipping");
        return Ok(BuildOutcome::Skipped { marker });
    }

    let mut out: GraphWriter<File> = GraphWriter::create(out_dir)?;
    let mut builder = GraphBuilder::new();
    let summary = builder.build_graph(input, &mut out)?;
    builder.close(out)?;
    Ok(BuildOutcome::Built(summary))
}
