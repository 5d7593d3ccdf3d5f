//! Newline-delimited operation-record stream.
//!
//! One JSON record per operation: `{id, kind, name, meta, req, prod}`. When
//! bound to a directory the stream is written to `full_graph.jsonl.partial`
//! and renamed to `full_graph.jsonl` on [`GraphWriter::close`]; the final file
//! therefore only exists for a completed build and doubles as the
//! build-complete marker.

use crate::model::{OpKind, Operation, ProduceEdge, RequireEdge};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the completed operation stream.
pub const GRAPH_FILE: &str = "full_graph.jsonl";

const PARTIAL_SUFFIX: &str = ".partial";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("graph output I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("graph record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Path of the completed stream inside `dir`.
pub fn graph_path(dir: &Path) -> PathBuf {
    dir.join(GRAPH_FILE)
}

fn partial_path(dir: &Path) -> PathBuf {
    dir.join(format!("{GRAPH_FILE}{PARTIAL_SUFFIX}"))
}

/// Whether a completed stream already exists in `dir`. Presence only; the
/// contents are not inspected.
pub fn is_complete(dir: &Path) -> bool {
    graph_path(dir).is_file()
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OpRecord<'a> {
    id: &'a str,
    kind: OpKind,
    name: &'a str,
    meta: &'a Value,
    req: &'a [RequireEdge],
    prod: &'a [ProduceEdge],
}

#[derive(Debug)]
struct Finalize {
    partial: PathBuf,
    complete: PathBuf,
}

/// Append-only sink for operation records.
#[derive(Debug)]
pub struct GraphWriter<W: Write = File> {
    out: BufWriter<W>,
    finalize: Option<Finalize>,
    records: usize,
}

impl GraphWriter<File> {
    /// Create `dir` if needed and open a fresh partial stream inside it.
    pub fn create(dir: &Path) -> Result<Self, WriteError> {
        fs::create_dir_all(dir)?;
        let partial = partial_path(dir);
        let file = File::create(&partial)?;
        tracing::debug!(path = %partial.display(), "opened graph stream");
        Ok(Self {
            out: BufWriter::new(file),
            finalize: Some(Finalize {
                partial,
                complete: graph_path(dir),
            }),
            records: 0,
        })
    }
}

impl<W: Write> GraphWriter<W> {
    /// Write records into an arbitrary sink. Closing does no renaming.
    pub fn from_writer(inner: W) -> Self {
        Self {
            out: BufWriter::new(inner),
            finalize: None,
            records: 0,
        }
    }

    /// Append one operation record and its terminating newline.
    pub fn write_op_record(
        &mut self,
        op: &Operation,
        requirements: &[RequireEdge],
        productions: &[ProduceEdge],
    ) -> Result<(), WriteError> {
        let record = OpRecord {
            id: &op.id,
            kind: op.kind,
            name: &op.name,
            meta: &op.meta,
            req: requirements,
            prod: productions,
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Flush the stream and, for directory-bound writers, publish it under its
    /// final name. Returns the underlying sink.
    pub fn close(self) -> Result<W, WriteError> {
        let inner = self.out.into_inner().map_err(|e| e.into_error())?;
        if let Some(finalize) = self.finalize {
            fs::rename(&finalize.partial, &finalize.complete)?;
            tracing::debug!(
                path = %finalize.complete.display(),
                records = self.records,
                "graph stream complete"
            );
        }
        Ok(inner)
    }
}
