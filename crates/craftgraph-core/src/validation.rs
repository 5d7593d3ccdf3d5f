//! Referential-integrity reporting.
//!
//! Edges that name an unregistered operation or object are not rejected; the
//! builder keeps the edge and records a [`ReferentialError`] here instead.

use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which kind of edge a referential error was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Require,
    Produce,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EdgeKind::Require => "require",
            EdgeKind::Produce => "produce",
        })
    }
}

/// Which end of the edge was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRef {
    Operation,
    Object,
}

impl fmt::Display for MissingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingRef::Operation => "operation",
            MissingRef::Object => "object",
        })
    }
}

/// An edge referencing an id that was not registered when the edge was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{edge} edge {op_id} -> {obj_id}: unknown {missing}")]
pub struct ReferentialError {
    pub edge: EdgeKind,
    pub op_id: String,
    pub obj_id: String,
    pub missing: MissingRef,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Accumulated referential errors for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<ReferentialError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ReferentialError) {
        tracing::warn!(%error, "referential error");
        self.errors.push(error);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ReferentialError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
