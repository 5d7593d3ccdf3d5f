use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

/// Namespace applied to identifiers written without a `<namespace>:` prefix.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

new_key_type! {
    /// Arena key of a registered object in the graph builder.
    pub struct ObjectKey;

    /// Arena key of a registered operation in the graph builder.
    pub struct OpKey;
}

/// A namespaced resource identifier, `<namespace>:<path>`.
///
/// Paths may contain `/` separators (`minecraft:blocks/stone`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Parse a raw id, applying [`DEFAULT_NAMESPACE`] when no prefix is given.
    ///
    /// Returns `None` for empty input or an empty namespace/path half; such
    /// ids are rejected rather than passed through unchanged.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let (namespace, path) = match raw.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, raw),
        };
        if namespace.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }

    /// The name this identifier is registered under as a graph object: the
    /// bare path in the default namespace, the full id anywhere else.
    pub fn object_name(&self) -> String {
        if self.is_default_namespace() {
            self.path.clone()
        } else {
            self.to_string()
        }
    }

    /// First `/`-separated segment of the path (`blocks` for `blocks/stone`).
    pub fn first_segment(&self) -> &str {
        self.path.split('/').next().unwrap_or(&self.path)
    }

    /// The identifier with its first path segment removed, keeping the
    /// namespace: `minecraft:blocks/stone` becomes `minecraft:stone`.
    pub fn strip_first_segment(&self) -> Option<Self> {
        let (_, rest) = self.path.split_once('/')?;
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            namespace: self.namespace.clone(),
            path: rest.to_string(),
        })
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Normalize a raw id string to its `<namespace>:<path>` form.
pub fn normalize_id(raw: &str) -> Option<String> {
    Identifier::parse(raw).map(|id| id.to_string())
}
