//! Item-tag expansion.
//!
//! A tag is a named list of values, each a literal item id, a `#`-prefixed
//! reference to another tag, or an object `{ "id": ..., "required": ... }`
//! wrapping either of those. [`TagExpander`] flattens tags into concrete item
//! sets. Every tag is resolved once and memoized; a tag that is re-entered
//! while it is still being expanded contributes nothing, so reference cycles
//! of any length terminate.

use crate::id::normalize_id;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Raw tag definitions: tag id to the list of values in its file.
pub type RawTagMap = BTreeMap<String, Vec<Value>>;

/// Resolved tags: tag id to the concrete item ids it contains.
pub type TagIndex = BTreeMap<String, BTreeSet<String>>;

/// One parsed value of a tag definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEntry {
    /// A literal item id, normalized.
    Item(String),
    /// A reference to another tag, normalized, without the leading `#`.
    Nested(String),
}

impl TagEntry {
    /// Parse a raw tag value. Malformed values yield `None`.
    pub fn parse(value: &Value) -> Option<Self> {
        let raw = match value {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("id")?.as_str()?,
            _ => return None,
        };
        match raw.strip_prefix('#') {
            Some(tag) => normalize_id(tag).map(TagEntry::Nested),
            None => normalize_id(raw).map(TagEntry::Item),
        }
    }
}

/// Extract the `values` list from a tag file document.
///
/// Files without a `values` array contribute an empty list.
pub fn tag_values(doc: &Value) -> Vec<Value> {
    doc.get("values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Derive a tag id from an archive path of the form
/// `data/<ns>/tags/items/<relative>.json` (or the singular `tags/item/`).
pub fn tag_id_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("data/")?;
    let (namespace, rest) = rest.split_once('/')?;
    let relative = rest
        .strip_prefix("tags/items/")
        .or_else(|| rest.strip_prefix("tags/item/"))?
        .strip_suffix(".json")?;
    if namespace.is_empty() || relative.is_empty() {
        return None;
    }
    Some(format!("{namespace}:{relative}"))
}

/// Memoizing, cycle-safe tag resolver over a raw tag map.
#[derive(Debug)]
pub struct TagExpander<'a> {
    raw: &'a RawTagMap,
    resolved: HashMap<String, BTreeSet<String>>,
}

impl<'a> TagExpander<'a> {
    pub fn new(raw: &'a RawTagMap) -> Self {
        Self {
            raw,
            resolved: HashMap::new(),
        }
    }

    /// Resolve a tag id to its item set. Unknown tags resolve to the empty set.
    pub fn expand(&mut self, tag_id: &str) -> BTreeSet<String> {
        let Some(tag_id) = normalize_id(tag_id.trim_start_matches('#')) else {
            return BTreeSet::new();
        };
        let mut visiting = HashSet::new();
        self.expand_inner(&tag_id, &mut visiting)
    }

    fn expand_inner(&mut self, tag_id: &str, visiting: &mut HashSet<String>) -> BTreeSet<String> {
        if let Some(items) = self.resolved.get(tag_id) {
            return items.clone();
        }
        if !visiting.insert(tag_id.to_string()) {
            tracing::trace!(tag = tag_id, "tag cycle cut");
            return BTreeSet::new();
        }

        let mut items = BTreeSet::new();
        let raw = self.raw;
        for entry in raw
            .get(tag_id)
            .into_iter()
            .flatten()
            .filter_map(TagEntry::parse)
        {
            match entry {
                TagEntry::Item(item) => {
                    items.insert(item);
                }
                TagEntry::Nested(nested) => {
                    items.extend(self.expand_inner(&nested, visiting));
                }
            }
        }

        visiting.remove(tag_id);
        self.resolved.insert(tag_id.to_string(), items.clone());
        items
    }

    /// Number of tags resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// Expand every defined tag and return the resolved index.
    pub fn expand_all(mut self) -> TagIndex {
        let raw = self.raw;
        let index: TagIndex = raw
            .keys()
            .map(|tag_id| (tag_id.clone(), self.expand(tag_id)))
            .collect();
        tracing::debug!(tags = index.len(), "expanded item tags");
        index
    }
}
