//! Loot-table parsing and closure resolution.
//!
//! Each loot table is an arbitrary JSON tree. Nodes carrying a recognised
//! `type` are classified into item, tag, or nested-table entries; every node is
//! then traversed for further entries regardless of its classification. The
//! closure of a table is everything obtainable from it after following tag and
//! table references. A table re-entered while it is on the current path
//! contributes nothing for that edge, so table reference cycles terminate.

use crate::id::{Identifier, normalize_id};
use crate::tag::TagIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// Source classification
// ---------------------------------------------------------------------------

/// Where a loot table's drops come from, inferred from its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Entity,
    Block,
    Chest,
    Gameplay,
    Archaeology,
    Other,
}

impl SourceType {
    /// Classify by the first path segment of the table id.
    pub fn from_table_id(table_id: &str) -> Self {
        let Some(id) = Identifier::parse(table_id) else {
            return SourceType::Other;
        };
        match id.first_segment() {
            "entities" => SourceType::Entity,
            "blocks" => SourceType::Block,
            "chests" => SourceType::Chest,
            "gameplay" => SourceType::Gameplay,
            "archaeology" => SourceType::Archaeology,
            _ => SourceType::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SourceType::Entity => "entity",
            SourceType::Block => "block",
            SourceType::Chest => "chest",
            SourceType::Gameplay => "gameplay",
            SourceType::Archaeology => "archaeology",
            SourceType::Other => "other",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a loot-table id from an archive path of the form
/// `data/<ns>/loot_tables/<relative>.json` (or the singular `loot_table/`).
pub fn table_id_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("data/")?;
    let (namespace, rest) = rest.split_once('/')?;
    let relative = rest
        .strip_prefix("loot_tables/")
        .or_else(|| rest.strip_prefix("loot_table/"))?
        .strip_suffix(".json")?;
    if namespace.is_empty() || relative.is_empty() {
        return None;
    }
    Some(format!("{namespace}:{relative}"))
}

// ---------------------------------------------------------------------------
// Node classification
// ---------------------------------------------------------------------------

/// A classified loot-table node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootNode {
    ItemEntry(String),
    TagEntry(String),
    TableRefEntry(String),
    Other,
}

impl LootNode {
    /// Classify a JSON object by its `type` field.
    pub fn classify(node: &Map<String, Value>) -> Self {
        let Some(kind) = node.get("type").and_then(Value::as_str).and_then(normalize_id) else {
            return LootNode::Other;
        };
        let name = || node.get("name").and_then(Value::as_str).and_then(normalize_id);
        let classified = match kind.as_str() {
            "minecraft:item" => name().map(LootNode::ItemEntry),
            "minecraft:tag" => name().map(LootNode::TagEntry),
            "minecraft:loot_table" => node
                .get("value")
                .and_then(Value::as_str)
                .and_then(normalize_id)
                .or_else(name)
                .map(LootNode::TableRefEntry),
            _ => None,
        };
        classified.unwrap_or(LootNode::Other)
    }
}

// ---------------------------------------------------------------------------
// Table metadata
// ---------------------------------------------------------------------------

/// Parsed shape of a single loot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootTableMeta {
    pub source_type: SourceType,
    /// Item ids named directly by item entries.
    pub items: BTreeSet<String>,
    /// Tag ids named by tag entries.
    pub tags: BTreeSet<String>,
    /// Ids of nested loot tables.
    pub table_refs: BTreeSet<String>,
}

impl LootTableMeta {
    /// Walk a loot-table document and collect its entries.
    pub fn parse(table_id: &str, doc: &Value) -> Self {
        let mut meta = Self {
            source_type: SourceType::from_table_id(table_id),
            items: BTreeSet::new(),
            tags: BTreeSet::new(),
            table_refs: BTreeSet::new(),
        };
        meta.collect(doc);
        meta
    }

    fn collect(&mut self, node: &Value) {
        match node {
            Value::Array(values) => {
                for value in values {
                    self.collect(value);
                }
            }
            Value::Object(map) => {
                match LootNode::classify(map) {
                    LootNode::ItemEntry(item) => {
                        self.items.insert(item);
                    }
                    LootNode::TagEntry(tag) => {
                        self.tags.insert(tag);
                    }
                    LootNode::TableRefEntry(table) => {
                        self.table_refs.insert(table);
                    }
                    LootNode::Other => {}
                }
                for value in map.values() {
                    self.collect(value);
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved index
// ---------------------------------------------------------------------------

/// One place an item can be obtained from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub table: String,
}

/// The fully resolved loot data for one data release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootIndex {
    pub table_to_items: BTreeMap<String, BTreeSet<String>>,
    /// Every source of every item. Duplicates across tables are kept.
    pub item_to_sources: BTreeMap<String, Vec<ItemSource>>,
    pub table_meta: BTreeMap<String, LootTableMeta>,
}

impl LootIndex {
    pub fn sources_of(&self, item_id: &str) -> &[ItemSource] {
        self.item_to_sources
            .get(item_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Computes table closures over parsed table metadata.
#[derive(Debug)]
pub struct LootResolver<'a> {
    meta: &'a BTreeMap<String, LootTableMeta>,
    tags: &'a TagIndex,
    memo: HashMap<String, BTreeSet<String>>,
}

impl<'a> LootResolver<'a> {
    pub fn new(meta: &'a BTreeMap<String, LootTableMeta>, tags: &'a TagIndex) -> Self {
        Self {
            meta,
            tags,
            memo: HashMap::new(),
        }
    }

    /// All items obtainable from `table_id`. Unknown tables yield the empty set.
    pub fn closure_items(&mut self, table_id: &str) -> BTreeSet<String> {
        let mut path = HashMap::new();
        self.closure_inner(table_id, &mut path).0
    }

    /// Returns the closure and the shallowest path depth at which the cycle
    /// guard cut an edge during this call, if any.
    ///
    /// A result is only memoized when no cut landed above `table_id` on the
    /// path; such a closure does not depend on how `table_id` was reached.
    fn closure_inner(
        &mut self,
        table_id: &str,
        path: &mut HashMap<String, usize>,
    ) -> (BTreeSet<String>, Option<usize>) {
        if let Some(&depth) = path.get(table_id) {
            return (BTreeSet::new(), Some(depth));
        }
        if let Some(items) = self.memo.get(table_id) {
            return (items.clone(), None);
        }
        let meta = self.meta;
        let Some(table) = meta.get(table_id) else {
            return (BTreeSet::new(), None);
        };

        let depth = path.len();
        path.insert(table_id.to_string(), depth);

        let mut items = table.items.clone();
        for tag in &table.tags {
            if let Some(tag_items) = self.tags.get(tag) {
                items.extend(tag_items.iter().cloned());
            }
        }
        let mut shallowest_cut: Option<usize> = None;
        for nested in &table.table_refs {
            let (nested_items, cut) = self.closure_inner(nested, path);
            items.extend(nested_items);
            shallowest_cut = match (shallowest_cut, cut) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }

        path.remove(table_id);
        if shallowest_cut.is_none_or(|cut| cut >= depth) {
            self.memo.insert(table_id.to_string(), items.clone());
            shallowest_cut = None;
        }
        (items, shallowest_cut)
    }
}

/// Parse every raw loot table, compute closures, and record provenance.
pub fn resolve_all(raw_tables: &BTreeMap<String, Value>, tags: &TagIndex) -> LootIndex {
    let table_meta: BTreeMap<String, LootTableMeta> = raw_tables
        .iter()
        .map(|(table_id, doc)| (table_id.clone(), LootTableMeta::parse(table_id, doc)))
        .collect();

    let mut resolver = LootResolver::new(&table_meta, tags);
    let mut table_to_items = BTreeMap::new();
    let mut item_to_sources: BTreeMap<String, Vec<ItemSource>> = BTreeMap::new();

    for (table_id, meta) in &table_meta {
        let items = resolver.closure_items(table_id);
        for item in &items {
            item_to_sources
                .entry(item.clone())
                .or_default()
                .push(ItemSource {
                    source_type: meta.source_type,
                    table: table_id.clone(),
                });
        }
        table_to_items.insert(table_id.clone(), items);
    }

    tracing::debug!(
        tables = table_meta.len(),
        items = item_to_sources.len(),
        "resolved loot tables"
    );

    LootIndex {
        table_to_items,
        item_to_sources,
        table_meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn tables(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(id, doc)| (id.to_string(), doc.clone()))
            .collect()
    }

    fn pool(entries: Value) -> Value {
        json!({"pools": [{"rolls": 1, "entries": entries}]})
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn source_type_from_first_segment() {
        assert_eq!(SourceType::from_table_id("minecraft:entities/zombie"), SourceType::Entity);
        assert_eq!(SourceType::from_table_id("minecraft:blocks/stone"), SourceType::Block);
        assert_eq!(
            SourceType::from_table_id("minecraft:chests/simple_dungeon"),
            SourceType::Chest
        );
        assert_eq!(
            SourceType::from_table_id("minecraft:gameplay/fishing"),
            SourceType::Gameplay
        );
        assert_eq!(
            SourceType::from_table_id("minecraft:archaeology/desert_pyramid"),
            SourceType::Archaeology
        );
        assert_eq!(SourceType::from_table_id("minecraft:empty"), SourceType::Other);
        assert_eq!(SourceType::from_table_id(""), SourceType::Other);
    }

    #[test]
    fn table_id_from_archive_path() {
        assert_eq!(
            table_id_from_path("data/minecraft/loot_tables/blocks/stone.json").as_deref(),
            Some("minecraft:blocks/stone")
        );
        assert_eq!(
            table_id_from_path("data/minecraft/loot_table/entities/zombie.json").as_deref(),
            Some("minecraft:entities/zombie")
        );
        assert_eq!(table_id_from_path("data/minecraft/recipes/stick.json"), None);
    }

    #[test]
    fn classify_entries() {
        let item = json!({"type": "minecraft:item", "name": "minecraft:stone"});
        assert_eq!(
            LootNode::classify(item.as_object().unwrap()),
            LootNode::ItemEntry("minecraft:stone".into())
        );

        let tag = json!({"type": "tag", "name": "minecraft:planks", "expand": true});
        assert_eq!(
            LootNode::classify(tag.as_object().unwrap()),
            LootNode::TagEntry("minecraft:planks".into())
        );

        let by_value = json!({"type": "minecraft:loot_table", "value": "minecraft:chests/x"});
        assert_eq!(
            LootNode::classify(by_value.as_object().unwrap()),
            LootNode::TableRefEntry("minecraft:chests/x".into())
        );

        let by_name = json!({"type": "minecraft:loot_table", "name": "chests/y"});
        assert_eq!(
            LootNode::classify(by_name.as_object().unwrap()),
            LootNode::TableRefEntry("minecraft:chests/y".into())
        );
    }

    #[test]
    fn unrecognised_nodes_are_other() {
        for node in [
            json!({"type": "minecraft:empty", "weight": 5}),
            json!({"type": "minecraft:item"}),
            json!({"type": 3, "name": "minecraft:stone"}),
            json!({"function": "minecraft:set_count"}),
            json!({"type": "minecraft:loot_table", "value": {"pools": []}}),
        ] {
            assert_eq!(LootNode::classify(node.as_object().unwrap()), LootNode::Other);
        }
    }

    #[test]
    fn parse_walks_nested_structures() {
        let doc = json!({
            "type": "minecraft:block",
            "pools": [{
                "entries": [{
                    "type": "minecraft:alternatives",
                    "children": [
                        {"type": "minecraft:item", "name": "minecraft:diamond"},
                        {"type": "minecraft:item", "name": "coal"}
                    ]
                }, {
                    "type": "minecraft:tag", "name": "minecraft:music_discs"
                }, {
                    "type": "minecraft:loot_table",
                    "value": {"pools": [{"entries": [
                        {"type": "minecraft:item", "name": "minecraft:emerald"}
                    ]}]}
                }]
            }]
        });
        let meta = LootTableMeta::parse("minecraft:blocks/diamond_ore", &doc);
        assert_eq!(meta.source_type, SourceType::Block);
        assert_eq!(
            meta.items,
            set(&["minecraft:coal", "minecraft:diamond", "minecraft:emerald"])
        );
        assert_eq!(meta.tags, set(&["minecraft:music_discs"]));
        assert!(meta.table_refs.is_empty());
    }

    // -----------------------------------------------------------------------
    // Closure
    // -----------------------------------------------------------------------

    #[test]
    fn closure_includes_tags_and_nested_tables() {
        let raw = tables(&[
            (
                "minecraft:chests/outer",
                pool(json!([
                    {"type": "minecraft:item", "name": "minecraft:bread"},
                    {"type": "minecraft:tag", "name": "minecraft:planks"},
                    {"type": "minecraft:loot_table", "value": "minecraft:chests/inner"}
                ])),
            ),
            (
                "minecraft:chests/inner",
                pool(json!([{"type": "minecraft:item", "name": "minecraft:gold_ingot"}])),
            ),
        ]);
        let mut tags = TagIndex::new();
        tags.insert(
            "minecraft:planks".into(),
            set(&["minecraft:oak_planks", "minecraft:birch_planks"]),
        );

        let index = resolve_all(&raw, &tags);
        assert_eq!(
            index.table_to_items["minecraft:chests/outer"],
            set(&[
                "minecraft:birch_planks",
                "minecraft:bread",
                "minecraft:gold_ingot",
                "minecraft:oak_planks"
            ])
        );
        assert_eq!(
            index.table_to_items["minecraft:chests/inner"],
            set(&["minecraft:gold_ingot"])
        );
    }

    #[test]
    fn two_table_cycle_terminates() {
        let raw = tables(&[
            (
                "minecraft:chests/x",
                pool(json!([
                    {"type": "minecraft:item", "name": "minecraft:x_item"},
                    {"type": "minecraft:loot_table", "value": "minecraft:chests/y"}
                ])),
            ),
            (
                "minecraft:chests/y",
                pool(json!([
                    {"type": "minecraft:item", "name": "minecraft:y_item"},
                    {"type": "minecraft:loot_table", "value": "minecraft:chests/x"}
                ])),
            ),
        ]);
        let index = resolve_all(&raw, &TagIndex::new());
        let both = set(&["minecraft:x_item", "minecraft:y_item"]);
        assert_eq!(index.table_to_items["minecraft:chests/x"], both);
        assert_eq!(index.table_to_items["minecraft:chests/y"], both);
    }

    #[test]
    fn truncated_closure_is_not_memoized() {
        // a -> b -> a, b -> c. While a is on the path, b's closure is cut at a;
        // asking for b afterwards must still include a's items.
        let raw = tables(&[
            (
                "minecraft:chests/a",
                pool(json!([
                    {"type": "minecraft:item", "name": "minecraft:a_item"},
                    {"type": "minecraft:loot_table", "value": "minecraft:chests/b"}
                ])),
            ),
            (
                "minecraft:chests/b",
                pool(json!([
                    {"type": "minecraft:loot_table", "value": "minecraft:chests/a"},
                    {"type": "minecraft:loot_table", "value": "minecraft:chests/c"}
                ])),
            ),
            (
                "minecraft:chests/c",
                pool(json!([{"type": "minecraft:item", "name": "minecraft:c_item"}])),
            ),
        ]);
        let meta: BTreeMap<_, _> = raw
            .iter()
            .map(|(id, doc)| (id.clone(), LootTableMeta::parse(id, doc)))
            .collect();
        let tags = TagIndex::new();
        let mut resolver = LootResolver::new(&meta, &tags);

        assert_eq!(
            resolver.closure_items("minecraft:chests/a"),
            set(&["minecraft:a_item", "minecraft:c_item"])
        );
        assert_eq!(
            resolver.closure_items("minecraft:chests/b"),
            set(&["minecraft:a_item", "minecraft:c_item"])
        );
        assert_eq!(
            resolver.closure_items("minecraft:chests/c"),
            set(&["minecraft:c_item"])
        );
    }

    #[test]
    fn unknown_references_contribute_nothing() {
        let raw = tables(&[(
            "minecraft:chests/lonely",
            pool(json!([
                {"type": "minecraft:loot_table", "value": "minecraft:chests/missing"},
                {"type": "minecraft:tag", "name": "minecraft:missing"},
                {"type": "minecraft:item", "name": "minecraft:apple"}
            ])),
        )]);
        let index = resolve_all(&raw, &TagIndex::new());
        assert_eq!(
            index.table_to_items["minecraft:chests/lonely"],
            set(&["minecraft:apple"])
        );
        let meta = &index.table_meta["minecraft:chests/lonely"];
        assert_eq!(meta.table_refs, set(&["minecraft:chests/missing"]));
        assert_eq!(meta.tags, set(&["minecraft:missing"]));
    }

    // -----------------------------------------------------------------------
    // Provenance
    // -----------------------------------------------------------------------

    #[test]
    fn provenance_keeps_every_source() {
        let raw = tables(&[
            (
                "minecraft:blocks/stone",
                pool(json!([{"type": "minecraft:item", "name": "minecraft:cobblestone"}])),
            ),
            (
                "minecraft:chests/mine",
                pool(json!([
                    {"type": "minecraft:item", "name": "minecraft:cobblestone"},
                    {"type": "minecraft:loot_table", "value": "minecraft:blocks/stone"}
                ])),
            ),
        ]);
        let index = resolve_all(&raw, &TagIndex::new());
        let sources = index.sources_of("minecraft:cobblestone");
        assert_eq!(sources.len(), 2);
        assert_eq!(
            sources[0],
            ItemSource {
                source_type: SourceType::Block,
                table: "minecraft:blocks/stone".into()
            }
        );
        assert_eq!(sources[1].source_type, SourceType::Chest);
        assert!(index.sources_of("minecraft:nothing").is_empty());
    }

    #[test]
    fn index_serializes_camel_case() {
        let raw = tables(&[(
            "minecraft:blocks/stone",
            pool(json!([{"type": "minecraft:item", "name": "minecraft:cobblestone"}])),
        )]);
        let index = resolve_all(&raw, &TagIndex::new());
        let value = serde_json::to_value(&index).unwrap();
        assert!(value.get("tableToItems").is_some());
        assert!(value.get("itemToSources").is_some());
        assert_eq!(
            value["tableMeta"]["minecraft:blocks/stone"]["sourceType"],
            json!("block")
        );
        assert_eq!(
            value["itemToSources"]["minecraft:cobblestone"][0]["type"],
            json!("block")
        );
        assert!(value["tableMeta"]["minecraft:blocks/stone"]["tableRefs"].is_array());
    }
}
