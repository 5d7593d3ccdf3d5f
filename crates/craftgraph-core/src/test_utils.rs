//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{
    BlockDef, Catalog, CatalogSnapshot, EntityDef, IngredientRef, ItemDef, RecipeResult,
    RecipeVariant,
};
use crate::loot::{LootIndex, resolve_all};
use crate::tag::{RawTagMap, TagExpander};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const SAMPLE_VERSION: &str = "1.20.4";

// ===========================================================================
// Catalog constructors
// ===========================================================================

pub fn item(id: i64, name: &str) -> ItemDef {
    ItemDef {
        id,
        name: name.to_string(),
        display_name: None,
        stack_size: Some(64),
        components: None,
    }
}

pub fn block(id: i64, name: &str) -> BlockDef {
    BlockDef {
        id,
        name: name.to_string(),
        display_name: None,
        hardness: Some(1.5),
        min_state_id: None,
        max_state_id: None,
        diggable: Some(true),
        material: None,
        components: None,
    }
}

pub fn entity(id: i64, name: &str) -> EntityDef {
    EntityDef {
        id,
        name: name.to_string(),
        display_name: None,
        entity_type: Some("hostile".to_string()),
        category: None,
    }
}

/// A shaped recipe; `None` cells are empty grid slots.
pub fn shaped(rows: &[&[Option<i64>]], count: u32) -> RecipeVariant {
    RecipeVariant {
        in_shape: Some(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.map(IngredientRef::Id)).collect())
                .collect(),
        ),
        ingredients: None,
        result: Some(RecipeResult {
            id: None,
            count: Some(count),
        }),
        requires_table: None,
    }
}

pub fn shapeless(ids: &[i64], count: u32) -> RecipeVariant {
    RecipeVariant {
        in_shape: None,
        ingredients: Some(ids.iter().map(|&id| Some(IngredientRef::Id(id))).collect()),
        result: Some(RecipeResult {
            id: None,
            count: Some(count),
        }),
        requires_table: None,
    }
}

// ===========================================================================
// Sample data set
// ===========================================================================

/// A small but complete catalog: two crafting recipes (one needing a table),
/// a minable block, and a hostile entity.
pub fn sample_catalog() -> Catalog {
    let mut recipes = BTreeMap::new();
    // stick: two planks stacked vertically, 2x1 grid
    recipes.insert("2".to_string(), vec![shaped(&[&[Some(1)], &[Some(1)]], 4)]);
    // oak_planks: one log, shapeless
    recipes.insert("1".to_string(), vec![shapeless(&[11], 4)]);
    // diamond_pickaxe: full 3x3 grid
    recipes.insert(
        "4".to_string(),
        vec![shaped(
            &[
                &[Some(3), Some(3), Some(3)],
                &[None, Some(2), None],
                &[None, Some(2), None],
            ],
            1,
        )],
    );

    Catalog {
        items: vec![
            item(1, "oak_planks"),
            item(2, "stick"),
            item(3, "diamond"),
            item(4, "diamond_pickaxe"),
            item(5, "cobblestone"),
            item(6, "rotten_flesh"),
            item(7, "iron_ingot"),
            item(8, "bread"),
            item(9, "birch_planks"),
            item(10, "stone"),
            item(11, "oak_log"),
        ],
        blocks: vec![block(1, "stone"), block(2, "oak_log")],
        entities: vec![entity(1, "zombie")],
        recipes,
        version: None,
    }
}

// ===========================================================================
// Tag and loot-table JSON builders
// ===========================================================================

pub fn item_entry(name: &str) -> Value {
    json!({"type": "minecraft:item", "name": name})
}

pub fn tag_entry(name: &str) -> Value {
    json!({"type": "minecraft:tag", "name": name, "expand": true})
}

pub fn table_ref(table_id: &str) -> Value {
    json!({"type": "minecraft:loot_table", "value": table_id})
}

/// A single-pool loot table over `entries`.
pub fn loot_table(entries: Vec<Value>) -> Value {
    json!({
        "type": "minecraft:generic",
        "pools": [{"rolls": 1, "entries": entries}]
    })
}

/// `minecraft:planks` references an undefined `minecraft:wooden_planks`.
pub fn sample_raw_tags() -> RawTagMap {
    let mut raw = RawTagMap::new();
    raw.insert(
        "minecraft:planks".to_string(),
        vec![json!("minecraft:oak_planks"), json!("#minecraft:wooden_planks")],
    );
    raw.insert(
        "minecraft:logs".to_string(),
        vec![json!("oak_log"), json!({"id": "minecraft:birch_log", "required": false})],
    );
    raw
}

pub fn sample_loot_tables() -> BTreeMap<String, Value> {
    let mut tables = BTreeMap::new();
    tables.insert(
        "minecraft:blocks/stone".to_string(),
        loot_table(vec![item_entry("minecraft:cobblestone")]),
    );
    tables.insert(
        "minecraft:blocks/oak_log".to_string(),
        loot_table(vec![item_entry("minecraft:oak_log")]),
    );
    tables.insert(
        "minecraft:entities/zombie".to_string(),
        loot_table(vec![
            item_entry("minecraft:rotten_flesh"),
            item_entry("minecraft:iron_ingot"),
        ]),
    );
    tables.insert(
        "minecraft:chests/simple_dungeon".to_string(),
        loot_table(vec![
            item_entry("minecraft:bread"),
            tag_entry("minecraft:planks"),
            table_ref("minecraft:blocks/stone"),
        ]),
    );
    tables
}

/// The resolved inputs for [`crate::builder::GraphBuilder::build_graph`].
pub fn sample_inputs() -> (CatalogSnapshot, LootIndex) {
    let snapshot = CatalogSnapshot::from_catalog(SAMPLE_VERSION, &sample_catalog());
    let raw_tags = sample_raw_tags();
    let tags = TagExpander::new(&raw_tags).expand_all();
    let loot = resolve_all(&sample_loot_tables(), &tags);
    (snapshot, loot)
}
