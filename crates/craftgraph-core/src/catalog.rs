//! Static game catalog and the resolved snapshot the graph is built from.
//!
//! A [`Catalog`] is the raw, per-version data: item, block and entity arrays
//! plus a recipe table keyed by the numeric id of the result item. Recipe
//! ingredients refer to items by numeric id. [`CatalogSnapshot`] resolves those
//! ids to names, merges ingredient multiplicities, and decides for every recipe
//! variant whether a crafting table is needed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Raw catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDef {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDef {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_state_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_state_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDef {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A recipe ingredient: a bare numeric item id or an object carrying one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngredientRef {
    Id(i64),
    Detailed { id: i64 },
}

impl IngredientRef {
    pub fn item_id(self) -> i64 {
        match self {
            IngredientRef::Id(id) | IngredientRef::Detailed { id } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// One way of crafting a result. Shaped variants carry `in_shape`, shapeless
/// variants carry `ingredients`; empty grid cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_shape: Option<Vec<Vec<Option<IngredientRef>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Option<IngredientRef>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RecipeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_table: Option<bool>,
}

impl RecipeVariant {
    /// Whether this variant needs a crafting table.
    ///
    /// An explicit `requires_table` wins. Otherwise a shaped recipe needs one
    /// when its grid exceeds 2x2 and a shapeless recipe when it has more than
    /// four ingredient slots. This is a fallback heuristic, not a game rule.
    pub fn infer_requires_table(&self) -> bool {
        if let Some(explicit) = self.requires_table {
            return explicit;
        }
        if let Some(shape) = &self.in_shape {
            let rows = shape.len();
            let cols = shape.iter().map(Vec::len).max().unwrap_or(0);
            return rows > 2 || cols > 2;
        }
        if let Some(ingredients) = &self.ingredients {
            return ingredients.len() > 4;
        }
        false
    }

    /// Declared result count, defaulting to 1.
    pub fn result_count(&self) -> u32 {
        self.result.and_then(|r| r.count).unwrap_or(1)
    }

    /// Every non-empty ingredient slot, shapeless list first, then the grid
    /// row by row.
    pub fn ingredient_slots(&self) -> impl Iterator<Item = IngredientRef> + '_ {
        let shapeless = self.ingredients.iter().flatten().flatten().copied();
        let shaped = self
            .in_shape
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .copied();
        shapeless.chain(shaped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub minecraft_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_version: Option<String>,
}

/// Raw per-version catalog data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
    /// Recipe variants keyed by the result item's numeric id.
    #[serde(default)]
    pub recipes: BTreeMap<String, Vec<RecipeVariant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionInfo>,
}

impl Catalog {
    fn item_names(&self) -> HashMap<i64, &str> {
        self.items
            .iter()
            .map(|item| (item.id, item.name.as_str()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCounts {
    pub items: usize,
    pub blocks: usize,
    pub entities: usize,
    pub recipe_outputs: usize,
}

/// A recipe variant with ingredient ids resolved to item names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecipe {
    pub variant: usize,
    pub requires_table: bool,
    /// Ingredient name to multiplicity.
    pub ingredients: BTreeMap<String, u32>,
    pub result_count: u32,
}

/// The resolved catalog persisted as `catalog.json` and fed to the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: VersionInfo,
    pub counts: SnapshotCounts,
    pub items: BTreeMap<String, ItemDef>,
    pub blocks: BTreeMap<String, BlockDef>,
    pub entities: Vec<EntityDef>,
    /// Output item name to its variants, in declaration order.
    pub recipes: BTreeMap<String, Vec<ResolvedRecipe>>,
}

fn unknown_name(id: impl std::fmt::Display) -> String {
    format!("unknown_{id}")
}

/// `1.20.4` -> `1.20`.
fn major_of(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

impl CatalogSnapshot {
    pub fn from_catalog(version: &str, catalog: &Catalog) -> Self {
        let names = catalog.item_names();
        let resolve = |id: i64| {
            names
                .get(&id)
                .map(|name| name.to_string())
                .unwrap_or_else(|| unknown_name(id))
        };

        let items: BTreeMap<String, ItemDef> = catalog
            .items
            .iter()
            .map(|item| (item.name.clone(), item.clone()))
            .collect();
        let blocks: BTreeMap<String, BlockDef> = catalog
            .blocks
            .iter()
            .map(|block| (block.name.clone(), block.clone()))
            .collect();

        let mut recipes = BTreeMap::new();
        for (result_key, variants) in &catalog.recipes {
            let output = match result_key.parse::<i64>() {
                Ok(id) => resolve(id),
                Err(_) => unknown_name(result_key),
            };
            let resolved: Vec<ResolvedRecipe> = variants
                .iter()
                .enumerate()
                .map(|(variant, recipe)| {
                    let mut ingredients = BTreeMap::new();
                    for slot in recipe.ingredient_slots() {
                        *ingredients.entry(resolve(slot.item_id())).or_insert(0) += 1;
                    }
                    ResolvedRecipe {
                        variant,
                        requires_table: recipe.infer_requires_table(),
                        ingredients,
                        result_count: recipe.result_count(),
                    }
                })
                .collect();
            recipes.insert(output, resolved);
        }

        let major_version = catalog
            .version
            .as_ref()
            .and_then(|v| v.major_version.clone())
            .unwrap_or_else(|| major_of(version));

        Self {
            version: VersionInfo {
                minecraft_version: version.to_string(),
                major_version: Some(major_version),
            },
            counts: SnapshotCounts {
                items: items.len(),
                blocks: blocks.len(),
                entities: catalog.entities.len(),
                recipe_outputs: recipes.len(),
            },
            items,
            blocks,
            entities: catalog.entities.clone(),
            recipes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, name: &str) -> ItemDef {
        ItemDef {
            id,
            name: name.to_string(),
            display_name: None,
            stack_size: Some(64),
            components: None,
        }
    }

    fn shaped(rows: &[&[Option<i64>]]) -> RecipeVariant {
        RecipeVariant {
            in_shape: Some(
                rows.iter()
                    .map(|row| row.iter().map(|c| c.map(IngredientRef::Id)).collect())
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn shapeless(ids: &[i64]) -> RecipeVariant {
        RecipeVariant {
            ingredients: Some(ids.iter().map(|&id| Some(IngredientRef::Id(id))).collect()),
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Crafting-table inference
    // -----------------------------------------------------------------------

    #[test]
    fn small_shapeless_needs_no_table() {
        assert!(!shapeless(&[1]).infer_requires_table());
        assert!(!shapeless(&[1, 2, 3, 4]).infer_requires_table());
        assert!(shapeless(&[1, 2, 3, 4, 5]).infer_requires_table());
    }

    #[test]
    fn three_by_three_grid_needs_table() {
        let pickaxe = shaped(&[
            &[Some(1), Some(1), Some(1)],
            &[None, Some(2), None],
            &[None, Some(2), None],
        ]);
        assert!(pickaxe.infer_requires_table());

        let stick = shaped(&[&[Some(3)], &[Some(3)]]);
        assert!(!stick.infer_requires_table());

        let wide = shaped(&[&[Some(1), Some(1), Some(1)]]);
        assert!(wide.infer_requires_table());
    }

    #[test]
    fn explicit_flag_wins() {
        let mut recipe = shapeless(&[1]);
        recipe.requires_table = Some(true);
        assert!(recipe.infer_requires_table());

        let mut recipe = shaped(&[&[Some(1); 3], &[Some(1); 3], &[Some(1); 3]]);
        recipe.requires_table = Some(false);
        assert!(!recipe.infer_requires_table());

        assert!(!RecipeVariant::default().infer_requires_table());
    }

    // -----------------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn variant_parses_mixed_ingredient_forms() {
        let variant: RecipeVariant = serde_json::from_value(json!({
            "inShape": [[1, null], [{"id": 2, "metadata": 0}, 1]],
            "result": {"id": 9, "count": 4}
        }))
        .unwrap();
        let ids: Vec<i64> = variant.ingredient_slots().map(IngredientRef::item_id).collect();
        assert_eq!(ids, vec![1, 2, 1]);
        assert_eq!(variant.result_count(), 4);
        assert_eq!(RecipeVariant::default().result_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    fn sample_catalog() -> Catalog {
        let mut recipes = BTreeMap::new();
        recipes.insert("3".to_string(), vec![shaped(&[&[Some(1)], &[Some(1)]])]);
        recipes.insert(
            "4".to_string(),
            vec![
                shaped(&[
                    &[Some(2), Some(2), Some(2)],
                    &[None, Some(3), None],
                    &[None, Some(3), None],
                ]),
                shapeless(&[2, 99]),
            ],
        );
        Catalog {
            items: vec![
                item(1, "oak_planks"),
                item(2, "diamond"),
                item(3, "stick"),
                item(4, "diamond_pickaxe"),
            ],
            blocks: Vec::new(),
            entities: Vec::new(),
            recipes,
            version: None,
        }
    }

    #[test]
    fn snapshot_resolves_names_and_counts() {
        let snapshot = CatalogSnapshot::from_catalog("1.20.4", &sample_catalog());
        assert_eq!(snapshot.version.minecraft_version, "1.20.4");
        assert_eq!(snapshot.version.major_version.as_deref(), Some("1.20"));
        assert_eq!(snapshot.counts.items, 4);
        assert_eq!(snapshot.counts.recipe_outputs, 2);

        let stick = &snapshot.recipes["stick"][0];
        assert_eq!(stick.ingredients, BTreeMap::from([("oak_planks".to_string(), 2)]));
        assert!(!stick.requires_table);

        let pickaxe = &snapshot.recipes["diamond_pickaxe"];
        assert_eq!(pickaxe.len(), 2);
        assert_eq!(pickaxe[0].variant, 0);
        assert!(pickaxe[0].requires_table);
        assert_eq!(pickaxe[0].ingredients["diamond"], 3);
        assert_eq!(pickaxe[0].ingredients["stick"], 2);
        assert_eq!(pickaxe[1].variant, 1);
        assert_eq!(pickaxe[1].ingredients["unknown_99"], 1);
    }

    #[test]
    fn catalog_major_version_is_preferred() {
        let mut catalog = sample_catalog();
        catalog.version = Some(VersionInfo {
            minecraft_version: "1.21".into(),
            major_version: Some("1.21".into()),
        });
        let snapshot = CatalogSnapshot::from_catalog("1.21", &catalog);
        assert_eq!(snapshot.version.major_version.as_deref(), Some("1.21"));
    }

    #[test]
    fn unresolved_result_is_named_unknown() {
        let mut catalog = sample_catalog();
        catalog.recipes.insert("500".into(), vec![shapeless(&[1])]);
        let snapshot = CatalogSnapshot::from_catalog("1.20.4", &catalog);
        assert!(snapshot.recipes.contains_key("unknown_500"));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = CatalogSnapshot::from_catalog("1.20.4", &sample_catalog());
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["version"]["minecraftVersion"], json!("1.20.4"));
        assert_eq!(value["counts"]["recipeOutputs"], json!(2));
        assert_eq!(value["recipes"]["stick"][0]["resultCount"], json!(1));
        assert_eq!(value["recipes"]["stick"][0]["requiresTable"], json!(false));
        assert_eq!(value["items"]["stick"]["stackSize"], json!(64));
    }
}
