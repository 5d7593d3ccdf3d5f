//! Graph node and edge types.
//!
//! Objects are things that can be required or produced; operations are the
//! actions that consume and produce them. Both carry a free-form JSON `meta`
//! payload that is written through to the output stream unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// What an object node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Item,
    Block,
    /// A world-state precondition such as standing next to a station.
    State,
}

impl ObjectKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Item => "item",
            ObjectKind::Block => "block",
            ObjectKind::State => "state",
        }
    }

    /// Deterministic object id: `<kind>:<name>`.
    pub fn object_id(self, name: &str) -> String {
        format!("{}:{name}", self.as_str())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an operation node does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Craft,
    Furnace,
    Smoke,
    Brew,
    Stonecut,
    Smith,
    Mine,
    Kill,
    Place,
    Use,
    Loot,
}

impl OpKind {
    pub const ALL: [OpKind; 11] = [
        OpKind::Craft,
        OpKind::Furnace,
        OpKind::Smoke,
        OpKind::Brew,
        OpKind::Stonecut,
        OpKind::Smith,
        OpKind::Mine,
        OpKind::Kill,
        OpKind::Place,
        OpKind::Use,
        OpKind::Loot,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            OpKind::Craft => "craft",
            OpKind::Furnace => "furnace",
            OpKind::Smoke => "smoke",
            OpKind::Brew => "brew",
            OpKind::Stonecut => "stonecut",
            OpKind::Smith => "smith",
            OpKind::Mine => "mine",
            OpKind::Kill => "kill",
            OpKind::Place => "place",
            OpKind::Use => "use",
            OpKind::Loot => "loot",
        }
    }

    /// Deterministic operation id: `<kind>:<key>`.
    pub fn op_id(self, key: &str) -> String {
        format!("{}:{key}", self.as_str())
    }

    /// Stations that can perform this kind of operation.
    pub fn stations(self) -> impl Iterator<Item = Station> {
        Station::ALL
            .into_iter()
            .filter(move |station| station.serves().contains(&self))
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an operation uses a required object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Used up by the operation.
    Consumed,
    /// Must be present but is not used up.
    Precond,
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// A world object modeled as a precondition for certain operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    CraftingTable,
    Furnace,
    Smoker,
    BlastFurnace,
    Stonecutter,
    SmithingTable,
    BrewingStand,
}

/// (station, object name, operation kinds it serves)
static STATION_TABLE: [(Station, &str, &[OpKind]); 7] = [
    (Station::CraftingTable, "crafting_table", &[OpKind::Craft]),
    (Station::Furnace, "furnace", &[OpKind::Furnace]),
    (Station::Smoker, "smoker", &[OpKind::Smoke]),
    (Station::BlastFurnace, "blast_furnace", &[OpKind::Furnace]),
    (Station::Stonecutter, "stonecutter", &[OpKind::Stonecut]),
    (Station::SmithingTable, "smithing_table", &[OpKind::Smith]),
    (Station::BrewingStand, "brewing_stand", &[OpKind::Brew]),
];

impl Station {
    pub const ALL: [Station; 7] = [
        Station::CraftingTable,
        Station::Furnace,
        Station::Smoker,
        Station::BlastFurnace,
        Station::Stonecutter,
        Station::SmithingTable,
        Station::BrewingStand,
    ];

    fn entry(self) -> &'static (Station, &'static str, &'static [OpKind]) {
        // STATION_TABLE is declared in the same order as the enum.
        &STATION_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn serves(self) -> &'static [OpKind] {
        self.entry().2
    }

    /// Object id of the station's precondition object (`state:<name>`).
    pub fn object_id(self) -> String {
        ObjectKind::State.object_id(self.name())
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// An object node: an item, a block, or a world-state precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: String,
    pub kind: ObjectKind,
    pub name: String,
    #[serde(default)]
    pub meta: Value,
}

/// An operation node: an executable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub kind: OpKind,
    pub name: String,
    #[serde(default)]
    pub meta: Value,
}

impl Operation {
    /// Build an operation whose id is `<kind>:<key>`.
    pub fn new(kind: OpKind, key: &str, name: impl Into<String>, meta: Value) -> Self {
        Self {
            id: kind.op_id(key),
            kind,
            name: name.into(),
            meta,
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// An operation's input. Serialized without `opId` inside an operation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequireEdge {
    #[serde(skip)]
    pub op_id: String,
    pub obj_id: String,
    pub count: u32,
    pub role: Role,
}

impl RequireEdge {
    pub fn new(op_id: &str, obj_id: impl Into<String>, count: u32, role: Role) -> Self {
        Self {
            op_id: op_id.to_string(),
            obj_id: obj_id.into(),
            count,
            role,
        }
    }
}

/// An operation's output. Serialized without `opId` inside an operation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceEdge {
    #[serde(skip)]
    pub op_id: String,
    pub obj_id: String,
    pub count: u32,
}

impl ProduceEdge {
    pub fn new(op_id: &str, obj_id: impl Into<String>, count: u32) -> Self {
        Self {
            op_id: op_id.to_string(),
            obj_id: obj_id.into(),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_ids_are_kind_prefixed() {
        assert_eq!(ObjectKind::Item.object_id("iron_ingot"), "item:iron_ingot");
        assert_eq!(ObjectKind::Block.object_id("stone"), "block:stone");
    }

    #[test]
    fn op_ids_are_kind_prefixed() {
        let op = Operation::new(OpKind::Mine, "minecraft:stone", "stone", json!({}));
        assert_eq!(op.id, "mine:minecraft:stone");
        assert_eq!(OpKind::Craft.op_id("stick#0"), "craft:stick#0");
    }

    #[test]
    fn station_table_matches_enum_order() {
        for station in Station::ALL {
            assert_eq!(station.entry().0, station);
        }
        assert_eq!(Station::CraftingTable.object_id(), "state:crafting_table");
        assert_eq!(Station::BrewingStand.name(), "brewing_stand");
    }

    #[test]
    fn furnace_ops_have_two_stations() {
        let stations: Vec<_> = OpKind::Furnace.stations().collect();
        assert_eq!(stations, vec![Station::Furnace, Station::BlastFurnace]);
        assert_eq!(OpKind::Mine.stations().count(), 0);
    }

    #[test]
    fn edges_serialize_without_op_id() {
        let edge = RequireEdge::new("craft:stick#0", "item:planks", 2, Role::Consumed);
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            value,
            json!({"objId": "item:planks", "count": 2, "role": "consumed"})
        );

        let prod = ProduceEdge::new("craft:stick#0", "item:stick", 4);
        let value = serde_json::to_value(&prod).unwrap();
        assert_eq!(value, json!({"objId": "item:stick", "count": 4}));
    }

    #[test]
    fn kinds_serialize_lowercase() {
        assert_eq!(serde_json::to_value(OpKind::Stonecut).unwrap(), json!("stonecut"));
        assert_eq!(serde_json::to_value(Role::Precond).unwrap(), json!("precond"));
        assert_eq!(serde_json::to_value(ObjectKind::State).unwrap(), json!("state"));
        for kind in OpKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }
}
