//! Property-based tests for tag expansion, loot closure, and graph output.
//!
//! Uses proptest to generate random reference graphs (cycles, self-loops and
//! dangling references included) and checks expansion against a plain
//! reachability computation.

use craftgraph_core::builder::{GraphBuilder, GraphInput};
use craftgraph_core::catalog::CatalogSnapshot;
use craftgraph_core::loot::{LootResolver, LootTableMeta, resolve_all};
use craftgraph_core::tag::{RawTagMap, TagExpander, TagIndex};
use craftgraph_core::test_utils::*;
use craftgraph_core::writer::GraphWriter;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const ITEM_NAMES: [&str; 6] = [
    "oak_planks",
    "stick",
    "diamond",
    "cobblestone",
    "bread",
    "iron_ingot",
];

// ===========================================================================
// Generators
// ===========================================================================

/// One node of a random reference graph: literal item indexes and indexes of
/// referenced nodes. Reference indexes past the node count are dangling.
type Node = (Vec<usize>, Vec<usize>);

fn arb_graph(max_nodes: usize) -> impl Strategy<Value = Vec<Node>> {
    (1..=max_nodes).prop_flat_map(move |n| {
        proptest::collection::vec(
            (
                proptest::collection::vec(0..ITEM_NAMES.len(), 0..3),
                proptest::collection::vec(0..n + 2, 0..3),
            ),
            n,
        )
    })
}

fn item_id(index: usize) -> String {
    format!("minecraft:{}", ITEM_NAMES[index])
}

fn tag_id(index: usize) -> String {
    format!("minecraft:t{index}")
}

/// Table ids cycle through block, chest and entity prefixes.
fn table_id(index: usize) -> String {
    let prefix = ["blocks", "chests", "entities"][index % 3];
    format!("minecraft:{prefix}/n{index}")
}

fn raw_tags(graph: &[Node]) -> RawTagMap {
    graph
        .iter()
        .enumerate()
        .map(|(i, (items, refs))| {
            let values = items
                .iter()
                .map(|&it| json!(item_id(it)))
                .chain(refs.iter().map(|&r| json!(format!("#{}", tag_id(r)))))
                .collect();
            (tag_id(i), values)
        })
        .collect()
}

fn raw_tables(graph: &[Node]) -> BTreeMap<String, Value> {
    graph
        .iter()
        .enumerate()
        .map(|(i, (items, refs))| {
            let entries = items
                .iter()
                .map(|&it| item_entry(&item_id(it)))
                .chain(refs.iter().map(|&r| table_ref(&table_id(r))))
                .collect();
            (table_id(i), loot_table(entries))
        })
        .collect()
}

/// Union of literal items over every node reachable from `root`.
fn reachable_items(graph: &[Node], root: usize) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([root]);
    let mut items = BTreeSet::new();
    while let Some(node) = queue.pop_front() {
        if node >= graph.len() || !seen.insert(node) {
            continue;
        }
        let (literals, refs) = &graph[node];
        items.extend(literals.iter().map(|&it| item_id(it)));
        queue.extend(refs.iter().copied());
    }
    items
}

fn build_bytes(snapshot: &CatalogSnapshot, tables: &BTreeMap<String, Value>) -> (Vec<u8>, bool) {
    let loot = resolve_all(tables, &TagIndex::new());
    let mut builder = GraphBuilder::new();
    let mut writer = GraphWriter::from_writer(Vec::new());
    builder
        .build_graph(
            GraphInput {
                catalog: snapshot,
                loot: &loot,
            },
            &mut writer,
        )
        .unwrap();
    let bytes = builder.close(writer).unwrap();
    (bytes, builder.validate_graph())
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The first expansion of any tag on a fresh expander is exactly the set
    /// of items reachable from it.
    #[test]
    fn first_tag_expansion_is_reachability(graph in arb_graph(8), root in 0usize..8) {
        let root = root % graph.len();
        let raw = raw_tags(&graph);
        let mut expander = TagExpander::new(&raw);
        prop_assert_eq!(expander.expand(&tag_id(root)), reachable_items(&graph, root));
    }

    /// Memoized results never contain items that are not reachable.
    #[test]
    fn later_tag_expansions_stay_within_reachability(graph in arb_graph(8)) {
        let raw = raw_tags(&graph);
        let mut expander = TagExpander::new(&raw);
        for i in 0..graph.len() {
            let expanded = expander.expand(&tag_id(i));
            prop_assert!(expanded.is_subset(&reachable_items(&graph, i)));
        }
    }

    /// Loot closure equals reachability regardless of query order.
    #[test]
    fn loot_closure_is_reachability(
        graph in arb_graph(8),
        order in proptest::collection::vec(0usize..8, 1..12),
    ) {
        let tables = raw_tables(&graph);
        let meta: BTreeMap<String, LootTableMeta> = tables
            .iter()
            .map(|(id, doc)| (id.clone(), LootTableMeta::parse(id, doc)))
            .collect();
        let tags = TagIndex::new();
        let mut resolver = LootResolver::new(&meta, &tags);
        for root in order {
            let root = root % graph.len();
            prop_assert_eq!(
                resolver.closure_items(&table_id(root)),
                reachable_items(&graph, root)
            );
        }
    }

    /// Two builds of the same inputs produce byte-identical streams, and every
    /// edge references a registered id.
    #[test]
    fn builds_are_deterministic_and_valid(graph in arb_graph(6)) {
        let snapshot = CatalogSnapshot::from_catalog(SAMPLE_VERSION, &sample_catalog());
        let tables = raw_tables(&graph);
        let (first, first_valid) = build_bytes(&snapshot, &tables);
        let (second, _) = build_bytes(&snapshot, &tables);
        prop_assert_eq!(first, second);
        prop_assert!(first_valid);
    }
}
