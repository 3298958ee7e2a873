//! Property-based tests for HierarchyIndex lineage and tree export

use chemref_ingest::hierarchy::{HierarchyError, HierarchyIndex, NameMap};
use proptest::prelude::*;
use std::collections::HashSet;

fn node_id(i: usize) -> String {
    format!("N{i:03}")
}

/// Acyclic forest: node `i` either is a root or points at an earlier node
fn forest_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..60).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop::option::weighted(0.85, 0..i).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn build(parents: &[Option<usize>]) -> HierarchyIndex<String> {
    let names: NameMap<String> = (0..parents.len())
        .map(|i| (node_id(i), format!("name of {i}")))
        .collect();
    let pairs: Vec<(String, Option<String>)> = parents
        .iter()
        .enumerate()
        .map(|(i, p)| (node_id(i), p.map(node_id)))
        .collect();
    HierarchyIndex::build(names, pairs, None)
}

proptest! {
    #[test]
    fn lineage_walks_parent_links_from_a_root(parents in forest_strategy()) {
        let index = build(&parents);

        for i in 0..parents.len() {
            let id = node_id(i);
            let lineage = index.ancestor_lineage(&id).unwrap();

            prop_assert_eq!(lineage.last(), Some(&id));
            prop_assert!(index.roots().contains(&&lineage[0]));
            prop_assert!(index.parent(&lineage[0]).is_none());
            for pair in lineage.windows(2) {
                prop_assert_eq!(index.parent(&pair[1]), Some(&pair[0]));
            }

            let names = index.name_lineage(&id).unwrap();
            prop_assert_eq!(names.len(), lineage.len());
        }
    }

    #[test]
    fn roots_have_single_element_lineage(parents in forest_strategy()) {
        let index = build(&parents);
        for root in index.roots() {
            prop_assert_eq!(index.ancestor_lineage(root).unwrap(), vec![root.clone()]);
        }
    }

    #[test]
    fn declared_roots_have_single_element_lineage(
        parents in forest_strategy(),
        picks in prop::collection::vec(0usize..60, 1..6),
    ) {
        let names: NameMap<String> = NameMap::new();
        let pairs: Vec<(String, Option<String>)> = parents
            .iter()
            .enumerate()
            .map(|(i, p)| (node_id(i), p.map(node_id)))
            .collect();
        let declared: Vec<String> = picks.into_iter().map(|i| node_id(i % parents.len())).collect();
        let index = HierarchyIndex::build(names, pairs, Some(declared.clone()));

        for root in &declared {
            prop_assert_eq!(index.ancestor_lineage(root).unwrap(), vec![root.clone()]);
        }
        for record in index.export_flattened_tree(None).unwrap() {
            if declared.contains(&record.id) {
                prop_assert_eq!(record.depth, 0);
            }
            prop_assert!(declared.contains(&index.ancestor_lineage(&record.id).unwrap()[0]));
        }
    }

    #[test]
    fn full_export_emits_every_node_once(parents in forest_strategy()) {
        let index = build(&parents);
        let records = index.export_flattened_tree(None).unwrap();

        prop_assert_eq!(records.len(), parents.len());
        let unique: HashSet<&String> = records.iter().map(|r| &r.id).collect();
        prop_assert_eq!(unique.len(), records.len());

        for record in &records {
            let lineage = index.ancestor_lineage(&record.id).unwrap();
            prop_assert_eq!(record.depth, lineage.len() - 1);
        }

        prop_assert_eq!(index.export_flattened_tree(None).unwrap(), records);
    }

    #[test]
    fn filtered_export_is_the_union_of_lineages(
        parents in forest_strategy(),
        picks in prop::collection::vec(0usize..60, 0..8),
    ) {
        let index = build(&parents);
        let filter: HashSet<String> = picks
            .into_iter()
            .filter(|&i| i < parents.len())
            .map(node_id)
            .collect();

        let records = index.export_flattened_tree(Some(&filter)).unwrap();
        let emitted: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
        prop_assert_eq!(emitted.len(), records.len());

        let mut expected = HashSet::new();
        for id in &filter {
            expected.extend(index.ancestor_lineage(id).unwrap());
        }
        prop_assert_eq!(emitted, expected);
    }

    #[test]
    fn extra_parent_edges_never_duplicate_records(
        parents in forest_strategy(),
        extra in prop::collection::vec((1usize..60, 0usize..60), 0..20),
    ) {
        let names = NameMap::new();
        let mut pairs: Vec<(String, Option<String>)> = parents
            .iter()
            .enumerate()
            .map(|(i, p)| (node_id(i), p.map(node_id)))
            .collect();
        // Later declarations only add adjacency, the first parent stays
        for (child, parent) in extra {
            if child < parents.len() && parent < child {
                pairs.push((node_id(child), Some(node_id(parent))));
            }
        }
        let index = HierarchyIndex::build(names, pairs, None);

        for (i, p) in parents.iter().enumerate() {
            prop_assert_eq!(index.parent(&node_id(i)).cloned(), p.map(node_id));
        }

        let records = index.export_flattened_tree(None).unwrap();
        let unique: HashSet<&String> = records.iter().map(|r| &r.id).collect();
        prop_assert_eq!(unique.len(), records.len());
    }

    #[test]
    fn parent_cycles_are_reported(len in 1usize..20, entry in 0usize..20) {
        let entry = entry % len;
        // N000 -> N001 -> ... -> N{len-1} -> N000
        let pairs: Vec<(String, Option<String>)> = (0..len)
            .map(|i| (node_id(i), Some(node_id((i + 1) % len))))
            .collect();
        let index = HierarchyIndex::build(NameMap::new(), pairs, None);

        prop_assert!(index.roots().is_empty());
        let result = index.ancestor_lineage(&node_id(entry));
        prop_assert!(matches!(result, Err(HierarchyError::Malformed { .. })), "expected a cycle error");
    }
}
