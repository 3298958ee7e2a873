// Breadth-first tree export

use super::index::{HierarchyIndex, NodeKey};
use super::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One record of the flattened tree.
///
/// `parents` holds the single tree parent and is omitted for roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode<K> {
    pub id: K,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<K>,
    pub depth: usize,
}

impl<K: NodeKey> HierarchyIndex<K> {
    /// Flatten the forest into display records.
    ///
    /// Traversal is breadth-first from the roots in ascending id order. Each
    /// visited id, restricted to `filter` when given, contributes its whole
    /// lineage; an id is emitted the first time it is reached and skipped
    /// afterwards, whatever path or depth a later occurrence would carry.
    /// Depth is the position in the lineage with roots at 0.
    pub fn export_flattened_tree(&self, filter: Option<&HashSet<K>>) -> Result<Vec<TreeNode<K>>> {
        let mut emitted = vec![false; self.nodes.len()];
        let mut records = Vec::new();

        for slot in self.breadth_first_slots() {
            if let Some(filter) = filter {
                if !filter.contains(&self.nodes[slot].id) {
                    continue;
                }
            }

            let mut lineage = self.lineage_slots(slot)?;
            if let Some(root) = self.synthetic_root {
                if lineage.first() != Some(&root) {
                    lineage.insert(0, root);
                }
            }

            for (depth, member) in lineage.into_iter().enumerate() {
                if emitted[member] {
                    continue;
                }
                emitted[member] = true;
                records.push(self.tree_node(member, depth));
            }
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            records = records.len(),
            filtered = filter.is_some(),
            "Exported flattened tree"
        );

        Ok(records)
    }

    /// Slots in breadth-first order, one traversal per root.
    ///
    /// The visited set is per root, so a slot reachable from two roots
    /// appears twice; the export dedupes on emission.
    fn breadth_first_slots(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());

        for &root in &self.roots {
            let mut visited = HashSet::from([root]);
            let mut queue = VecDeque::from([root]);

            while let Some(slot) = queue.pop_front() {
                order.push(slot);
                for &child in &self.nodes[slot].children {
                    if visited.insert(child) {
                        queue.push_back(child);
                    }
                }
            }
        }

        order
    }

    fn tree_node(&self, slot: usize, depth: usize) -> TreeNode<K> {
        let node = &self.nodes[slot];
        TreeNode {
            id: node.id.clone(),
            name: node.name.clone(),
            parents: node
                .parent
                .map(|p| vec![self.nodes[p].id.clone()])
                .unwrap_or_default(),
            depth,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::hierarchy::{HierarchyError, NameMap};

    fn s(v: &str) -> String {
        v.to_string()
    }

    fn atc_forest() -> HierarchyIndex<String> {
        let names: NameMap<String> = [
            ("A", "ALIMENTARY TRACT AND METABOLISM"),
            ("A01", "STOMATOLOGICAL PREPARATIONS"),
            ("A01A", "STOMATOLOGICAL PREPARATIONS"),
            ("A02", "DRUGS FOR ACID RELATED DISORDERS"),
            ("B", "BLOOD AND BLOOD FORMING ORGANS"),
            ("B05", "BLOOD SUBSTITUTES AND PERFUSION SOLUTIONS"),
            ("B05D", "PERITONEAL DIALYTICS"),
            ("B05DB", "Hypertonic solutions"),
        ]
        .into_iter()
        .map(|(k, v)| (s(k), s(v)))
        .collect();

        HierarchyIndex::build(
            names,
            vec![
                (s("B"), None),
                (s("A"), None),
                (s("A01"), Some(s("A"))),
                (s("A02"), Some(s("A"))),
                (s("A01A"), Some(s("A01"))),
                (s("B05"), Some(s("B"))),
                (s("B05D"), Some(s("B05"))),
                (s("B05DB"), Some(s("B05D"))),
            ],
            None,
        )
    }

    fn ids(records: &[TreeNode<String>]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_full_export_is_breadth_first_from_sorted_roots() {
        let records = atc_forest().export_flattened_tree(None).unwrap();
        assert_eq!(
            ids(&records),
            vec!["A", "A01", "A02", "A01A", "B", "B05", "B05D", "B05DB"]
        );

        let b05db = records.iter().find(|r| r.id == "B05DB").unwrap();
        assert_eq!(b05db.depth, 3);
        assert_eq!(b05db.parents, vec![s("B05D")]);
        assert_eq!(b05db.name.as_deref(), Some("Hypertonic solutions"));

        let root = records.iter().find(|r| r.id == "A").unwrap();
        assert_eq!(root.depth, 0);
        assert!(root.parents.is_empty());
    }

    #[test]
    fn test_filter_emits_only_the_lineage() {
        let filter = HashSet::from([s("B05DB")]);
        let records = atc_forest().export_flattened_tree(Some(&filter)).unwrap();
        assert_eq!(ids(&records), vec!["B", "B05", "B05D", "B05DB"]);
        assert_eq!(
            records.iter().map(|r| r.depth).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_filter_shares_ancestors_once() {
        let filter = HashSet::from([s("A01A"), s("A02")]);
        let records = atc_forest().export_flattened_tree(Some(&filter)).unwrap();
        assert_eq!(ids(&records), vec!["A", "A02", "A01", "A01A"]);
    }

    #[test]
    fn test_empty_filter_emits_nothing() {
        let filter = HashSet::new();
        let records = atc_forest().export_flattened_tree(Some(&filter)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_export_is_idempotent() {
        let index = atc_forest();
        let first = index.export_flattened_tree(None).unwrap();
        let second = index.export_flattened_tree(None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multiple_incoming_edges_emit_once() {
        let index = HierarchyIndex::build(
            NameMap::new(),
            vec![
                (s("R"), None),
                (s("P1"), Some(s("R"))),
                (s("P2"), Some(s("R"))),
                (s("N"), Some(s("P2"))),
                (s("N"), Some(s("P1"))),
            ],
            None,
        );
        let records = index.export_flattened_tree(None).unwrap();
        assert_eq!(ids(&records), vec!["R", "P1", "P2", "N"]);

        let n = records.iter().find(|r| r.id == "N").unwrap();
        assert_eq!(n.parents, vec![s("P2")]);
        assert_eq!(n.depth, 2);
    }

    #[test]
    fn test_node_under_two_roots_first_occurrence_wins() {
        let index = HierarchyIndex::build(
            NameMap::new(),
            vec![
                (s("X"), None),
                (s("Y"), None),
                (s("Y1"), Some(s("Y"))),
                (s("N"), Some(s("Y1"))),
                (s("N"), Some(s("X"))),
            ],
            None,
        );
        let records = index.export_flattened_tree(None).unwrap();
        assert_eq!(records.iter().filter(|r| r.id == "N").count(), 1);
        assert_eq!(ids(&records), vec!["X", "Y", "Y1", "N"]);
    }

    #[test]
    fn test_synthetic_root_depths() {
        let names: NameMap<i64> = [(0, s("root")), (46456, s("All alpha proteins")), (46457, s("Globin-like"))]
            .into_iter()
            .collect();
        let index = HierarchyIndex::builder()
            .names(names)
            .parent(46456, Some(0))
            .parent(46457, Some(46456))
            .synthetic_root(0)
            .build();

        let records = index.export_flattened_tree(None).unwrap();
        let summary: Vec<(i64, usize, Vec<i64>)> = records
            .iter()
            .map(|r| (r.id, r.depth, r.parents.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, 0, vec![]), (46456, 1, vec![0]), (46457, 2, vec![46456])]
        );
    }

    #[test]
    fn test_declared_root_inside_cycle_fails_export() {
        let index = HierarchyIndex::build(
            NameMap::new(),
            vec![(s("A"), Some(s("B"))), (s("B"), Some(s("A")))],
            Some(vec![s("A")]),
        );
        assert!(matches!(
            index.export_flattened_tree(None),
            Err(HierarchyError::Malformed { .. })
        ));
    }

    #[test]
    fn test_tree_node_json_omits_root_parents() {
        let records = atc_forest().export_flattened_tree(None).unwrap();
        let root = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(
            root,
            serde_json::json!({"id": "A", "name": "ALIMENTARY TRACT AND METABOLISM", "depth": 0})
        );
        let child = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(child["parents"], serde_json::json!(["A"]));
    }
}
