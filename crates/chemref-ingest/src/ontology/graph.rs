//! Ontology DAG backed by petgraph.
//!
//! Edges point from child to parent and carry the relation name, so
//! "outgoing" means "towards the roots" throughout this module.

use super::obo::{OboDocument, OboHeader, OboTerm};
use crate::hierarchy::{HierarchyIndex, NameMap};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Version reported when the OBO header carries no `data-version`
pub const DEFAULT_DATA_VERSION: &str = "1.013.0";

/// Export record for an ontology term and all of its direct parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Directed child -> parent edge with its relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentEdge {
    pub child: String,
    pub parent: String,
    pub relation: String,
}

/// Multi-parent ontology graph.
///
/// Unknown ids are answered with empty results, never errors.
#[derive(Debug, Clone)]
pub struct OntologyGraph {
    graph: DiGraph<OboTerm, String>,
    id_index: HashMap<String, NodeIndex>,
    header: OboHeader,
}

impl OntologyGraph {
    /// Build the graph from a parsed document.
    ///
    /// Obsolete terms are left out, along with every edge touching a term
    /// that is not in the graph. Repeated (child, parent, relation) triples
    /// collapse into one edge.
    pub fn from_document(document: OboDocument) -> Self {
        let OboDocument {
            header,
            terms,
            relationships,
        } = document;

        let mut graph = DiGraph::with_capacity(terms.len(), relationships.len());
        let mut id_index = HashMap::with_capacity(terms.len());
        let mut obsolete = 0usize;

        for term in terms {
            if term.is_obsolete {
                obsolete += 1;
                continue;
            }
            if id_index.contains_key(&term.id) {
                debug!("Duplicate term {} ignored", term.id);
                continue;
            }
            let id = term.id.clone();
            let index = graph.add_node(term);
            id_index.insert(id, index);
        }

        let mut dropped = 0usize;
        for rel in relationships {
            let (Some(&child), Some(&parent)) = (id_index.get(&rel.subject), id_index.get(&rel.object)) else {
                debug!(
                    "Dropping edge {} -{}-> {} with unknown endpoint",
                    rel.subject, rel.relation, rel.object
                );
                dropped += 1;
                continue;
            };
            let duplicate = graph
                .edges_connecting(child, parent)
                .any(|edge| *edge.weight() == rel.relation);
            if !duplicate {
                graph.add_edge(child, parent, rel.relation);
            }
        }

        info!(
            "Built ontology graph: {} nodes, {} edges ({} obsolete terms, {} dangling edges skipped)",
            graph.node_count(),
            graph.edge_count(),
            obsolete,
            dropped
        );

        Self {
            graph,
            id_index,
            header,
        }
    }

    pub fn header(&self) -> &OboHeader {
        &self.header
    }

    /// Header `data-version`, or [`DEFAULT_DATA_VERSION`]
    pub fn version(&self) -> &str {
        self.header
            .data_version
            .as_deref()
            .unwrap_or(DEFAULT_DATA_VERSION)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn term(&self, id: &str) -> Option<&OboTerm> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.term(id)?.name.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Terms without parents, sorted by id
    pub fn root_nodes(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self
            .graph
            .node_indices()
            .filter(|&ix| self.graph.edges_directed(ix, Direction::Outgoing).next().is_none())
            .map(|ix| self.graph[ix].id.as_str())
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Outgoing edges of `id` in declaration order
    pub fn adjacent_parents(&self, id: &str) -> Vec<ParentEdge> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        self.parent_edges(index)
            .into_iter()
            .map(|edge| {
                let (child, parent) = self.endpoints(edge);
                ParentEdge {
                    child: child.to_string(),
                    parent: parent.to_string(),
                    relation: self.graph[edge].clone(),
                }
            })
            .collect()
    }

    /// Direct children, sorted by id
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<&str> = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .map(|ix| self.graph[ix].id.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        children.sort_unstable();
        children
    }

    /// Direct parents in declaration order, each listed once
    pub fn successors(&self, id: &str) -> Vec<&str> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.parent_edges(index)
            .into_iter()
            .map(|edge| self.endpoints(edge).1)
            .filter(|parent| seen.insert(*parent))
            .collect()
    }

    /// Every term reachable through parent edges, with names.
    ///
    /// `id` itself comes first when `include_self` is set; the rest are
    /// sorted by id.
    pub fn ancestors(&self, id: &str, include_self: bool) -> Vec<(String, Option<String>)> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if include_self {
            out.push(self.named(index));
        }
        out.extend(self.ancestor_indices(index).into_iter().map(|ix| self.named(ix)));
        out
    }

    /// Union of [`ancestors`](Self::ancestors) over `ids`, first occurrence
    /// order preserved.
    pub fn unique_ancestors<S: AsRef<str>>(&self, ids: &[S], include_self: bool) -> Vec<(String, Option<String>)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in ids {
            for entry in self.ancestors(id.as_ref(), include_self) {
                if seen.insert(entry.0.clone()) {
                    out.push(entry);
                }
            }
        }
        out
    }

    /// `id` and its ancestors with a 1-based ordinal
    pub fn lineage(&self, id: &str) -> Vec<(String, Option<String>, usize)> {
        self.ancestors(id, true)
            .into_iter()
            .enumerate()
            .map(|(i, (id, name))| (id, name, i + 1))
            .collect()
    }

    /// Export the given terms and all of their ancestors, each carrying
    /// every direct parent. Unknown ids are skipped. Sorted by id.
    pub fn export_tree_node_list<S: AsRef<str>>(&self, ids: &[S]) -> Vec<OntologyNode> {
        let mut members: HashSet<NodeIndex> = HashSet::new();
        for id in ids {
            let id = id.as_ref();
            let Some(&index) = self.id_index.get(id) else {
                warn!("{} not in current ontology", id);
                continue;
            };
            members.insert(index);
            members.extend(self.ancestor_indices(index));
        }

        let mut nodes: Vec<OntologyNode> = members
            .into_iter()
            .map(|ix| {
                let term = &self.graph[ix];
                let parents: Vec<String> = self
                    .parent_edges(ix)
                    .into_iter()
                    .map(|edge| self.endpoints(edge).1.to_string())
                    .collect();
                if parents.is_empty() {
                    debug!("Node {} ({:?}) has no parents", term.id, term.name);
                }
                OntologyNode {
                    id: term.id.clone(),
                    name: term.name.clone(),
                    parents,
                }
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Single-parent view of the DAG for breadth-first display.
    ///
    /// Each term keeps its first declared parent edge as tree parent; all
    /// edges still feed the child adjacency.
    pub fn to_hierarchy(&self) -> HierarchyIndex<String> {
        let names: NameMap<String> = self
            .graph
            .node_weights()
            .filter_map(|term| Some((term.id.clone(), term.name.clone()?)))
            .collect();

        let mut parents = Vec::with_capacity(self.graph.edge_count() + 1);
        for ix in self.graph.node_indices() {
            let id = &self.graph[ix].id;
            let edges = self.parent_edges(ix);
            if edges.is_empty() {
                parents.push((id.clone(), None));
            }
            for edge in edges {
                parents.push((id.clone(), Some(self.endpoints(edge).1.to_string())));
            }
        }

        HierarchyIndex::build(names, parents, None)
    }

    fn parent_edges(&self, index: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        // petgraph walks adjacency newest first
        edges.sort_unstable();
        edges
    }

    fn endpoints(&self, edge: EdgeIndex) -> (&str, &str) {
        match self.graph.edge_endpoints(edge) {
            Some((child, parent)) => (self.graph[child].id.as_str(), self.graph[parent].id.as_str()),
            None => ("", ""),
        }
    }

    fn ancestor_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut bfs = Bfs::new(&self.graph, index);
        let mut found = Vec::new();
        while let Some(ix) = bfs.next(&self.graph) {
            if ix != index {
                found.push(ix);
            }
        }
        found.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        found
    }

    fn named(&self, index: NodeIndex) -> (String, Option<String>) {
        let term = &self.graph[index];
        (term.id.clone(), term.name.clone())
    }
}
