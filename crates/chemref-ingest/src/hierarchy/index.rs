// Hierarchy node table and lineage walks

use super::{HierarchyError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

/// Bounds every node identifier must satisfy.
///
/// ATC and PSI-MOD use string codes ("B05DB", "MOD:00032"), sunid style
/// trees use integers.
pub trait NodeKey: Clone + Eq + Hash + Ord + Display {}

impl<T: Clone + Eq + Hash + Ord + Display> NodeKey for T {}

/// Mapping from node id to display name
pub type NameMap<K> = HashMap<K, String>;

#[derive(Debug, Clone)]
pub(crate) struct Node<K> {
    pub(crate) id: K,
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

/// Read-only forest built once from name and parent maps.
///
/// Nodes live in an arena; parents and children are arena slots. A node has
/// at most one parent. When the raw input declares several, the first one
/// becomes the parent while every declared edge stays in the child
/// adjacency used for breadth-first traversal.
#[derive(Debug, Clone)]
pub struct HierarchyIndex<K> {
    pub(crate) nodes: Vec<Node<K>>,
    pub(crate) slots: HashMap<K, usize>,
    /// Root slots in ascending id order
    pub(crate) roots: Vec<usize>,
    pub(crate) synthetic_root: Option<usize>,
}

impl<K: NodeKey> HierarchyIndex<K> {
    /// Build from a name map, parent pairs and optional declared roots.
    ///
    /// A `None` parent marks an explicit root. Ids without any parent entry
    /// are implicit roots. Declared roots replace inference entirely and drop
    /// their own tree parent, so lineage walks stop at them.
    pub fn build<P>(names: NameMap<K>, parents: P, roots: Option<Vec<K>>) -> Self
    where
        P: IntoIterator<Item = (K, Option<K>)>,
    {
        let builder = HierarchyBuilder::new().names(names).parents(parents);
        match roots {
            Some(roots) => builder.roots(roots).build(),
            None => builder.build(),
        }
    }

    pub fn builder() -> HierarchyBuilder<K> {
        HierarchyBuilder::new()
    }

    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            slots: HashMap::new(),
            roots: Vec::new(),
            synthetic_root: None,
        }
    }

    fn intern(&mut self, id: K) -> usize {
        if let Some(&slot) = self.slots.get(&id) {
            return slot;
        }
        let slot = self.nodes.len();
        self.nodes.push(Node {
            id: id.clone(),
            name: None,
            parent: None,
            children: Vec::new(),
        });
        self.slots.insert(id, slot);
        slot
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.slots.contains_key(id)
    }

    /// Display name, `None` for unknown ids or ids without a name entry
    pub fn name(&self, id: &K) -> Option<&str> {
        let slot = *self.slots.get(id)?;
        self.nodes[slot].name.as_deref()
    }

    /// Tree parent (first declared parent)
    pub fn parent(&self, id: &K) -> Option<&K> {
        let slot = *self.slots.get(id)?;
        self.nodes[slot].parent.map(|p| &self.nodes[p].id)
    }

    /// Direct children in declaration order
    pub fn children(&self, id: &K) -> Vec<&K> {
        match self.slots.get(id) {
            Some(&slot) => self.nodes[slot]
                .children
                .iter()
                .map(|&c| &self.nodes[c].id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Roots in ascending id order
    pub fn roots(&self) -> Vec<&K> {
        self.roots.iter().map(|&r| &self.nodes[r].id).collect()
    }

    /// Ids from the root down to and including `id`.
    ///
    /// The first element is a root, except under a
    /// [synthetic root](HierarchyBuilder::synthetic_root): the placeholder is
    /// left out, so the chain starts at its child and exported depth equals
    /// the lineage length. Unknown ids yield an empty lineage. A parent chain that revisits a
    /// node fails with [`HierarchyError::Malformed`].
    pub fn ancestor_lineage(&self, id: &K) -> Result<Vec<K>> {
        let Some(&start) = self.slots.get(id) else {
            return Ok(Vec::new());
        };
        Ok(self
            .lineage_slots(start)?
            .into_iter()
            .map(|slot| self.nodes[slot].id.clone())
            .collect())
    }

    /// Names along [`ancestor_lineage`](Self::ancestor_lineage); a missing
    /// name leaves `None` in its slot.
    pub fn name_lineage(&self, id: &K) -> Result<Vec<Option<&str>>> {
        let Some(&start) = self.slots.get(id) else {
            return Ok(Vec::new());
        };
        Ok(self
            .lineage_slots(start)?
            .into_iter()
            .map(|slot| self.nodes[slot].name.as_deref())
            .collect())
    }

    /// Root-first slot chain for `start`.
    ///
    /// Each step must land on a slot not seen before, so the walk is bounded
    /// by the node count. The synthetic root terminates the walk without
    /// being included.
    pub(crate) fn lineage_slots(&self, start: usize) -> Result<Vec<usize>> {
        let mut chain = vec![start];
        let mut seen = HashSet::from([start]);
        let mut current = start;

        while let Some(parent) = self.nodes[current].parent {
            if Some(parent) == self.synthetic_root {
                break;
            }
            if chain.len() > self.nodes.len() || !seen.insert(parent) {
                return Err(HierarchyError::Malformed {
                    id: self.nodes[start].id.to_string(),
                    at: self.nodes[parent].id.to_string(),
                });
            }
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }
}

/// Builder for [`HierarchyIndex`]
#[derive(Debug, Clone)]
pub struct HierarchyBuilder<K> {
    names: Vec<(K, String)>,
    parents: Vec<(K, Option<K>)>,
    roots: Option<Vec<K>>,
    synthetic_root: Option<K>,
}

impl<K> Default for HierarchyBuilder<K> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            parents: Vec::new(),
            roots: None,
            synthetic_root: None,
        }
    }
}

impl<K: NodeKey> HierarchyBuilder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, id: K, name: impl Into<String>) -> Self {
        self.names.push((id, name.into()));
        self
    }

    pub fn names<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (K, String)>,
    {
        self.names.extend(names);
        self
    }

    pub fn parent(mut self, id: K, parent: Option<K>) -> Self {
        self.parents.push((id, parent));
        self
    }

    pub fn parents<I>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<K>)>,
    {
        self.parents.extend(parents);
        self
    }

    /// Declare the roots instead of inferring them.
    ///
    /// A declared root that also has a parent entry loses that tree parent;
    /// the edge stays in the parent's child adjacency.
    pub fn roots<I>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        self.roots = Some(roots.into_iter().collect());
        self
    }

    /// Single-root trees whose top node is a placeholder id (sunid `0`).
    ///
    /// The placeholder is the only root and ends every other node's lineage
    /// walk without appearing in it.
    pub fn synthetic_root(mut self, id: K) -> Self {
        self.synthetic_root = Some(id);
        self
    }

    pub fn build(self) -> HierarchyIndex<K> {
        let mut index = HierarchyIndex::empty();

        for (id, name) in self.names {
            let slot = index.intern(id);
            index.nodes[slot].name = Some(name);
        }

        let mut declared = HashSet::new();
        for (id, parent) in self.parents {
            let child = index.intern(id);
            let first = declared.insert(child);
            if let Some(parent) = parent {
                let parent = index.intern(parent);
                index.nodes[parent].children.push(child);
                if first {
                    index.nodes[child].parent = Some(parent);
                }
            }
        }

        let declared_roots = self.synthetic_root.is_none() && self.roots.is_some();
        let root_ids: BTreeSet<K> = match (self.synthetic_root, self.roots) {
            (Some(root), _) => {
                let slot = index.intern(root.clone());
                index.synthetic_root = Some(slot);
                BTreeSet::from([root])
            },
            (None, Some(roots)) => roots.into_iter().collect(),
            (None, None) => index
                .nodes
                .iter()
                .filter(|node| node.parent.is_none())
                .map(|node| node.id.clone())
                .collect(),
        };

        let roots: Vec<usize> = root_ids.into_iter().map(|id| index.intern(id)).collect();
        if declared_roots {
            for &slot in &roots {
                index.nodes[slot].parent = None;
            }
        }
        index.roots = roots;

        tracing::debug!(
            nodes = index.nodes.len(),
            roots = index.roots.len(),
            "Built hierarchy index"
        );

        index
    }
}
