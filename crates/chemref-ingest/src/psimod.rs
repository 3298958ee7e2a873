//! PSI-MOD protein modification ontology
//!
//! Two query surfaces over one parsed document: the multi-parent
//! [`OntologyGraph`] for reachability questions, and a single-parent
//! [`HierarchyIndex`] for breadth-first tree display.

use crate::cache::DatasetCache;
use crate::config::{IngestConfig, DEFAULT_PSIMOD_MIN_NODES};
use crate::error::Result;
use crate::fetch::{fetch_text, Fetcher};
use crate::hierarchy::HierarchyIndex;
use crate::ontology::{OboDocument, OboParser, OboTerm, OntologyGraph, OntologyNode};
use tracing::{info, warn};

/// Cache dataset name
pub const PSIMOD_DATASET: &str = "psimod";

/// Cache version label; the release is only known after parsing
const PSIMOD_CACHE_LABEL: &str = "current";

pub struct PsiModProvider {
    graph: OntologyGraph,
    tree: HierarchyIndex<String>,
    min_nodes: usize,
}

impl PsiModProvider {
    /// Load the cached document, or fetch and parse the OBO file and refresh
    /// the cache entry.
    pub async fn load(config: &IngestConfig, fetcher: &dyn Fetcher, cache: &DatasetCache) -> Result<Self> {
        if config.use_cache {
            if let Some(entry) = cache.load::<OboDocument>(PSIMOD_DATASET, PSIMOD_CACHE_LABEL)? {
                info!("Loaded PSI-MOD from cache");
                return Ok(Self::from_document(entry.payload).with_min_nodes(config.psimod.min_nodes));
            }
        }

        info!("Fetching PSI-MOD ontology");
        let text = fetch_text(fetcher, &config.psimod.urls()).await?;
        let document = OboParser::parse(&text, None)?;

        if let Err(e) = cache.store(PSIMOD_DATASET, PSIMOD_CACHE_LABEL, &document) {
            warn!("Failed to cache PSI-MOD: {}", e);
        }

        Ok(Self::from_document(document).with_min_nodes(config.psimod.min_nodes))
    }

    pub fn from_obo(text: &str) -> Result<Self> {
        Ok(Self::from_document(OboParser::parse(text, None)?))
    }

    pub fn from_document(document: OboDocument) -> Self {
        let graph = OntologyGraph::from_document(document);
        let tree = graph.to_hierarchy();
        Self {
            graph,
            tree,
            min_nodes: DEFAULT_PSIMOD_MIN_NODES,
        }
    }

    pub fn with_min_nodes(mut self, min_nodes: usize) -> Self {
        self.min_nodes = min_nodes;
        self
    }

    /// True when the ontology is a DAG of plausible size
    pub fn test_cache(&self) -> bool {
        info!(
            "Reading {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.graph.is_acyclic() && self.graph.node_count() > self.min_nodes
    }

    pub fn version(&self) -> &str {
        self.graph.version()
    }

    /// Reachability queries (ancestors, adjacent parents, ...)
    pub fn graph(&self) -> &OntologyGraph {
        &self.graph
    }

    /// Flattened single-parent view
    pub fn tree_view(&self) -> &HierarchyIndex<String> {
        &self.tree
    }

    pub fn exists(&self, id: &str) -> bool {
        self.graph.exists(id)
    }

    pub fn term(&self, id: &str) -> Option<&OboTerm> {
        self.graph.term(id)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.graph.name(id)
    }

    pub fn root_nodes(&self) -> Vec<&str> {
        self.graph.root_nodes()
    }

    pub fn ancestors(&self, id: &str, include_self: bool) -> Vec<(String, Option<String>)> {
        self.graph.ancestors(id, include_self)
    }

    pub fn lineage(&self, id: &str) -> Vec<(String, Option<String>, usize)> {
        self.graph.lineage(id)
    }

    pub fn export_tree_node_list<S: AsRef<str>>(&self, ids: &[S]) -> Vec<OntologyNode> {
        self.graph.export_tree_node_list(ids)
    }
}
