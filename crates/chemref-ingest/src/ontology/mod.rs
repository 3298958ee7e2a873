// OBO ontologies
//
// - obo:   flat-file parser producing an OboDocument
// - graph: multi-parent DAG queries over the parsed terms, plus the
//          single-parent HierarchyIndex view used for tree display

pub mod graph;
pub mod obo;

pub use graph::{OntologyGraph, OntologyNode, ParentEdge, DEFAULT_DATA_VERSION};
pub use obo::{OboDocument, OboHeader, OboParser, OboRelationship, OboTerm, Synonym, SynonymScope};
