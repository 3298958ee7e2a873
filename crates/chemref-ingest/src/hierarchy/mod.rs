// Parent/child hierarchy index
//
// Every chemical reference classification served here (ATC codes, sunid
// style domain trees, the flattened PSI-MOD view) reduces to two maps:
// id -> display name and id -> parent id. This module turns those maps into
// an arena-backed forest that answers lineage and tree-export queries.
//
// - index: node table, construction, ancestor walks
// - tree:  breadth-first flattening into display records

pub mod index;
pub mod tree;

pub use index::{HierarchyBuilder, HierarchyIndex, NameMap, NodeKey};
pub use tree::TreeNode;

/// Result type for hierarchy queries
pub type Result<T> = std::result::Result<T, HierarchyError>;

/// Structural corruption detected while walking the parent chain.
///
/// Raised per query; callers should treat the whole dataset as suspect
/// rather than retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("Malformed hierarchy: lineage walk from '{id}' revisits '{at}'")]
    Malformed { id: String, at: String },
}
