// Anatomical Therapeutic Chemical (ATC) classification
//
// Source is the BioPortal CSV export (or the gzipped fallback mirror); the
// parsed classification is cached as JSON and served through a
// HierarchyIndex.

pub mod parser;
pub mod provider;

pub use parser::{AtcData, AtcParser, AtcTerm, ATC_NAMESPACE};
pub use provider::{AtcProvider, ATC_DATASET};
