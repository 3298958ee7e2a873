//! Chemref Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Chemical reference classifications served from cached source files.
//!
//! # Supported Data Sources
//!
//! - **ATC**: Anatomical Therapeutic Chemical classification (BioPortal CSV)
//! - **PSI-MOD**: protein modification ontology (OBO)
//!
//! Both reduce to a [`hierarchy::HierarchyIndex`] answering lineage and
//! breadth-first tree queries; PSI-MOD additionally keeps the full
//! multi-parent [`ontology::OntologyGraph`].
//!
//! # Example
//!
//! ```no_run
//! use chemref_ingest::atc::AtcProvider;
//! use chemref_ingest::cache::DatasetCache;
//! use chemref_ingest::config::IngestConfig;
//! use chemref_ingest::fetch::HttpFetcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let fetcher = HttpFetcher::new(config.timeout_secs, config.max_retries, &config.user_agent)?;
//!     let cache = DatasetCache::on_disk(&config.cache_dir);
//!
//!     let atc = AtcProvider::load(&config, &fetcher, &cache).await?;
//!     println!("{:?}", atc.name_lineage("B05DB")?);
//!     Ok(())
//! }
//! ```

pub mod atc;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hierarchy;
pub mod ontology;
pub mod psimod;

pub use error::{IngestError, Result};
