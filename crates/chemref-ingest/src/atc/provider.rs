// ATC provider: cached classification plus lineage and tree queries

use super::parser::{AtcData, AtcParser, AtcTerm};
use crate::cache::DatasetCache;
use crate::config::{IngestConfig, DEFAULT_ATC_MIN_ENTRIES};
use crate::error::Result;
use crate::fetch::{fetch_text, Fetcher};
use crate::hierarchy::{HierarchyIndex, NameMap, TreeNode};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Cache dataset name
pub const ATC_DATASET: &str = "atc";

pub struct AtcProvider {
    version: String,
    data: AtcData,
    index: HierarchyIndex<String>,
    min_entries: usize,
}

impl AtcProvider {
    /// Load from the cache, or fetch and parse the CSV export and refresh
    /// the cache entry.
    pub async fn load(config: &IngestConfig, fetcher: &dyn Fetcher, cache: &DatasetCache) -> Result<Self> {
        let version = config.atc.version.as_str();

        if config.use_cache {
            if let Some(entry) = cache.load::<AtcData>(ATC_DATASET, version)? {
                info!("Loaded ATC {} from cache", version);
                return Ok(Self::from_data(version, entry.payload).with_min_entries(config.atc.min_entries));
            }
        }

        info!("Fetching ATC {} term descriptions", version);
        let text = fetch_text(fetcher, &config.atc.urls()).await?;
        let data = AtcParser::new().parse(&text)?;

        if let Err(e) = cache.store(ATC_DATASET, version, &data) {
            warn!("Failed to cache ATC {}: {}", version, e);
        }

        Ok(Self::from_data(version, data).with_min_entries(config.atc.min_entries))
    }

    pub fn from_data(version: impl Into<String>, data: AtcData) -> Self {
        let names: NameMap<String> = data
            .names
            .iter()
            .map(|(code, term)| (code.clone(), term.name.clone()))
            .collect();
        let index = HierarchyIndex::build(
            names,
            data.parents.iter().map(|(code, parent)| (code.clone(), parent.clone())),
            None,
        );

        Self {
            version: version.into(),
            data,
            index,
            min_entries: DEFAULT_ATC_MIN_ENTRIES,
        }
    }

    pub fn with_min_entries(mut self, min_entries: usize) -> Self {
        self.min_entries = min_entries;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// True when the classification looks complete
    pub fn test_cache(&self) -> bool {
        info!(
            "ATC names {} parents {}",
            self.data.names.len(),
            self.data.parents.len()
        );
        self.data.names.len() > self.min_entries && self.data.parents.len() > self.min_entries
    }

    pub fn atc_name(&self, code: &str) -> Option<&str> {
        let name = self.data.names.get(code).map(|term| term.name.as_str());
        if name.is_none() {
            debug!("Undefined ATC {:?}", code);
        }
        name
    }

    pub fn term(&self, code: &str) -> Option<&AtcTerm> {
        self.data.names.get(code)
    }

    /// Codes from the anatomical main group down to `code`
    pub fn id_lineage(&self, code: &str) -> Result<Vec<String>> {
        Ok(self.index.ancestor_lineage(&code.to_string())?)
    }

    pub fn name_lineage(&self, code: &str) -> Result<Vec<Option<&str>>> {
        Ok(self.index.name_lineage(&code.to_string())?)
    }

    /// Breadth-first display records, optionally restricted to `filter` and
    /// the lineages of its members
    pub fn tree_node_list(&self, filter: Option<&HashSet<String>>) -> Result<Vec<TreeNode<String>>> {
        Ok(self.index.export_flattened_tree(filter)?)
    }

    pub fn index(&self) -> &HierarchyIndex<String> {
        &self.index
    }

    pub fn data(&self) -> &AtcData {
        &self.data
    }
}
