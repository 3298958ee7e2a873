//! Ingest configuration
//!
//! Defaults are compiled in; `from_env` overlays `CHEMREF_*` environment
//! variables, after loading a `.env` file when one is present.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

/// Root of the on-disk dataset cache
pub const DEFAULT_CACHE_DIR: &str = "./cache";

/// HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Download attempts per mirror
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound on attempts per mirror; backoff doubles on each one
pub const MAX_RETRIES_LIMIT: u32 = 10;

pub const DEFAULT_USER_AGENT: &str = concat!("chemref-ingest/", env!("CARGO_PKG_VERSION"));

/// BioPortal CSV export; requires an `apikey` query parameter to succeed
pub const DEFAULT_ATC_URL: &str = "https://data.bioontology.org/ontologies/ATC/download?download_format=csv";

pub const DEFAULT_ATC_FALLBACK_URL: &str =
    "https://github.com/rcsb/py-rcsb_exdb_assets/raw/master/fall_back/ATC-2018.csv.gz";

pub const DEFAULT_ATC_VERSION: &str = "2018";

/// A complete ATC export has a little over 6100 classes
pub const DEFAULT_ATC_MIN_ENTRIES: usize = 6100;

pub const DEFAULT_PSIMOD_URL: &str =
    "https://raw.githubusercontent.com/HUPO-PSI/psi-mod-CV/master/PSI-MOD.obo";

pub const DEFAULT_PSIMOD_MIN_NODES: usize = 1000;

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub cache_dir: PathBuf,
    /// Serve datasets from the cache when a valid entry exists
    pub use_cache: bool,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub user_agent: String,
    pub atc: AtcSourceConfig,
    pub psimod: PsiModSourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtcSourceConfig {
    pub url: String,
    pub fallback_url: Option<String>,
    pub version: String,
    /// `test_cache` passes only when names and parents both exceed this
    pub min_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsiModSourceConfig {
    pub url: String,
    pub fallback_url: Option<String>,
    /// `test_cache` passes only when the graph exceeds this many nodes
    pub min_nodes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            use_cache: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            atc: AtcSourceConfig::default(),
            psimod: PsiModSourceConfig::default(),
        }
    }
}

impl Default for AtcSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ATC_URL.to_string(),
            fallback_url: Some(DEFAULT_ATC_FALLBACK_URL.to_string()),
            version: DEFAULT_ATC_VERSION.to_string(),
            min_entries: DEFAULT_ATC_MIN_ENTRIES,
        }
    }
}

impl Default for PsiModSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PSIMOD_URL.to_string(),
            fallback_url: None,
            min_nodes: DEFAULT_PSIMOD_MIN_NODES,
        }
    }
}

impl AtcSourceConfig {
    /// Primary URL followed by the fallback mirror
    pub fn urls(&self) -> Vec<String> {
        std::iter::once(self.url.clone())
            .chain(self.fallback_url.clone())
            .collect()
    }
}

impl PsiModSourceConfig {
    pub fn urls(&self) -> Vec<String> {
        std::iter::once(self.url.clone())
            .chain(self.fallback_url.clone())
            .collect()
    }
}

impl IngestConfig {
    /// Load configuration from environment and defaults
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            cache_dir: std::env::var("CHEMREF_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            use_cache: env_parse("CHEMREF_USE_CACHE").unwrap_or(defaults.use_cache),
            timeout_secs: env_parse("CHEMREF_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            max_retries: env_parse("CHEMREF_MAX_RETRIES").unwrap_or(defaults.max_retries),
            user_agent: defaults.user_agent,
            atc: AtcSourceConfig {
                url: std::env::var("CHEMREF_ATC_URL").unwrap_or(defaults.atc.url),
                fallback_url: env_optional("CHEMREF_ATC_FALLBACK_URL", defaults.atc.fallback_url),
                version: std::env::var("CHEMREF_ATC_VERSION").unwrap_or(defaults.atc.version),
                min_entries: defaults.atc.min_entries,
            },
            psimod: PsiModSourceConfig {
                url: std::env::var("CHEMREF_PSIMOD_URL").unwrap_or(defaults.psimod.url),
                fallback_url: env_optional("CHEMREF_PSIMOD_FALLBACK_URL", defaults.psimod.fallback_url),
                min_nodes: defaults.psimod.min_nodes,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(IngestError::Config("Cache directory cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(IngestError::Config("Timeout must be greater than 0".to_string()));
        }

        if self.max_retries == 0 {
            return Err(IngestError::Config("Max retries must be at least 1".to_string()));
        }

        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(IngestError::Config(format!(
                "Max retries cannot exceed {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.atc.url.is_empty() || self.psimod.url.is_empty() {
            return Err(IngestError::Config("Source URLs cannot be empty".to_string()));
        }

        if self.atc.version.is_empty() {
            return Err(IngestError::Config("ATC version cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// An empty value clears the default
fn env_optional(key: &str, default: Option<String>) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(value),
        Err(_) => default,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "CHEMREF_CACHE_DIR",
        "CHEMREF_USE_CACHE",
        "CHEMREF_TIMEOUT_SECS",
        "CHEMREF_MAX_RETRIES",
        "CHEMREF_ATC_URL",
        "CHEMREF_ATC_FALLBACK_URL",
        "CHEMREF_ATC_VERSION",
        "CHEMREF_PSIMOD_URL",
        "CHEMREF_PSIMOD_FALLBACK_URL",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.atc.urls(), vec![DEFAULT_ATC_URL, DEFAULT_ATC_FALLBACK_URL]);
        assert_eq!(config.psimod.urls(), vec![DEFAULT_PSIMOD_URL]);
    }

    #[test]
    fn test_validate_bounds_max_retries() {
        let mut config = IngestConfig {
            max_retries: MAX_RETRIES_LIMIT,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_ok());

        config.max_retries = 40;
        assert!(matches!(config.validate(), Err(IngestError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("CHEMREF_CACHE_DIR", "/tmp/chemref-test");
        std::env::set_var("CHEMREF_USE_CACHE", "false");
        std::env::set_var("CHEMREF_TIMEOUT_SECS", "12");
        std::env::set_var("CHEMREF_ATC_VERSION", "2024");
        std::env::set_var("CHEMREF_ATC_FALLBACK_URL", "");
        std::env::set_var("CHEMREF_PSIMOD_FALLBACK_URL", "file:///data/PSI-MOD.obo");

        let config = IngestConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/chemref-test"));
        assert!(!config.use_cache);
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.atc.version, "2024");
        assert_eq!(config.atc.fallback_url, None);
        assert_eq!(config.psimod.fallback_url.as_deref(), Some("file:///data/PSI-MOD.obo"));
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("CHEMREF_MAX_RETRIES", "lots");

        let config = IngestConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_timeout() {
        clear_env();
        std::env::set_var("CHEMREF_TIMEOUT_SECS", "0");

        let result = IngestConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(IngestError::Config(_))));
    }
}
