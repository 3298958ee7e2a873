//! Dataset cache
//!
//! Parsed datasets are stored as JSON blobs behind a [`CacheStorage`]
//! backend. Each blob has a `.sha256` sidecar; an entry whose digest does
//! not match, or whose JSON no longer decodes, is reported as a miss so the
//! caller refetches instead of failing.

use crate::error::Result;
use chemref_common::checksum::{sha256_hex, verify_sha256};
use chemref_common::ChemrefError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Bumped whenever the cached JSON layout changes
pub const CACHE_FORMAT: u32 = 1;

const CHECKSUM_SUFFIX: &str = ".sha256";

// ============================================================================
// Storage backends
// ============================================================================

/// Key/value blob store used by [`DatasetCache`]
pub trait CacheStorage: Send + Sync {
    /// `None` when the key is absent
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn write(&self, key: &str, blob: &[u8]) -> Result<()>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Blobs as files below a root directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(ChemrefError::cache(format!("Invalid cache key: {:?}", key)).into());
        }
        Ok(self.root.join(relative))
    }
}

impl CacheStorage for FsStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so readers never see a torn file
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;

        debug!("Wrote {} bytes to {}", blob.len(), path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.blobs
            .lock()
            .map_err(|_| ChemrefError::cache("Memory cache lock poisoned").into())
    }
}

impl CacheStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs()?.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &[u8]) -> Result<()> {
        self.blobs()?.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.blobs()?.remove(key);
        Ok(())
    }
}

// ============================================================================
// Dataset cache
// ============================================================================

/// A decoded cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub dataset: String,
    pub version: String,
    pub cached_at: DateTime<Utc>,
    pub payload: T,
}

/// Versioned, checksummed dataset store
#[derive(Clone)]
pub struct DatasetCache {
    storage: Arc<dyn CacheStorage>,
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache").finish_non_exhaustive()
    }
}

impl DatasetCache {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    pub fn on_disk(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsStorage::new(root)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// `{dataset}/{dataset}-{version}-v{CACHE_FORMAT}.json`
    pub fn key(dataset: &str, version: &str) -> String {
        format!("{dataset}/{dataset}-{version}-v{CACHE_FORMAT}.json")
    }

    /// Serialize `payload` and store it with its checksum sidecar
    pub fn store<T: Serialize>(&self, dataset: &str, version: &str, payload: &T) -> Result<()> {
        let key = Self::key(dataset, version);
        let entry = CacheEntry {
            dataset: dataset.to_string(),
            version: version.to_string(),
            cached_at: Utc::now(),
            payload,
        };
        let blob = serde_json::to_vec(&entry)?;
        let digest = sha256_hex(&blob);

        self.storage.write(&key, &blob)?;
        self.storage
            .write(&format!("{key}{CHECKSUM_SUFFIX}"), digest.as_bytes())?;

        info!("Cached {} {} ({} bytes)", dataset, version, blob.len());
        Ok(())
    }

    /// Fetch a cached entry.
    ///
    /// Missing entries, missing sidecars, digest mismatches and undecodable
    /// JSON all yield `Ok(None)`; only storage failures are errors.
    pub fn load<T: DeserializeOwned>(&self, dataset: &str, version: &str) -> Result<Option<CacheEntry<T>>> {
        let key = Self::key(dataset, version);

        let Some(blob) = self.storage.read(&key)? else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        let Some(sidecar) = self.storage.read(&format!("{key}{CHECKSUM_SUFFIX}"))? else {
            warn!("Cache entry {} has no checksum; ignoring it", key);
            return Ok(None);
        };
        let expected = String::from_utf8_lossy(&sidecar);
        if let Err(e) = verify_sha256(&blob, &expected) {
            warn!("Cache entry {} failed verification: {}", key, e);
            return Ok(None);
        }

        match serde_json::from_slice::<CacheEntry<T>>(&blob) {
            Ok(entry) => {
                info!("Cache hit for {} (cached at {})", key, entry.cached_at.to_rfc3339());
                Ok(Some(entry))
            },
            Err(e) => {
                warn!("Cache entry {} does not decode: {}", key, e);
                Ok(None)
            },
        }
    }

    /// Drop an entry and its sidecar
    pub fn invalidate(&self, dataset: &str, version: &str) -> Result<()> {
        let key = Self::key(dataset, version);
        self.storage.remove(&key)?;
        self.storage.remove(&format!("{key}{CHECKSUM_SUFFIX}"))?;
        debug!("Invalidated {}", key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("A".to_string(), "ALIMENTARY TRACT AND METABOLISM".to_string()),
            ("B".to_string(), "BLOOD AND BLOOD FORMING ORGANS".to_string()),
        ])
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(DatasetCache::key("atc", "2018"), "atc/atc-2018-v1.json");
    }

    #[test]
    fn test_fs_store_and_load() {
        let dir = TempDir::new().unwrap();
        let cache = DatasetCache::on_disk(dir.path());

        cache.store("atc", "2018", &sample()).unwrap();
        assert!(dir.path().join("atc/atc-2018-v1.json").exists());
        assert!(dir.path().join("atc/atc-2018-v1.json.sha256").exists());
        assert!(!dir.path().join("atc/atc-2018-v1.json.tmp").exists());

        let entry = cache
            .load::<BTreeMap<String, String>>("atc", "2018")
            .unwrap()
            .expect("cache hit");
        assert_eq!(entry.payload, sample());
        assert_eq!(entry.version, "2018");

        assert!(cache
            .load::<BTreeMap<String, String>>("atc", "2019")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_tampered_blob_is_a_miss() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = DatasetCache::new(storage.clone());
        cache.store("atc", "2018", &sample()).unwrap();

        let key = DatasetCache::key("atc", "2018");
        let mut blob = storage.read(&key).unwrap().unwrap();
        blob.extend_from_slice(b" ");
        storage.write(&key, &blob).unwrap();

        assert!(cache
            .load::<BTreeMap<String, String>>("atc", "2018")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_undecodable_payload_is_a_miss() {
        let cache = DatasetCache::in_memory();
        cache.store("atc", "2018", &vec![1, 2, 3]).unwrap();

        assert!(cache
            .load::<BTreeMap<String, String>>("atc", "2018")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_sidecar_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = DatasetCache::on_disk(dir.path());
        cache.store("psimod", "1.031.6", &sample()).unwrap();
        std::fs::remove_file(dir.path().join("psimod/psimod-1.031.6-v1.json.sha256")).unwrap();

        assert!(cache
            .load::<BTreeMap<String, String>>("psimod", "1.031.6")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = DatasetCache::on_disk(dir.path());
        cache.store("atc", "2018", &sample()).unwrap();

        cache.invalidate("atc", "2018").unwrap();
        assert!(!dir.path().join("atc/atc-2018-v1.json").exists());
        assert!(!dir.path().join("atc/atc-2018-v1.json.sha256").exists());

        // Absent entries invalidate cleanly
        cache.invalidate("atc", "2018").unwrap();
    }

    #[test]
    fn test_fs_storage_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(matches!(
            storage.write("../outside.json", b"{}"),
            Err(IngestError::Common(ChemrefError::Cache(_)))
        ));
        assert!(storage.read("/etc/passwd").is_err());
        assert!(storage.read("").is_err());
    }
}
