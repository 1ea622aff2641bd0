//! Durable verdict stores.
//!
//! The gate asks the store before running a resolution and hands it every `Ready` entry
//! after publication, so verdicts survive a restart. Stores hold settled entries only.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::types::CacheEntry;
use crate::hashing::ImageFingerprint;

/// Key-value persistence of cache entries by fingerprint.
#[async_trait]
pub trait VerdictStore: Send + Sync {
    async fn get(&self, fingerprint: &ImageFingerprint) -> StoreResult<Option<CacheEntry>>;

    async fn put(&self, fingerprint: &ImageFingerprint, entry: &CacheEntry) -> StoreResult<()>;
}

/// Process-local store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryVerdictStore {
    entries: DashMap<ImageFingerprint, CacheEntry>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryVerdictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VerdictStore for MemoryVerdictStore {
    async fn get(&self, fingerprint: &ImageFingerprint) -> StoreResult<Option<CacheEntry>> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.entries.get(fingerprint).map(|e| e.value().clone()))
    }

    async fn put(&self, fingerprint: &ImageFingerprint, entry: &CacheEntry) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(*fingerprint, entry.clone());
        Ok(())
    }
}

/// One JSON document per fingerprint under a directory.
///
/// Writes go to a temporary file that is renamed into place, so a reader never sees a
/// half-written entry.
#[derive(Debug, Clone)]
pub struct FileVerdictStore {
    dir: PathBuf,
}

impl FileVerdictStore {
    /// Opens (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, fingerprint: &ImageFingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint.to_hex()))
    }
}

fn read_entry(path: &Path) -> StoreResult<Option<CacheEntry>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Serialization {
            message: format!("{}: {e}", path.display()),
        })
}

fn write_entry(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl VerdictStore for FileVerdictStore {
    async fn get(&self, fingerprint: &ImageFingerprint) -> StoreResult<Option<CacheEntry>> {
        let path = self.path_for(fingerprint);
        tokio::task::spawn_blocking(move || read_entry(&path))
            .await
            .map_err(|e| StoreError::Task {
                message: e.to_string(),
            })?
    }

    async fn put(&self, fingerprint: &ImageFingerprint, entry: &CacheEntry) -> StoreResult<()> {
        let path = self.path_for(fingerprint);
        let bytes = serde_json::to_vec_pretty(entry).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;

        tokio::task::spawn_blocking(move || write_entry(&path, &bytes))
            .await
            .map_err(|e| StoreError::Task {
                message: e.to_string(),
            })??;

        debug!(fingerprint = %fingerprint.short(), "Persisted verdict");
        Ok(())
    }
}
