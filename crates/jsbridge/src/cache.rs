//! Read-through cache for bootstrap scripts.
//!
//! The cache exists to avoid re-reading the JSON compatibility script
//! from disk for every spawned instance. It is keyed by path, holds at
//! most one entry per distinct path, and never invalidates: the scripts
//! it serves are assumed immutable for the life of the process.
//!
//! There is no ambient global. Callers construct a [`ScriptCache`] during
//! process bootstrap and pass it to the spawn paths that need it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem capability consumed by the cache.
///
/// The default [`FsLoader`] reads through `std::fs`; tests substitute an
/// in-memory loader with read-count instrumentation.
pub trait SourceLoader: Send + Sync {
    /// Read the full contents of `path`.
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// `std::fs`-backed loader.
#[derive(Debug, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Process-wide script cache, explicitly constructed and shared by
/// reference (or `Arc`) with whoever spawns VMs.
pub struct ScriptCache {
    loader: Box<dyn SourceLoader>,
    entries: Mutex<HashMap<PathBuf, Arc<[u8]>>>,
}

impl ScriptCache {
    /// Cache reading through the native filesystem.
    pub fn new() -> Self {
        Self::with_loader(Box::new(FsLoader))
    }

    /// Cache reading through a custom loader.
    pub fn with_loader(loader: Box<dyn SourceLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the contents of `path`, reading it at most once.
    ///
    /// Concurrent first fetches may race to read the same file; both
    /// reads return the same path-determined bytes and the first store
    /// wins, so the race is benign.
    pub fn fetch(&self, path: &Path) -> std::io::Result<Arc<[u8]>> {
        if let Some(hit) = self.entries.lock().get(path) {
            return Ok(Arc::clone(hit));
        }

        let bytes: Arc<[u8]> = self.loader.read(path)?.into();
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&bytes));
        Ok(Arc::clone(entry))
    }

    /// Explicitly populate an entry. A path that is already cached keeps
    /// its existing bytes.
    pub fn store(&self, path: impl Into<PathBuf>, bytes: impl Into<Arc<[u8]>>) {
        self.entries
            .lock()
            .entry(path.into())
            .or_insert_with(|| bytes.into());
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingLoader;

    #[test]
    fn fetch_reads_each_path_once() {
        let loader = CountingLoader::new().with_file("/priv/json_compat.js", b"var JSON;".to_vec());
        let reads = loader.reads_handle();
        let cache = ScriptCache::with_loader(Box::new(loader));

        let first = cache.fetch(Path::new("/priv/json_compat.js")).unwrap();
        let second = cache.fetch(Path::new("/priv/json_compat.js")).unwrap();

        assert_eq!(&*first, b"var JSON;");
        assert_eq!(first, second);
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fetch_propagates_missing_files() {
        let cache = ScriptCache::with_loader(Box::new(CountingLoader::new()));
        let err = cache.fetch(Path::new("/absent.js")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(cache.is_empty());
    }

    #[test]
    fn store_preempts_the_loader() {
        let loader = CountingLoader::new();
        let reads = loader.reads_handle();
        let cache = ScriptCache::with_loader(Box::new(loader));

        cache.store("/boot.js", b"1;".to_vec());
        let bytes = cache.fetch(Path::new("/boot.js")).unwrap();

        assert_eq!(&*bytes, b"1;");
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn store_keeps_the_first_entry() {
        let cache = ScriptCache::with_loader(Box::new(CountingLoader::new()));
        cache.store("/boot.js", b"first".to_vec());
        cache.store("/boot.js", b"second".to_vec());

        let bytes = cache.fetch(Path::new("/boot.js")).unwrap();
        assert_eq!(&*bytes, b"first");
    }
}
