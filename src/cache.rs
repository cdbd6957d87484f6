/**
Shared cache of loaded models and dictionaries, keyed by language and path.
*/
use crate::error::Result;
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

type CacheKey = (String, PathBuf);

/// Read-mostly cache of loaded resources. It is an explicit value: create one and hand it (or an
/// `Arc` of it) to whatever needs to share loaded resources.
#[derive(Debug)]
pub struct ModelCache<V> {
    entries: RwLock<AHashMap<CacheKey, Arc<V>>>,
}

impl<V> Default for ModelCache<V> {
    fn default() -> Self {
        ModelCache {
            entries: RwLock::new(AHashMap::new()),
        }
    }
}

impl<V> ModelCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(language: &str, path: &Path) -> CacheKey {
        (String::from(language), path.to_path_buf())
    }

    /// Returns the cached value, if any.
    pub fn get<P: AsRef<Path>>(&self, language: &str, path: P) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&Self::key(language, path.as_ref())).cloned()
    }

    /// Returns the cached value or loads it with `load`. The loader runs without holding the lock,
    /// so two threads may load the same resource; the first one inserted wins.
    ///
    /// * `language`: Language of the resource (ex: `"en"`).
    /// * `path`: Location of the resource.
    /// * `load`: Called on a cache miss. Its error is returned as is and nothing is cached.
    pub fn get_or_load<P, F>(&self, language: &str, path: P, load: F) -> Result<Arc<V>>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<V>,
    {
        if let Some(value) = self.get(language, path.as_ref()) {
            return Ok(value);
        }
        log::debug!("Loading {} resource {}", language, path.as_ref().display());
        let loaded = Arc::new(load(path.as_ref())?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let value = entries
            .entry(Self::key(language, path.as_ref()))
            .or_insert(loaded);
        Ok(Arc::clone(value))
    }

    /// Inserts a value, replacing any previous one.
    pub fn insert<P: AsRef<Path>>(&self, language: &str, path: P, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(Self::key(language, path.as_ref()), Arc::clone(&value));
        value
    }

    /// Removes a value. Holders of the `Arc` keep it alive.
    pub fn remove<P: AsRef<Path>>(&self, language: &str, path: P) -> Option<Arc<V>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&Self::key(language, path.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
