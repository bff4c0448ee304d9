
use std::sync::Arc;

use crate::cache::{CacheStats, LruCache};

/// Strict-LRU cache of embeddings keyed by model and normalized text
pub struct EmbeddingCache {
    entries: LruCache<String, Arc<Vec<f32>>>,
}

impl EmbeddingCache {
    #[inline]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: LruCache::new(max_entries),
        }
    }

    /// Key for a (model, text) pair; text is trimmed and lower-cased first
    #[inline]
    pub fn key(model: &str, text: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(model.as_bytes());
        hasher.update(b"\0");
        hasher.update(text.trim().to_lowercase().as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    #[inline]
    pub fn get(&self, model: &str, text: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.get(&Self::key(model, text))
    }

    #[inline]
    pub fn get_by_key(&self, key: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.get(&key.to_string())
    }

    #[inline]
    pub fn insert(&self, model: &str, text: &str, vector: Arc<Vec<f32>>) {
        self.entries.insert(Self::key(model, text), vector);
    }

    #[inline]
    pub fn insert_by_key(&self, key: String, vector: Arc<Vec<f32>>) {
        self.entries.insert(key, vector);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }
}
