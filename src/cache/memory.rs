use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::cache::Cache;

/// Snapshot of the cache's contents.
#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
    pub capacity: usize,
}

/// In-memory LRU store for encoded images.
///
/// Capacity-bounded in entries; the LRU discipline is the only eviction
/// policy. Entries are invalidated implicitly: a changed source file changes
/// the key, and the stale entry ages out.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        let total: u64 = entries.iter().map(|(_, v)| v.len() as u64).sum();
        CacheStats {
            entry_count: entries.len(),
            total_size_bytes: total,
            capacity: entries.cap().get(),
        }
    }
}

#[async_trait::async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        let mut entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, data: Vec<u8>) -> Result<(), String> {
        let mut entries = self.entries.lock().await;
        entries.put(key.to_string(), data);
        Ok(())
    }
}
