pub mod memory;

pub use memory::{CacheStats, MemoryCache};

/// Trait for cache backends holding encoded image bytes.
///
/// The store is shared by all in-flight requests; implementations must be
/// safe for concurrent get/set. Two racing misses for the same key may both
/// compute and the second `set` wins, which is byte-identical output either
/// way.
#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    /// Get cached bytes by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String>;

    /// Store bytes under a key, overwriting any previous entry.
    async fn set(&self, key: &str, data: Vec<u8>) -> Result<(), String>;
}

/// Generate an ETag from a cache key
pub fn etag_for_key(key: &str) -> String {
    format!("\"{}\"", key)
}
