//! File-backed caches in front of the search executor.
//!
//! Both caches are derived data: deleting the cache root only costs latency.

pub mod fingerprint;
pub mod popular_cache;
pub mod result_cache;

pub use fingerprint::{CacheKey, Fingerprint};
pub use popular_cache::{
    PopularCacheState, PopularCacheStatus, PopularSearchCache, PopularSearchSource,
    StorePopularSource,
};
pub use result_cache::{CacheEntry, CacheStats, ResultCache};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another caller holds the rebuild lock.
    #[error("Cache lock is held by another rebuild")]
    LockUnavailable,

    #[error("Failed to fetch cache source data: {0}")]
    Source(String),
}

/// Current time as unix seconds.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Writes `bytes` to a uniquely named sibling of `path`, then renames it into
/// place so readers never observe a partial file. The parent directory is
/// recreated if the cache root was removed underneath us.
pub(crate) async fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("entry");
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        tokio::fs::remove_file(&tmp).await.ok();
        return Err(e.into());
    }
    Ok(())
}
