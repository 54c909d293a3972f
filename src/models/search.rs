use serde::{Deserialize, Serialize};

use super::building::{ArchitectProfile, Building};

/// How a result was served by the result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Hit,
    Miss,
    Disabled,
}

/// Cache annotation attached to every result passing through the cache layer.
/// Timestamps are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub hit: bool,
    pub status: CacheStatus,
    pub created_at: i64,
    pub expires_at: i64,
    pub age_secs: i64,
}

impl CacheInfo {
    #[must_use]
    pub const fn hit(created_at: i64, expires_at: i64, now: i64) -> Self {
        Self {
            hit: true,
            status: CacheStatus::Hit,
            created_at,
            expires_at,
            age_secs: now - created_at,
        }
    }

    #[must_use]
    pub const fn miss(now: i64, ttl_secs: i64) -> Self {
        Self {
            hit: false,
            status: CacheStatus::Miss,
            created_at: now,
            expires_at: now + ttl_secs,
            age_secs: 0,
        }
    }

    #[must_use]
    pub const fn disabled(now: i64) -> Self {
        Self {
            hit: false,
            status: CacheStatus::Disabled,
            created_at: now,
            expires_at: now,
            age_secs: 0,
        }
    }
}

/// One page of buildings. Built once per call and never mutated afterwards,
/// apart from the cache annotation added by the cache layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub items: Vec<Building>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architect_info: Option<ArchitectProfile>,
    /// Set when the result is an empty stand-in for a failed query.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheInfo>,
}

impl SearchResult {
    #[must_use]
    pub fn new(items: Vec<Building>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            page,
            total_pages: total_pages(total, limit),
            limit,
            architect_info: None,
            degraded: false,
            cache: None,
        }
    }

    #[must_use]
    pub fn empty(page: u64, limit: u64) -> Self {
        Self::new(Vec::new(), 0, page, limit)
    }

    /// The well-shaped empty page returned instead of a propagated failure.
    #[must_use]
    pub fn degraded(page: u64, limit: u64) -> Self {
        Self {
            degraded: true,
            ..Self::empty(page, limit)
        }
    }

    #[must_use]
    pub fn with_architect_info(mut self, info: Option<ArchitectProfile>) -> Self {
        self.architect_info = info;
        self
    }
}

#[must_use]
pub const fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        total.div_ceil(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn degraded_result_is_well_shaped() {
        let result = SearchResult::degraded(3, 10);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.page, 3);
        assert_eq!(result.total_pages, 0);
        assert!(result.degraded);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(SearchResult::empty(1, 10)).unwrap();
        assert_eq!(json["totalPages"], 0);
        assert!(json.get("degraded").is_none());
        assert!(json.get("cache").is_none());
    }
}
