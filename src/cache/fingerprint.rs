//! Normalized cache keys.
//!
//! A [`CacheKey`] holds exactly the parameters that affect a cached payload,
//! normalized so that equivalent requests share one [`Fingerprint`]. The
//! caller's session id never takes part.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{Lang, SearchType};
use crate::search::predicate::tokenize;
use crate::search::{LocationQuery, SearchFilters, prefecture};
use crate::services::PageRequest;

/// SHA-256 (hex) of a key's canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts only 64 lowercase hex digits, so a fingerprint is always a safe
    /// file name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        (value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')))
            .then(|| Self(value.to_string()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheKey {
    Search {
        keywords: String,
        prefectures: BTreeSet<String>,
        completion_years: BTreeSet<String>,
        building_types: BTreeSet<String>,
        has_photos: bool,
        has_videos: bool,
        page: u64,
        limit: u64,
        lang: Lang,
    },
    /// Coordinates and radius are keyed by their exact bit patterns.
    Location {
        lat: u64,
        lng: u64,
        radius_km: u64,
        has_photos: bool,
        has_videos: bool,
        page: u64,
        limit: u64,
        lang: Lang,
    },
    Architect {
        slug: String,
        page: u64,
        limit: u64,
        lang: Lang,
    },
    Building {
        slug: String,
        lang: Lang,
    },
    Popular {
        page: u64,
        limit: u64,
        text_filter: String,
        type_filter: Option<SearchType>,
    },
}

/// Bits of `value` with `-0.0` folded into `0.0`.
fn exact_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0_f64 } else { value }.to_bits()
}

fn normalize_set(values: &BTreeSet<String>, map: impl Fn(&str) -> String) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| map(v.trim()))
        .filter(|v| !v.is_empty())
        .collect()
}

impl CacheKey {
    #[must_use]
    pub fn search(filters: &SearchFilters, page: PageRequest) -> Self {
        Self::Search {
            keywords: tokenize(&filters.keywords).join(" "),
            prefectures: normalize_set(&filters.prefectures, prefecture::to_native),
            completion_years: normalize_set(&filters.completion_years, str::to_string),
            building_types: normalize_set(&filters.building_types, str::to_string),
            has_photos: filters.has_photos,
            has_videos: filters.has_videos,
            page: page.page.max(1),
            limit: page.limit,
            lang: page.lang,
        }
    }

    #[must_use]
    pub fn location(query: &LocationQuery, page: PageRequest) -> Self {
        Self::Location {
            lat: exact_bits(query.lat),
            lng: exact_bits(query.lng),
            radius_km: exact_bits(query.radius_km),
            has_photos: query.has_photos,
            has_videos: query.has_videos,
            page: page.page.max(1),
            limit: page.limit,
            lang: page.lang,
        }
    }

    #[must_use]
    pub fn architect(slug: &str, page: PageRequest) -> Self {
        Self::Architect {
            slug: slug.trim().to_string(),
            page: page.page.max(1),
            limit: page.limit,
            lang: page.lang,
        }
    }

    #[must_use]
    pub fn building(slug: &str, lang: Lang) -> Self {
        Self::Building {
            slug: slug.trim().to_string(),
            lang,
        }
    }

    #[must_use]
    pub fn popular(
        page: u64,
        limit: u64,
        text_filter: Option<&str>,
        type_filter: Option<SearchType>,
    ) -> Self {
        Self::Popular {
            page: page.max(1),
            limit,
            text_filter: text_filter.map(str::trim).unwrap_or_default().to_string(),
            type_filter,
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let canonical =
            serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        Fingerprint(hex::encode(Sha256::digest(&canonical)))
    }
}
