use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::search::prefecture;

/// What a logged query turned out to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Text,
    Architect,
    Building,
    Prefecture,
}

impl SearchType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Architect => "architect",
            Self::Building => "building",
            Self::Prefecture => "prefecture",
        }
    }

    /// Lenient conversion for values read back from the log table.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "architect" => Ok(Self::Architect),
            "building" => Ok(Self::Building),
            "prefecture" => Ok(Self::Prefecture),
            other => Err(format!("unknown search type '{other}'")),
        }
    }
}

/// One aggregated `(query, type)` row of the popular-search view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularSearch {
    pub query: String,
    pub search_type: SearchType,
    pub total_searches: u64,
    pub unique_users: u64,
    pub last_searched: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularSearchPage {
    pub searches: Vec<PopularSearch>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PopularSearchPage {
    #[must_use]
    pub const fn empty(page: u64, limit: u64) -> Self {
        Self {
            searches: Vec::new(),
            total: 0,
            page,
            limit,
            total_pages: 0,
        }
    }

    /// Static sample served when neither the cache nor the log table can
    /// provide data.
    #[must_use]
    pub fn fallback(type_filter: Option<SearchType>) -> Self {
        const SAMPLE: [(&str, SearchType, u64, u64); 10] = [
            ("安藤忠雄", SearchType::Architect, 15, 8),
            ("隈研吾", SearchType::Architect, 12, 6),
            ("丹下健三", SearchType::Architect, 9, 4),
            ("東京", SearchType::Prefecture, 20, 10),
            ("大阪", SearchType::Prefecture, 8, 4),
            ("京都", SearchType::Prefecture, 6, 3),
            ("国立代々木競技場", SearchType::Building, 5, 3),
            ("東京スカイツリー", SearchType::Building, 4, 2),
            ("現代建築", SearchType::Text, 10, 5),
            ("住宅", SearchType::Text, 7, 3),
        ];

        let no_filters = serde_json::Value::Null;
        let searches: Vec<PopularSearch> = SAMPLE
            .iter()
            .filter(|(_, search_type, _, _)| type_filter.is_none_or(|t| t == *search_type))
            .map(|&(query, search_type, total_searches, unique_users)| PopularSearch {
                query: query.to_string(),
                search_type,
                total_searches,
                unique_users,
                last_searched: None,
                link: derive_link(query, search_type, &no_filters),
            })
            .collect();

        let count = searches.len() as u64;
        Self {
            searches,
            total: count,
            page: 1,
            limit: count,
            total_pages: 1,
        }
    }
}

/// Builds the outbound link for a popular-search row from its query, type and
/// the filter JSON recorded at log time.
#[must_use]
pub fn derive_link(query: &str, search_type: SearchType, filters: &serde_json::Value) -> String {
    let recorded = |key: &str| {
        filters
            .get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|v| !v.is_empty())
    };

    match search_type {
        SearchType::Architect => recorded("architect_slug").map_or_else(
            || format!("/index.php?q={}&type=architect", urlencoding::encode(query)),
            |slug| format!("/architects/{slug}/"),
        ),
        SearchType::Building => recorded("building_slug").map_or_else(
            || format!("/index.php?q={}&type=building", urlencoding::encode(query)),
            |slug| format!("/buildings/{slug}/"),
        ),
        SearchType::Prefecture => {
            let english = recorded("prefecture_en")
                .map_or_else(|| prefecture::to_english(query), ToString::to_string);
            format!("/index.php?prefectures={}", urlencoding::encode(&english))
        }
        SearchType::Text => format!("/index.php?q={}", urlencoding::encode(query)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn architect_link_uses_recorded_slug() {
        let filters = json!({ "architect_slug": "tadao-ando" });
        assert_eq!(
            derive_link("安藤忠雄", SearchType::Architect, &filters),
            "/architects/tadao-ando/"
        );
    }

    #[test]
    fn architect_link_without_slug_falls_back_to_query() {
        let link = derive_link("安藤忠雄", SearchType::Architect, &serde_json::Value::Null);
        assert!(link.starts_with("/index.php?q="));
        assert!(link.ends_with("&type=architect"));
    }

    #[test]
    fn prefecture_link_converts_to_english() {
        assert_eq!(
            derive_link("東京都", SearchType::Prefecture, &serde_json::Value::Null),
            "/index.php?prefectures=Tokyo"
        );
    }

    #[test]
    fn text_link_is_url_encoded() {
        assert_eq!(
            derive_link("modern house", SearchType::Text, &serde_json::Value::Null),
            "/index.php?q=modern%20house"
        );
    }

    #[test]
    fn fallback_filters_by_type() {
        let all = PopularSearchPage::fallback(None);
        assert_eq!(all.searches.len(), 10);
        assert_eq!(all.total_pages, 1);

        let architects = PopularSearchPage::fallback(Some(SearchType::Architect));
        assert_eq!(architects.total, 3);
        assert!(
            architects
                .searches
                .iter()
                .all(|s| s.search_type == SearchType::Architect)
        );
    }

    #[test]
    fn unknown_type_from_db_is_text() {
        assert_eq!(SearchType::from_db("bogus"), SearchType::Text);
        assert_eq!(SearchType::from_db("building"), SearchType::Building);
    }
}
