use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language of a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ja,
    En,
}

impl Lang {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ja => "ja",
            Self::En => "en",
        }
    }

    /// Picks the value for this language, falling back to the other one when
    /// the preferred value is empty. Only use this for descriptive text.
    #[must_use]
    pub fn pick<'a>(self, ja: &'a str, en: &'a str) -> &'a str {
        let (primary, secondary) = match self {
            Self::Ja => (ja, en),
            Self::En => (en, ja),
        };

        if primary.trim().is_empty() {
            secondary
        } else {
            primary
        }
    }

    /// The value in the other language, without fallback.
    #[must_use]
    pub fn other<'a>(self, ja: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::Ja => en,
            Self::En => ja,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ja" | "jp" => Ok(Self::Ja),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language '{other}' (expected 'ja' or 'en')")),
        }
    }
}

/// One architect as listed on a building, in association order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectRef {
    pub architect_id: i32,
    pub name_ja: String,
    pub name_en: String,
    pub slug: String,
}

impl ArchitectRef {
    #[must_use]
    pub fn display_name(&self, lang: Lang) -> &str {
        lang.pick(&self.name_ja, &self.name_en)
    }
}

/// Profile of the architect an architect search was run for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectProfile {
    pub architect_id: i32,
    pub slug: String,
    pub name_ja: String,
    pub name_en: Option<String>,
    pub website: Option<String>,
}

impl From<crate::entities::architects::Model> for ArchitectProfile {
    fn from(model: crate::entities::architects::Model) -> Self {
        Self {
            architect_id: model.id,
            slug: model.slug,
            name_ja: model.name_ja,
            name_en: model.name_en,
            website: model.website,
        }
    }
}

/// A building with its architects, localized for one [`Lang`].
///
/// `title`, `location` and `prefecture` hold the value in the requested
/// language (falling back to the other language when empty); the `*_other`
/// fields keep the other language verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub building_id: i32,
    pub uid: String,
    pub slug: String,
    pub lang: Lang,
    pub title: String,
    pub title_other: String,
    pub location: String,
    pub location_other: String,
    pub prefecture: String,
    pub prefecture_other: String,
    pub building_types: Vec<String>,
    pub building_types_other: Vec<String>,
    pub completion_years: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub has_photo: Option<String>,
    pub thumbnail_url: Option<String>,
    pub youtube_url: Option<String>,
    pub architects: Vec<ArchitectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Building {
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.has_photo.as_deref().is_some_and(|p| !p.is_empty())
    }

    #[must_use]
    pub fn has_video(&self) -> bool {
        self.youtube_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}
