//! Row aggregation and localization.
//!
//! The page query returns one row per building with its architects folded
//! into four separator-joined projections. This module splits them back and
//! zips them positionally; any length mismatch is a [`TransformDefect`].

use sea_orm::FromQueryResult;

use crate::entities::buildings;
use crate::models::{ArchitectRef, Building, Lang};
use crate::search::geo::round2;

/// Separator used by the aggregate projections (ASCII unit separator).
pub const SEPARATOR: char = '\u{1f}';

/// The four aggregate projections disagree for one building.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("architect projections misaligned for building {building_id}: {detail}")]
pub struct TransformDefect {
    pub building_id: i32,
    pub detail: String,
}

/// One building row as returned by the aggregated page query.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct RawBuildingRow {
    pub id: i32,
    pub uid: String,
    pub slug: String,
    pub title: String,
    pub title_en: Option<String>,
    pub location: Option<String>,
    pub location_en: Option<String>,
    pub prefectures: Option<String>,
    pub prefectures_en: Option<String>,
    pub building_types: Option<String>,
    pub building_types_en: Option<String>,
    pub completion_years: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub has_photo: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub architect_ja: Option<String>,
    pub architect_en: Option<String>,
    pub architect_ids: Option<String>,
    pub architect_slugs: Option<String>,
}

impl From<buildings::Model> for RawBuildingRow {
    fn from(model: buildings::Model) -> Self {
        Self {
            id: model.id,
            uid: model.uid,
            slug: model.slug,
            title: model.title,
            title_en: model.title_en,
            location: model.location,
            location_en: model.location_en,
            prefectures: model.prefectures,
            prefectures_en: model.prefectures_en,
            building_types: model.building_types,
            building_types_en: model.building_types_en,
            completion_years: model.completion_years,
            lat: model.lat,
            lng: model.lng,
            has_photo: model.has_photo,
            youtube_url: model.youtube_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
            architect_ja: None,
            architect_en: None,
            architect_ids: None,
            architect_slugs: None,
        }
    }
}

impl RawBuildingRow {
    /// Rewrites the four projections from an ordered architect list.
    #[must_use]
    pub fn with_architects(mut self, architects: &[ArchitectRef]) -> Self {
        if architects.is_empty() {
            return self;
        }

        let join = |f: &dyn Fn(&ArchitectRef) -> String| {
            architects
                .iter()
                .map(f)
                .collect::<Vec<_>>()
                .join(&SEPARATOR.to_string())
        };
        self.architect_ja = Some(join(&|a| a.name_ja.clone()));
        self.architect_en = Some(join(&|a| a.name_en.clone()));
        self.architect_ids = Some(join(&|a| a.architect_id.to_string()));
        self.architect_slugs = Some(join(&|a| a.slug.clone()));
        self
    }
}

/// Splits and zips the architect projections of `row`.
pub fn split_architects(row: &RawBuildingRow) -> Result<Vec<ArchitectRef>, TransformDefect> {
    let defect = |detail: String| TransformDefect {
        building_id: row.id,
        detail,
    };

    let (ja, en, ids, slugs) = match (
        row.architect_ja.as_deref(),
        row.architect_en.as_deref(),
        row.architect_ids.as_deref(),
        row.architect_slugs.as_deref(),
    ) {
        (None, None, None, None) => return Ok(Vec::new()),
        (Some(ja), Some(en), Some(ids), Some(slugs)) => (
            ja.split(SEPARATOR).collect::<Vec<_>>(),
            en.split(SEPARATOR).collect::<Vec<_>>(),
            ids.split(SEPARATOR).collect::<Vec<_>>(),
            slugs.split(SEPARATOR).collect::<Vec<_>>(),
        ),
        _ => return Err(defect("only some architect projections are present".into())),
    };

    if ja.len() != en.len() || ja.len() != ids.len() || ja.len() != slugs.len() {
        return Err(defect(format!(
            "projection lengths differ (ja={}, en={}, ids={}, slugs={})",
            ja.len(),
            en.len(),
            ids.len(),
            slugs.len()
        )));
    }

    ja.into_iter()
        .zip(en)
        .zip(ids)
        .zip(slugs)
        .map(|(((name_ja, name_en), id), slug)| {
            let architect_id = id
                .trim()
                .parse::<i32>()
                .map_err(|_| defect(format!("invalid architect id '{id}'")))?;
            Ok(ArchitectRef {
                architect_id,
                name_ja: name_ja.trim().to_string(),
                name_en: name_en.trim().to_string(),
                slug: slug.trim().to_string(),
            })
        })
        .collect()
}

fn split_types(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split('/')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Localizes a raw row into a [`Building`].
///
/// Descriptive fields fall back to the other language when empty; the slug
/// and uid are never substituted.
pub fn transform_row(
    row: RawBuildingRow,
    lang: Lang,
    photo_base_url: &str,
    distance_km: Option<f64>,
) -> Result<Building, TransformDefect> {
    let architects = split_architects(&row)?;

    let title_en = row.title_en.as_deref().unwrap_or_default();
    let location = row.location.as_deref().unwrap_or_default();
    let location_en = row.location_en.as_deref().unwrap_or_default();
    let prefecture = row.prefectures.as_deref().unwrap_or_default();
    let prefecture_en = row.prefectures_en.as_deref().unwrap_or_default();

    let types_ja = split_types(row.building_types.as_deref());
    let types_en = split_types(row.building_types_en.as_deref());
    let (mut building_types, building_types_other) = match lang {
        Lang::Ja => (types_ja, types_en),
        Lang::En => (types_en, types_ja),
    };
    if building_types.is_empty() {
        building_types.clone_from(&building_types_other);
    }

    let has_photo = row.has_photo.filter(|p| !p.trim().is_empty());
    let thumbnail_url = has_photo.as_ref().map(|photo| {
        format!(
            "{}/{}/{}",
            photo_base_url.trim_end_matches('/'),
            row.uid,
            photo
        )
    });

    Ok(Building {
        building_id: row.id,
        lang,
        title: lang.pick(&row.title, title_en).to_string(),
        title_other: lang.other(&row.title, title_en).to_string(),
        location: lang.pick(location, location_en).to_string(),
        location_other: lang.other(location, location_en).to_string(),
        prefecture: lang.pick(prefecture, prefecture_en).to_string(),
        prefecture_other: lang.other(prefecture, prefecture_en).to_string(),
        building_types,
        building_types_other,
        completion_years: row.completion_years.unwrap_or_default(),
        lat: row.lat,
        lng: row.lng,
        has_photo,
        thumbnail_url,
        youtube_url: row.youtube_url.filter(|u| !u.trim().is_empty()),
        architects,
        distance_km: distance_km.map(round2),
        uid: row.uid,
        slug: row.slug,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RawBuildingRow {
        RawBuildingRow {
            id: 42,
            uid: "b-42".into(),
            slug: "church-of-the-light".into(),
            title: "光の教会".into(),
            title_en: Some("Church of the Light".into()),
            location: Some("大阪府茨木市".into()),
            location_en: Some(String::new()),
            prefectures: Some("大阪府".into()),
            prefectures_en: Some("Osaka".into()),
            building_types: Some("教会 / 宗教施設".into()),
            building_types_en: None,
            completion_years: Some("1989".into()),
            lat: Some(34.82),
            lng: Some(135.54),
            has_photo: Some("main.jpg".into()),
            youtube_url: Some(String::new()),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
            architect_ja: None,
            architect_en: None,
            architect_ids: None,
            architect_slugs: None,
        }
    }

    fn joined(parts: &[&str]) -> Option<String> {
        Some(parts.join("\u{1f}"))
    }

    #[test]
    fn zips_projections_in_order() {
        let mut raw = row();
        raw.architect_ja = joined(&["安藤忠雄", "隈研吾"]);
        raw.architect_en = joined(&["Tadao Ando", ""]);
        raw.architect_ids = joined(&["7", "3"]);
        raw.architect_slugs = joined(&["tadao-ando", "kengo-kuma"]);

        let architects = split_architects(&raw).unwrap();
        assert_eq!(architects.len(), 2);
        assert_eq!(architects[0].architect_id, 7);
        assert_eq!(architects[0].slug, "tadao-ando");
        assert_eq!(architects[1].name_ja, "隈研吾");
        assert_eq!(architects[1].name_en, "");
    }

    #[test]
    fn no_architects_is_not_a_defect() {
        assert!(split_architects(&row()).unwrap().is_empty());
    }

    #[test]
    fn length_mismatch_is_a_defect() {
        let mut raw = row();
        raw.architect_ja = joined(&["安藤忠雄", "隈研吾"]);
        raw.architect_en = joined(&["Tadao Ando"]);
        raw.architect_ids = joined(&["7", "3"]);
        raw.architect_slugs = joined(&["tadao-ando", "kengo-kuma"]);

        let err = split_architects(&raw).unwrap_err();
        assert_eq!(err.building_id, 42);
        assert!(err.detail.contains("en=1"));
    }

    #[test]
    fn partial_projections_are_a_defect() {
        let mut raw = row();
        raw.architect_ja = Some("安藤忠雄".into());
        assert!(split_architects(&raw).is_err());
    }

    #[test]
    fn localizes_descriptive_fields_with_fallback() {
        let building = transform_row(row(), Lang::En, "https://img.example/", Some(1.234)).unwrap();
        assert_eq!(building.title, "Church of the Light");
        assert_eq!(building.title_other, "光の教会");
        assert_eq!(building.location, "大阪府茨木市");
        assert_eq!(building.location_other, "大阪府茨木市");
        assert_eq!(building.prefecture, "Osaka");
        assert_eq!(building.building_types, vec!["教会", "宗教施設"]);
        assert_eq!(building.slug, "church-of-the-light");
        assert_eq!(building.distance_km, Some(1.23));
        assert_eq!(
            building.thumbnail_url.as_deref(),
            Some("https://img.example/b-42/main.jpg")
        );
        assert!(building.youtube_url.is_none());
    }

    #[test]
    fn rebuilt_projections_round_trip() {
        let architects = vec![ArchitectRef {
            architect_id: 5,
            name_ja: "丹下健三".into(),
            name_en: "Kenzo Tange".into(),
            slug: "kenzo-tange".into(),
        }];
        let raw = row().with_architects(&architects);
        assert_eq!(split_architects(&raw).unwrap(), architects);
    }
}
