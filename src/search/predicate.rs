//! Predicate Builder.
//!
//! Raw filter values become a small expression tree ([`Predicate`]) that is
//! rendered into a sea-query [`Condition`] against the `buildings` table.
//! Architect fields never join into the outer query: they render as
//! `buildings.id IN (SELECT building_id ...)`, so testing a building against an
//! architect never multiplies or narrows the rows used for display.

use std::collections::BTreeSet;

use sea_orm::Value;
use sea_orm::sea_query::{Condition, Expr, LikeExpr, Query, SimpleExpr};

use crate::entities::{architects, building_architects, buildings};
use crate::search::geo::BoundingBox;
use crate::search::prefecture;

/// Filter dimensions of a catalogue search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub keywords: String,
    pub prefectures: BTreeSet<String>,
    pub completion_years: BTreeSet<String>,
    pub building_types: BTreeSet<String>,
    pub has_photos: bool,
    pub has_videos: bool,
    /// Identifies the caller for search logging only; never affects results.
    pub session_id: Option<String>,
}

impl SearchFilters {
    #[must_use]
    pub fn keywords(query: impl Into<String>) -> Self {
        Self {
            keywords: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        tokenize(&self.keywords)
    }

    /// Builds the predicate selecting every building these filters match.
    #[must_use]
    pub fn to_predicate(&self) -> Predicate {
        let mut clauses: Vec<Predicate> = self.tokens().iter().map(|t| keyword_clause(t)).collect();

        clauses.push(prefecture_clause(&self.prefectures));
        clauses.push(any_contains(&[Field::CompletionYears], &self.completion_years));
        clauses.push(any_contains(
            &[Field::BuildingTypes, Field::BuildingTypesEn],
            &self.building_types,
        ));
        clauses.push(media_clause(self.has_photos, self.has_videos));

        Predicate::all(clauses)
    }
}

/// Columns a predicate can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Slug,
    Title,
    TitleEn,
    BuildingTypes,
    BuildingTypesEn,
    Location,
    LocationEn,
    Prefectures,
    CompletionYears,
    HasPhoto,
    YoutubeUrl,
    Lat,
    Lng,
    ArchitectNameJa,
    ArchitectNameEn,
    ArchitectSlug,
}

/// Fields every keyword token is OR-matched against.
pub const KEYWORD_FIELDS: [Field; 8] = [
    Field::Title,
    Field::TitleEn,
    Field::BuildingTypes,
    Field::BuildingTypesEn,
    Field::Location,
    Field::LocationEn,
    Field::ArchitectNameJa,
    Field::ArchitectNameEn,
];

enum Target {
    Building(buildings::Column),
    Architect(architects::Column),
}

impl Field {
    const fn target(self) -> Target {
        match self {
            Self::Id => Target::Building(buildings::Column::Id),
            Self::Slug => Target::Building(buildings::Column::Slug),
            Self::Title => Target::Building(buildings::Column::Title),
            Self::TitleEn => Target::Building(buildings::Column::TitleEn),
            Self::BuildingTypes => Target::Building(buildings::Column::BuildingTypes),
            Self::BuildingTypesEn => Target::Building(buildings::Column::BuildingTypesEn),
            Self::Location => Target::Building(buildings::Column::Location),
            Self::LocationEn => Target::Building(buildings::Column::LocationEn),
            Self::Prefectures => Target::Building(buildings::Column::Prefectures),
            Self::CompletionYears => Target::Building(buildings::Column::CompletionYears),
            Self::HasPhoto => Target::Building(buildings::Column::HasPhoto),
            Self::YoutubeUrl => Target::Building(buildings::Column::YoutubeUrl),
            Self::Lat => Target::Building(buildings::Column::Lat),
            Self::Lng => Target::Building(buildings::Column::Lng),
            Self::ArchitectNameJa => Target::Architect(architects::Column::NameJa),
            Self::ArchitectNameEn => Target::Architect(architects::Column::NameEn),
            Self::ArchitectSlug => Target::Architect(architects::Column::Slug),
        }
    }

    const fn is_text(self) -> bool {
        !matches!(self, Self::Id | Self::Lat | Self::Lng)
    }
}

/// A value bound into the rendered query.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<BoundValue> for Value {
    fn from(value: BoundValue) -> Self {
        match value {
            BoundValue::Text(s) => s.into(),
            BoundValue::Int(i) => i.into(),
            BoundValue::Float(f) => f.into(),
        }
    }
}

/// Boolean filter expression over [`Field`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every building.
    True,
    Equals(Field, BoundValue),
    /// Case-insensitive substring match.
    Contains(Field, String),
    InSet(Field, Vec<BoundValue>),
    /// Non-NULL, and for text fields also non-empty.
    NotEmpty(Field),
    Between(Field, f64, f64),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction that drops `True` members and flattens nested conjunctions.
    #[must_use]
    pub fn all(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Self::True => {}
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Self::True,
            1 => flat.remove(0),
            _ => Self::And(flat),
        }
    }

    /// Disjunction; any `True` member makes the whole disjunction `True`.
    #[must_use]
    pub fn any(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Self::True => return Self::True,
                Self::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Or(flat)
        }
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::all([self, other])
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Bound values in the order they appear in the rendered expression.
    #[must_use]
    pub fn bound_values(&self) -> Vec<BoundValue> {
        let mut out = Vec::new();
        self.collect_values(&mut out);
        out
    }

    fn collect_values(&self, out: &mut Vec<BoundValue>) {
        match self {
            Self::True | Self::NotEmpty(_) => {}
            Self::Equals(_, v) => out.push(v.clone()),
            Self::Contains(_, needle) => out.push(BoundValue::Text(like_pattern(needle))),
            Self::InSet(_, values) => out.extend(values.iter().cloned()),
            Self::Between(_, lo, hi) => {
                out.push(BoundValue::Float(*lo));
                out.push(BoundValue::Float(*hi));
            }
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.collect_values(out);
                }
            }
        }
    }

    /// Renders the predicate for use in `cond_where` against `buildings`.
    #[must_use]
    pub fn to_condition(&self) -> Condition {
        match self {
            Self::True => Condition::all(),
            Self::And(parts) => parts
                .iter()
                .fold(Condition::all(), |cond, p| cond.add(p.to_condition())),
            Self::Or(parts) if parts.is_empty() => Condition::all().add(Expr::cust("1 = 0")),
            Self::Or(parts) => parts
                .iter()
                .fold(Condition::any(), |cond, p| cond.add(p.to_condition())),
            leaf => Condition::all().add(leaf.leaf_expr()),
        }
    }

    fn leaf_expr(&self) -> SimpleExpr {
        match self {
            Self::Equals(field, value) => render_on(*field, |col| col.eq(value.clone())),
            Self::Contains(field, needle) => render_on(*field, |col| {
                col.like(LikeExpr::new(like_pattern(needle)).escape('\\'))
            }),
            Self::InSet(field, values) => render_on(*field, |col| {
                col.is_in(values.iter().cloned().map(Value::from))
            }),
            Self::NotEmpty(field) if field.is_text() => render_on(*field, |col| {
                col.clone().is_not_null().and(col.ne(""))
            }),
            Self::NotEmpty(field) => render_on(*field, Expr::is_not_null),
            Self::Between(field, lo, hi) => render_on(*field, |col| col.between(*lo, *hi)),
            Self::True | Self::And(_) | Self::Or(_) => Expr::cust("1 = 1"),
        }
    }
}

fn render_on(field: Field, build: impl FnOnce(Expr) -> SimpleExpr) -> SimpleExpr {
    match field.target() {
        Target::Building(column) => build(Expr::col((buildings::Entity, column))),
        Target::Architect(column) => {
            let matching = build(Expr::col((architects::Entity, column)));
            let subquery = Query::select()
                .column((
                    building_architects::Entity,
                    building_architects::Column::BuildingId,
                ))
                .from(building_architects::Entity)
                .inner_join(
                    architects::Entity,
                    Expr::col((architects::Entity, architects::Column::Id)).equals((
                        building_architects::Entity,
                        building_architects::Column::ArchitectId,
                    )),
                )
                .and_where(matching)
                .to_owned();

            Expr::col((buildings::Entity, buildings::Column::Id)).in_subquery(subquery)
        }
    }
}

fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Splits a free-text query on whitespace. Full-width (U+3000) and half-width
/// spaces are equivalent; empty tokens are dropped.
#[must_use]
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .replace('\u{3000}', " ")
        .split_whitespace()
        .map(ToString::to_string)
        .collect()
}

/// One AND-clause: the token must match at least one keyword field.
#[must_use]
pub fn keyword_clause(token: &str) -> Predicate {
    Predicate::any(
        KEYWORD_FIELDS
            .iter()
            .map(|field| Predicate::Contains(*field, token.to_string())),
    )
}

/// OR of substring matches on the stored (native) prefecture name.
#[must_use]
pub fn prefecture_clause(labels: &BTreeSet<String>) -> Predicate {
    let natives: BTreeSet<String> = labels
        .iter()
        .map(|label| prefecture::to_native(label))
        .filter(|label| !label.is_empty())
        .collect();

    any_contains(&[Field::Prefectures], &natives)
}

fn any_contains(fields: &[Field], values: &BTreeSet<String>) -> Predicate {
    let branches: Vec<Predicate> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .flat_map(|v| {
            fields
                .iter()
                .map(move |field| Predicate::Contains(*field, v.to_string()))
        })
        .collect();

    if branches.is_empty() {
        Predicate::True
    } else {
        Predicate::any(branches)
    }
}

#[must_use]
pub fn media_clause(has_photos: bool, has_videos: bool) -> Predicate {
    let mut parts = Vec::new();
    if has_photos {
        parts.push(Predicate::NotEmpty(Field::HasPhoto));
    }
    if has_videos {
        parts.push(Predicate::NotEmpty(Field::YoutubeUrl));
    }
    Predicate::all(parts)
}

/// Selects buildings linked to the architect with this slug.
#[must_use]
pub fn architect_slug_clause(slug: &str) -> Predicate {
    Predicate::Equals(Field::ArchitectSlug, BoundValue::Text(slug.trim().to_string()))
}

#[must_use]
pub fn building_slug_clause(slug: &str) -> Predicate {
    Predicate::Equals(Field::Slug, BoundValue::Text(slug.trim().to_string()))
}

#[must_use]
pub fn id_set_clause(ids: &[i32]) -> Predicate {
    Predicate::InSet(
        Field::Id,
        ids.iter().map(|id| BoundValue::Int(i64::from(*id))).collect(),
    )
}

/// Stage-one geospatial filter: non-null coordinates inside the box.
#[must_use]
pub fn bounding_box_clause(bbox: &BoundingBox) -> Predicate {
    let mut parts = vec![
        Predicate::NotEmpty(Field::Lat),
        Predicate::NotEmpty(Field::Lng),
        Predicate::Between(Field::Lat, bbox.min_lat, bbox.max_lat),
    ];
    if let Some((min_lng, max_lng)) = bbox.lng_range {
        parts.push(Predicate::Between(Field::Lng, min_lng, max_lng));
    }
    Predicate::all(parts)
}
