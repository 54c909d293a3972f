//! Two-stage geospatial search helpers.
//!
//! Stage one narrows candidates with a cheap latitude/longitude box in SQL.
//! Stage two computes the exact great-circle distance here and keeps only
//! candidates within the radius.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Parameters of a radius search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    #[serde(default)]
    pub has_photos: bool,
    #[serde(default)]
    pub has_videos: bool,
}

impl LocationQuery {
    #[must_use]
    pub const fn new(lat: f64, lng: f64, radius_km: f64) -> Self {
        Self {
            lat,
            lng,
            radius_km,
            has_photos: false,
            has_videos: false,
        }
    }

    #[must_use]
    pub const fn center(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.center().is_valid() && self.radius_km.is_finite() && self.radius_km > 0.0
    }
}

/// Great-circle distance in kilometres (spherical law of cosines). The cosine
/// argument is clamped to `[-1, 1]` so identical points yield `0.0`, not NaN.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlng = (b.lng - a.lng).to_radians();

    let cos_angle = lat1.sin().mul_add(lat2.sin(), lat1.cos() * lat2.cos() * dlng.cos());
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}

/// Stage-one candidate window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    /// `None` when the longitude span is unbounded (near a pole or across the
    /// antimeridian); stage two still filters exactly.
    pub lng_range: Option<(f64, f64)>,
}

impl BoundingBox {
    #[must_use]
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let dlat = radius_km / KM_PER_DEGREE;
        let cos_lat = center.lat.to_radians().cos();

        let lng_range = if cos_lat > 1e-6 {
            let dlng = radius_km / (KM_PER_DEGREE * cos_lat);
            let (min, max) = (center.lng - dlng, center.lng + dlng);
            (min >= -180.0 && max <= 180.0).then_some((min, max))
        } else {
            None
        };

        Self {
            min_lat: center.lat - dlat,
            max_lat: center.lat + dlat,
            lng_range,
        }
    }
}

/// Stage two: exact distance filter and ranking.
///
/// Keeps candidates within `radius_km` (inclusive) and orders them by
/// `(distance, id)`.
#[must_use]
pub fn rank_candidates(
    center: GeoPoint,
    radius_km: f64,
    candidates: impl IntoIterator<Item = (i32, GeoPoint)>,
) -> Vec<(i32, f64)> {
    let mut ranked: Vec<(i32, f64)> = candidates
        .into_iter()
        .map(|(id, point)| (id, haversine_km(center, point)))
        .filter(|(_, distance)| *distance <= radius_km)
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    ranked
}

#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO_STATION: GeoPoint = GeoPoint::new(35.681_236, 139.767_125);
    const SHINJUKU: GeoPoint = GeoPoint::new(35.690_921, 139.700_258);

    #[test]
    fn identical_points_are_zero_apart() {
        let d = haversine_km(TOKYO_STATION, TOKYO_STATION);
        assert!(d.abs() < 1e-9, "got {d}");
    }

    #[test]
    fn tokyo_to_shinjuku_is_about_six_km() {
        let d = haversine_km(TOKYO_STATION, SHINJUKU);
        assert!((5.9..6.4).contains(&d), "got {d}");
        assert!((d - haversine_km(SHINJUKU, TOKYO_STATION)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn bounding_box_covers_radius() {
        let center = GeoPoint::new(35.68, 139.65);
        let bbox = BoundingBox::around(center, 5.0);
        assert!((bbox.max_lat - bbox.min_lat - 10.0 / KM_PER_DEGREE).abs() < 1e-9);

        let (min_lng, max_lng) = bbox.lng_range.unwrap();
        assert!(min_lng < 139.65 && max_lng > 139.65);
        // Longitude degrees are shorter away from the equator.
        assert!(max_lng - min_lng > bbox.max_lat - bbox.min_lat);
    }

    #[test]
    fn bounding_box_drops_longitude_near_antimeridian() {
        let bbox = BoundingBox::around(GeoPoint::new(10.0, 179.99), 5.0);
        assert!(bbox.lng_range.is_none());

        let polar = BoundingBox::around(GeoPoint::new(90.0, 0.0), 5.0);
        assert!(polar.lng_range.is_none());
    }

    #[test]
    fn ranking_filters_and_orders_by_distance_then_id() {
        let center = GeoPoint::new(35.68, 139.65);
        let ranked = rank_candidates(
            center,
            5.0,
            [
                (7, GeoPoint::new(35.70, 139.66)),
                (3, GeoPoint::new(35.70, 139.66)),
                (1, center),
                (9, GeoPoint::new(35.80, 139.65)),
            ],
        );

        let ids: Vec<i32> = ranked.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 3, 7]);
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let center = GeoPoint::new(0.0, 0.0);
        let edge = GeoPoint::new(1.0, 0.0);
        let exact = haversine_km(center, edge);
        assert_eq!(rank_candidates(center, exact, [(1, edge)]).len(), 1);
    }

    #[test]
    fn validates_coordinates() {
        assert!(LocationQuery::new(35.0, 139.0, 1.0).is_valid());
        assert!(!LocationQuery::new(91.0, 139.0, 1.0).is_valid());
        assert!(!LocationQuery::new(35.0, 139.0, 0.0).is_valid());
        assert!(!LocationQuery::new(f64::NAN, 139.0, 1.0).is_valid());
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert!((round2(1.23456) - 1.23).abs() < 1e-9);
        assert!((round2(6.129) - 6.13).abs() < 1e-9);
    }
}
