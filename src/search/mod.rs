//! Store-independent search logic: predicates, geography, row transforms.

pub mod geo;
pub mod predicate;
pub mod prefecture;
pub mod transform;

pub use geo::{BoundingBox, GeoPoint, LocationQuery, haversine_km};
pub use predicate::{BoundValue, Field, Predicate, SearchFilters};
pub use transform::{RawBuildingRow, TransformDefect};
