pub use super::architects::Entity as Architects;
pub use super::building_architects::Entity as BuildingArchitects;
pub use super::buildings::Entity as Buildings;
pub use super::search_history::Entity as SearchHistory;
