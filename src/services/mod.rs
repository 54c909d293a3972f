pub mod search_service;
pub use search_service::{BuildingSearch, PageRequest, SearchError, hydrate_architects};

pub mod search_service_impl;
pub use search_service_impl::SeaOrmSearchService;

pub mod cached_search_service;
pub use cached_search_service::CachedSearchService;
