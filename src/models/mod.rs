pub mod building;
pub mod popular;
pub mod search;

pub use building::{ArchitectProfile, ArchitectRef, Building, Lang};
pub use popular::{PopularSearch, PopularSearchPage, SearchType};
pub use search::{CacheInfo, CacheStatus, SearchResult};
