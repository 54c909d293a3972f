mod building;
mod cache;
mod import;
mod popular;
mod search;

pub use building::cmd_building;
pub use cache::{cmd_cache_clear, cmd_cache_stats};
pub use import::cmd_import;
pub use popular::{cmd_popular, cmd_prune};
pub use search::{cmd_architect, cmd_near, cmd_search};
