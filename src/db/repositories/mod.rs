pub mod architect;
pub mod building;
pub mod dataset;
pub mod search_log;
