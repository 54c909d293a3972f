pub mod prelude;

pub mod architects;
pub mod building_architects;
pub mod buildings;
pub mod search_history;
