pub mod loader;
pub mod schema;

pub use loader::{build_simulation, load_scenario, DataLoadError, ScenarioError};
pub use schema::ScenarioData;
