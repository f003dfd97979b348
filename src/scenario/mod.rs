//! Scenario Module
//!
//! Scenario parameters and the scenario-level cache wrapper.

mod manager;
mod params;

pub use manager::{scenario_key, CachedScenario, ScenarioCacheManager, ScenarioMetadata, KEY_SEPARATOR};
pub use params::ScenarioParams;
