//! Scenario Cache - pre-generation machinery for investment scenario pages
//!
//! Provides a generic TTL/LRU cache, a scenario-level cache wrapper, a
//! parameter space enumerator and a batch pipeline that warms the cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod generation;
pub mod models;
pub mod scenario;
mod tasks;

pub use api::AppState;
pub use cache::GenericCache;
pub use config::Config;
pub use enumerator::{estimate_count, ParameterCombination, ParameterSpace};
pub use error::{Result, ScenarioError};
pub use generation::{BatchGenerationPipeline, GenerationResult, PreGenerateOptions};
pub use scenario::{CachedScenario, ScenarioCacheManager, ScenarioParams};
