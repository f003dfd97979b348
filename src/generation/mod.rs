//! Generation Module
//!
//! Batch pre-generation of scenario content and the collaborators it drives.

mod collaborators;
mod pipeline;
mod result;

pub use collaborators::{
    future_value, ContentGenerator, ContentSection, ContentSections, GoalDetector,
    InMemoryScenarioStore, RoundedSlugGenerator, RuleGoalDetector, ScenarioRecord, ScenarioStore,
    SlugGenerator, TemplateContentGenerator,
};
pub use pipeline::{
    BatchGenerationPipeline, Collaborators, PipelineOptions, PreGenerateOptions, StopHandle,
};
pub use result::{GenerationFailure, GenerationResult};
