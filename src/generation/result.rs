//! Generation Result
//!
//! Aggregate report of one pre-generation run.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::scenario::ScenarioParams;

/// A (combination, locale) pair that could not be generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationFailure {
    pub params: ScenarioParams,
    pub locale: String,
    pub message: String,
}

/// Report of one pipeline invocation.
///
/// Counters only ever move through [`GenerationResult::record_success`] and
/// [`GenerationResult::record_failure`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Successfully generated and cached items
    pub total_generated: usize,
    pub by_goal: BTreeMap<String, usize>,
    pub by_locale: BTreeMap<String, usize>,
    pub processing_time_ms: u64,
    pub errors: Vec<GenerationFailure>,
    /// Items that were started, successful or not
    pub attempted: usize,
    /// True when the run was stopped early and the report is partial
    pub stopped: bool,
}

impl GenerationResult {
    pub fn record_success(&mut self, goal: &str, locale: &str) {
        self.attempted += 1;
        self.total_generated += 1;
        *self.by_goal.entry(goal.to_string()).or_default() += 1;
        *self.by_locale.entry(locale.to_string()).or_default() += 1;
    }

    pub fn record_failure(&mut self, failure: GenerationFailure) {
        self.attempted += 1;
        self.errors.push(failure);
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn processing_time(&self) -> Duration {
        Duration::from_millis(self.processing_time_ms)
    }
}
