//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies and queries.

use serde::Deserialize;

use crate::enumerator::{MAX_PRIORITY, MIN_PRIORITY};
use crate::generation::PreGenerateOptions;
use crate::scenario::ScenarioParams;

/// Request body for POST /pregenerate
///
/// Missing fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreGenerateRequest {
    #[serde(default)]
    pub max_scenarios: Option<usize>,
    #[serde(default)]
    pub min_priority: Option<u8>,
    #[serde(default)]
    pub locales: Option<Vec<String>>,
}

impl PreGenerateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(priority) = self.min_priority {
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
                return Some(format!(
                    "min_priority must be between {} and {}",
                    MIN_PRIORITY, MAX_PRIORITY
                ));
            }
        }
        match &self.locales {
            Some(locales) => validate_locales(locales),
            None => None,
        }
    }

    /// Fills unset fields from `defaults`.
    pub fn resolve(self, defaults: &PreGenerateOptions) -> PreGenerateOptions {
        PreGenerateOptions {
            max_scenarios: self.max_scenarios.unwrap_or(defaults.max_scenarios),
            min_priority: self.min_priority.unwrap_or(defaults.min_priority),
            locales: self.locales.unwrap_or_else(|| defaults.locales.clone()),
        }
    }
}

/// Request body for POST /pregenerate/custom
///
/// Parameters are range-checked while deserializing.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomPreGenerateRequest {
    pub combinations: Vec<ScenarioParams>,
    pub locales: Vec<String>,
}

impl CustomPreGenerateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.combinations.is_empty() {
            return Some("combinations cannot be empty".to_string());
        }
        validate_locales(&self.locales)
    }
}

/// Query string of DELETE /scenarios/:slug
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub locale: Option<String>,
}

fn validate_locales(locales: &[String]) -> Option<String> {
    if locales.is_empty() {
        return Some("locales cannot be empty".to_string());
    }
    if locales.iter().any(|l| l.trim().is_empty()) {
        return Some("locales cannot contain blank entries".to_string());
    }
    None
}
