//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::CacheStats;
use crate::config::Config;
use crate::enumerator::ParameterSpace;
use crate::error::{Result, ScenarioError};
use crate::generation::{
    BatchGenerationPipeline, Collaborators, GenerationResult, PipelineOptions, PreGenerateOptions,
};
use crate::models::{
    CustomPreGenerateRequest, EstimateResponse, HealthResponse, InvalidateQuery,
    InvalidateResponse, PreGenerateRequest,
};
use crate::scenario::{CachedScenario, ScenarioCacheManager};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Scenario cache shared with the pipeline
    pub scenarios: Arc<ScenarioCacheManager>,
    /// Pre-generation pipeline
    pub pipeline: Arc<BatchGenerationPipeline>,
    /// Options used when a request leaves fields unset
    pub defaults: PreGenerateOptions,
}

impl AppState {
    /// Creates a new AppState around an existing pipeline.
    pub fn new(pipeline: BatchGenerationPipeline, defaults: PreGenerateOptions) -> Self {
        Self {
            scenarios: pipeline.cache().clone(),
            pipeline: Arc::new(pipeline),
            defaults,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the cache, the default parameter grid and the reference
    /// collaborators.
    pub fn from_config(config: &Config) -> Self {
        let scenarios = Arc::new(ScenarioCacheManager::from_config(config));
        let pipeline =
            BatchGenerationPipeline::new(scenarios, ParameterSpace::default(), Collaborators::reference())
                .with_options(PipelineOptions::from_config(config));
        Self::new(pipeline, PreGenerateOptions::from_config(config))
    }
}

/// Handler for GET /scenarios/:slug/:locale
pub async fn get_scenario_handler(
    State(state): State<AppState>,
    Path((slug, locale)): Path<(String, String)>,
) -> Result<Json<CachedScenario>> {
    state
        .scenarios
        .get_scenario(&slug, &locale)
        .await
        .map(Json)
        .ok_or_else(|| ScenarioError::NotFound(format!("{slug} ({locale})")))
}

/// Handler for DELETE /scenarios/:slug
///
/// Removes one locale with `?locale=xx`, otherwise every locale variant.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<InvalidateQuery>,
) -> Json<InvalidateResponse> {
    let removed = state
        .scenarios
        .invalidate_scenario(&slug, query.locale.as_deref())
        .await;

    Json(InvalidateResponse::new(slug, removed))
}

/// Handler for POST /pregenerate
pub async fn pregenerate_handler(
    State(state): State<AppState>,
    Json(req): Json<PreGenerateRequest>,
) -> Result<Json<GenerationResult>> {
    if let Some(error_msg) = req.validate() {
        return Err(ScenarioError::InvalidRequest(error_msg));
    }

    let options = req.resolve(&state.defaults);
    Ok(Json(state.pipeline.pre_generate_scenarios(&options).await))
}

/// Handler for POST /pregenerate/custom
pub async fn pregenerate_custom_handler(
    State(state): State<AppState>,
    Json(req): Json<CustomPreGenerateRequest>,
) -> Result<Json<GenerationResult>> {
    if let Some(error_msg) = req.validate() {
        return Err(ScenarioError::InvalidRequest(error_msg));
    }

    let result = state
        .pipeline
        .pre_generate_custom_scenarios(&req.combinations, &req.locales)
        .await;
    Ok(Json(result))
}

/// Handler for GET /estimate
pub async fn estimate_handler(State(state): State<AppState>) -> Json<EstimateResponse> {
    let space = state.pipeline.space();
    Json(EstimateResponse {
        estimated_count: space.estimated_count(),
        grid_size: space.grid_size(),
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.scenarios.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
