//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies. Cache statistics,
//! cached scenarios and generation reports serialize directly.

use serde::Serialize;

/// Response body for DELETE /scenarios/:slug
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub slug: String,
    /// Number of locale variants removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(slug: impl Into<String>, removed: usize) -> Self {
        Self {
            slug: slug.into(),
            removed,
        }
    }
}

/// Response body for GET /estimate
#[derive(Debug, Clone, Serialize)]
pub struct EstimateResponse {
    pub estimated_count: u64,
    pub grid_size: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
