//! Error types for the scenario cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Scenario Error Enum ==
/// Unified error type for the scenario cache and generation pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    /// Parameter values outside the accepted ranges
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Content generator reported a failure
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Content generator did not answer in time
    #[error("Generation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Persistent store rejected the record
    #[error("Store error: {0}")]
    Store(String),

    /// Scenario not present in the cache
    #[error("Scenario not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ScenarioError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScenarioError::InvalidParameters(_) | ScenarioError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ScenarioError::NotFound(_) => StatusCode::NOT_FOUND,
            ScenarioError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ScenarioError::Generation(_) | ScenarioError::Store(_) | ScenarioError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the scenario cache.
pub type Result<T> = std::result::Result<T, ScenarioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_uses_millis() {
        let err = ScenarioError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Generation timed out after 1500ms");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ScenarioError::InvalidParameters("x".into()), StatusCode::BAD_REQUEST),
            (ScenarioError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ScenarioError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ScenarioError::Timeout(Duration::from_secs(1)), StatusCode::GATEWAY_TIMEOUT),
            (ScenarioError::Generation("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ScenarioError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
