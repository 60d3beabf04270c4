// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the aggregation and proximity pipeline

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure the pipeline can produce.
/// Enrichment and source failures are normally absorbed before they reach a
/// handler; persistence and geolocation failures are the user-facing ones.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FoodieError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Cuisine enrichment failed: {0}")]
    EnrichmentFailure(String),

    #[error("Restaurant source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Location access was denied")]
    GeolocationDenied,

    #[error("Location request timed out")]
    GeolocationTimeout,

    #[error("Could not save your rating: {0}")]
    PersistenceFailure(String),
}

impl FoodieError {
    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            FoodieError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            FoodieError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            FoodieError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            FoodieError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            FoodieError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
            FoodieError::ExternalApiError(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            FoodieError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            FoodieError::EnrichmentFailure(_) => {
                (StatusCode::BAD_GATEWAY, "ENRICHMENT_FAILURE")
            }
            FoodieError::SourceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SOURCE_UNAVAILABLE")
            }
            FoodieError::GeolocationDenied => (StatusCode::FORBIDDEN, "GEOLOCATION_DENIED"),
            FoodieError::GeolocationTimeout => {
                (StatusCode::REQUEST_TIMEOUT, "GEOLOCATION_TIMEOUT")
            }
            FoodieError::PersistenceFailure(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_FAILURE")
            }
        }
    }

    /// Whether the client may resubmit the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FoodieError::PersistenceFailure(_) | FoodieError::RateLimitExceeded
        )
    }
}

/// Convert FoodieError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for FoodieError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.code();

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "retryable": self.is_retryable(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.code().0
    }
}

impl From<validator::ValidationErrors> for FoodieError {
    fn from(errors: validator::ValidationErrors) -> Self {
        FoodieError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            FoodieError::GeolocationDenied.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FoodieError::PersistenceFailure("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            FoodieError::InvalidState("not prompted".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_only_persistence_and_quota_are_retryable() {
        assert!(FoodieError::PersistenceFailure("x".into()).is_retryable());
        assert!(FoodieError::RateLimitExceeded.is_retryable());
        assert!(!FoodieError::GeolocationTimeout.is_retryable());
        assert!(!FoodieError::NotFound("x".into()).is_retryable());
    }
}
