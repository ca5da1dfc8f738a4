//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use domain_policy::PolicyError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Business(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream service failed: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Business(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Business(_) => "business_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadGateway(_) => "fraud_analysis_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => {
                warn!(status = %status.as_u16(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PolicyError::Business(_) => ApiError::Business(err.to_string()),
            PolicyError::Creation { .. } | PolicyError::InvalidRiskClassification(_) => {
                ApiError::BadRequest(err.to_string())
            }
            PolicyError::FraudAnalysis { .. } => ApiError::BadGateway(err.to_string()),
            PolicyError::ConcurrentModification(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// A missing or malformed body is a creation failure
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::from(PolicyError::creation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{PolicyRequestId, PortError};

    #[test]
    fn test_policy_error_status_mapping() {
        let id = PolicyRequestId::new();
        let cases = [
            (PolicyError::request_not_found(id), StatusCode::NOT_FOUND),
            (PolicyError::business("refused"), StatusCode::UNPROCESSABLE_ENTITY),
            (PolicyError::creation("missing body"), StatusCode::BAD_REQUEST),
            (
                PolicyError::InvalidRiskClassification("UNHEARD_OF".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PolicyError::FraudAnalysis {
                    policy_id: id,
                    source: PortError::ServiceUnavailable {
                        service: "fraud-api".to_string(),
                    },
                },
                StatusCode::BAD_GATEWAY,
            ),
            (PolicyError::ConcurrentModification(id), StatusCode::CONFLICT),
            (
                PolicyError::Persistence(PortError::internal("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }
}
