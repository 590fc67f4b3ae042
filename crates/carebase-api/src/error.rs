//! API error types with structured JSON responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use carebase_contracts::error::CarebaseError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Inactive user")]
    InactiveUser,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {}", .0.join("; "))]
    Unprocessable(Vec<String>),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Unauthorized(detail) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", detail, Vec::new())
            }
            ApiError::InactiveUser => (
                StatusCode::BAD_REQUEST,
                "INACTIVE_USER",
                "Inactive user".to_string(),
                Vec::new(),
            ),
            ApiError::Forbidden(reason) => {
                tracing::debug!(%reason, "request forbidden");
                (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    "Not enough permissions".to_string(),
                    Vec::new(),
                )
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail, Vec::new()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail, Vec::new())
            }
            ApiError::Unprocessable(failures) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                "Request validation failed".to_string(),
                failures,
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<CarebaseError> for ApiError {
    fn from(err: CarebaseError) -> Self {
        match err {
            CarebaseError::Authentication { reason } => ApiError::Unauthorized(reason),
            CarebaseError::InactiveUser => ApiError::InactiveUser,
            CarebaseError::AccessDenied { reason } => ApiError::Forbidden(reason),
            e @ CarebaseError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CarebaseError::Conflict { reason } => ApiError::BadRequest(reason),
            CarebaseError::ValidationFailed { failures } => ApiError::Unprocessable(failures),
            e @ (CarebaseError::Store { .. }
            | CarebaseError::ObjectStore { .. }
            | CarebaseError::Config { .. }
            | CarebaseError::SchemaValidation { .. }
            | CarebaseError::Internal { .. }) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn json_of(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401_with_challenge() {
        let response = ApiError::Unauthorized("Not authenticated".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("WWW-Authenticate").unwrap(), "Bearer");
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
        assert_eq!(json["error"]["message"], "Not authenticated");
    }

    #[tokio::test]
    async fn inactive_user_returns_400() {
        let response = ApiError::InactiveUser.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "Inactive user");
    }

    #[tokio::test]
    async fn validation_failures_are_listed() {
        let response =
            ApiError::Unprocessable(vec!["[a] first".into(), "[b] second".into()]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_of(response).await;
        assert_eq!(json["error"]["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let response = ApiError::Internal("lock poisoned".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
        assert!(json["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn forbidden_does_not_echo_policy_reason() {
        let response = ApiError::Forbidden("rule 'x' requires 'users:admin'".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "Not enough permissions");
    }

    #[test]
    fn carebase_errors_map_to_statuses() {
        let cases = [
            (CarebaseError::authentication("bad token"), StatusCode::UNAUTHORIZED),
            (CarebaseError::InactiveUser, StatusCode::BAD_REQUEST),
            (
                CarebaseError::AccessDenied { reason: "no".into() },
                StatusCode::FORBIDDEN,
            ),
            (CarebaseError::not_found("Patient", "p-1"), StatusCode::NOT_FOUND),
            (
                CarebaseError::Conflict { reason: "Email already registered".into() },
                StatusCode::BAD_REQUEST,
            ),
            (
                CarebaseError::ValidationFailed { failures: vec!["[x] y".into()] },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CarebaseError::store("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
