use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum KeywordError {
    #[error("{0}")]
    MissingConfig(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(
        "Version number mismatch. Expected version {expected} (current max is {current}), but got {got}"
    )]
    VersionConflict { expected: i32, current: i32, got: i32 },

    #[error("DataForSEO API request failed with status code {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("DataForSEO API error: {code} - {message}")]
    DataForSeoTask { code: i64, message: String },

    #[error("{0}")]
    UnexpectedResponse(String),

    #[error("Google Gemini API request failed after {attempts} attempts: {source}")]
    Gemini {
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to upload image to S3: {0}")]
    Storage(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
}

impl KeywordError {
    pub fn missing_database() -> Self {
        Self::MissingConfig("DATABASE_URL environment variable is not set.".to_string())
    }

    pub fn missing_dataforseo() -> Self {
        Self::MissingConfig(
            "DATAFORSEO_USERNAME + DATAFORSEO_API_SECRET (or DATAFORSEO_API_KEY) not set."
                .to_string(),
        )
    }
}

impl IntoResponse for KeywordError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            KeywordError::InvalidArguments(_) | KeywordError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT")
            }
            KeywordError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            KeywordError::VersionConflict { .. } => (StatusCode::CONFLICT, "VERSION_CONFLICT"),
            KeywordError::MissingConfig(_) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED"),
            KeywordError::UpstreamStatus { status, .. } => match *status {
                StatusCode::TOO_MANY_REQUESTS => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT"),
                _ => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            },
            KeywordError::DataForSeoTask { .. }
            | KeywordError::UnexpectedResponse(_)
            | KeywordError::Gemini { .. }
            | KeywordError::Storage(_)
            | KeywordError::Reqwest(_)
            | KeywordError::UrlParse(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            KeywordError::Json(_) | KeywordError::Base64(_) | KeywordError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let message = match &self {
            KeywordError::DatabaseError(_) => "An internal server error occurred.".to_string(),
            other => other.to_string(),
        };

        let body = ApiErrorResponse {
            error: ApiErrorBody {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_message_names_expected_version() {
        let err = KeywordError::VersionConflict {
            expected: 3,
            current: 2,
            got: 5,
        };
        assert_eq!(
            err.to_string(),
            "Version number mismatch. Expected version 3 (current max is 2), but got 5"
        );
    }

    #[test]
    fn missing_config_maps_to_service_unavailable() {
        let resp = KeywordError::missing_database().into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn upstream_rate_limit_is_passed_through() {
        let resp = KeywordError::UpstreamStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
