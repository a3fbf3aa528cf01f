//! Mapping of request and publish failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::ErrorResponse;
use crate::publish::{PublishError, PublishFailure};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body is not a JSON object.
    #[error("Invalid JSON")]
    InvalidJson,

    /// JSON object that does not describe a task brief.
    #[error("Invalid task brief: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Publish(#[from] PublishFailure),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidJson => (StatusCode::BAD_REQUEST, ErrorResponse::new("Invalid JSON")),
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Invalid task brief").with_details(details),
            ),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorResponse::new("Unauthorized")),
            ApiError::Publish(failure) => match failure.error {
                PublishError::PermissionDenied {
                    repo,
                    action_required,
                    detail,
                } => {
                    let mut body = ErrorResponse::new(
                        "Repository creation failed - insufficient token permissions",
                    )
                    .with_details(detail);
                    body.action_required = Some(action_required);
                    body.repository = Some(repo);
                    (StatusCode::FORBIDDEN, body)
                }
                other => {
                    let mut body =
                        ErrorResponse::new("Publishing failed").with_details(other.to_string());
                    body.status = Some("error".to_string());
                    body.files_created = Some(failure.partial.files_created);
                    (StatusCode::INTERNAL_SERVER_ERROR, body)
                }
            },
        };
        (status, Json(body)).into_response()
    }
}
