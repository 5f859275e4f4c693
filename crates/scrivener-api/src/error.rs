use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scrivener_crypto::{AuthError, ValidationError};
use scrivener_types::api::{ErrorDetails, ErrorResponse};

/// Lookups that found nothing, kept apart from authorization failures so a
/// client can tell "does not exist" from "not allowed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("unknown user")]
    UnknownUser,

    #[error("text not found")]
    ArtifactNotFound,
}

impl NotFoundError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownUser => "UNKNOWN_USER",
            Self::ArtifactNotFound => "ARTIFACT_NOT_FOUND",
        }
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Storage failure. Logged where it happens; the detail never leaves the server.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::AccessDenied) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(ValidationError::DuplicateLogin) => StatusCode::CONFLICT,
            ApiError::Validation(ValidationError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(ValidationError::PayloadTooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.code(),
            ApiError::Validation(e) => e.code(),
            ApiError::NotFound(e) => e.code(),
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

/// Extractor rejections become validation errors so they share the JSON
/// error body. Only the size limit keeps its own status.
fn rejected(status: StatusCode, detail: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::PayloadTooLarge.into()
    } else {
        ValidationError::MalformedPayload(detail).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
