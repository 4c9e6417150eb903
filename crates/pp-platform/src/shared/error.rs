//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate entity: {entity_type} with {field}={value}")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication required: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid coupon: {code}")]
    InvalidCoupon { code: String },

    #[error("Upstream service error: {message}")]
    Upstream { message: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn invalid_coupon(code: impl Into<String>) -> Self {
        Self::InvalidCoupon { code: code.into() }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Detect a MongoDB unique-index violation (E11000).
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    let code = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => Some(we.code),
        ErrorKind::Command(ce) => Some(ce.code),
        _ => None,
    };
    code.is_some_and(is_duplicate_key_code)
}

fn is_duplicate_key_code(code: i32) -> bool {
    code == 11000
}

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            PlatformError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PlatformError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            PlatformError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PlatformError::InvalidCoupon { .. } => (StatusCode::BAD_REQUEST, "INVALID_COUPON"),
            PlatformError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PlatformError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            PlatformError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            PlatformError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            PlatformError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn status_of(err: PlatformError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_error_mapping() {
        assert_eq!(status_of(PlatformError::not_found("Product", "X")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(PlatformError::duplicate("User", "email", "a@x.com")),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(PlatformError::validation("bad id")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(PlatformError::invalid_coupon("SAVE10")), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(status_of(PlatformError::unauthorized("no token")), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(PlatformError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(PlatformError::forbidden("admin only")), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_server_error_mapping() {
        assert_eq!(status_of(PlatformError::upstream("gateway timeout")), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(PlatformError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_key_detection() {
        assert!(is_duplicate_key_code(11000));
        assert!(!is_duplicate_key_code(11001));
        assert!(!is_duplicate_key_code(0));

        // Errors that are not unique-index violations must pass through.
        let other = mongodb::error::Error::custom("connection reset");
        assert!(!is_duplicate_key_error(&other));
    }

    #[test]
    fn test_duplicate_key_surfaces_as_conflict() {
        // The repository maps E11000 to Duplicate; Duplicate maps to 409.
        let err = PlatformError::duplicate("User", "email", "a@x.com");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
