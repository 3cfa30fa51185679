use actix_web::{http::StatusCode, HttpResponse};
use std::fmt;

/// Failure taxonomy shared by every service. Handlers map variants onto HTTP
/// responses; nothing propagates past the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    Forbidden(String),
    Unauthorized(String),
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Legacy clients expect 400 on duplicates, not 409.
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status()).json(serde_json::json!({
            "success": false,
            "code": self.code(),
            "error": self.to_string(),
        }))
    }

    pub fn database(e: mongodb::error::Error) -> Self {
        ApiError::Internal(format!("Database error: {}", e))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        // Duplicates answer 400 for wire compatibility with the old backend.
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ApiError::Validation("x".into()).code(), "validation_error");
        assert_eq!(ApiError::Conflict("x".into()).code(), "conflict");
        assert_eq!(ApiError::Forbidden("x".into()).code(), "forbidden");
    }

    #[test]
    fn display_is_message_only() {
        let e = ApiError::NotFound("Club not found".into());
        assert_eq!(e.to_string(), "Club not found");
    }
}
