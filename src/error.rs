// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::tenant::ResolverError;

/// HTTP API error with appropriate status codes and client-safe messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (request valid, current state forbids it)
    Conflict(String),

    // 500 Internal Server Error (process configuration absent or invalid)
    Configuration(String),

    // 500 Internal Server Error (backing database call failed)
    Backend(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Configuration(_) => 500,
            ApiError::Backend(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Configuration(msg) => msg,
            ApiError::Backend(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
            ApiError::Backend(_) => "BACKEND_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ApiError::Configuration(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        ApiError::Backend(message.into())
    }
}

// Convert resolver errors to ApiError
impl From<ResolverError> for ApiError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::ConfigMissing(var) => {
                tracing::error!("Missing required configuration: {}", var);
                ApiError::configuration("Server configuration error")
            }
            ResolverError::InvalidEndpoint(detail) => {
                // The raw URL may embed credentials; log only the parse detail.
                tracing::error!("Invalid endpoint URL: {}", detail);
                ApiError::configuration("Server configuration error")
            }
            ResolverError::ShopNotFound(id) => {
                tracing::warn!("Shop lookup returned zero rows: {}", id);
                ApiError::not_found("Shop not found")
            }
            ResolverError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::backend("Database error occurred")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("SQLx error: {}", other);
                ApiError::backend("Database error occurred")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::conflict("x").status_code(), 409);
        assert_eq!(ApiError::configuration("x").status_code(), 500);
        assert_eq!(ApiError::backend("x").status_code(), 500);
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = ApiError::unauthorized("Invalid NFC UID.");
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid NFC UID.");
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[test]
    fn test_backend_errors_stay_generic() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Database error occurred");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_resolver_config_missing_is_configuration_error() {
        let err: ApiError = ResolverError::ConfigMissing("HOST_ENDPOINT_URL").into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        // Variable name stays out of the client message.
        assert_eq!(err.message(), "Server configuration error");
    }

    #[test]
    fn test_shop_not_found_maps_to_404() {
        let err: ApiError = ResolverError::ShopNotFound(Uuid::nil()).into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Shop not found");
    }
}
