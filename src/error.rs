use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// User-facing messages stay generic and localized; diagnostic detail is
/// logged server-side before one of these is constructed.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("no active session")]
    Unauthorized,

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("store error: {0}")]
    Store(&'static str),

    #[error("document store unavailable")]
    StoreUnavailable,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "No autorizado".to_string()),
            AppError::MissingField(field) => (StatusCode::BAD_REQUEST, format!("Falta {}", field)),
            AppError::Store(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
            AppError::StoreUnavailable
            | AppError::Database(_)
            | AppError::HttpClient(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error interno".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_401() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_missing_field_maps_to_400() {
        let response = AppError::MissingField("director".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_maps_to_500() {
        let response = AppError::Store("Error agregando").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_unavailable_maps_to_500() {
        let response = AppError::StoreUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
