/*
error.rs
*/

use axum::{
    Json,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("startup failed: {0}")]
    StartupError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("conversion error: {0}")]
    InternalConversionError(String),

    #[error("notification delivery failed: {0}")]
    NotificationError(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::StartupError(_)
            | ApiError::DatabaseError(_)
            | ApiError::InternalConversionError(_)
            | ApiError::NotificationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/*
Validation failures carry a German message meant for the user and are
returned as-is. Everything else is logged and answered with a generic 500.
*/
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        let error_message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Interner Serverfehler".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_keep_their_message() {
        let (status, body) = body_of(ApiError::BadRequest("Titel fehlt".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Titel fehlt");

        let (status, _) = body_of(ApiError::Forbidden("Nicht eingeladen".to_string())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = body_of(ApiError::NotFound("Termin nicht gefunden".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_are_masked() {
        let (status, body) =
            body_of(ApiError::DatabaseError("relation \"events\" does not exist".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Interner Serverfehler");
    }
}
