use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::catalog::UnknownDatabase;
use crate::docker::ContainerError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Request rejected before reaching the engine. Reported like an
    /// engine failure so clients only ever see `{error}` with a 500.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Container engine error: {0}")]
    Engine(#[from] ContainerError),
    #[error("Not Found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Engine(err) => {
                error!(error = %err, "Container engine call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<UnknownDatabase> for AppError {
    fn from(err: UnknownDatabase) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}
