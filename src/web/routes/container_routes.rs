use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use bollard::models::ContainerSummary;
use std::sync::Arc;
use tracing::info;

use crate::catalog::DatabaseKind;
use crate::web::extract::AppJson;
use crate::web::models::{LaunchRequest, StopRequest, SuccessResponse};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

/// Pull, create and start a database container. The pull runs inside the
/// request, so the response only comes back once the image is local.
async fn launch_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LaunchRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let db_type = payload
        .db_type
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("dbType is required".to_string()))?;
    let kind: DatabaseKind = db_type.parse()?;

    let port = payload
        .port
        .ok_or_else(|| AppError::InvalidInput("port is required".to_string()))?;
    let host_port = port.to_port().ok_or_else(|| {
        AppError::InvalidInput("port must be a number between 1 and 65535".to_string())
    })?;

    let password = if kind.needs_password() {
        payload
            .password
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| app_state.config.default_db_password.clone())
    } else {
        String::new()
    };

    info!(db_type = %kind, host_port = host_port, "Launch requested");
    app_state.docker.launch(kind, host_port, &password).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn stop_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<StopRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = payload
        .id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("id is required".to_string()))?;

    info!(container_id = %id, "Stop requested");
    app_state.docker.stop_and_remove(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn list_containers_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContainerSummary>>, AppError> {
    let containers = app_state.docker.list_containers().await?;
    Ok(Json(containers))
}

pub fn container_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/launch", post(launch_handler))
        .route("/stop", post(stop_handler))
        .route("/api/containers", get(list_containers_handler))
}
