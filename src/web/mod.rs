use axum::{
    http::{header, Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::docker::DockerClient;
use crate::server::config::ServerConfig;
use crate::web::models::WsMessage;
use crate::web::routes::*;

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod websocket_handler;

#[derive(RustEmbed, Clone)]
#[folder = "static/"]
pub struct Assets;

#[derive(Clone)]
pub struct AppState {
    pub docker: DockerClient,
    pub status_tx: broadcast::Sender<WsMessage>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

/// Serves the embedded page and its assets. `/` maps to `index.html`.
async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => AppError::NotFound(format!("No such asset: /{path}")).into_response(),
    }
}

pub fn create_axum_router(
    docker: DockerClient,
    status_tx: broadcast::Sender<WsMessage>,
    config: Arc<ServerConfig>,
) -> Router {
    let app_state = Arc::new(AppState {
        docker,
        status_tx,
        config,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(static_handler))
        .route("/api/health", get(health_check_handler))
        .route("/ws", get(websocket_handler::websocket_handler))
        .merge(container_routes::container_router())
        .merge(catalog_routes::catalog_router())
        .fallback(static_handler)
        .with_state(app_state)
        .layer(cors)
}
