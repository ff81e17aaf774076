use axum::{routing::get, Json, Router};
use std::sync::Arc;

use crate::catalog::{self, CatalogEntry};
use crate::web::AppState;

async fn list_databases_handler() -> Json<Vec<CatalogEntry>> {
    Json(catalog::entries())
}

pub fn catalog_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/databases", get(list_databases_handler))
}
