use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub offers: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/catalog/reload", post(reload_catalog))
}

/// POST /admin/catalog/reload
/// Rebuild the offer index from disk. The previous catalog stays live on failure.
pub async fn reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let handle = state.service.catalog().clone();
    let offers = tokio::task::spawn_blocking(move || handle.reload())
        .await
        .map_err(|e| AppError::InternalServerError(format!("Catalog reload task failed: {}", e)))??;

    info!("Catalog reloaded with {} offers", offers);
    Ok(Json(ReloadResponse { offers }))
}
