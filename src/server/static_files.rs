//! Static files from the asset directory (background presets, logos).

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::path::Component;
use std::sync::Arc;

use super::state::AppState;

/// GET /assets/*path - Serve a file from the asset directory.
pub async fn asset_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let Some(root) = state.config.asset_dir.as_ref() else {
        return (StatusCode::NOT_FOUND, "No asset directory configured").into_response();
    };

    let clean_path = path.split('?').next().unwrap_or(&path);
    let rel = std::path::Path::new(clean_path);
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return (StatusCode::BAD_REQUEST, "Invalid asset path").into_response();
    }

    match tokio::fs::read(root.join(rel)).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(clean_path)
                .first_or_octet_stream()
                .to_string();
            (
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
                ],
                bytes,
            )
                .into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
