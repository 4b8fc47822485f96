//! Card image rendering handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderName, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::document::{FieldValues, Template, validate};
use crate::error::CardpressError;
use crate::render::{self, ExportFormat, RenderOptions};
use crate::store::UserRecord;
use crate::units::scale_for_dpi;

use super::super::response::{ApiError, ApiJson, ApiQuery, ApiResult};
use super::super::state::AppState;

/// Request body for POST /api/render.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(alias = "templateData")]
    pub template: Template,
    #[serde(default)]
    pub values: FieldValues,
    #[serde(default)]
    pub format: ExportFormat,
    pub scale: Option<f64>,
    /// Overrides `scale` with a physical resolution.
    pub dpi: Option<f64>,
    #[serde(default)]
    pub show_grid: bool,
}

/// Query parameters for GET /api/templates/name/:name/render.
#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    /// User id or name whose field values fill the card.
    pub user: Option<String>,
    pub format: Option<String>,
    pub scale: Option<f64>,
    pub dpi: Option<f64>,
}

/// Encoded image with its content type.
pub type ImageResponse = ([(HeaderName, &'static str); 1], Vec<u8>);

fn resolve_scale(scale: Option<f64>, dpi: Option<f64>) -> f64 {
    match dpi {
        Some(dpi) => scale_for_dpi(dpi),
        None => scale.unwrap_or(1.0),
    }
}

async fn render_response(
    state: &AppState,
    template: &Template,
    values: &FieldValues,
    format: ExportFormat,
    options: RenderOptions,
) -> ApiResult<ImageResponse> {
    validate(template)?;
    let size_mm = template.size_mm();
    let image = render::render_card(&state.assets, template, values, options).await?;
    let bytes = tokio::task::spawn_blocking(move || render::encode(&image, format, size_mm))
        .await
        .map_err(ApiError::internal)??;
    tracing::debug!(
        format = format.extension(),
        bytes = bytes.len(),
        scale = options.scale,
        "Rendered card"
    );
    Ok(([(header::CONTENT_TYPE, format.mime())], bytes))
}

/// POST /api/render - Render a template with field values to PNG, JPEG or PDF.
pub async fn render(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RenderRequest>,
) -> ApiResult<impl IntoResponse> {
    let options = RenderOptions {
        scale: resolve_scale(req.scale, req.dpi),
        show_grid: req.show_grid,
    };
    render_response(&state, &req.template, &req.values, req.format, options).await
}

/// GET /api/templates/name/:name/render?user=&format=&scale=
pub async fn render_saved(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiQuery(query): ApiQuery<RenderQuery>,
) -> ApiResult<impl IntoResponse> {
    let record = state.store.templates.get_by_name(&name).await?;
    let format = match query.format.as_deref() {
        Some(f) => ExportFormat::parse(f)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown format '{}'", f)))?,
        None => ExportFormat::Png,
    };
    let values = match query.user.as_deref().filter(|u| !u.is_empty()) {
        Some(user) => find_user(&state, user).await?.values(),
        None => FieldValues::new(),
    };
    let options = RenderOptions::at_scale(resolve_scale(query.scale, query.dpi));
    render_response(&state, &record.template_data, &values, format, options).await
}

/// Look a user up by id, falling back to a field-value match.
async fn find_user(state: &AppState, user: &str) -> Result<UserRecord, CardpressError> {
    match state.store.users.get(user).await {
        Ok(record) => Ok(record),
        Err(CardpressError::NotFound(_)) => state.store.users.get_by_name(user).await,
        Err(e) => Err(e),
    }
}
