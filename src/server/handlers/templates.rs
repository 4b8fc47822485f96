//! Template CRUD handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::document::{FieldValues, validate};
use crate::render::{self, RenderOptions, to_data_url};
use crate::store::{NewTemplate, TemplateRecord, TemplateSummary};

use super::super::response::{ApiJson, ApiResult, Envelope, ok, ok_with_message};
use super::super::state::AppState;

/// GET /api/templates - List template summaries.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Envelope<Vec<TemplateSummary>>> {
    ok(state.store.templates.list().await)
}

/// GET /api/templates/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<TemplateRecord>>> {
    Ok(ok(state.store.templates.get(&id).await?))
}

/// GET /api/templates/name/:name
pub async fn get_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<TemplateRecord>>> {
    Ok(ok(state.store.templates.get_by_name(&name).await?))
}

/// POST /api/templates - Create; 409 when the name is taken.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(mut new): ApiJson<NewTemplate>,
) -> ApiResult<impl IntoResponse> {
    fill_thumbnail(&state, &mut new).await;
    let record = state.store.templates.create(new).await?;
    tracing::info!(id = %record.id, name = %record.name, "Template created");
    Ok((StatusCode::CREATED, ok_with_message(record, "Template created")))
}

/// PUT /api/templates - Save by name, creating it if needed.
pub async fn save(
    State(state): State<Arc<AppState>>,
    ApiJson(mut new): ApiJson<NewTemplate>,
) -> ApiResult<impl IntoResponse> {
    fill_thumbnail(&state, &mut new).await;
    let (record, created) = state.store.templates.upsert(new).await?;
    tracing::info!(id = %record.id, name = %record.name, created, "Template saved");
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    let message = if created { "Template created" } else { "Template updated" };
    Ok((status, ok_with_message(record, message)))
}

/// DELETE /api/templates/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<TemplateRecord>>> {
    let record = state.store.templates.delete(&id).await?;
    tracing::info!(id = %record.id, name = %record.name, "Template deleted");
    Ok(ok_with_message(record, "Template deleted"))
}

/// Render a thumbnail when the client did not send one.
///
/// Invalid templates get no thumbnail; the store rejects them with the
/// validation error.
async fn fill_thumbnail(state: &AppState, new: &mut NewTemplate) {
    if new.thumbnail.as_deref().is_some_and(|t| !t.is_empty()) {
        return;
    }
    if validate(&new.template_data).is_err() {
        return;
    }
    let values = FieldValues::new();
    let rendered =
        render::render_card(&state.assets, &new.template_data, &values, RenderOptions::default()).await;
    match rendered.and_then(|image| render::thumbnail(&image)) {
        Ok(jpeg) => new.thumbnail = Some(to_data_url("image/jpeg", &jpeg)),
        Err(e) => tracing::warn!(name = %new.name, error = %e, "Thumbnail render failed"),
    }
}
