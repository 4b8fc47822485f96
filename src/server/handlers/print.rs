//! Print output handlers: browser print page and tiled sheets.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::document::{FieldValues, Template, describe_fields, validate};
use crate::error::CardpressError;
use crate::print::{self, PRINT_SCALE, PrintJob};
use crate::render::{self, RenderOptions};
use crate::units::scale_for_dpi;

use super::super::response::{ApiError, ApiJson, ApiResult, ok};
use super::super::state::AppState;

/// Request body for the print endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    #[serde(alias = "templateData")]
    pub template: Template,
    #[serde(default)]
    pub values: FieldValues,
    #[serde(flatten)]
    pub job: PrintJob,
}

/// POST /api/print/html - Standalone print page for the browser.
pub async fn html(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PrintRequest>,
) -> ApiResult<Html<String>> {
    validate(&req.template)?;
    req.job.validate()?;
    let image = render::render_card(
        &state.assets,
        &req.template,
        &req.values,
        RenderOptions::at_scale(PRINT_SCALE),
    )
    .await?;
    let png = render::export::encode_png(&image)?;
    let canvas = &req.template.canvas;
    tracing::info!(copies = req.job.copies, "Print page generated");
    Ok(Html(print::print_html(&png, canvas.width, canvas.height, &req.job)))
}

/// POST /api/print/sheet - First sheet as PNG; `X-Sheet-Count` tells how
/// many sheets the job needs.
pub async fn sheet(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PrintRequest>,
) -> ApiResult<impl IntoResponse> {
    validate(&req.template)?;
    req.job.validate()?;
    let job = req.job;
    let card_mm = req.template.size_mm();
    let image = render::render_card(
        &state.assets,
        &req.template,
        &req.values,
        RenderOptions::at_scale(scale_for_dpi(job.dpi)),
    )
    .await?;

    let (count, png) = tokio::task::spawn_blocking(move || {
        let renderer = print::SheetRenderer::new(&image, card_mm, &job)?;
        let first = renderer.render(0)?;
        Ok::<_, CardpressError>((renderer.sheet_count(), render::export::encode_png(&first)?))
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::HeaderName::from_static("x-sheet-count"), count.to_string()),
        ],
        png,
    ))
}

/// Values for a fresh print form, so clients can prefill their inputs.
#[derive(Debug, Deserialize)]
pub struct FieldsRequest {
    #[serde(alias = "templateData")]
    pub template: Template,
}

/// POST /api/print/fields - Data-entry fields and initial values.
pub async fn fields(ApiJson(req): ApiJson<FieldsRequest>) -> impl IntoResponse {
    let body = serde_json::json!({
        "fields": describe_fields(&req.template),
        "values": FieldValues::initial(&req.template),
    });
    ok(body)
}
