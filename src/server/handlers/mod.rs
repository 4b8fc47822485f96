//! HTTP handlers for the server.

pub mod assets;
pub mod print;
pub mod render;
pub mod templates;
pub mod users;

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::document::BackgroundPreset;
use crate::units::{CardSize, PaperSize};

use super::response::{Envelope, ok};
use super::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub templates: usize,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Envelope<Health>> {
    ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
        templates: state.store.templates.list().await.len(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presets {
    pub backgrounds: Vec<BackgroundPreset>,
    pub papers: Vec<PaperInfo>,
    pub card: CardInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperInfo {
    pub name: &'static str,
    pub width_mm: f64,
    pub height_mm: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub name: &'static str,
    pub width_mm: f64,
    pub height_mm: f64,
    pub width_px: u32,
    pub height_px: u32,
}

/// GET /api/presets - Background presets, paper sizes and the CR80 card.
pub async fn presets() -> Json<Envelope<Presets>> {
    let card = CardSize::CR80;
    ok(Presets {
        backgrounds: BackgroundPreset::built_in(),
        papers: PaperSize::all()
            .iter()
            .map(|p| {
                let size = p.size_mm();
                PaperInfo {
                    name: p.name(),
                    width_mm: size.width,
                    height_mm: size.height,
                }
            })
            .collect(),
        card: CardInfo {
            name: card.name,
            width_mm: card.mm.width,
            height_mm: card.mm.height,
            width_px: card.width_px,
            height_px: card.height_px,
        },
    })
}
