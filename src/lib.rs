//! # Cardpress - ID Card Template Library
//!
//! Cardpress composes fixed-size ID cards from templates made of text,
//! image and QR elements. It provides:
//!
//! - **Document model**: templates, elements, borders and the editor state machine
//! - **Rendering**: z-ordered compositing to RGBA, PNG/JPEG export, thumbnails
//! - **Printing**: physical-size print pages and tiled sheets
//! - **Storage**: JSON-file persistence for templates and card holders
//! - **Server**: a REST API over all of the above
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardpress::{
//!     document::{FieldValues, Template},
//!     render::{self, AssetLoader, RenderOptions},
//! };
//!
//! # async fn example() -> Result<(), cardpress::CardpressError> {
//! let template: Template = serde_json::from_str(&std::fs::read_to_string("badge.json")?)?;
//!
//! let mut values = FieldValues::initial(&template);
//! values.set("Name", "Ada Lovelace");
//!
//! let loader = AssetLoader::http(None)?;
//! let card = render::render_card(&loader, &template, &values, RenderOptions::at_dpi(300.0)).await?;
//! std::fs::write("badge.png", render::export::encode_png(&card)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`units`] | px/mm conversion at 96 DPI, card and paper sizes |
//! | [`color`] | CSS color parsing and blending |
//! | [`document`] | Templates, elements, borders, editor |
//! | [`render`] | Compositing, assets, export |
//! | [`print`] | Print pages and sheets |
//! | [`store`] | Template and user persistence |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod color;
pub mod document;
pub mod error;
pub mod print;
pub mod render;
pub mod server;
pub mod store;
pub mod units;

// Re-exports for convenience
pub use error::CardpressError;
