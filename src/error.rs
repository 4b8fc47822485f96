//! # Error Types
//!
//! This module defines error types used throughout the cardpress library.

use thiserror::Error;

/// Main error type for cardpress operations
#[derive(Debug, Error)]
pub enum CardpressError {
    /// Template or field data failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A template, user or element does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique key (e.g. template name) is already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Composition error (QR encoding, invalid canvas size, ...)
    #[error("Render error: {0}")]
    Render(String),

    /// Persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// Transport-level errors (socket bind, HTTP fetch)
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for CardpressError {
    fn from(e: image::ImageError) -> Self {
        CardpressError::Image(e.to_string())
    }
}
