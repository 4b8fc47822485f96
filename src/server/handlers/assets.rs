//! Image upload: turns a file into a data URL that templates and user
//! records can embed directly.

use axum::{Json, extract::Multipart};
use serde::Serialize;

use crate::render::to_data_url;

use super::super::response::{ApiError, ApiResult, Envelope, ok};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Response from the upload endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub data_url: String,
    pub filename: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

/// POST /api/assets - Upload an image (multipart field `image` or `file`).
pub async fn upload(mut multipart: Multipart) -> ApiResult<Json<Envelope<UploadResponse>>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" || name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read image: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::bad_request("No image field found"))?;

    let format = image::guess_format(&bytes)
        .map_err(|e| ApiError::bad_request(format!("Unrecognised image: {}", e)))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ApiError::bad_request(format!("Failed to decode image: {}", e)))?;
    let mime = mime_guess::from_ext(format.extensions_str().first().copied().unwrap_or("bin"))
        .first_or_octet_stream()
        .to_string();

    tracing::info!(
        filename = %filename,
        mime = %mime,
        width = decoded.width(),
        height = decoded.height(),
        "Image uploaded"
    );

    Ok(ok(UploadResponse {
        data_url: to_data_url(&mime, &bytes),
        filename,
        mime,
        width: decoded.width(),
        height: decoded.height(),
    }))
}
