//! QR code elements.
//!
//! Codes use error correction level L and no quiet zone; the module grid is
//! stretched to fill the element's `size` exactly, with output pixel `p`
//! sampling module `floor(p · modules / size)`.

use qrcode::{EcLevel, QrCode};

use super::surface::Surface;
use crate::color::Color;
use crate::error::CardpressError;

/// Encoded module grid.
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    pub fn encode(data: &str) -> Result<Self, CardpressError> {
        let code = QrCode::with_error_correction_level(data, EcLevel::L)
            .map_err(|e| CardpressError::Render(format!("QR code generation failed: {}", e)))?;
        let width = code.width();
        let mut dark = Vec::with_capacity(width * width);
        for y in 0..width {
            for x in 0..width {
                dark.push(code[(x, y)] == qrcode::Color::Dark);
            }
        }
        Ok(Self { width, dark })
    }

    /// Modules per side.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }
}

/// Module index sampled by output pixel `p` of a `side`-pixel code.
#[inline]
fn module_at(p: usize, modules: usize, side: usize) -> usize {
    (p as u128 * modules as u128 / side as u128) as usize
}

/// Paint a QR code into the square at `(x, y)` with side `size` (output px).
///
/// Only the part of the square that lands on the surface is visited.
pub fn draw_qr(surface: &mut Surface, matrix: &QrMatrix, x: f64, y: f64, size: f64) {
    let side = size.round();
    if side < 1.0 {
        return;
    }
    let side = side as usize;
    let (ox, oy) = (x.round() as i64, y.round() as i64);
    let Some(clip) = surface.visible(ox, oy, side, side) else {
        return;
    };
    let (dx, dy) = clip.offset(ox, oy);
    let n = matrix.width();
    for py in clip.y0..clip.y1 {
        let my = module_at(py, n, side);
        for px in clip.x0..clip.x1 {
            let mx = module_at(px, n, side);
            let color = if matrix.is_dark(mx, my) {
                Color::BLACK
            } else {
                Color::WHITE
            };
            surface.blend(
                dx + (px - clip.x0) as i64,
                dy + (py - clip.y0) as i64,
                color,
                1.0,
            );
        }
    }
}
