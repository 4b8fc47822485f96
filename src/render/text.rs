//! Single-line text rendering with the Spleen bitmap fonts.
//!
//! Glyphs are scaled to the requested font size by 4×4 supersampling, which
//! gives anti-aliased coverage masks at any size. The three Spleen faces all
//! have a 1:2 cell, so advance width is always half the cell height and the
//! measured extent does not depend on which face is picked.
//!
//! ```text
//! cell height = font_size × LINE_HEIGHT
//! advance     = cell height / 2
//! bold        = mask OR-ed with itself shifted right by `embolden` pixels
//! ```

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};
use std::collections::HashMap;

use super::surface::Clip;

/// Line box height relative to the font size (CSS `line-height: normal`).
pub const LINE_HEIGHT: f64 = 1.15;

/// Supersampling grid per output pixel, per axis.
const SUBSAMPLES: usize = 4;

/// Anti-aliased coverage mask of rendered text.
///
/// A mask may cover only part of the full line; `x` and `y` place it
/// within the line's box.
pub struct TextMask {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Coverage values: 0.0 = empty, 1.0 = fully inked.
    pub data: Vec<f32>,
}

impl TextMask {
    pub fn coverage(&self, x: usize, y: usize) -> f32 {
        self.data.get(y * self.width + x).copied().unwrap_or(0.0)
    }
}

/// Extra horizontal ink for bold text, in output pixels.
fn embolden(cell_height: f64) -> usize {
    ((cell_height / 18.0).round() as usize).max(1)
}

/// Size of a text line in canvas pixels (scale 1).
pub fn measure_text(text: &str, font_size: f64, bold: bool) -> (f64, f64) {
    let cell_height = font_size.max(0.0) * LINE_HEIGHT;
    let chars = text.chars().count();
    if chars == 0 {
        return (0.0, cell_height);
    }
    let mut width = chars as f64 * cell_height / 2.0;
    if bold {
        width += embolden(cell_height) as f64;
    }
    (width, cell_height)
}

/// Bitmap face used as the sampling source.
struct Face {
    data: &'static [u8],
    width: usize,
    height: usize,
}

/// Pick the smallest face that is at least as tall as the target, so
/// scaling mostly shrinks (which supersampling handles well).
fn face_for(pixel_height: f64) -> Face {
    if pixel_height <= 12.0 {
        Face {
            data: FONT_6X12,
            width: 6,
            height: 12,
        }
    } else if pixel_height <= 16.0 {
        Face {
            data: FONT_8X16,
            width: 8,
            height: 16,
        }
    } else {
        Face {
            data: FONT_12X24,
            width: 12,
            height: 24,
        }
    }
}

/// Rasterize a glyph to a row-major on/off bitmap.
///
/// Characters missing from the face render as an outlined box.
fn glyph_bitmap(font: Option<&mut PSF2Font<'static>>, face: &Face, ch: char) -> Vec<bool> {
    let mut bitmap = vec![false; face.width * face.height];
    if ch == ' ' {
        return bitmap;
    }
    let utf8 = ch.to_string();
    if let Some(glyph) = font.and_then(|f| f.glyph_for_utf8(utf8.as_bytes())) {
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if let Some(px) = bitmap.get_mut(row_y * face.width + col_x) {
                    *px = on;
                }
            }
        }
    } else {
        draw_box(&mut bitmap, face.width, face.height);
    }
    bitmap
}

fn draw_box(bitmap: &mut [bool], width: usize, height: usize) {
    if width < 3 || height < 5 {
        return;
    }
    let (left, right) = (1, width - 2);
    let (top, bottom) = (2, height - 3);
    for x in left..=right {
        bitmap[top * width + x] = true;
        bitmap[bottom * width + x] = true;
    }
    for y in top..=bottom {
        bitmap[y * width + left] = true;
        bitmap[y * width + right] = true;
    }
}

/// Output-pixel geometry of one line.
struct LineMetrics {
    face: Face,
    factor: f64,
    advance: f64,
    bold_extra: usize,
    width: usize,
    height: usize,
}

impl LineMetrics {
    fn new(chars: usize, pixel_height: f64, bold: bool) -> Self {
        let pixel_height = pixel_height.max(1.0);
        let face = face_for(pixel_height);
        let factor = pixel_height / face.height as f64;
        let advance = face.width as f64 * factor;
        let bold_extra = if bold { embolden(pixel_height) } else { 0 };
        let height = pixel_height.round().max(1.0) as usize;
        let width = ((chars as f64 * advance).round() as usize)
            .saturating_add(bold_extra)
            .max(1);
        Self {
            face,
            factor,
            advance,
            bold_extra,
            width,
            height,
        }
    }
}

/// Full mask size of a line, in output pixels.
pub fn mask_size(text: &str, pixel_height: f64, bold: bool) -> (usize, usize) {
    let metrics = LineMetrics::new(text.chars().count(), pixel_height, bold);
    (metrics.width, metrics.height)
}

/// Render one line of text at `pixel_height` output pixels per cell.
pub fn render_text(text: &str, pixel_height: f64, bold: bool) -> TextMask {
    let (width, height) = mask_size(text, pixel_height, bold);
    render_text_region(text, pixel_height, bold, Clip::full(width, height))
}

/// Render only the `clip` window of a line; work is proportional to the
/// window, not to the line.
pub fn render_text_region(text: &str, pixel_height: f64, bold: bool, clip: Clip) -> TextMask {
    let chars: Vec<char> = text.chars().collect();
    let m = LineMetrics::new(chars.len(), pixel_height, bold);
    let mut font = PSF2Font::new(m.face.data).ok();

    let x1 = clip.x1.min(m.width);
    let y1 = clip.y1.min(m.height);
    let x0 = clip.x0.min(x1);
    let y0 = clip.y0.min(y1);

    // Bold ink comes from up to `bold_extra` columns to the left
    let sx0 = x0.saturating_sub(m.bold_extra);
    let stride = x1 - sx0;
    let rows = y1 - y0;
    let mut data = vec![0.0f32; stride * rows];

    let mut glyphs: HashMap<char, Vec<bool>> = HashMap::new();
    let step = 1.0 / SUBSAMPLES as f64;
    let full = (SUBSAMPLES * SUBSAMPLES) as f32;
    let face = &m.face;

    let first = (sx0 as f64 / m.advance).floor() as usize;
    let last = ((x1 as f64 / m.advance).ceil() as usize).min(chars.len());

    for (i, ch) in chars.iter().enumerate().take(last).skip(first) {
        let bitmap = glyphs
            .entry(*ch)
            .or_insert_with(|| glyph_bitmap(font.as_mut(), face, *ch));
        let origin = i as f64 * m.advance;
        let x_start = (origin.floor() as usize).max(sx0);
        let x_end = ((origin + m.advance).ceil() as usize).min(x1);

        for ty in y0..y1 {
            for tx in x_start..x_end {
                let mut hits = 0u32;
                for sy in 0..SUBSAMPLES {
                    let v = (ty as f64 + (sy as f64 + 0.5) * step) / m.factor;
                    let gy = v as usize;
                    if gy >= face.height {
                        continue;
                    }
                    for sx in 0..SUBSAMPLES {
                        let u = (tx as f64 + (sx as f64 + 0.5) * step - origin) / m.factor;
                        if u < 0.0 {
                            continue;
                        }
                        let gx = u as usize;
                        if gx < face.width && bitmap[gy * face.width + gx] {
                            hits += 1;
                        }
                    }
                }
                if hits > 0 {
                    let idx = (ty - y0) * stride + (tx - sx0);
                    data[idx] = (data[idx] + hits as f32 / full).min(1.0);
                }
            }
        }
    }

    if m.bold_extra > 0 {
        for y in 0..rows {
            let row = y * stride;
            for x in (0..stride).rev() {
                let mut c = data[row + x];
                for d in 1..=m.bold_extra.min(x) {
                    c = c.max(data[row + x - d]);
                }
                data[row + x] = c;
            }
        }
    }

    let skip = x0 - sx0;
    if skip > 0 {
        data = data
            .chunks(stride)
            .flat_map(|row| row[skip..].iter().copied())
            .collect();
    }

    TextMask {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: rows,
        data,
    }
}
