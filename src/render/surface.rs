//! RGBA drawing surface with clipped, anti-aliased primitives.
//!
//! All coordinates are output pixels as `f64`; anything that falls outside
//! the image is silently clipped.

use image::{Rgba, RgbaImage};

use crate::color::{Color, blend_over};

pub struct Surface {
    image: RgbaImage,
}

/// The on-surface window of a box, in the box's own pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Clip {
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    /// Surface position of the window's corner for a box placed at `(x, y)`.
    pub fn offset(&self, x: i64, y: i64) -> (i64, i64) {
        (
            (x as i128 + self.x0 as i128) as i64,
            (y as i128 + self.y0 as i128) as i64,
        )
    }
}

/// Visible `lo..hi` of a span of `len` pixels starting at `origin`.
fn visible_span(origin: i64, len: usize, limit: u32) -> Option<(usize, usize)> {
    let origin = origin as i128;
    let lo = (-origin).max(0);
    let hi = (limit as i128 - origin).min(len as i128);
    (lo < hi).then_some((lo as usize, hi as usize))
}

impl Surface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 0])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Part of a `width × height` box at `(x, y)` that lands on the surface,
    /// or `None` when it is entirely off-surface.
    ///
    /// Drawing code works within this window only, so a box may be far
    /// larger than the surface.
    pub fn visible(&self, x: i64, y: i64, width: usize, height: usize) -> Option<Clip> {
        let (x0, x1) = visible_span(x, width, self.image.width())?;
        let (y0, y1) = visible_span(y, height, self.image.height())?;
        Some(Clip { x0, y0, x1, y1 })
    }

    /// Blend one pixel; out-of-range coordinates are ignored.
    #[inline]
    pub fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        blend_over(self.image.get_pixel_mut(x as u32, y as u32), color, coverage);
    }

    /// Fill `[x0, x1) × [y0, y1)` with partial coverage on fractional edges.
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
        if !(x1 > x0 && y1 > y0) || color.a == 0 {
            return;
        }
        let xs = pixel_range(x0, x1, self.image.width());
        let ys = pixel_range(y0, y1, self.image.height());
        for y in ys {
            let cy = span_coverage(y, y0, y1);
            for x in xs.clone() {
                let c = cy * span_coverage(x, x0, x1);
                if c > 0.0 {
                    blend_over(self.image.get_pixel_mut(x, y), color, c);
                }
            }
        }
    }

    /// Draw a coverage mask with its top-left corner at `(x, y)`.
    pub fn draw_mask(&mut self, mask: &[f32], mask_width: usize, x: i64, y: i64, color: Color) {
        if mask_width == 0 {
            return;
        }
        for (i, &coverage) in mask.iter().enumerate() {
            if coverage <= 0.0 {
                continue;
            }
            let mx = (i % mask_width) as i64;
            let my = (i / mask_width) as i64;
            self.blend(x.saturating_add(mx), y.saturating_add(my), color, coverage);
        }
    }

    /// Draw an RGBA image at `(x, y)`, weighting each pixel by `mask`
    /// (same dimensions as `src`) when given.
    pub fn draw_image(&mut self, src: &RgbaImage, x: i64, y: i64, mask: Option<&[f32]>) {
        let width = src.width() as usize;
        for (sx, sy, pixel) in src.enumerate_pixels() {
            let coverage = match mask {
                Some(m) => m.get(sy as usize * width + sx as usize).copied().unwrap_or(0.0),
                None => 1.0,
            };
            if coverage <= 0.0 || pixel.0[3] == 0 {
                continue;
            }
            let [r, g, b, a] = pixel.0;
            self.blend(
                x.saturating_add(sx as i64),
                y.saturating_add(sy as i64),
                Color::rgba(r, g, b, a),
                coverage,
            );
        }
    }
}
