//! Image elements and canvas backgrounds: `object-fit: cover` with rounded
//! corners.
//!
//! Boxes are clipped to the surface first; only the visible window is
//! resampled and masked, whatever the box size.

use image::{DynamicImage, RgbaImage, imageops, imageops::FilterType};

use super::surface::{Clip, Surface};
use super::text;
use crate::color::Color;

/// Label drawn centred in an empty image slot.
pub const PLACEHOLDER_LABEL: &str = "Upload Image";

/// Font size of the placeholder label, in canvas pixels.
const PLACEHOLDER_FONT_SIZE: f64 = 12.0;

/// Scale `src` to cover `width × height`, cropping the overflow evenly on
/// both sides.
pub fn cover(src: &DynamicImage, width: usize, height: usize) -> RgbaImage {
    cover_region(src, width, height, Clip::full(width.max(1), height.max(1)))
}

/// The `clip` window of `src` covered onto `width × height`.
pub fn cover_region(src: &DynamicImage, width: usize, height: usize, clip: Clip) -> RgbaImage {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let (sw, sh) = (src.width().max(1) as f64, src.height().max(1) as f64);
    let scale = (w / sw).max(h / sh);

    // Centred crop origin in source pixels
    let crop_x = ((sw - w / scale) / 2.0).max(0.0);
    let crop_y = ((sh - h / scale) / 2.0).max(0.0);

    let span = |origin: f64, lo: usize, hi: usize, limit: f64| -> (u32, u32) {
        let start = (origin + lo as f64 / scale).floor().clamp(0.0, limit - 1.0);
        let end = (origin + hi as f64 / scale).ceil().clamp(start + 1.0, limit);
        (start as u32, (end - start) as u32)
    };
    let (sx, span_w) = span(crop_x, clip.x0, clip.x1, sw);
    let (sy, span_h) = span(crop_y, clip.y0, clip.y1, sh);

    let window = src.crop_imm(sx, sy, span_w, span_h).to_rgba8();
    imageops::resize(
        &window,
        clip.width().max(1) as u32,
        clip.height().max(1) as u32,
        FilterType::Triangle,
    )
}

/// Coverage mask of a rounded rectangle, 4×4 supersampled at the corners.
pub fn rounded_mask(width: usize, height: usize, radius: f64) -> Vec<f32> {
    rounded_mask_region(width, height, radius, Clip::full(width, height))
}

/// The `clip` window of [`rounded_mask`], row-major.
pub fn rounded_mask_region(width: usize, height: usize, radius: f64, clip: Clip) -> Vec<f32> {
    let (w, h) = (width as f64, height as f64);
    let r = radius.max(0.0).min(w / 2.0).min(h / 2.0);
    let stride = clip.width();
    let mut mask = vec![1.0f32; stride * clip.height()];
    if r <= 0.0 {
        return mask;
    }

    let inside = |px: f64, py: f64| -> bool {
        let cx = px.clamp(r, w - r);
        let cy = py.clamp(r, h - r);
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy <= r * r
    };

    let corner = r.ceil() as usize;
    let near = |p: usize, len: usize| p < corner || p >= len.saturating_sub(corner);
    for y in clip.y0..clip.y1 {
        if !near(y, height) {
            continue;
        }
        for x in clip.x0..clip.x1 {
            if !near(x, width) {
                continue;
            }
            let mut hits = 0;
            for sy in 0..4 {
                for sx in 0..4 {
                    let px = x as f64 + (sx as f64 + 0.5) / 4.0;
                    let py = y as f64 + (sy as f64 + 0.5) / 4.0;
                    if inside(px, py) {
                        hits += 1;
                    }
                }
            }
            mask[(y - clip.y0) * stride + (x - clip.x0)] = hits as f32 / 16.0;
        }
    }
    mask
}

/// Draw `src` (or the placeholder when `None`) into the box at `(x, y)` of
/// size `width × height`, all in output pixels. `scale` sizes the
/// placeholder label.
#[allow(clippy::too_many_arguments)]
pub fn draw_image_box(
    surface: &mut Surface,
    src: Option<&DynamicImage>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
    scale: f64,
) {
    let (bw, bh) = (width.round(), height.round());
    if bw < 1.0 || bh < 1.0 {
        return;
    }
    let (bw, bh) = (bw as usize, bh as usize);
    let (ox, oy) = (x.round() as i64, y.round() as i64);
    let Some(clip) = surface.visible(ox, oy, bw, bh) else {
        return;
    };
    let mask = rounded_mask_region(bw, bh, radius, clip);
    let (dx, dy) = clip.offset(ox, oy);

    match src {
        Some(image) => {
            let fitted = cover_region(image, bw, bh, clip);
            surface.draw_image(&fitted, dx, dy, Some(&mask));
        }
        None => {
            surface.draw_mask(&mask, clip.width(), dx, dy, Color::PLACEHOLDER);
            draw_placeholder_label(surface, ox, oy, bw, bh, scale);
        }
    }
}

/// "Upload Image", centred, when it fits inside the slot.
fn draw_placeholder_label(surface: &mut Surface, ox: i64, oy: i64, bw: usize, bh: usize, scale: f64) {
    let pixel_height = PLACEHOLDER_FONT_SIZE * text::LINE_HEIGHT * scale;
    if pixel_height < 1.0 {
        return;
    }
    let (lw, lh) = text::mask_size(PLACEHOLDER_LABEL, pixel_height, false);
    if lw > bw || lh > bh {
        return;
    }
    let lx = ox.saturating_add(((bw - lw) / 2) as i64);
    let ly = oy.saturating_add(((bh - lh) / 2) as i64);
    let Some(clip) = surface.visible(lx, ly, lw, lh) else {
        return;
    };
    let mask = text::render_text_region(PLACEHOLDER_LABEL, pixel_height, false, clip);
    let (dx, dy) = clip.offset(lx, ly);
    surface.draw_mask(&mask.data, mask.width, dx, dy, Color::PLACEHOLDER_TEXT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_cover_crops_wide_source() {
        // Left half red, right half blue, 4:1 aspect
        let mut src = RgbaImage::new(40, 10);
        for (x, _, p) in src.enumerate_pixels_mut() {
            *p = if x < 20 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) };
        }
        let fitted = cover(&DynamicImage::ImageRgba8(src), 10, 10);
        assert_eq!(fitted.dimensions(), (10, 10));
        // Centre crop keeps both halves
        assert!(fitted.get_pixel(0, 5).0[0] > 200);
        assert!(fitted.get_pixel(9, 5).0[2] > 200);
    }

    #[test]
    fn test_cover_region_samples_the_window() {
        let mut src = RgbaImage::new(10, 10);
        for (x, _, p) in src.enumerate_pixels_mut() {
            *p = if x < 5 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) };
        }
        let src = DynamicImage::ImageRgba8(src);
        // Right quarter of a 1000px box is all blue
        let clip = Clip {
            x0: 750,
            y0: 0,
            x1: 1000,
            y1: 4,
        };
        let part = cover_region(&src, 1000, 1000, clip);
        assert_eq!(part.dimensions(), (250, 4));
        assert!(part.pixels().all(|p| p.0[2] > 200));
    }

    #[test]
    fn test_rounded_mask_corners() {
        let mask = rounded_mask(20, 20, 10.0);
        assert_eq!(mask[0], 0.0);
        assert_eq!(mask[10 * 20 + 10], 1.0);
        let square = rounded_mask(5, 5, 0.0);
        assert!(square.iter().all(|&c| c == 1.0));
    }

    #[test]
    fn test_rounded_mask_region_matches_full() {
        let full = rounded_mask(20, 20, 6.0);
        let clip = Clip {
            x0: 12,
            y0: 14,
            x1: 20,
            y1: 20,
        };
        let part = rounded_mask_region(20, 20, 6.0, clip);
        assert_eq!(part.len(), 8 * 6);
        for y in 0..6 {
            for x in 0..8 {
                assert_eq!(part[y * 8 + x], full[(y + 14) * 20 + x + 12]);
            }
        }
    }

    #[test]
    fn test_placeholder_fill() {
        let mut surface = Surface::new(10, 10);
        draw_image_box(&mut surface, None, 0.0, 0.0, 10.0, 10.0, 0.0, 1.0);
        let image = surface.into_image();
        assert_eq!(image.get_pixel(5, 5).0, [0xf0, 0xf0, 0xf0, 255]);
    }

    #[test]
    fn test_placeholder_label_is_centred() {
        let mut surface = Surface::new(150, 100);
        draw_image_box(&mut surface, None, 0.0, 0.0, 150.0, 100.0, 0.0, 1.0);
        let image = surface.into_image();
        let inked: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 0xe0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        // Label sits in the middle band, corners stay plain
        assert!(inked.iter().all(|&(x, y)| (20..130).contains(&x) && (35..65).contains(&y)));
        assert_eq!(image.get_pixel(2, 2).0, [0xf0, 0xf0, 0xf0, 255]);
    }

    #[test]
    fn test_placeholder_label_skipped_when_too_small() {
        let mut surface = Surface::new(40, 40);
        draw_image_box(&mut surface, None, 0.0, 0.0, 40.0, 40.0, 0.0, 1.0);
        let image = surface.into_image();
        assert!(image.pixels().all(|p| p.0 == [0xf0, 0xf0, 0xf0, 255]));
    }

    #[test]
    fn test_giant_box_is_clipped_to_surface() {
        let mut surface = Surface::new(30, 20);
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255])));
        draw_image_box(&mut surface, Some(&src), -1e9, -1e9, 4e9, 4e9, 1e9, 1.0);
        draw_image_box(&mut surface, None, 10.0, 10.0, 1e12, 1e12, 0.0, 1.0);
        let image = surface.into_image();
        assert_eq!(image.get_pixel(5, 5).0, [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(15, 15).0, [0xf0, 0xf0, 0xf0, 255]);
    }
}
