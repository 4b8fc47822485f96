//! # Card Rendering
//!
//! Composes a [`Template`] and per-user [`FieldValues`] into an RGBA raster.
//!
//! ```text
//! background colour (× opacity)
//!   → background image (cover, centred)
//!   → grid overlay (editor preview only)
//!   → elements by zIndex, ties in document order
//!   → canvas border (inset)
//! ```
//!
//! Canvas coordinates are CSS pixels at 96 DPI; `RenderOptions::scale`
//! multiplies everything, so `scale_for_dpi(300.0)` yields a 300 DPI raster
//! of the same physical size.
//!
//! ## Usage Example
//!
//! ```
//! use cardpress::document::{Editor, FieldValues};
//! use cardpress::render::{self, LoadedImages, RenderOptions};
//!
//! let editor = Editor::sample();
//! let values = FieldValues::initial(editor.template());
//! let image = render::compose(editor.template(), &values, &LoadedImages::new(), &RenderOptions::default())
//!     .unwrap();
//! assert_eq!(image.dimensions(), (323, 204));
//! ```
//!
//! ## Modules
//!
//! - [`assets`]: image source resolution (data URLs, http, asset directory)
//! - [`export`]: PNG/JPEG encoding and thumbnails
//! - [`text`]: Spleen bitmap text
//! - [`image`]: cover-fit images with rounded corners
//! - [`qr`]: QR code elements

pub mod assets;
pub mod export;
pub mod image;
pub mod qr;
pub mod surface;
pub mod text;

pub use assets::{AssetLoader, Fetcher, HttpFetcher, ImageSource, LoadedImages, to_data_url};
pub use export::{ExportFormat, encode, thumbnail};

use ::image::RgbaImage;

use crate::color::Color;
use crate::document::{BorderTarget, Element, ElementKind, FieldValues, ResolvedBorder, Template};
use crate::error::CardpressError;
use crate::units::scale_for_dpi;
use surface::Surface;

/// Largest output edge, in pixels.
pub const MAX_OUTPUT_PX: u32 = 16_384;

/// How to rasterize a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Output pixels per canvas pixel.
    pub scale: f64,
    /// Draw the editor grid overlay.
    pub show_grid: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            show_grid: false,
        }
    }
}

impl RenderOptions {
    pub fn at_scale(scale: f64) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// Physical-size raster at `dpi`.
    pub fn at_dpi(dpi: f64) -> Self {
        Self::at_scale(scale_for_dpi(dpi))
    }

    /// What the editor shows: the template's own grid setting and zoom.
    pub fn editor_preview(template: &Template) -> Self {
        Self {
            scale: template.canvas.zoom as f64 / 100.0,
            show_grid: template.canvas.show_grid,
        }
    }
}

/// Output raster size for a template.
pub fn output_size(template: &Template, scale: f64) -> Result<(u32, u32), CardpressError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CardpressError::Render(format!("Invalid scale {}", scale)));
    }
    let width = (template.canvas.width as f64 * scale).round();
    let height = (template.canvas.height as f64 * scale).round();
    if width < 1.0 || height < 1.0 {
        return Err(CardpressError::Render("Output image would be empty".into()));
    }
    if width > MAX_OUTPUT_PX as f64 || height > MAX_OUTPUT_PX as f64 {
        return Err(CardpressError::Render(format!(
            "Output {}x{} exceeds {}px",
            width, height, MAX_OUTPUT_PX
        )));
    }
    Ok((width as u32, height as u32))
}

/// Content box size of an element in canvas pixels.
fn content_size(element: &Element, values: &FieldValues) -> (f64, f64) {
    match &element.kind {
        ElementKind::Text(t) => {
            text::measure_text(values.text_for(&t.label, &t.value), t.font_size, t.is_bold())
        }
        ElementKind::Image(i) => (i.width, i.height),
        ElementKind::Qr(q) => (q.size, q.size),
    }
}

/// Border-box size of an element in canvas pixels: content plus border.
///
/// This is the box that must stay inside the canvas while dragging.
pub fn measure_element(element: &Element, values: &FieldValues) -> (f64, f64) {
    let (w, h) = content_size(element, values);
    match element.border.resolve(BorderTarget::Element) {
        Some(border) => {
            let (top, right, bottom, left) = border.insets();
            (w + left + right, h + top + bottom)
        }
        None => (w, h),
    }
}

/// Compose `template` filled with `values` into an RGBA image.
///
/// Images must already be resolved into `images`; sources missing from it
/// draw as placeholders.
pub fn compose(
    template: &Template,
    values: &FieldValues,
    images: &LoadedImages,
    options: &RenderOptions,
) -> Result<RgbaImage, CardpressError> {
    let (width, height) = output_size(template, options.scale)?;
    let s = options.scale;
    let canvas = &template.canvas;
    let mut surface = Surface::new(width, height);
    let (w, h) = (width as f64, height as f64);

    let background =
        Color::parse_or(Some(&canvas.background_color), Color::WHITE).with_opacity(canvas.background_opacity);
    surface.fill_rect(0.0, 0.0, w, h, background);

    if let Some(src) = canvas.background_image.as_deref()
        && let Some(bg) = images.get(src)
    {
        image::draw_image_box(&mut surface, Some(bg), 0.0, 0.0, w, h, 0.0, s);
    }

    if options.show_grid && canvas.grid_size > 0 {
        draw_grid(&mut surface, canvas.grid_size as f64 * s, s.max(1.0));
    }

    for element in template.paint_order() {
        draw_element(&mut surface, element, values, images, s);
    }

    if let Some(border) = canvas.border.resolve(BorderTarget::Canvas) {
        draw_inset_border(&mut surface, &border, s);
    }

    Ok(surface.into_image())
}

/// Resolve images through `loader`, then compose on a blocking thread.
pub async fn render_card(
    loader: &AssetLoader,
    template: &Template,
    values: &FieldValues,
    options: RenderOptions,
) -> Result<RgbaImage, CardpressError> {
    let images = loader.load_template(template, values).await;
    let template = template.clone();
    let values = values.clone();
    tokio::task::spawn_blocking(move || compose(&template, &values, &images, &options))
        .await
        .map_err(|e| CardpressError::Render(format!("Render task failed: {}", e)))?
}

fn draw_grid(surface: &mut Surface, step: f64, line: f64) {
    if step < 2.0 {
        return;
    }
    let (w, h) = (surface.width() as f64, surface.height() as f64);
    let mut x = step;
    while x < w {
        surface.fill_rect(x, 0.0, x + line, h, Color::GRID);
        x += step;
    }
    let mut y = step;
    while y < h {
        surface.fill_rect(0.0, y, w, y + line, Color::GRID);
        y += step;
    }
}

fn draw_element(
    surface: &mut Surface,
    element: &Element,
    values: &FieldValues,
    images: &LoadedImages,
    s: f64,
) {
    let border = element.border.resolve(BorderTarget::Element);
    let (top, right, bottom, left) = border.map(|b| b.insets()).unwrap_or_default();
    let (cw, ch) = content_size(element, values);

    // Border box in output pixels
    let x0 = element.x * s;
    let y0 = element.y * s;
    let x1 = (element.x + left + cw + right) * s;
    let y1 = (element.y + top + ch + bottom) * s;

    if let Some(border) = border {
        let color = border.color;
        // Top and bottom span the full width; sides fit between them
        surface.fill_rect(x0, y0, x1, y0 + top * s, color);
        surface.fill_rect(x0, y1 - bottom * s, x1, y1, color);
        surface.fill_rect(x0, y0 + top * s, x0 + left * s, y1 - bottom * s, color);
        surface.fill_rect(x1 - right * s, y0 + top * s, x1, y1 - bottom * s, color);
    }

    let cx = (element.x + left) * s;
    let cy = (element.y + top) * s;

    match &element.kind {
        ElementKind::Text(t) => {
            let content = values.text_for(&t.label, &t.value);
            if content.is_empty() {
                return;
            }
            let pixel_height = t.font_size * text::LINE_HEIGHT * s;
            let (ox, oy) = (cx.round() as i64, cy.round() as i64);
            let (mw, mh) = text::mask_size(content, pixel_height, t.is_bold());
            let Some(clip) = surface.visible(ox, oy, mw, mh) else {
                return;
            };
            let mask = text::render_text_region(content, pixel_height, t.is_bold(), clip);
            let color = Color::parse_or(Some(&t.color), Color::BLACK);
            let (dx, dy) = clip.offset(ox, oy);
            surface.draw_mask(&mask.data, mask.width, dx, dy, color);
        }
        ElementKind::Image(i) => {
            let picture = values.image_for(element).and_then(|src| images.get(src));
            image::draw_image_box(
                surface,
                picture,
                cx,
                cy,
                i.width * s,
                i.height * s,
                i.border_radius * s,
                s,
            );
        }
        ElementKind::Qr(q) => {
            let Some(data) = values.qr_for(element).filter(|d| !d.is_empty()) else {
                return;
            };
            match qr::QrMatrix::encode(data) {
                Ok(matrix) => qr::draw_qr(surface, &matrix, cx, cy, q.size * s),
                Err(e) => {
                    tracing::warn!(element = %element.id, error = %e, "Skipping QR code");
                }
            }
        }
    }
}

/// Canvas borders are drawn inside the canvas so the output keeps its size.
fn draw_inset_border(surface: &mut Surface, border: &ResolvedBorder, s: f64) {
    let (w, h) = (surface.width() as f64, surface.height() as f64);
    let (top, right, bottom, left) = border.insets();
    let (top, right, bottom, left) = (top * s, right * s, bottom * s, left * s);
    let color = border.color;
    surface.fill_rect(0.0, 0.0, w, top, color);
    surface.fill_rect(0.0, h - bottom, w, h, color);
    surface.fill_rect(0.0, top, left, h - bottom, color);
    surface.fill_rect(w - right, top, w, h - bottom, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BorderSpec, ImageElement, QrElement, TextElement};
    use ::image::{DynamicImage, Rgba};

    fn element(id: &str, x: f64, y: f64, z: i64, kind: ElementKind) -> Element {
        Element {
            id: id.into(),
            x,
            y,
            z_index: z,
            border: BorderSpec::default(),
            kind,
        }
    }

    fn image(id: &str, x: f64, y: f64, z: i64, src: &str) -> Element {
        element(
            id,
            x,
            y,
            z,
            ElementKind::Image(ImageElement {
                src: Some(src.into()),
                width: 20.0,
                height: 20.0,
                border_radius: 0.0,
            }),
        )
    }

    fn solid(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba(color)))
    }

    fn plain_template() -> Template {
        let mut template = Template::default();
        // Borderless canvas still gets a hairline; make it fully transparent
        template.canvas.border = BorderSpec::all(1.0, "#ffffff00");
        template
    }

    #[test]
    fn test_output_size_and_scale() {
        let template = Template::default();
        assert_eq!(output_size(&template, 1.0).unwrap(), (323, 204));
        assert_eq!(output_size(&template, 2.0).unwrap(), (646, 408));
        let at_300 = output_size(&template, scale_for_dpi(300.0)).unwrap();
        assert_eq!(at_300, (1009, 638));
        assert!(output_size(&template, 0.0).is_err());
        assert!(output_size(&template, f64::NAN).is_err());
        assert!(output_size(&template, 100.0).is_err());
    }

    #[test]
    fn test_background_and_opacity() {
        let mut template = plain_template();
        template.canvas.background_color = "#ff0000".into();
        template.canvas.background_opacity = 0.5;
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.get_pixel(100, 100).0, [255, 0, 0, 128]);
    }

    #[test]
    fn test_z_order_and_ties() {
        let mut template = plain_template();
        template.elements = vec![
            image("top", 10.0, 10.0, 5, "blue"),
            image("bottom", 10.0, 10.0, 1, "red"),
            image("tie-a", 50.0, 50.0, 2, "red"),
            image("tie-b", 50.0, 50.0, 2, "blue"),
        ];
        let mut images = LoadedImages::new();
        images.insert("red", solid([255, 0, 0, 255]));
        images.insert("blue", solid([0, 0, 255, 255]));

        let out = compose(&template, &FieldValues::new(), &images, &RenderOptions::default()).unwrap();
        // Higher zIndex wins even though it comes first in the list
        assert_eq!(out.get_pixel(15, 15).0, [0, 0, 255, 255]);
        // Equal zIndex: later in document order paints last
        assert_eq!(out.get_pixel(55, 55).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_missing_image_draws_placeholder() {
        let mut template = plain_template();
        template.elements = vec![image("photo", 10.0, 10.0, 1, "https://example.com/missing.png")];
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.get_pixel(20, 20).0, [0xf0, 0xf0, 0xf0, 255]);
    }

    #[test]
    fn test_elements_outside_canvas_are_clipped() {
        let mut template = plain_template();
        template.elements = vec![
            image("off", 400.0, 300.0, 1, "x"),
            image("edge", -10.0, -10.0, 1, "x"),
            element(
                "qr",
                310.0,
                190.0,
                3,
                ElementKind::Qr(QrElement {
                    data: "https://example.com".into(),
                    ..Default::default()
                }),
            ),
        ];
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.dimensions(), (323, 204));
        assert_eq!(out.get_pixel(0, 0).0, [0xf0, 0xf0, 0xf0, 255]);
    }

    #[test]
    fn test_text_uses_field_value() {
        let mut template = plain_template();
        template.elements = vec![element(
            "name-1",
            10.0,
            10.0,
            1,
            ElementKind::Text(TextElement {
                label: "Name".into(),
                value: String::new(),
                font_size: 24.0,
                ..Default::default()
            }),
        )];
        let ink = |values: &FieldValues| {
            let out = compose(&template, values, &LoadedImages::new(), &RenderOptions::default()).unwrap();
            out.pixels().filter(|p| p.0[0] < 128).count()
        };
        assert_eq!(ink(&FieldValues::new()), 0);
        let mut values = FieldValues::new();
        values.set("Name", "Ada Lovelace");
        assert!(ink(&values) > 50);
    }

    #[test]
    fn test_element_border_grows_box() {
        let mut el = image("photo", 10.0, 10.0, 1, "x");
        el.border = BorderSpec::all(2.0, "#00ff00");
        assert_eq!(measure_element(&el, &FieldValues::new()), (24.0, 24.0));

        let mut template = plain_template();
        template.elements = vec![el];
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.get_pixel(10, 10).0, [0, 255, 0, 255]);
        assert_eq!(out.get_pixel(33, 33).0, [0, 255, 0, 255]);
        assert_eq!(out.get_pixel(12, 12).0, [0xf0, 0xf0, 0xf0, 255]);
    }

    #[test]
    fn test_canvas_border_is_inset() {
        let mut template = Template::default();
        template.canvas.border = BorderSpec {
            border_style: Some("one".into()),
            border_width: Some(4.0),
            border_color: Some("#0000ff".into()),
            border_sides: Some("top".into()),
        };
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.dimensions(), (323, 204));
        assert_eq!(out.get_pixel(100, 3).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(100, 4).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(0, 100).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_default_canvas_has_hairline() {
        let out = compose(&Template::default(), &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        let edge = out.get_pixel(0, 100).0;
        assert!(edge[0] < 255 && edge[0] > 240);
        assert_eq!(out.get_pixel(100, 100).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_grid_only_when_requested() {
        let template = plain_template();
        let values = FieldValues::new();
        let images = LoadedImages::new();
        let plain = compose(&template, &values, &images, &RenderOptions::default()).unwrap();
        assert_eq!(plain.get_pixel(10, 5).0, [255, 255, 255, 255]);
        let grid = compose(
            &template,
            &values,
            &images,
            &RenderOptions {
                scale: 1.0,
                show_grid: true,
            },
        )
        .unwrap();
        assert_eq!(grid.get_pixel(10, 5).0, [0xe0, 0xe0, 0xe0, 255]);
    }

    #[test]
    fn test_empty_qr_data_draws_nothing() {
        let mut template = plain_template();
        template.elements = vec![element(
            "qr-1",
            0.0,
            0.0,
            3,
            ElementKind::Qr(QrElement {
                data: String::new(),
                ..Default::default()
            }),
        )];
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_unvalidated_giant_elements_are_clipped() {
        let mut template = plain_template();
        let mut photo = image("photo", 0.0, 0.0, 1, "missing");
        if let ElementKind::Image(i) = &mut photo.kind {
            i.width = 70_000.0;
            i.height = 70_000.0;
            i.border_radius = 35_000.0;
        }
        template.elements = vec![
            photo,
            element(
                "name",
                -50_000.0,
                -20.0,
                2,
                ElementKind::Text(TextElement {
                    value: "Huge".into(),
                    font_size: 1e5,
                    ..Default::default()
                }),
            ),
            element(
                "qr",
                5.0,
                5.0,
                3,
                ElementKind::Qr(QrElement {
                    data: "EMP-0001".into(),
                    size: 1e6,
                    ..Default::default()
                }),
            ),
        ];
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.dimensions(), (323, 204));
        // Finder module of the QR code covers the visible canvas
        assert_eq!(out.get_pixel(200, 150).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_placeholder_shows_upload_label() {
        let mut template = plain_template();
        let mut photo = image("photo", 10.0, 10.0, 1, "missing");
        if let ElementKind::Image(i) = &mut photo.kind {
            i.width = 150.0;
            i.height = 100.0;
        }
        template.elements = vec![photo];
        let out = compose(&template, &FieldValues::new(), &LoadedImages::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.get_pixel(12, 12).0, [0xf0, 0xf0, 0xf0, 255]);
        let label = (10..160)
            .flat_map(|x| (10..110).map(move |y| (x, y)))
            .filter(|&(x, y)| out.get_pixel(x, y).0[0] < 0xe0)
            .count();
        assert!(label > 20);
    }
}
