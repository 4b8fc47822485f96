//! Encoding rendered cards as PNG, JPEG or a single-page PDF.
//!
//! PDF pages are sized to the card in millimetres, so printing the PDF at
//! 100% yields a card of the right physical size whatever the raster DPI.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage, codecs::jpeg::JpegEncoder};
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::CardpressError;
use crate::units::{MM_PER_INCH, SizeMm};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// JPEG quality of full-size exports.
pub const JPEG_QUALITY: u8 = 95;

/// Scale and quality of the thumbnail stored with a template.
pub const THUMBNAIL_SCALE: f64 = 0.5;
pub const THUMBNAIL_QUALITY: u8 = 70;

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Pdf,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpeg" | "jpg" => Some(ExportFormat::Jpeg),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Composite onto white, dropping alpha.
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let a = a as u32;
        let mix = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([mix(r), mix(g), mix(b)])
    })
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CardpressError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, CardpressError> {
    let flat = flatten_on_white(image);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&flat)?;
    Ok(bytes)
}

fn pdf_error(e: impl std::fmt::Display) -> CardpressError {
    CardpressError::Render(format!("PDF export failed: {}", e))
}

/// One PDF page of `size_mm` with the card drawn edge to edge.
///
/// The raster is flattened on white and stored losslessly (Flate).
pub fn encode_pdf(image: &RgbaImage, size_mm: SizeMm) -> Result<Vec<u8>, CardpressError> {
    let to_points = |mm: f64| (mm / MM_PER_INCH * POINTS_PER_INCH) as f32;
    let (page_w, page_h) = (to_points(size_mm.width), to_points(size_mm.height));
    if !(page_w.is_finite() && page_h.is_finite()) || page_w <= 0.0 || page_h <= 0.0 {
        return Err(CardpressError::Render("PDF page would be empty".into()));
    }

    let flat = flatten_on_white(image);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => flat.width() as i64,
            "Height" => flat.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        flat.into_raw(),
    ));

    // Image space is the unit square; scale it to the page
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(page_w),
                    0.into(),
                    0.into(),
                    Object::Real(page_h),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Card".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(pdf_error)?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(page_w), Object::Real(page_h)],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Card" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_error)?;
    Ok(bytes)
}

/// Encode in `format` at its export quality. `size_mm` is the card's
/// physical size; only PDF pages use it.
pub fn encode(image: &RgbaImage, format: ExportFormat, size_mm: SizeMm) -> Result<Vec<u8>, CardpressError> {
    match format {
        ExportFormat::Png => encode_png(image),
        ExportFormat::Jpeg => encode_jpeg(image, JPEG_QUALITY),
        ExportFormat::Pdf => encode_pdf(image, size_mm),
    }
}

/// Thumbnail JPEG of a full-size (scale 1) render.
pub fn thumbnail(image: &RgbaImage) -> Result<Vec<u8>, CardpressError> {
    let width = ((image.width() as f64 * THUMBNAIL_SCALE).round() as u32).max(1);
    let height = ((image.height() as f64 * THUMBNAIL_SCALE).round() as u32).max(1);
    let small = DynamicImage::ImageRgba8(image.clone())
        .resize_exact(width, height, image::imageops::FilterType::Triangle)
        .to_rgba8();
    encode_jpeg(&small, THUMBNAIL_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_flatten_on_white() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flat = flatten_on_white(&image);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_encoders_produce_magic_bytes() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        let size = SizeMm::new(85.6, 54.0);
        let png = encode(&image, ExportFormat::Png, size).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let jpeg = encode(&image, ExportFormat::Jpeg, size).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let pdf = encode(&image, ExportFormat::Pdf, size).unwrap();
        assert_eq!(&pdf[..5], b"%PDF-");
    }

    #[test]
    fn test_pdf_page_matches_card_size() {
        let image = RgbaImage::from_pixel(323, 204, Rgba([255, 0, 0, 255]));
        let bytes = encode_pdf(&image, SizeMm::new(85.6, 53.98)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let width = media_box[2].as_float().unwrap();
        let height = media_box[3].as_float().unwrap();
        // 85.6mm × 53.98mm in points
        assert!((width - 242.65).abs() < 0.01);
        assert!((height - 153.01).abs() < 0.01);
    }

    #[test]
    fn test_pdf_rejects_empty_page() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        assert!(encode_pdf(&image, SizeMm::new(0.0, 10.0)).is_err());
    }

    #[test]
    fn test_thumbnail_is_half_size() {
        let image = RgbaImage::from_pixel(323, 204, Rgba([255, 255, 255, 255]));
        let bytes = thumbnail(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (162, 102));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("JPG"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::parse("png"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::parse("PDF"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::Pdf.mime(), "application/pdf");
        assert_eq!(ExportFormat::parse("gif"), None);
    }
}
