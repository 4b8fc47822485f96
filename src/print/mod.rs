//! # Printing
//!
//! Two ways to get cards onto paper at their exact physical size:
//!
//! - [`SheetRenderer`] tiles copies onto paper-sized rasters at a chosen DPI
//!   (one image per sheet, rendered on demand), ready for any image printing
//!   pipeline. [`render_sheet`] and [`render_sheets`] wrap it.
//! - [`print_html`] produces a standalone page whose card images are sized
//!   in millimetres, for printing from a browser.
//!
//! ## Sheet Geometry
//!
//! ```text
//! ┌───────────── paper ─────────────┐
//! │ margin                          │
//! │   ┌──────┐ spacing ┌──────┐     │  grid centred in the
//! │   │ card │         │ card │     │  printable area
//! │   └──────┘         └──────┘     │
//! │   ...                           │
//! └─────────────────────────────────┘
//! ```

mod html;

pub use html::{PRINT_SCALE, print_html};

use image::{Rgba, RgbaImage, imageops, imageops::FilterType};
use serde::{Deserialize, Serialize};

use crate::error::CardpressError;
use crate::units::{
    CardLayout, DEFAULT_MARGIN_MM, DEFAULT_SPACING_MM, MM_PER_INCH, PaperSize, SizeMm, calculate_card_layout,
    mm_to_dots,
};

/// Copies accepted by one print job.
pub const MAX_COPIES: u32 = 500;

/// Lowest and highest raster resolution for sheets.
pub const MIN_DPI: f64 = 72.0;
pub const MAX_DPI: f64 = 600.0;

fn default_copies() -> u32 {
    1
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN_MM
}

fn default_spacing() -> f64 {
    DEFAULT_SPACING_MM
}

fn default_dpi() -> f64 {
    300.0
}

/// What to print and on which paper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    #[serde(default = "default_copies")]
    pub copies: u32,
    #[serde(default)]
    pub paper: PaperSize,
    #[serde(default = "default_margin")]
    pub margin_mm: f64,
    #[serde(default = "default_spacing")]
    pub spacing_mm: f64,
    #[serde(default = "default_dpi")]
    pub dpi: f64,
}

impl Default for PrintJob {
    fn default() -> Self {
        Self {
            copies: default_copies(),
            paper: PaperSize::default(),
            margin_mm: default_margin(),
            spacing_mm: default_spacing(),
            dpi: default_dpi(),
        }
    }
}

impl PrintJob {
    pub fn validate(&self) -> Result<(), CardpressError> {
        if self.copies == 0 || self.copies > MAX_COPIES {
            return Err(CardpressError::Validation(format!(
                "Copies must be between 1 and {}",
                MAX_COPIES
            )));
        }
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(CardpressError::Validation(format!(
                "DPI must be between {} and {}",
                MIN_DPI, MAX_DPI
            )));
        }
        if !(self.margin_mm.is_finite() && self.margin_mm >= 0.0)
            || !(self.spacing_mm.is_finite() && self.spacing_mm >= 0.0)
        {
            return Err(CardpressError::Validation(
                "Margin and spacing must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Grid of cards of `card` size on this job's paper.
    pub fn layout(&self, card: SizeMm) -> CardLayout {
        calculate_card_layout(card, self.paper.size_mm(), self.margin_mm, self.spacing_mm)
    }

    /// Sheets needed for all copies.
    pub fn sheet_count(&self, card: SizeMm) -> u32 {
        let per_sheet = self.layout(card).total_cards;
        if per_sheet == 0 {
            0
        } else {
            self.copies.div_ceil(per_sheet)
        }
    }
}

/// Lays copies of one card out on paper rasters, one sheet at a time.
///
/// The card is resampled to exactly `card_mm` at `job.dpi` once, up front;
/// each sheet is only allocated when asked for.
pub struct SheetRenderer {
    card: RgbaImage,
    card_mm: SizeMm,
    layout: CardLayout,
    paper_px: (u32, u32),
    copies: u32,
    dpi: f64,
}

impl SheetRenderer {
    pub fn new(card: &RgbaImage, card_mm: SizeMm, job: &PrintJob) -> Result<Self, CardpressError> {
        job.validate()?;
        let layout = job.layout(card_mm);
        if layout.total_cards == 0 {
            return Err(CardpressError::Validation(format!(
                "A {:.2}mm × {:.2}mm card does not fit on {} with {}mm margins",
                card_mm.width,
                card_mm.height,
                job.paper.name(),
                job.margin_mm
            )));
        }

        let paper = job.paper.size_mm();
        let paper_px = (mm_to_dots(paper.width, job.dpi), mm_to_dots(paper.height, job.dpi));
        let (card_w, card_h) = (
            mm_to_dots(card_mm.width, job.dpi).max(1),
            mm_to_dots(card_mm.height, job.dpi).max(1),
        );
        let card = if card.dimensions() == (card_w, card_h) {
            card.clone()
        } else {
            imageops::resize(card, card_w, card_h, FilterType::Triangle)
        };

        Ok(Self {
            card,
            card_mm,
            layout,
            paper_px,
            copies: job.copies,
            dpi: job.dpi,
        })
    }

    pub fn sheet_count(&self) -> u32 {
        self.copies.div_ceil(self.layout.total_cards)
    }

    /// Sheet `index` (0-based); the last sheet holds the remainder.
    pub fn render(&self, index: u32) -> Result<RgbaImage, CardpressError> {
        let count = self.sheet_count();
        if index >= count {
            return Err(CardpressError::Validation(format!(
                "Sheet {} out of range, the job has {} sheets",
                index + 1,
                count
            )));
        }
        let per_sheet = self.layout.total_cards;
        let on_this_sheet = (self.copies - index * per_sheet).min(per_sheet);

        let (paper_w, paper_h) = self.paper_px;
        let mut sheet = RgbaImage::from_pixel(paper_w, paper_h, Rgba([255, 255, 255, 255]));
        for slot in 0..on_this_sheet {
            if let Some((x, y)) = self.layout.slot_origin(self.card_mm, slot) {
                let x = (x * self.dpi / MM_PER_INCH).round() as i64;
                let y = (y * self.dpi / MM_PER_INCH).round() as i64;
                imageops::overlay(&mut sheet, &self.card, x, y);
            }
        }
        tracing::debug!(sheet = index + 1, of = count, cards = on_this_sheet, dpi = self.dpi, "Rendered print sheet");
        Ok(sheet)
    }
}

/// Render only sheet `index` of a job.
pub fn render_sheet(
    card: &RgbaImage,
    card_mm: SizeMm,
    job: &PrintJob,
    index: u32,
) -> Result<RgbaImage, CardpressError> {
    SheetRenderer::new(card, card_mm, job)?.render(index)
}

/// Tile `job.copies` copies of `card` onto white paper rasters.
///
/// `card` may be at any resolution; it is resampled to exactly `card_mm` at
/// `job.dpi`. Copies that do not fit on one sheet continue on the next.
pub fn render_sheets(card: &RgbaImage, card_mm: SizeMm, job: &PrintJob) -> Result<Vec<RgbaImage>, CardpressError> {
    let renderer = SheetRenderer::new(card, card_mm, job)?;
    (0..renderer.sheet_count()).map(|i| renderer.render(i)).collect()
}
