//! # Physical Units
//!
//! Maps canvas pixels to physical millimetres for exact-size printing.
//!
//! The editor canvas is laid out in CSS pixels, which are defined at a fixed
//! 96 DPI regardless of the display. A card that is 323 px wide on screen is
//! therefore 85.46 mm wide on paper.
//!
//! ## Calculations
//!
//! ```text
//! px_per_mm = 96 / 25.4 ≈ 3.7795
//! mm        = px * 25.4 / 96
//! px        = mm * 96 / 25.4
//!
//! For a CR80 card:
//!   85.60mm × 53.98mm ≈ 323px × 204px
//! ```
//!
//! ## Usage
//!
//! ```
//! use cardpress::units::{px_to_mm, mm_to_px};
//!
//! assert!((px_to_mm(96.0) - 25.4).abs() < 1e-9);
//! assert!((mm_to_px(25.4) - 96.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

/// CSS reference resolution: one CSS pixel is 1/96 inch.
pub const CSS_DPI: f64 = 96.0;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Default page margin for print sheets, in millimetres.
pub const DEFAULT_MARGIN_MM: f64 = 20.0;

/// Default gap between tiled cards, in millimetres.
pub const DEFAULT_SPACING_MM: f64 = 5.0;

/// Convert CSS pixels to millimetres.
#[inline]
pub fn px_to_mm(px: f64) -> f64 {
    px * MM_PER_INCH / CSS_DPI
}

/// Convert millimetres to CSS pixels.
#[inline]
pub fn mm_to_px(mm: f64) -> f64 {
    mm * CSS_DPI / MM_PER_INCH
}

/// Convert millimetres to device dots at an arbitrary resolution.
#[inline]
pub fn mm_to_dots(mm: f64, dpi: f64) -> u32 {
    (mm * dpi / MM_PER_INCH).round().max(0.0) as u32
}

/// Raster scale factor that turns CSS pixels into dots at `dpi`.
///
/// ```
/// use cardpress::units::scale_for_dpi;
///
/// assert_eq!(scale_for_dpi(96.0), 1.0);
/// assert!((scale_for_dpi(300.0) - 3.125).abs() < 1e-9);
/// ```
#[inline]
pub fn scale_for_dpi(dpi: f64) -> f64 {
    dpi / CSS_DPI
}

/// Physical size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeMm {
    pub width: f64,
    pub height: f64,
}

impl SizeMm {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Physical size of a canvas laid out in CSS pixels.
    pub fn from_px(width_px: f64, height_px: f64) -> Self {
        Self {
            width: px_to_mm(width_px),
            height: px_to_mm(height_px),
        }
    }

    /// The same size rotated by 90 degrees.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// # Card Size
///
/// A card format with its physical size and the pixel size the editor uses for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSize {
    pub name: &'static str,
    pub mm: SizeMm,
    pub width_px: u32,
    pub height_px: u32,
}

impl CardSize {
    /// ISO/IEC 7810 ID-1 (CR80): the standard credit-card / ID-badge size.
    ///
    /// | Property | Value |
    /// |----------|-------|
    /// | Width | 85.60mm (323px) |
    /// | Height | 53.98mm (204px) |
    pub const CR80: Self = Self {
        name: "CR80",
        mm: SizeMm::new(85.6, 53.98),
        width_px: 323,
        height_px: 204,
    };
}

/// # Paper Size
///
/// Sheet formats that cards are tiled onto when printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    A5,
    Letter,
}

impl PaperSize {
    /// Paper dimensions in millimetres (portrait).
    pub fn size_mm(self) -> SizeMm {
        match self {
            PaperSize::A4 => SizeMm::new(210.0, 297.0),
            PaperSize::A5 => SizeMm::new(148.0, 210.0),
            PaperSize::Letter => SizeMm::new(215.9, 279.4),
        }
    }

    /// Look up a paper size by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(PaperSize::A4),
            "a5" => Some(PaperSize::A5),
            "letter" => Some(PaperSize::Letter),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::Letter => "Letter",
        }
    }

    pub fn all() -> &'static [PaperSize] {
        &[PaperSize::A4, PaperSize::A5, PaperSize::Letter]
    }
}

/// How cards tile onto a sheet of paper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLayout {
    pub cards_per_row: u32,
    pub cards_per_column: u32,
    pub total_cards: u32,
    /// Left edge of the first column, measured from the paper edge (includes margin).
    pub horizontal_offset: f64,
    /// Top edge of the first row, measured from the paper edge (includes margin).
    pub vertical_offset: f64,
    pub spacing: f64,
}

impl CardLayout {
    /// Top-left corner in millimetres of the card at `slot` (row-major).
    pub fn slot_origin(&self, card: SizeMm, slot: u32) -> Option<(f64, f64)> {
        if self.cards_per_row == 0 || slot >= self.total_cards {
            return None;
        }
        let col = slot % self.cards_per_row;
        let row = slot / self.cards_per_row;
        Some((
            self.horizontal_offset + col as f64 * (card.width + self.spacing),
            self.vertical_offset + row as f64 * (card.height + self.spacing),
        ))
    }
}

/// Calculate how many cards fit on a sheet and where the grid starts.
///
/// The grid is centred within the printable area (paper minus `margin` on
/// every side). Cards that do not fit at all produce a zero-sized grid.
///
/// ```
/// use cardpress::units::{calculate_card_layout, CardSize, PaperSize};
///
/// let layout = calculate_card_layout(CardSize::CR80.mm, PaperSize::A4.size_mm(), 20.0, 5.0);
/// assert_eq!(layout.cards_per_row, 1);
/// assert_eq!(layout.cards_per_column, 4);
/// ```
pub fn calculate_card_layout(card: SizeMm, paper: SizeMm, margin: f64, spacing: f64) -> CardLayout {
    let printable_width = paper.width - 2.0 * margin;
    let printable_height = paper.height - 2.0 * margin;

    let fit = |printable: f64, card: f64| -> u32 {
        if printable <= 0.0 || card <= 0.0 {
            return 0;
        }
        ((printable + spacing) / (card + spacing)).floor().max(0.0) as u32
    };

    let cards_per_row = fit(printable_width, card.width);
    let cards_per_column = fit(printable_height, card.height);

    let centre = |printable: f64, count: u32, card: f64| -> f64 {
        if count == 0 {
            return 0.0;
        }
        let used = count as f64 * card + (count - 1) as f64 * spacing;
        (printable - used) / 2.0
    };

    CardLayout {
        cards_per_row,
        cards_per_column,
        total_cards: cards_per_row * cards_per_column,
        horizontal_offset: margin + centre(printable_width, cards_per_row, card.width),
        vertical_offset: margin + centre(printable_height, cards_per_column, card.height),
        spacing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_mm_round_trip() {
        for px in [0.0, 1.0, 204.0, 323.0, 1234.5] {
            assert!((mm_to_px(px_to_mm(px)) - px).abs() < 1e-9);
        }
    }

    #[test]
    fn test_one_inch() {
        assert!((px_to_mm(96.0) - 25.4).abs() < 1e-12);
        assert!((mm_to_px(25.4) - 96.0).abs() < 1e-12);
    }

    #[test]
    fn test_cr80_pixels_match_physical_size() {
        let card = CardSize::CR80;
        // The editor truncates to whole pixels
        assert_eq!(mm_to_px(card.mm.width) as u32, card.width_px);
        assert_eq!(mm_to_px(card.mm.height) as u32, card.height_px);
    }

    #[test]
    fn test_mm_to_dots() {
        // 1 inch at 300 DPI
        assert_eq!(mm_to_dots(25.4, 300.0), 300);
        assert_eq!(mm_to_dots(-3.0, 300.0), 0);
    }

    #[test]
    fn test_paper_by_name() {
        assert_eq!(PaperSize::by_name("a4"), Some(PaperSize::A4));
        assert_eq!(PaperSize::by_name("LETTER"), Some(PaperSize::Letter));
        assert_eq!(PaperSize::by_name("b5"), None);
    }

    #[test]
    fn test_layout_a4_cr80() {
        let layout =
            calculate_card_layout(CardSize::CR80.mm, PaperSize::A4.size_mm(), 20.0, 5.0);
        // printable 170 x 257
        assert_eq!(layout.cards_per_row, 1);
        assert_eq!(layout.cards_per_column, 4);
        assert_eq!(layout.total_cards, 4);
        assert!((layout.horizontal_offset - (20.0 + (170.0 - 85.6) / 2.0)).abs() < 1e-9);
        let used_h = 4.0 * 53.98 + 3.0 * 5.0;
        assert!((layout.vertical_offset - (20.0 + (257.0 - used_h) / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_layout_small_margin_fits_two_columns() {
        let layout =
            calculate_card_layout(CardSize::CR80.mm, PaperSize::A4.size_mm(), 10.0, 5.0);
        assert_eq!(layout.cards_per_row, 2);
        assert_eq!(layout.cards_per_column, 4);
    }

    #[test]
    fn test_layout_card_too_large() {
        let layout = calculate_card_layout(SizeMm::new(300.0, 400.0), PaperSize::A5.size_mm(), 20.0, 5.0);
        assert_eq!(layout.cards_per_row, 0);
        assert_eq!(layout.total_cards, 0);
        assert!(layout.horizontal_offset.is_finite());
        assert_eq!(layout.slot_origin(SizeMm::new(300.0, 400.0), 0), None);
    }

    #[test]
    fn test_slot_origin_row_major() {
        let card = SizeMm::new(50.0, 30.0);
        let layout = calculate_card_layout(card, SizeMm::new(150.0, 100.0), 10.0, 5.0);
        // printable 130 x 80 → 2 per row, 2 per column
        assert_eq!(layout.cards_per_row, 2);
        assert_eq!(layout.cards_per_column, 2);
        let (x0, y0) = layout.slot_origin(card, 0).unwrap();
        let (x1, y1) = layout.slot_origin(card, 1).unwrap();
        let (x2, y2) = layout.slot_origin(card, 2).unwrap();
        assert!((x1 - x0 - 55.0).abs() < 1e-9);
        assert_eq!(y0, y1);
        assert_eq!(x2, x0);
        assert!((y2 - y0 - 35.0).abs() < 1e-9);
        assert_eq!(layout.slot_origin(card, 4), None);
    }
}
