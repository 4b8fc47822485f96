//! Browser print page with millimetre-exact card sizes.

use std::fmt::Write as _;

use super::PrintJob;
use crate::render::to_data_url;
use crate::units::SizeMm;

/// Render scale of the card image embedded in the print page.
pub const PRINT_SCALE: f64 = 2.0;

/// Build a standalone HTML page that prints `job.copies` copies of a card.
///
/// `card_png` is the rendered card (any resolution); `width_px × height_px`
/// is the canvas size at 96 DPI, which fixes the printed size in mm.
///
/// ```
/// use cardpress::print::{PrintJob, print_html};
///
/// let html = print_html(b"\x89PNG", 323, 204, &PrintJob::default());
/// assert!(html.contains("Print ID Card - 85.46mm"));
/// assert!(html.contains("size: A4;"));
/// ```
pub fn print_html(card_png: &[u8], width_px: u32, height_px: u32, job: &PrintJob) -> String {
    let card = SizeMm::from_px(width_px as f64, height_px as f64);
    let layout = job.layout(card);
    let spacing = layout.spacing;
    let src = to_data_url("image/png", card_png);
    let copies = job.copies.max(1);
    let per_row = layout.cards_per_row.max(1);

    let mut cards = String::new();
    for i in 0..copies {
        let mut style = format!("width: {}mm; height: {}mm;", card.width, card.height);
        if i + 1 < copies {
            let _ = write!(style, " margin-bottom: {}mm;", spacing);
        }
        if i % per_row != per_row - 1 {
            let _ = write!(style, " margin-right: {}mm;", spacing);
        }
        let _ = write!(
            cards,
            "\n      <div class=\"id-card\" style=\"{}\">\n        <img src=\"{}\" alt=\"ID Card {}\" />\n      </div>",
            style,
            src,
            i + 1
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <title>Print ID Card - {width:.2}mm × {height:.2}mm</title>
    <style>
      * {{ margin: 0; padding: 0; box-sizing: border-box; }}
      @page {{ size: {paper}; margin: {margin}mm; }}
      @media print {{
        body {{ margin: 0 !important; padding: 0 !important; background: transparent !important; }}
        .print-info {{ display: none !important; }}
        .id-card {{ box-shadow: none !important; border: none !important; }}
      }}
      body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; background: #f5f5f5; }}
      .print-info {{ background: white; padding: 20px; border-radius: 12px; margin-bottom: 20px; }}
      .print-button {{ background: #2563eb; color: white; border: none; padding: 14px 28px; border-radius: 8px; font-size: 16px; cursor: pointer; }}
      .card-grid {{ display: flex; flex-wrap: wrap; }}
      .id-card {{ box-shadow: 0 2px 4px rgba(0,0,0,0.1); border: 1px solid #e5e7eb; }}
      .id-card img {{ width: 100%; height: 100%; display: block; }}
    </style>
  </head>
  <body>
    <div class="print-info">
      <h2>ID Card Print Preview</h2>
      <p>{copies} {noun} · {per_sheet} per {paper} sheet</p>
      <button class="print-button" onclick="window.print()">Print ID Card{plural}</button>
    </div>
    <div class="card-grid">{cards}
    </div>
  </body>
</html>
"#,
        width = card.width,
        height = card.height,
        paper = job.paper.name(),
        margin = job.margin_mm,
        copies = copies,
        noun = if copies == 1 { "copy" } else { "copies" },
        per_sheet = layout.total_cards,
        plural = if copies > 1 { "s" } else { "" },
        cards = cards,
    )
}
