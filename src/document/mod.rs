//! # Card Document Model
//!
//! A [`Template`] is both the Rust API and the JSON the editor stores as
//! `templateData`: a canvas (size, background, border) plus a flat list of
//! positioned [`Element`]s.
//!
//! ```
//! use cardpress::document::*;
//!
//! let template: Template = serde_json::from_str(r#"{
//!     "canvas": {"width": 323, "height": 204},
//!     "elements": [
//!         {"id": "name-1", "type": "text", "label": "Name", "value": "John Doe",
//!          "x": 150, "y": 80, "fontSize": 24, "zIndex": 1}
//!     ]
//! }"#).unwrap();
//!
//! assert!(validate(&template).is_ok());
//! assert_eq!(template.size_mm().width.round(), 85.0);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Template, canvas and element types |
//! | [`border`] | Border style permutations |
//! | [`editor`] | Direct-manipulation editor state |
//! | [`drag`] | Bounded drag placement |
//! | [`fields`] | Per-user field values |

pub mod border;
pub mod drag;
pub mod editor;
pub mod fields;
pub mod types;

pub use border::{BorderSpec, BorderTarget, Edges, ResolvedBorder, Side};
pub use drag::DragSession;
pub use editor::{Editor, EditorData};
pub use fields::{FieldDescriptor, FieldValues, describe_fields};
pub use types::*;

use std::collections::HashSet;

use crate::color::Color;
use crate::error::CardpressError;
use crate::units::SizeMm;

/// Largest canvas edge accepted, in CSS pixels (about 52cm).
pub const MAX_CANVAS_PX: u32 = 2000;

impl Template {
    /// Elements in paint order: ascending `z_index`, ties in document order.
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut sorted: Vec<&Element> = self.elements.iter().collect();
        // sort_by_key is stable
        sorted.sort_by_key(|e| e.z_index);
        sorted
    }

    /// Physical card size at 96 DPI.
    pub fn size_mm(&self) -> SizeMm {
        SizeMm::from_px(self.canvas.width as f64, self.canvas.height as f64)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }
}

/// Check a template before saving or rendering.
///
/// Rejects zero or oversized canvases, duplicate or empty element ids,
/// non-finite coordinates and malformed colours. Element sizes must be
/// positive and at most [`MAX_CANVAS_PX`].
pub fn validate(template: &Template) -> Result<(), CardpressError> {
    let canvas = &template.canvas;
    if canvas.width == 0 || canvas.height == 0 {
        return Err(CardpressError::Validation(
            "Canvas width and height must be positive".into(),
        ));
    }
    if canvas.width > MAX_CANVAS_PX || canvas.height > MAX_CANVAS_PX {
        return Err(CardpressError::Validation(format!(
            "Canvas larger than {}px is not supported",
            MAX_CANVAS_PX
        )));
    }
    check_color("backgroundColor", Some(&canvas.background_color))?;
    check_color("borderColor", canvas.border.border_color.as_deref())?;

    let mut ids = HashSet::new();
    for element in &template.elements {
        if element.id.trim().is_empty() {
            return Err(CardpressError::Validation("Element id cannot be empty".into()));
        }
        if !ids.insert(element.id.as_str()) {
            return Err(CardpressError::Validation(format!(
                "Duplicate element id '{}'",
                element.id
            )));
        }
        if !element.x.is_finite() || !element.y.is_finite() {
            return Err(CardpressError::Validation(format!(
                "Element '{}' has an invalid position",
                element.id
            )));
        }
        check_color("borderColor", element.border.border_color.as_deref())?;
        if let Some(width) = element.border.border_width {
            check_range(&element.id, "borderWidth", width, 0.0)?;
        }

        match &element.kind {
            ElementKind::Text(t) => {
                check_size(&element.id, "fontSize", t.font_size)?;
                check_color("color", Some(&t.color))?;
            }
            ElementKind::Image(i) => {
                check_size(&element.id, "width", i.width)?;
                check_size(&element.id, "height", i.height)?;
                check_range(&element.id, "borderRadius", i.border_radius, 0.0)?;
            }
            ElementKind::Qr(q) => {
                check_size(&element.id, "size", q.size)?;
            }
        }
    }
    Ok(())
}

/// [`validate`], plus the rule that an empty template cannot be saved.
pub fn validate_for_save(template: &Template) -> Result<(), CardpressError> {
    validate(template)?;
    if template.elements.is_empty() {
        return Err(CardpressError::Validation(
            "Cannot save empty template. Add at least one element.".into(),
        ));
    }
    Ok(())
}

fn check_color(field: &str, value: Option<&str>) -> Result<(), CardpressError> {
    match value {
        Some(v) if !v.trim().is_empty() => Color::parse(v)
            .map(|_| ())
            .map_err(|e| CardpressError::Validation(format!("{}: {}", field, e))),
        _ => Ok(()),
    }
}

/// A size must be positive and no larger than the largest canvas.
fn check_size(id: &str, field: &str, value: f64) -> Result<(), CardpressError> {
    if value.is_finite() && value > 0.0 && value <= MAX_CANVAS_PX as f64 {
        Ok(())
    } else {
        Err(CardpressError::Validation(format!(
            "Element '{}': {} must be between 0 and {}px",
            id, field, MAX_CANVAS_PX
        )))
    }
}

fn check_range(id: &str, field: &str, value: f64, min: f64) -> Result<(), CardpressError> {
    if value.is_finite() && value >= min && value <= MAX_CANVAS_PX as f64 {
        Ok(())
    } else {
        Err(CardpressError::Validation(format!(
            "Element '{}': {} must be between {} and {}px",
            id, field, min, MAX_CANVAS_PX
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: &str, z: i64) -> Element {
        Element {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            z_index: z,
            border: BorderSpec::default(),
            kind: ElementKind::Text(TextElement::default()),
        }
    }

    #[test]
    fn test_paint_order_is_stable() {
        let template = Template {
            elements: vec![text("a", 2), text("b", 1), text("c", 2), text("d", 0)],
            ..Default::default()
        };
        let order: Vec<&str> = template.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_validate_ok() {
        let template = Template {
            elements: vec![text("a", 1)],
            ..Default::default()
        };
        assert!(validate(&template).is_ok());
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let template = Template {
            elements: vec![text("a", 1), text("a", 2)],
            ..Default::default()
        };
        assert!(validate(&template).is_err());
    }

    #[test]
    fn test_validate_canvas() {
        let mut template = Template::default();
        template.canvas.width = 0;
        assert!(validate(&template).is_err());
        template.canvas.width = 5000;
        assert!(validate(&template).is_err());
    }

    #[test]
    fn test_validate_colours_and_sizes() {
        let mut template = Template {
            elements: vec![text("a", 1)],
            ..Default::default()
        };
        template.canvas.background_color = "purple".into();
        assert!(validate(&template).is_err());

        template.canvas.background_color = "#ffffff".into();
        if let ElementKind::Text(t) = &mut template.elements[0].kind {
            t.font_size = 0.0;
        }
        assert!(validate(&template).is_err());
    }

    #[test]
    fn test_validate_position() {
        let mut el = text("a", 1);
        el.x = f64::NAN;
        let template = Template {
            elements: vec![el],
            ..Default::default()
        };
        assert!(validate(&template).is_err());
    }

    #[test]
    fn test_size_mm() {
        let template = Template::default();
        let size = template.size_mm();
        assert!((size.width - 85.4604).abs() < 1e-3);
        assert!((size.height - 53.975).abs() < 1e-3);
    }

    #[test]
    fn test_validate_caps_element_sizes() {
        let check = |kind: ElementKind| {
            let mut el = text("a", 1);
            el.kind = kind;
            validate(&Template {
                elements: vec![el],
                ..Default::default()
            })
        };
        assert!(
            check(ElementKind::Text(TextElement {
                font_size: 1e5,
                ..Default::default()
            }))
            .is_err()
        );
        assert!(
            check(ElementKind::Image(ImageElement {
                width: 70_000.0,
                ..Default::default()
            }))
            .is_err()
        );
        assert!(
            check(ElementKind::Image(ImageElement {
                border_radius: -1.0,
                ..Default::default()
            }))
            .is_err()
        );
        assert!(
            check(ElementKind::Qr(QrElement {
                size: 1e6,
                ..Default::default()
            }))
            .is_err()
        );
        assert!(
            check(ElementKind::Qr(QrElement {
                size: 2000.0,
                ..Default::default()
            }))
            .is_ok()
        );

        let mut el = text("a", 1);
        el.border = BorderSpec::all(1e9, "#000000");
        let template = Template {
            elements: vec![el],
            ..Default::default()
        };
        assert!(validate(&template).is_err());
    }
}
