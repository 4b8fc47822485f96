//! Border styles shared by the canvas and by elements.
//!
//! A border is described by four loose string/number fields as saved by the
//! editor. [`BorderSpec::resolve`] turns them into concrete edges:
//!
//! | `borderStyle` | `borderSides` | Edges |
//! |---------------|---------------|-------|
//! | `none` / missing | - | none (canvas: 1px hairline on all four) |
//! | `all` | - | top, right, bottom, left |
//! | `one` | `top` `right` `bottom` `left` (default `left`) | that side |
//! | `two` | `vertical` (default) / anything else | left+right / top+bottom |

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Border fields as stored on a canvas or element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_sides: Option<String>,
}

/// One side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Side::Top),
            "right" => Some(Side::Right),
            "bottom" => Some(Side::Bottom),
            "left" => Some(Side::Left),
            _ => None,
        }
    }
}

/// Which edges of a box carry a border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edges {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Edges {
    pub const NONE: Edges = Edges {
        top: false,
        right: false,
        bottom: false,
        left: false,
    };

    pub const ALL: Edges = Edges {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    pub fn only(side: Side) -> Self {
        let mut edges = Edges::NONE;
        match side {
            Side::Top => edges.top = true,
            Side::Right => edges.right = true,
            Side::Bottom => edges.bottom = true,
            Side::Left => edges.left = true,
        }
        edges
    }

    pub fn is_empty(&self) -> bool {
        !(self.top || self.right || self.bottom || self.left)
    }
}

/// Whether a border belongs to the card itself or to an element on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderTarget {
    Canvas,
    Element,
}

/// A border ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBorder {
    pub edges: Edges,
    /// Stroke width in canvas pixels.
    pub width: f64,
    pub color: Color,
}

impl ResolvedBorder {
    /// Thickness added on each side, in canvas pixels.
    pub fn insets(&self) -> (f64, f64, f64, f64) {
        let w = |on: bool| if on { self.width } else { 0.0 };
        (
            w(self.edges.top),
            w(self.edges.right),
            w(self.edges.bottom),
            w(self.edges.left),
        )
    }
}

impl BorderSpec {
    /// A border on every side.
    pub fn all(width: f64, color: &str) -> Self {
        Self {
            border_style: Some("all".into()),
            border_width: Some(width),
            border_color: Some(color.into()),
            border_sides: None,
        }
    }

    /// Resolve the style permutation into concrete edges.
    ///
    /// Returns `None` when nothing should be drawn. Unknown styles behave
    /// like `none`.
    pub fn resolve(&self, target: BorderTarget) -> Option<ResolvedBorder> {
        let style = self
            .border_style
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let sides = self
            .border_sides
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let edges = match style.as_str() {
            "all" => Edges::ALL,
            "one" => Edges::only(sides.and_then(Side::parse).unwrap_or(Side::Left)),
            // Anything but `vertical` pairs the horizontal edges
            "two" => match sides.map(|s| s.to_ascii_lowercase()).as_deref() {
                None | Some("vertical") => Edges {
                    left: true,
                    right: true,
                    ..Edges::NONE
                },
                Some(_) => Edges {
                    top: true,
                    bottom: true,
                    ..Edges::NONE
                },
            },
            _ => {
                return match target {
                    BorderTarget::Canvas => Some(ResolvedBorder {
                        edges: Edges::ALL,
                        width: 1.0,
                        color: Color::HAIRLINE,
                    }),
                    BorderTarget::Element => None,
                };
            }
        };

        let width = self
            .border_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(1.0);
        let color = Color::parse_or(self.border_color.as_deref(), Color::BLACK);

        Some(ResolvedBorder {
            edges,
            width,
            color,
        })
    }

    /// CSS declarations equivalent to this border, as used by the print page.
    pub fn to_css(&self, target: BorderTarget) -> String {
        let Some(border) = self.resolve(target) else {
            return String::new();
        };
        let value = format!("{}px solid {}", border.width, border.color.to_css());
        if border.edges == Edges::ALL {
            return format!("border: {};", value);
        }
        let mut css = Vec::new();
        for (on, name) in [
            (border.edges.top, "top"),
            (border.edges.right, "right"),
            (border.edges.bottom, "bottom"),
            (border.edges.left, "left"),
        ] {
            if on {
                css.push(format!("border-{}: {};", name, value));
            }
        }
        css.join(" ")
    }
}
