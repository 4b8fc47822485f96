//! Template, canvas and element types.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! Rust construction and for the camelCase JSON the editor saves as
//! `templateData`. Every field has a default so templates saved by older
//! editor versions still load.
//!
//! Each element kind implements [`ElementMeta`] to declare its `type` tag and
//! the starter values the editor inserts.

use serde::{Deserialize, Serialize};

use super::border::BorderSpec;

/// Metadata that every element kind must provide.
pub trait ElementMeta: Sized {
    /// The `type` tag used in JSON (e.g. "text", "qr").
    fn type_name() -> &'static str;

    /// Starter value inserted by the editor's "add" buttons.
    ///
    /// Distinct from `Default`: editor defaults carry example content so a
    /// new element is visible immediately.
    fn editor_default() -> Self;

    /// Default layer order for newly added elements of this kind.
    fn default_z_index() -> i64;
}

// ============================================================================
// CANVAS
// ============================================================================

/// Card orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Landscape => Orientation::Portrait,
            Orientation::Portrait => Orientation::Landscape,
        }
    }
}

fn default_canvas_width() -> u32 {
    323
}

fn default_canvas_height() -> u32 {
    204
}

fn default_grid_size() -> u32 {
    10
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

fn default_opacity() -> f64 {
    1.0
}

fn default_zoom() -> u32 {
    100
}

/// The print surface: size in CSS pixels (96 DPI), background and border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
    #[serde(default)]
    pub orientation: Orientation,
    /// Editor-only grid overlay; never drawn on exports.
    #[serde(default)]
    pub show_grid: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_opacity")]
    pub background_opacity: f64,
    /// Image source: data URL, http(s) URL or asset path.
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(flatten)]
    pub border: BorderSpec,
    /// Editor zoom in percent (50..=200). Has no effect on exports.
    #[serde(default = "default_zoom")]
    pub zoom: u32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            orientation: Orientation::Landscape,
            show_grid: false,
            snap_to_grid: false,
            grid_size: default_grid_size(),
            background_color: default_background_color(),
            background_opacity: default_opacity(),
            background_image: None,
            border: BorderSpec::default(),
            zoom: default_zoom(),
        }
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// A positioned item on the card.
///
/// Position is the top-left corner of the element box in canvas pixels.
/// Elements are composited in ascending `z_index`; ties keep document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z_index: i64,
    #[serde(flatten)]
    pub border: BorderSpec,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Type-specific element attributes, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextElement),
    Image(ImageElement),
    Qr(QrElement),
}

impl ElementKind {
    /// The JSON `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => TextElement::type_name(),
            ElementKind::Image(_) => ImageElement::type_name(),
            ElementKind::Qr(_) => QrElement::type_name(),
        }
    }

    /// Editor default for a `type` tag.
    pub fn editor_default(type_name: &str) -> Option<(Self, i64)> {
        match type_name {
            "text" => Some((
                ElementKind::Text(TextElement::editor_default()),
                TextElement::default_z_index(),
            )),
            "image" => Some((
                ElementKind::Image(ImageElement::editor_default()),
                ImageElement::default_z_index(),
            )),
            "qr" => Some((
                ElementKind::Qr(QrElement::editor_default()),
                QrElement::default_z_index(),
            )),
            _ => None,
        }
    }
}

fn default_font_size() -> f64 {
    16.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

fn default_text_color() -> String {
    "#000000".to_string()
}

fn default_align() -> String {
    "left".to_string()
}

/// A single line of text bound to a user field by `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Field name shown in the data-entry form; also the field-value key.
    #[serde(default)]
    pub label: String,
    /// Placeholder value used when no field value is supplied.
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// CSS weight: "normal", "bold", or a number ("600").
    #[serde(default = "default_font_weight")]
    pub font_weight: String,
    #[serde(default = "default_text_color")]
    pub color: String,
    /// "left", "center" or "right".
    #[serde(default = "default_align")]
    pub align: String,
}

impl TextElement {
    /// True for `bold`, `bolder` and numeric weights of 600 and above.
    pub fn is_bold(&self) -> bool {
        match self.font_weight.trim() {
            "bold" | "bolder" => true,
            w => w.parse::<u32>().map(|n| n >= 600).unwrap_or(false),
        }
    }
}

impl Default for TextElement {
    fn default() -> Self {
        Self {
            label: String::new(),
            value: String::new(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            color: default_text_color(),
            align: default_align(),
        }
    }
}

impl ElementMeta for TextElement {
    fn type_name() -> &'static str {
        "text"
    }

    fn editor_default() -> Self {
        Self {
            label: "New Field".into(),
            value: "Enter text".into(),
            ..Default::default()
        }
    }

    fn default_z_index() -> i64 {
        1
    }
}

fn default_image_size() -> f64 {
    100.0
}

/// A photo slot, drawn with object-fit: cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default = "default_image_size")]
    pub width: f64,
    #[serde(default = "default_image_size")]
    pub height: f64,
    #[serde(default)]
    pub border_radius: f64,
}

impl Default for ImageElement {
    fn default() -> Self {
        Self {
            src: None,
            width: default_image_size(),
            height: default_image_size(),
            border_radius: 0.0,
        }
    }
}

impl ElementMeta for ImageElement {
    fn type_name() -> &'static str {
        "image"
    }

    fn editor_default() -> Self {
        Self::default()
    }

    fn default_z_index() -> i64 {
        2
    }
}

fn default_qr_size() -> f64 {
    80.0
}

/// A square QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrElement {
    /// Field-value key. When absent the element id is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: String,
    /// Edge length in pixels, excluding padding.
    #[serde(default = "default_qr_size")]
    pub size: f64,
}

impl Default for QrElement {
    fn default() -> Self {
        Self {
            label: None,
            data: String::new(),
            size: default_qr_size(),
        }
    }
}

impl ElementMeta for QrElement {
    fn type_name() -> &'static str {
        "qr"
    }

    fn editor_default() -> Self {
        Self {
            data: "https://example.com".into(),
            ..Default::default()
        }
    }

    fn default_z_index() -> i64 {
        3
    }
}

// ============================================================================
// TEMPLATE
// ============================================================================

/// A saved canvas configuration plus its placed elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub canvas: CanvasSettings,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// A built-in background the editor can apply in one click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundPreset {
    pub id: String,
    pub name: String,
    pub background_image: String,
    pub orientation: Orientation,
}

impl BackgroundPreset {
    /// Presets shipped with the editor (images live under the asset root).
    pub fn built_in() -> Vec<BackgroundPreset> {
        vec![
            BackgroundPreset {
                id: "template-1".into(),
                name: "Corporate Blue".into(),
                background_image: "templates/corporate-blue.png".into(),
                orientation: Orientation::Landscape,
            },
            BackgroundPreset {
                id: "template-2".into(),
                name: "Modern Gradient".into(),
                background_image: "templates/modern-gradient.png".into(),
                orientation: Orientation::Landscape,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_saved_template() {
        let json = r##"{
            "canvas": {
                "width": 323, "height": 204,
                "backgroundColor": "#eef", "backgroundOpacity": 0.5,
                "backgroundImage": null,
                "borderStyle": "two", "borderWidth": 3,
                "borderColor": "#123456", "borderSides": "horizontal"
            },
            "elements": [
                {"id": "name-1", "type": "text", "label": "Name", "value": "John Doe",
                 "x": 150, "y": 80, "fontSize": 24, "fontFamily": "Arial",
                 "fontWeight": "bold", "color": "#000000", "align": "left", "zIndex": 1},
                {"id": "image-1", "type": "image", "src": null, "x": 20, "y": 20,
                 "width": 100, "height": 100, "borderRadius": 8, "zIndex": 2,
                 "borderStyle": "all", "borderWidth": 2},
                {"id": "qr-1", "type": "qr", "data": "https://example.com",
                 "x": 300, "y": 150, "size": 80, "zIndex": 3}
            ]
        }"##;
        let template: Template = serde_json::from_str(json).unwrap();

        assert_eq!(template.canvas.background_opacity, 0.5);
        assert_eq!(template.canvas.border.border_style.as_deref(), Some("two"));
        assert_eq!(template.canvas.zoom, 100);
        assert_eq!(template.elements.len(), 3);

        let name = &template.elements[0];
        assert_eq!(name.x, 150.0);
        match &name.kind {
            ElementKind::Text(t) => {
                assert_eq!(t.label, "Name");
                assert!(t.is_bold());
            }
            other => panic!("expected text, got {:?}", other),
        }

        let image = &template.elements[1];
        assert_eq!(image.border.border_width, Some(2.0));
        assert_eq!(image.kind.type_name(), "image");
        assert_eq!(template.elements[2].z_index, 3);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let template: Template =
            serde_json::from_str(r#"{"elements":[{"id":"t","type":"text"}]}"#).unwrap();
        assert_eq!(template.canvas, CanvasSettings::default());
        match &template.elements[0].kind {
            ElementKind::Text(t) => assert_eq!(t, &TextElement::default()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_serialize_uses_camel_case_and_type_tag() {
        let el = Element {
            id: "qr-1".into(),
            x: 1.0,
            y: 2.0,
            z_index: 3,
            border: BorderSpec::default(),
            kind: ElementKind::Qr(QrElement::editor_default()),
        };
        let value = serde_json::to_value(&el).unwrap();
        assert_eq!(value["type"], "qr");
        assert_eq!(value["zIndex"], 3);
        assert_eq!(value["data"], "https://example.com");
        assert!(value.get("label").is_none());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<Element, _> =
            serde_json::from_str(r#"{"id":"x","type":"barcode"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_font_weight() {
        let mut t = TextElement::default();
        assert!(!t.is_bold());
        t.font_weight = "700".into();
        assert!(t.is_bold());
        t.font_weight = "500".into();
        assert!(!t.is_bold());
    }

    #[test]
    fn test_editor_defaults() {
        let (kind, z) = ElementKind::editor_default("image").unwrap();
        assert_eq!(z, 2);
        assert_eq!(kind, ElementKind::Image(ImageElement::default()));
        assert!(ElementKind::editor_default("video").is_none());
    }

    #[test]
    fn test_orientation_flip() {
        assert_eq!(Orientation::Landscape.flipped(), Orientation::Portrait);
        assert_eq!(Orientation::Portrait.flipped(), Orientation::Landscape);
    }
}
