//! Editor state: the card being designed plus the current selection.
//!
//! All direct-manipulation operations of the design surface live here so that
//! the HTTP API, the CLI and tests share one implementation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::border::BorderSpec;
use super::types::{
    BackgroundPreset, CanvasSettings, Element, ElementKind, ElementMeta, Template, TextElement,
};
use crate::error::CardpressError;

/// Lowest zoom the editor allows, in percent.
pub const MIN_ZOOM: u32 = 50;
/// Highest zoom the editor allows, in percent.
pub const MAX_ZOOM: u32 = 200;
/// Zoom change per mouse-wheel notch, in percent.
pub const WHEEL_ZOOM_STEP: i64 = 5;
/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: f64 = 10.0;

/// Snap a coordinate to the nearest grid line.
///
/// ```
/// use cardpress::document::editor::snap;
///
/// assert_eq!(snap(14.0, 10), 10.0);
/// assert_eq!(snap(15.0, 10), 20.0);
/// assert_eq!(snap(7.3, 0), 7.3);
/// ```
pub fn snap(value: f64, grid_size: u32) -> f64 {
    if grid_size == 0 {
        return value;
    }
    let grid = grid_size as f64;
    (value / grid).round() * grid
}

/// Clamp a zoom percentage to the supported range.
pub fn clamp_zoom(percent: i64) -> u32 {
    percent.clamp(MIN_ZOOM as i64, MAX_ZOOM as i64) as u32
}

/// Exported editor content (what "Export JSON" writes and "Import" reads).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorData {
    #[serde(default)]
    pub canvas: Option<CanvasSettings>,
    #[serde(default)]
    pub elements: Option<Vec<Element>>,
}

/// The editor: one template and an optional selected element.
#[derive(Debug, Clone)]
pub struct Editor {
    template: Template,
    selected: Option<String>,
    last_id_stamp: i64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Template::default())
    }
}

impl Editor {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            selected: None,
            last_id_stamp: 0,
        }
    }

    /// The starter card the editor opens with: two sample text fields.
    pub fn sample() -> Self {
        let text = |id: &str, label: &str, value: &str, y: f64, size: f64, bold: bool, color: &str| {
            Element {
                id: id.into(),
                x: 150.0,
                y,
                z_index: 1,
                border: BorderSpec::default(),
                kind: ElementKind::Text(TextElement {
                    label: label.into(),
                    value: value.into(),
                    font_size: size,
                    font_weight: (if bold { "bold" } else { "normal" }).into(),
                    color: color.into(),
                    ..Default::default()
                }),
            }
        };
        Self::new(Template {
            canvas: CanvasSettings::default(),
            elements: vec![
                text("name-1", "Name", "John Doe", 80.0, 24.0, true, "#000000"),
                text("id-1", "Employee ID", "EMP-12345", 120.0, 16.0, false, "#333333"),
            ],
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.template.canvas
    }

    pub fn elements(&self) -> &[Element] {
        &self.template.elements
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.template.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut Element, CardpressError> {
        self.template
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CardpressError::NotFound(format!("element '{}'", id)))
    }

    /// Generate a `"{type}-{stamp}"` id that is unique within this editor.
    fn next_id(&mut self, type_name: &str) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut stamp = now.max(self.last_id_stamp + 1);
        while self
            .template
            .elements
            .iter()
            .any(|e| e.id == format!("{}-{}", type_name, stamp))
        {
            stamp += 1;
        }
        self.last_id_stamp = stamp;
        format!("{}-{}", type_name, stamp)
    }

    // ========================================================================
    // CANVAS
    // ========================================================================

    /// Set a single canvas property by its camelCase JSON name.
    pub fn set_canvas_property(&mut self, key: &str, value: Value) -> Result<(), CardpressError> {
        let mut patch = Map::new();
        patch.insert(key.to_string(), value);
        self.template.canvas = merge(&self.template.canvas, &patch)?;
        self.template.canvas.zoom = clamp_zoom(self.template.canvas.zoom as i64);
        Ok(())
    }

    /// Swap width and height and flip the orientation flag.
    pub fn toggle_orientation(&mut self) {
        let canvas = &mut self.template.canvas;
        std::mem::swap(&mut canvas.width, &mut canvas.height);
        canvas.orientation = canvas.orientation.flipped();
    }

    pub fn set_zoom(&mut self, percent: i64) -> u32 {
        self.template.canvas.zoom = clamp_zoom(percent);
        self.template.canvas.zoom
    }

    /// Ctrl + wheel: scrolling down zooms out, up zooms in.
    pub fn zoom_by_wheel(&mut self, delta_y: f64) -> u32 {
        let step = if delta_y > 0.0 {
            -WHEEL_ZOOM_STEP
        } else {
            WHEEL_ZOOM_STEP
        };
        self.set_zoom(self.template.canvas.zoom as i64 + step)
    }

    /// Apply a background preset (image and orientation).
    pub fn apply_preset(&mut self, preset: &BackgroundPreset) {
        self.template.canvas.background_image = Some(preset.background_image.clone());
        self.template.canvas.orientation = preset.orientation;
    }

    // ========================================================================
    // ELEMENTS
    // ========================================================================

    /// Append an element, assigning it a fresh id. Returns the id.
    pub fn add_element(&mut self, x: f64, y: f64, z_index: i64, kind: ElementKind) -> String {
        let id = self.next_id(kind.type_name());
        debug!(id = %id, "adding element");
        self.template.elements.push(Element {
            id: id.clone(),
            x,
            y,
            z_index,
            border: BorderSpec::default(),
            kind,
        });
        id
    }

    /// Add an element of `type_name` with the editor's starter values.
    pub fn add_default(&mut self, type_name: &str) -> Result<String, CardpressError> {
        let (kind, z_index) = ElementKind::editor_default(type_name).ok_or_else(|| {
            CardpressError::Validation(format!("Unknown element type '{}'", type_name))
        })?;
        let (x, y) = match &kind {
            ElementKind::Text(_) => (50.0, 50.0),
            ElementKind::Image(_) => (20.0, 20.0),
            ElementKind::Qr(_) => (300.0, 150.0),
        };
        Ok(self.add_element(x, y, z_index, kind))
    }

    /// Add a labelled text field, stacked below the existing text fields.
    pub fn add_predefined_field(&mut self, label: &str, value: &str) -> String {
        let text_count = self
            .template
            .elements
            .iter()
            .filter(|e| matches!(e.kind, ElementKind::Text(_)))
            .count();
        self.add_element(
            50.0,
            50.0 + text_count as f64 * 30.0,
            TextElement::default_z_index(),
            ElementKind::Text(TextElement {
                label: label.into(),
                value: value.into(),
                ..Default::default()
            }),
        )
    }

    /// Merge a camelCase JSON patch into an element. `id` and `type` are fixed.
    pub fn update_element(&mut self, id: &str, patch: &Map<String, Value>) -> Result<(), CardpressError> {
        let element = self.element_mut(id)?;
        let type_name = element.kind.type_name();
        if let Some(t) = patch.get("type").and_then(Value::as_str)
            && t != type_name
        {
            return Err(CardpressError::Validation(format!(
                "Cannot change element type from '{}' to '{}'",
                type_name, t
            )));
        }
        let mut patch = patch.clone();
        patch.remove("id");
        patch.remove("type");
        let updated = merge::<Element>(&*element, &patch)?;
        *element = updated;
        Ok(())
    }

    /// Remove an element; clears the selection when it pointed at it.
    pub fn delete_element(&mut self, id: &str) -> Result<Element, CardpressError> {
        let index = self
            .template
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CardpressError::NotFound(format!("element '{}'", id)))?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(self.template.elements.remove(index))
    }

    /// Copy an element with a new id, offset down and to the right.
    pub fn duplicate_element(&mut self, id: &str) -> Result<String, CardpressError> {
        let source = self
            .element(id)
            .cloned()
            .ok_or_else(|| CardpressError::NotFound(format!("element '{}'", id)))?;
        let new_id = self.next_id(source.kind.type_name());
        self.template.elements.push(Element {
            id: new_id.clone(),
            x: source.x + DUPLICATE_OFFSET,
            y: source.y + DUPLICATE_OFFSET,
            ..source
        });
        Ok(new_id)
    }

    /// Move an element, snapping to the grid when snapping is on.
    pub fn move_element(&mut self, id: &str, x: f64, y: f64) -> Result<(f64, f64), CardpressError> {
        let (snap_on, grid) = (
            self.template.canvas.snap_to_grid,
            self.template.canvas.grid_size,
        );
        let (x, y) = if snap_on {
            (snap(x, grid), snap(y, grid))
        } else {
            (x, y)
        };
        let element = self.element_mut(id)?;
        element.x = x;
        element.y = y;
        Ok((x, y))
    }

    pub fn clear_all_elements(&mut self) {
        self.template.elements.clear();
        self.selected = None;
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    pub fn select(&mut self, id: &str) -> Result<(), CardpressError> {
        if self.element(id).is_none() {
            return Err(CardpressError::NotFound(format!("element '{}'", id)));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Element> {
        self.selected.as_deref().and_then(|id| self.element(id))
    }

    // ========================================================================
    // IMPORT / EXPORT
    // ========================================================================

    pub fn export_data(&self) -> EditorData {
        EditorData {
            canvas: Some(self.template.canvas.clone()),
            elements: Some(self.template.elements.clone()),
        }
    }

    /// Replace the content. A missing canvas keeps the current one; missing
    /// elements empty the card.
    pub fn import_data(&mut self, data: EditorData) {
        if let Some(canvas) = data.canvas {
            self.template.canvas = canvas;
        }
        self.template.elements = data.elements.unwrap_or_default();
        self.selected = None;
    }

    /// Check the card can be saved.
    pub fn validate_for_save(&self) -> Result<(), CardpressError> {
        super::validate_for_save(&self.template)
    }
}

/// Shallow-merge a JSON object into a serializable value.
fn merge<T>(current: &T, patch: &Map<String, Value>) -> Result<T, CardpressError>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut value = serde_json::to_value(current)?;
    if let Value::Object(obj) = &mut value {
        for (k, v) in patch {
            obj.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value)
        .map_err(|e| CardpressError::Validation(format!("Invalid update: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ImageElement, Orientation};
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sample_has_two_text_fields() {
        let editor = Editor::sample();
        assert_eq!(editor.elements().len(), 2);
        assert_eq!(editor.canvas().width, 323);
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut editor = Editor::default();
        let a = editor.add_default("text").unwrap();
        let b = editor.add_default("text").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("text-"));
        assert_eq!(editor.elements().len(), 2);
        assert!(editor.add_default("video").is_err());
    }

    #[test]
    fn test_add_default_positions() {
        let mut editor = Editor::default();
        let qr = editor.add_default("qr").unwrap();
        let el = editor.element(&qr).unwrap();
        assert_eq!((el.x, el.y, el.z_index), (300.0, 150.0, 3));
    }

    #[test]
    fn test_predefined_fields_stack() {
        let mut editor = Editor::default();
        editor.add_predefined_field("Name", "John Doe");
        let id = editor.add_predefined_field("Email", "john@example.com");
        assert_eq!(editor.element(&id).unwrap().y, 80.0);
    }

    #[test]
    fn test_update_element_merges() {
        let mut editor = Editor::sample();
        editor
            .update_element("name-1", &obj(json!({"x": 12, "fontSize": 30, "color": "#ff0000"})))
            .unwrap();
        let el = editor.element("name-1").unwrap();
        assert_eq!(el.x, 12.0);
        match &el.kind {
            ElementKind::Text(t) => {
                assert_eq!(t.font_size, 30.0);
                assert_eq!(t.color, "#ff0000");
                assert_eq!(t.label, "Name");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_update_cannot_change_id_or_type() {
        let mut editor = Editor::sample();
        editor
            .update_element("name-1", &obj(json!({"id": "other"})))
            .unwrap();
        assert!(editor.element("name-1").is_some());
        let err = editor
            .update_element("name-1", &obj(json!({"type": "qr"})))
            .unwrap_err();
        assert!(matches!(err, CardpressError::Validation(_)));
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let mut editor = Editor::sample();
        let err = editor
            .update_element("name-1", &obj(json!({"fontSize": "huge"})))
            .unwrap_err();
        assert!(matches!(err, CardpressError::Validation(_)));
        assert!(editor.update_element("missing", &Map::new()).is_err());
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut editor = Editor::sample();
        editor.select("name-1").unwrap();
        assert_eq!(editor.selected().unwrap().id, "name-1");
        editor.delete_element("id-1").unwrap();
        assert!(editor.selected().is_some());
        editor.delete_element("name-1").unwrap();
        assert!(editor.selected().is_none());
        assert!(editor.delete_element("name-1").is_err());
    }

    #[test]
    fn test_duplicate_offsets() {
        let mut editor = Editor::sample();
        let copy = editor.duplicate_element("name-1").unwrap();
        let el = editor.element(&copy).unwrap();
        assert_eq!((el.x, el.y), (160.0, 90.0));
        assert!(copy.starts_with("text-"));
        assert_eq!(editor.elements().len(), 3);
    }

    #[test]
    fn test_move_with_snap() {
        let mut editor = Editor::sample();
        assert_eq!(editor.move_element("name-1", 14.0, 26.0).unwrap(), (14.0, 26.0));
        editor
            .set_canvas_property("snapToGrid", json!(true))
            .unwrap();
        assert_eq!(editor.move_element("name-1", 14.0, 26.0).unwrap(), (10.0, 30.0));
    }

    #[test]
    fn test_toggle_orientation() {
        let mut editor = Editor::default();
        editor.toggle_orientation();
        assert_eq!(editor.canvas().width, 204);
        assert_eq!(editor.canvas().height, 323);
        assert_eq!(editor.canvas().orientation, Orientation::Portrait);
        editor.toggle_orientation();
        assert_eq!(editor.canvas().width, 323);
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut editor = Editor::default();
        assert_eq!(editor.set_zoom(500), MAX_ZOOM);
        assert_eq!(editor.set_zoom(-10), MIN_ZOOM);
        editor.set_zoom(100);
        assert_eq!(editor.zoom_by_wheel(1.0), 95);
        assert_eq!(editor.zoom_by_wheel(-3.0), 100);
        editor.set_zoom(200);
        assert_eq!(editor.zoom_by_wheel(-1.0), 200);
        editor
            .set_canvas_property("zoom", json!(10))
            .unwrap();
        assert_eq!(editor.canvas().zoom, MIN_ZOOM);
    }

    #[test]
    fn test_apply_preset() {
        let mut editor = Editor::default();
        let preset = &BackgroundPreset::built_in()[0];
        editor.apply_preset(preset);
        assert_eq!(
            editor.canvas().background_image.as_deref(),
            Some("templates/corporate-blue.png")
        );
    }

    #[test]
    fn test_import_export() {
        let mut editor = Editor::sample();
        editor.select("name-1").unwrap();
        let exported = editor.export_data();

        let mut other = Editor::default();
        other.import_data(exported);
        assert_eq!(other.elements().len(), 2);

        other.import_data(EditorData {
            canvas: None,
            elements: None,
        });
        assert!(other.elements().is_empty());
        assert_eq!(other.canvas().width, 323);
        assert!(other.selected().is_none());
    }

    #[test]
    fn test_validate_for_save() {
        let mut editor = Editor::default();
        assert!(editor.validate_for_save().is_err());
        editor.add_element(
            0.0,
            0.0,
            2,
            ElementKind::Image(ImageElement::default()),
        );
        assert!(editor.validate_for_save().is_ok());
        editor.clear_all_elements();
        assert!(editor.elements().is_empty());
    }
}
