//! Per-user field values that fill a template at render time.
//!
//! Text and QR elements are keyed by their label; image elements by their id
//! (labels are not unique for photos). A value that is absent falls back to
//! the template's own placeholder.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::types::{Element, ElementKind, QrElement, Template};

/// Field values for one card holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(pub BTreeMap<String, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The values a fresh data-entry form starts with: every text and QR
    /// field pre-filled from the template, every photo empty.
    pub fn initial(template: &Template) -> Self {
        let mut values = FieldValues::new();
        for element in &template.elements {
            match &element.kind {
                ElementKind::Text(t) => {
                    values.set(t.label.clone(), t.value.clone());
                }
                ElementKind::Qr(q) => {
                    values.set(qr_key(element, q).to_string(), q.data.clone());
                }
                ElementKind::Image(_) => {}
            }
        }
        values
    }

    /// Build from a stored `userData` object. Strings are taken as-is,
    /// numbers and booleans are stringified, null/arrays/objects skipped.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let mut values = FieldValues::new();
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            values.set(key.clone(), text);
        }
        values
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text shown by a text element: the field value when present (even if
    /// empty), otherwise the placeholder.
    pub fn text_for<'a>(&'a self, label: &str, placeholder: &'a str) -> &'a str {
        self.get(label).unwrap_or(placeholder)
    }

    /// Image source for an image element: a non-empty field value, otherwise
    /// the template's `src`.
    pub fn image_for<'a>(&'a self, element: &'a Element) -> Option<&'a str> {
        let ElementKind::Image(image) = &element.kind else {
            return None;
        };
        self.get(&element.id)
            .filter(|s| !s.is_empty())
            .or_else(|| image.src.as_deref().filter(|s| !s.is_empty()))
    }

    /// Data encoded by a QR element: a non-empty field value, otherwise the
    /// template's `data`.
    pub fn qr_for<'a>(&'a self, element: &'a Element) -> Option<&'a str> {
        let ElementKind::Qr(qr) = &element.kind else {
            return None;
        };
        self.get(qr_key(element, qr))
            .filter(|s| !s.is_empty())
            .or(Some(qr.data.as_str()))
    }
}

/// Field-value key of a QR element.
pub fn qr_key<'a>(element: &'a Element, qr: &'a QrElement) -> &'a str {
    qr.label
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or(&element.id)
}

/// A form field the print page should ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Key in [`FieldValues`].
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// `text`, `image` or `qr`.
    pub kind: &'static str,
    pub placeholder: Option<String>,
}

/// The data-entry form for a template, in document order.
pub fn describe_fields(template: &Template) -> Vec<FieldDescriptor> {
    let mut photo_index = 0;
    template
        .elements
        .iter()
        .map(|element| match &element.kind {
            ElementKind::Text(t) => FieldDescriptor {
                key: t.label.clone(),
                label: t.label.clone(),
                kind: "text",
                placeholder: Some(t.value.clone()),
            },
            ElementKind::Image(image) => {
                photo_index += 1;
                FieldDescriptor {
                    key: element.id.clone(),
                    label: format!("Photo {}", photo_index),
                    kind: "image",
                    placeholder: image.src.clone(),
                }
            }
            ElementKind::Qr(q) => FieldDescriptor {
                key: qr_key(element, q).to_string(),
                label: "QR Code Data".to_string(),
                kind: "qr",
                placeholder: Some(q.data.clone()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BorderSpec, ImageElement, TextElement};
    use serde_json::json;

    fn element(id: &str, kind: ElementKind) -> Element {
        Element {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            z_index: 1,
            border: BorderSpec::default(),
            kind,
        }
    }

    fn sample() -> Template {
        Template {
            elements: vec![
                element(
                    "name-1",
                    ElementKind::Text(TextElement {
                        label: "Name".into(),
                        value: "John Doe".into(),
                        ..Default::default()
                    }),
                ),
                element(
                    "image-1",
                    ElementKind::Image(ImageElement {
                        src: Some("default.png".into()),
                        ..Default::default()
                    }),
                ),
                element(
                    "qr-1",
                    ElementKind::Qr(QrElement {
                        data: "https://example.com".into(),
                        ..Default::default()
                    }),
                ),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_values() {
        let values = FieldValues::initial(&sample());
        assert_eq!(values.get("Name"), Some("John Doe"));
        assert_eq!(values.get("qr-1"), Some("https://example.com"));
        assert_eq!(values.get("image-1"), None);
    }

    #[test]
    fn test_text_resolution() {
        let mut values = FieldValues::new();
        assert_eq!(values.text_for("Name", "John Doe"), "John Doe");
        values.set("Name", "");
        assert_eq!(values.text_for("Name", "John Doe"), "");
        values.set("Name", "Ada");
        assert_eq!(values.text_for("Name", "John Doe"), "Ada");
    }

    #[test]
    fn test_image_resolution() {
        let template = sample();
        let image = &template.elements[1];
        let mut values = FieldValues::new();
        assert_eq!(values.image_for(image), Some("default.png"));
        values.set("image-1", "");
        assert_eq!(values.image_for(image), Some("default.png"));
        values.set("image-1", "data:image/png;base64,AAAA");
        assert_eq!(values.image_for(image), Some("data:image/png;base64,AAAA"));
        assert_eq!(values.image_for(&template.elements[0]), None);
    }

    #[test]
    fn test_qr_resolution() {
        let template = sample();
        let qr = &template.elements[2];
        let mut values = FieldValues::new();
        assert_eq!(values.qr_for(qr), Some("https://example.com"));
        values.set("qr-1", "EMP-1");
        assert_eq!(values.qr_for(qr), Some("EMP-1"));
    }

    #[test]
    fn test_from_json_skips_non_scalars() {
        let map = json!({"Name": "Ada", "Age": 36, "Active": true, "photo": null, "tags": []});
        let values = FieldValues::from_json(map.as_object().unwrap());
        assert_eq!(values.get("Name"), Some("Ada"));
        assert_eq!(values.get("Age"), Some("36"));
        assert_eq!(values.get("Active"), Some("true"));
        assert_eq!(values.get("photo"), None);
        assert_eq!(values.0.len(), 3);
    }

    #[test]
    fn test_describe_fields() {
        let fields = describe_fields(&sample());
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].key, "Name");
        assert_eq!(fields[1].label, "Photo 1");
        assert_eq!(fields[1].kind, "image");
        assert_eq!(fields[2].key, "qr-1");
    }
}
