//! Drag placement of elements on the canvas.
//!
//! ```text
//! begin(pointer, element_pos)  → offset = pointer/zoom − element_pos
//! update(pointer)              → clamp(pointer/zoom − offset, 0, canvas − element)
//! end()                        → Editor::move_element (grid snap happens here)
//! ```
//!
//! Pointer coordinates are in screen pixels relative to the canvas origin;
//! they are divided by the zoom scale so the element follows the cursor at
//! any zoom level.

use super::editor::Editor;
use crate::error::CardpressError;

/// An in-progress drag of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    element_id: String,
    offset: (f64, f64),
    bounds: (f64, f64),
    zoom_scale: f64,
    current: (f64, f64),
}

impl DragSession {
    /// Start dragging `element_id`.
    ///
    /// `element_size` is the rendered box size (see
    /// [`measure_element`](crate::render::measure_element)); the element is
    /// kept fully inside the canvas while dragging.
    pub fn begin(
        editor: &Editor,
        element_id: &str,
        pointer: (f64, f64),
        element_size: (f64, f64),
    ) -> Result<Self, CardpressError> {
        let element = editor
            .element(element_id)
            .ok_or_else(|| CardpressError::NotFound(format!("element '{}'", element_id)))?;
        let canvas = editor.canvas();
        let zoom_scale = (canvas.zoom.max(1) as f64) / 100.0;
        let pointer = (pointer.0 / zoom_scale, pointer.1 / zoom_scale);

        Ok(Self {
            element_id: element_id.to_string(),
            offset: (pointer.0 - element.x, pointer.1 - element.y),
            bounds: (
                (canvas.width as f64 - element_size.0).max(0.0),
                (canvas.height as f64 - element_size.1).max(0.0),
            ),
            zoom_scale,
            current: (element.x, element.y),
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Position the element would have right now.
    pub fn position(&self) -> (f64, f64) {
        self.current
    }

    /// Follow the pointer, clamped to the canvas.
    pub fn update(&mut self, pointer: (f64, f64)) -> (f64, f64) {
        let x = pointer.0 / self.zoom_scale - self.offset.0;
        let y = pointer.1 / self.zoom_scale - self.offset.1;
        self.current = (x.clamp(0.0, self.bounds.0), y.clamp(0.0, self.bounds.1));
        self.current
    }

    /// Release: commit the last position to the editor. Returns the final
    /// (possibly grid-snapped) position.
    pub fn end(self, editor: &mut Editor) -> Result<(f64, f64), CardpressError> {
        editor.move_element(&self.element_id, self.current.0, self.current.1)
    }
}
