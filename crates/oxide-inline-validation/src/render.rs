//! Inline error rendering.

use oxide_page::{Document, NodeId, Selector};
use tracing::warn;

/// Class toggled on a field box holding an invalid value.
pub const ERROR_CLASS: &str = "error";

/// Class of the error display region inside a field box.
pub const ERROR_BOX_CLASS: &str = "fieldErrorBox";

/// Writes validation messages into field boxes.
///
/// The message is inserted as markup, unescaped: the validation endpoint is
/// trusted to send only what it means to show.
#[derive(Debug, Clone)]
pub struct ErrorRenderer {
    marker_class: String,
    region: Selector,
}

impl Default for ErrorRenderer {
    fn default() -> Self {
        Self {
            marker_class: ERROR_CLASS.to_string(),
            region: Selector::tag("div").and_class(ERROR_BOX_CLASS),
        }
    }
}

impl ErrorRenderer {
    /// Creates a renderer with the default error class and region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different class as the invalid marker.
    #[must_use]
    pub fn marker_class(mut self, class: impl Into<String>) -> Self {
        self.marker_class = class.into();
        self
    }

    /// Uses a different selector for the error display region.
    #[must_use]
    pub fn region(mut self, selector: Selector) -> Self {
        self.region = selector;
        self
    }

    /// Shows `message` on the field box, or clears it when empty.
    ///
    /// Rendering the same message twice leaves the same state.
    pub fn render(&self, doc: &mut Document, field_box: NodeId, message: &str) {
        let marked = if message.is_empty() {
            doc.remove_class(field_box, &self.marker_class)
        } else {
            doc.add_class(field_box, &self.marker_class)
        };
        if let Err(err) = marked {
            warn!(field_box = %field_box, error = %err, "cannot render validation result");
            return;
        }

        for region in doc.find(field_box, &self.region) {
            if let Err(err) = doc.set_inner_html(region, message) {
                warn!(region = %region, error = %err, "cannot write error message");
            }
        }
    }
}
