//! z3c.form strategy.

use oxide_page::{Document, NodeId, Selector};
use tracing::debug;

use super::{enclosing_form, field_identity, form_submission, Backend, FieldStrategy, ValidationRequest};
use crate::error::Result;
use crate::path::join_url;
use crate::request::Request;

/// Form view validating a single z3c.form field.
pub const Z3CFORM_VIEW: &str = "@@z3cform_validate_field";

/// Prefix of z3c.form button names; present in the serialized form only
/// while a submit button is being pressed.
pub const PRESSED_BUTTON_MARKER: &str = "form.buttons.";

/// Validates z3c.form fields by submitting the enclosing form to
/// `<form-action>/@@z3cform_validate_field` with extra `fname` and `fset`.
///
/// `fset` comes from the `data-fieldset` of the closest `<fieldset>` and is
/// sent empty when there is none. While the form is being submitted for
/// real, live validation stays quiet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Z3cForm;

impl FieldStrategy for Z3cForm {
    fn backend(&self) -> Backend {
        Backend::Z3cForm
    }

    fn prepare(&self, doc: &Document, input: NodeId) -> Option<ValidationRequest> {
        let (field_box, fname) = field_identity(doc, input)?;
        let (form, action) = enclosing_form(doc, field_box)?;

        let serialized = doc.serialize_form(form).ok()?;
        let pressed = serialized.iter().any(|(name, value)| {
            name.contains(PRESSED_BUTTON_MARKER) || value.contains(PRESSED_BUTTON_MARKER)
        });
        if pressed {
            debug!(fname = %fname, "form is being submitted, skipping live validation");
            return None;
        }

        let fieldset = doc
            .closest(input, &Selector::tag("fieldset"))
            .and_then(|fs| doc.element(fs).ok())
            .and_then(|fs| fs.attr("data-fieldset"))
            .map(str::to_string);

        Some(ValidationRequest {
            backend: Backend::Z3cForm,
            field_box,
            fname,
            uid: None,
            value: None,
            fieldset,
            form: Some(form),
            endpoint: join_url(&action, Z3CFORM_VIEW),
        })
    }

    fn build_request(&self, doc: &Document, request: &ValidationRequest) -> Result<Request> {
        let fset = request.fieldset.as_deref().unwrap_or_default();
        form_submission(
            doc,
            request,
            &[("fname", request.fname.as_str()), ("fset", fset)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use oxide_page::{el, ElementBuilder};

    fn form() -> ElementBuilder {
        el("form")
            .attr("action", "http://nohost/plone/++add++Document")
            .attr("method", "post")
            .children([
                el("fieldset").attr("data-fieldset", "default").child(
                    el("div")
                        .class("field")
                        .attr("data-fieldname", "form.widgets.IDublinCore.title")
                        .children([
                            ElementBuilder::input("text")
                                .id("title")
                                .name("form.widgets.IDublinCore.title")
                                .value("Welcome to Plone"),
                            el("div").class("fieldErrorBox"),
                        ]),
                ),
                el("div")
                    .class("field")
                    .attr("data-fieldname", "form.widgets.IDublinCore.description")
                    .child(
                        el("textarea")
                            .id("description")
                            .name("form.widgets.IDublinCore.description"),
                    ),
                ElementBuilder::input("submit")
                    .id("save")
                    .name("form.buttons.save")
                    .value("Save"),
            ])
    }

    #[test]
    fn test_request_shape() {
        let (doc, _) = Document::build(form());
        let input = doc.by_id("title").unwrap();

        let request = Z3cForm.prepare(&doc, input).unwrap();
        assert_eq!(request.fieldset.as_deref(), Some("default"));
        assert_eq!(
            request.endpoint,
            "http://nohost/plone/++add++Document/@@z3cform_validate_field"
        );

        let http = request.to_http(&doc).unwrap();
        assert_eq!(http.method, Method::Post);
        let pairs = http.form_pairs();
        assert_eq!(
            pairs[pairs.len() - 2..],
            [
                ("fname".to_string(), "form.widgets.IDublinCore.title".to_string()),
                ("fset".to_string(), "default".to_string()),
            ]
        );
        assert!(pairs.contains(&(
            "form.widgets.IDublinCore.title".to_string(),
            "Welcome to Plone".to_string()
        )));
    }

    #[test]
    fn test_missing_fieldset_sends_empty_fset() {
        let (doc, _) = Document::build(form());
        let input = doc.by_id("description").unwrap();

        let request = Z3cForm.prepare(&doc, input).unwrap();
        assert_eq!(request.fieldset, None);
        let http = request.to_http(&doc).unwrap();
        assert!(http
            .form_pairs()
            .contains(&("fset".to_string(), String::new())));
    }

    #[test]
    fn test_pressed_button_suppresses_validation() {
        let (mut doc, form) = Document::build(form());
        let input = doc.by_id("title").unwrap();
        let save = doc.by_id("save").unwrap();

        doc.press_button(save).unwrap();
        assert!(Z3cForm.prepare(&doc, input).is_none());

        doc.release_button(form);
        assert!(Z3cForm.prepare(&doc, input).is_some());
    }

    #[test]
    fn test_hidden_button_marker_suppresses_validation() {
        let (mut doc, form) = Document::build(form());
        doc.append(
            form,
            ElementBuilder::input("hidden")
                .name("form.buttons.cancel")
                .value("1"),
        )
        .unwrap();
        let input = doc.by_id("title").unwrap();
        assert!(Z3cForm.prepare(&doc, input).is_none());
    }

    #[test]
    fn test_missing_fieldname_skips() {
        let (doc, _) = Document::build(el("form").child(
            el("div")
                .class("field")
                .attr("data-fieldname", "")
                .child(ElementBuilder::input("text").id("title")),
        ));
        let input = doc.by_id("title").unwrap();
        assert!(Z3cForm.prepare(&doc, input).is_none());
    }
}
