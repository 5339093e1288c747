//! zope.formlib strategy.

use oxide_page::{Document, NodeId};

use super::{enclosing_form, field_identity, form_submission, Backend, FieldStrategy, ValidationRequest};
use crate::error::Result;
use crate::path::join_url;
use crate::request::Request;

/// Form view validating a single formlib field.
pub const FORMLIB_VIEW: &str = "@@formlib_validate_field";

/// Validates formlib fields by submitting the enclosing form to
/// `<form-action>/@@formlib_validate_field` with an extra `fname`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formlib;

impl FieldStrategy for Formlib {
    fn backend(&self) -> Backend {
        Backend::Formlib
    }

    fn prepare(&self, doc: &Document, input: NodeId) -> Option<ValidationRequest> {
        let (field_box, fname) = field_identity(doc, input)?;
        let (form, action) = enclosing_form(doc, field_box)?;

        Some(ValidationRequest {
            backend: Backend::Formlib,
            field_box,
            fname,
            uid: None,
            value: None,
            fieldset: None,
            form: Some(form),
            endpoint: join_url(&action, FORMLIB_VIEW),
        })
    }

    fn build_request(&self, doc: &Document, request: &ValidationRequest) -> Result<Request> {
        form_submission(doc, request, &[("fname", request.fname.as_str())])
    }
}
