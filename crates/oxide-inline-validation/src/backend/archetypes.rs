//! Archetypes strategy.

use oxide_page::{Document, FieldValue, NodeId};

use super::{ajax, field_identity, Backend, FieldStrategy, ValidationRequest};
use crate::error::Result;
use crate::path::{append_query, join_url};
use crate::request::{encode_pairs, Request};

/// Site-level view validating a single Archetypes field.
pub const ARCHETYPES_ENDPOINT: &str = "at_validate_field";

/// Validates Archetypes fields through `<site-base>/at_validate_field`.
///
/// The field box carries `data-uid` and `data-fieldname`; the site base is
/// the page's `<base href>`. The value is read when the event fires and sent
/// in the query string, one `value` pair per selected item. A multi-select
/// with nothing selected still sends an empty `value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Archetypes;

impl FieldStrategy for Archetypes {
    fn backend(&self) -> Backend {
        Backend::Archetypes
    }

    fn prepare(&self, doc: &Document, input: NodeId) -> Option<ValidationRequest> {
        let (field_box, fname) = field_identity(doc, input)?;
        let uid = doc
            .element(field_box)
            .ok()?
            .non_empty_attr("data-uid")?
            .to_string();
        let site = doc.base_href()?;
        let value = doc.field_value(input).ok()?;

        Some(ValidationRequest {
            backend: Backend::Archetypes,
            field_box,
            fname,
            uid: Some(uid),
            value: Some(value),
            fieldset: None,
            form: None,
            endpoint: join_url(site, ARCHETYPES_ENDPOINT),
        })
    }

    fn build_request(&self, _doc: &Document, request: &ValidationRequest) -> Result<Request> {
        let uid = request.uid.as_deref().unwrap_or_default();
        let mut pairs = vec![("uid", uid), ("fname", request.fname.as_str())];
        match &request.value {
            Some(FieldValue::Multiple(values)) if values.is_empty() => pairs.push(("value", "")),
            Some(value) => pairs.extend(value.values().into_iter().map(|v| ("value", v))),
            None => {}
        }

        let url = append_query(&request.endpoint, &encode_pairs(pairs));
        Ok(ajax(Request::post(url)))
    }
}
