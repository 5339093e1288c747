//! Backend strategies and the validation round-trip.
//!
//! Each supported form library gets a [`FieldStrategy`] that reads the
//! field's identity off the page and shapes the HTTP request its server-side
//! view expects. The round-trip itself is shared: it runs on a serial queue,
//! renders the returned `errmsg`, and always advances the queue, also when
//! the request fails.

mod archetypes;
mod formlib;
mod z3cform;

pub use archetypes::{Archetypes, ARCHETYPES_ENDPOINT};
pub use formlib::{Formlib, FORMLIB_VIEW};
pub use z3cform::{Z3cForm, PRESSED_BUTTON_MARKER, Z3CFORM_VIEW};

use std::fmt;
use std::sync::{Arc, MutexGuard, PoisonError};

use oxide_page::{Document, FieldValue, NodeId, Selector, SharedDocument};
use tracing::{debug, warn};

use crate::error::{Result, TransportError, ValidationError};
use crate::path::append_query;
use crate::queue::QueueRegistry;
use crate::render::ErrorRenderer;
use crate::request::{encode_pairs, Method, Request};
use crate::response::ValidationResponse;
use crate::scheduler::Scheduler;
use crate::transport::Transport;

/// Class of the container wrapping one field and its error region.
pub const FIELD_BOX_CLASS: &str = "field";

/// The supported form-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Archetypes content types.
    Archetypes,
    /// z3c.form forms.
    Z3cForm,
    /// zope.formlib forms.
    Formlib,
}

impl Backend {
    /// Parses the `type` option value.
    pub fn from_type(name: &str) -> Option<Self> {
        match name {
            "archetypes" => Some(Self::Archetypes),
            "z3c.form" => Some(Self::Z3cForm),
            "formlib" => Some(Self::Formlib),
            _ => None,
        }
    }

    /// Returns the `type` option value naming this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archetypes => "archetypes",
            Self::Z3cForm => "z3c.form",
            Self::Formlib => "formlib",
        }
    }

    /// Returns the strategy implementing this backend.
    pub fn strategy(self) -> &'static dyn FieldStrategy {
        match self {
            Self::Archetypes => &Archetypes,
            Self::Z3cForm => &Z3cForm,
            Self::Formlib => &Formlib,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-specific request construction.
pub trait FieldStrategy: Send + Sync {
    /// Returns the backend this strategy talks to.
    fn backend(&self) -> Backend;

    /// Reads what the request needs from the page at event time.
    ///
    /// Returns `None` when the field cannot be validated (missing identity,
    /// no enclosing form, or a backend-specific veto); nothing is queued
    /// then.
    fn prepare(&self, doc: &Document, input: NodeId) -> Option<ValidationRequest>;

    /// Builds the HTTP request when its turn in the queue comes.
    fn build_request(&self, doc: &Document, request: &ValidationRequest) -> Result<Request>;
}

/// Everything known about one validation at event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Backend the request is for.
    pub backend: Backend,
    /// Field box receiving the result.
    pub field_box: NodeId,
    /// Field name.
    pub fname: String,
    /// Content UID (Archetypes only).
    pub uid: Option<String>,
    /// Field value captured at event time (Archetypes only; the form
    /// backends serialize the whole form when the request is sent).
    pub value: Option<FieldValue>,
    /// Fieldset name (z3c.form only).
    pub fieldset: Option<String>,
    /// Enclosing form (form backends only).
    pub form: Option<NodeId>,
    /// Endpoint URL, derived from the site base or the form action.
    pub endpoint: String,
}

impl ValidationRequest {
    /// Builds the HTTP request through the backend's strategy.
    pub fn to_http(&self, doc: &Document) -> Result<Request> {
        self.backend.strategy().build_request(doc, self)
    }
}

/// Returns the field box wrapping `input` together with its field name.
fn field_identity(doc: &Document, input: NodeId) -> Option<(NodeId, String)> {
    let field_box = doc.closest(input, &Selector::class(FIELD_BOX_CLASS))?;
    let fname = doc
        .element(field_box)
        .ok()?
        .non_empty_attr("data-fieldname")?
        .to_string();
    Some((field_box, fname))
}

/// Returns the form enclosing the field box and the form's action URL.
fn enclosing_form(doc: &Document, field_box: NodeId) -> Option<(NodeId, String)> {
    let form = doc.closest(field_box, &Selector::tag("form"))?;
    let action = doc
        .element(form)
        .ok()?
        .attr("action")
        .unwrap_or_default()
        .to_string();
    Some((form, action))
}

/// Marks a request the way an XMLHttpRequest expecting JSON does.
fn ajax(request: Request) -> Request {
    request
        .header("Accept", "application/json, text/javascript, */*; q=0.01")
        .header("X-Requested-With", "XMLHttpRequest")
}

/// Builds an intercepted submission of the request's form: the serialized
/// form followed by `extra`, sent with the form's own method.
fn form_submission(
    doc: &Document,
    request: &ValidationRequest,
    extra: &[(&str, &str)],
) -> Result<Request> {
    let form = request
        .form
        .ok_or(ValidationError::NoForm(request.field_box))?;
    let method = Method::from_form_attr(doc.element(form)?.attr("method"));

    let fields = doc.serialize_form(form)?;
    let encoded = encode_pairs(
        fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .chain(extra.iter().copied()),
    );

    let http = match method {
        Method::Get => Request::get(append_query(&request.endpoint, &encoded)),
        Method::Post => Request::post(request.endpoint.clone()).form_body(encoded),
    };
    Ok(ajax(http))
}

/// Locks the shared page, recovering from a poisoned lock.
pub(crate) fn lock_page(page: &SharedDocument) -> MutexGuard<'_, Document> {
    page.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The shared machinery every strategy's round-trip runs through.
pub(crate) struct Pipeline {
    pub(crate) page: SharedDocument,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) queues: QueueRegistry,
    pub(crate) queue_name: String,
    pub(crate) renderer: ErrorRenderer,
}

impl Pipeline {
    /// Validates one field with the given backend.
    pub(crate) fn validate(self: &Arc<Self>, backend: Backend, input: NodeId) {
        let prepared = {
            let doc = lock_page(&self.page);
            backend.strategy().prepare(&doc, input)
        };
        let Some(request) = prepared else {
            debug!(backend = %backend, input = %input, "field not validated");
            return;
        };

        debug!(
            backend = %backend,
            fname = %request.fname,
            queue = %self.queue_name,
            "queueing field validation"
        );
        let pipeline = Arc::clone(self);
        self.queues.enqueue(&self.queue_name, move |advance| {
            let scheduler = Arc::clone(&pipeline.scheduler);
            scheduler.spawn(Box::pin(async move {
                pipeline.round_trip(request).await;
                advance.advance();
            }));
        });
    }

    async fn round_trip(&self, request: ValidationRequest) {
        let built = {
            let doc = lock_page(&self.page);
            request.to_http(&doc)
        };
        let http = match built {
            Ok(http) => http,
            Err(err) => {
                warn!(fname = %request.fname, error = %err, "cannot build validation request");
                return;
            }
        };

        debug!(method = %http.method, url = %http.url, fname = %request.fname, "sending validation request");
        let outcome: std::result::Result<ValidationResponse, TransportError> = self
            .transport
            .send(http)
            .await
            .and_then(|response| ValidationResponse::from_response(&response));

        match outcome {
            Ok(result) => {
                debug!(fname = %request.fname, valid = result.is_valid(), "validation result");
                let mut doc = lock_page(&self.page);
                self.renderer.render(&mut doc, request.field_box, &result.errmsg);
            }
            Err(err) => {
                warn!(
                    backend = %request.backend,
                    fname = %request.fname,
                    error = %err,
                    "validation round-trip failed; field left unchanged"
                );
            }
        }
    }
}
