//! # oxide-inline-validation
//!
//! Live per-field validation for server-rendered forms.
//!
//! When a bound control loses focus (or, for some widgets, changes), the
//! field's value is sent to the validation view of the form's backend and
//! the returned message is rendered next to the field. Three backends are
//! supported:
//!
//! - **Archetypes**: POST to `<base>/at_validate_field` with `uid`, `fname`
//!   and `value`
//! - **z3c.form**: the whole form submitted to `<action>/@@z3cform_validate_field`
//!   with `fname` and `fset`
//! - **formlib**: the whole form submitted to `<action>/@@formlib_validate_field`
//!   with `fname`
//!
//! Round-trips run on a named serial queue, one at a time, so answers
//! render in the order the fields were left. A failed round-trip leaves the
//! page untouched and frees the queue.
//!
//! The page lives in an [`oxide_page::SharedDocument`]; the network and the
//! timers are injected through the [`Transport`] and [`Scheduler`] traits.
//! [`TokioScheduler`] runs on tokio and, with the `reqwest` feature,
//! [`ReqwestTransport`] talks HTTP.

mod backend;
mod controller;
mod error;
mod options;
mod path;
mod queue;
mod render;
mod request;
mod response;
mod scheduler;
mod transport;

pub use backend::{
    Archetypes, Backend, FieldStrategy, Formlib, ValidationRequest, Z3cForm, ARCHETYPES_ENDPOINT,
    FIELD_BOX_CLASS, FORMLIB_VIEW, PRESSED_BUTTON_MARKER, Z3CFORM_VIEW,
};
pub use controller::{
    Binding, BoundValidation, EventKind, InlineValidation, Trigger, BLUR_SELECTOR,
    PATTERN_CLASS, PICKER_SELECTOR, RELATED_ITEMS_SELECTOR,
};
pub use error::{Result, TransportError, ValidationError};
pub use options::{Options, DEFAULT_SETTLE_DELAY, OPTIONS_ATTR};
pub use path::{append_query, join_url};
pub use queue::{Advance, QueueRegistry, DEFAULT_QUEUE};
pub use render::{ErrorRenderer, ERROR_BOX_CLASS, ERROR_CLASS};
pub use request::{encode_pairs, Method, Request};
pub use response::{Response, ValidationResponse};
pub use scheduler::{Scheduler, TokioScheduler};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{BoxFuture, Transport};
