//! Error types for inline validation.

use oxide_page::{NodeId, PageError};
use thiserror::Error;

/// Errors raised while binding a controller or building a request.
///
/// Event handling never returns errors; failures there are logged and the
/// field is left untouched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Pattern options could not be parsed as JSON.
    #[error("invalid pattern options: {0}")]
    Options(#[from] serde_json::Error),

    /// A `key: value` pattern option had an unusable value.
    #[error("invalid value for option {key}: {value:?}")]
    InvalidOption { key: String, value: String },

    /// The page model rejected an operation.
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// The bind root is not part of the document.
    #[error("bind root {0} not found")]
    RootNotFound(NodeId),

    /// A form submission was requested for a field outside any form.
    #[error("field box {0} is not inside a form")]
    NoForm(NodeId),
}

/// Failures of a single validation round-trip.
///
/// All of them are swallowed by the validation pipeline: the queue advances
/// and the field's error state is left as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be delivered or no response arrived.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The body is not the expected JSON document.
    #[error("malformed validation response: {0}")]
    Decode(String),
}

/// Result type alias for inline validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;
