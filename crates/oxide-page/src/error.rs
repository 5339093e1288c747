//! Error types for the page model.

use thiserror::Error;

use crate::node::NodeId;

/// Page-specific errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The node id does not belong to this document.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A selector could not be parsed.
    #[error("invalid selector {selector:?} at offset {offset}: {message}")]
    InvalidSelector {
        selector: String,
        offset: usize,
        message: String,
    },

    /// The node is not the kind of element the operation expects.
    #[error("expected <{expected}>, found <{found}>")]
    WrongElement {
        expected: &'static str,
        found: String,
    },
}

/// Result type alias for page operations.
pub type Result<T> = std::result::Result<T, PageError>;
