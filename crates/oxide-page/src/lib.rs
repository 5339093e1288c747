//! # oxide-page
//!
//! An in-memory page model for code that observes and annotates forms.
//!
//! This crate provides:
//! - An element tree with live form-control state
//! - Compound CSS-like selectors (`tag`, `.class`, `[attr="v"]`, `:not(..)`)
//! - Ancestor and descendant queries (`closest`, `find`)
//! - Form serialization with pressed-button tracking
//!
//! ## Quick Start
//!
//! ```rust
//! use oxide_page::{el, Document, ElementBuilder, FieldValue, Selector};
//!
//! let (mut doc, form) = Document::build(
//!     el("form").attr("action", "/edit").child(
//!         el("div")
//!             .class("field")
//!             .attr("data-fieldname", "title")
//!             .children([
//!                 ElementBuilder::input("text").id("title").name("title"),
//!                 el("div").class("fieldErrorBox"),
//!             ]),
//!     ),
//! );
//!
//! let input = doc.by_id("title").unwrap();
//! doc.set_value(input, "Hello").unwrap();
//!
//! let field = doc.closest(input, &Selector::class("field")).unwrap();
//! assert_eq!(doc.element(field).unwrap().attr("data-fieldname"), Some("title"));
//! assert_eq!(doc.field_value(input).unwrap(), FieldValue::from("Hello"));
//! assert_eq!(
//!     doc.serialize_form(form).unwrap(),
//!     vec![("title".to_string(), "Hello".to_string())],
//! );
//! ```

mod builder;
mod document;
mod error;
mod node;
mod selector;
mod value;

pub use builder::{el, ElementBuilder};
pub use document::{Document, SharedDocument};
pub use error::{PageError, Result};
pub use node::{Element, NodeId};
pub use selector::Selector;
pub use value::FieldValue;
