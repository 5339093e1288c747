//! Element nodes.

use std::collections::HashMap;
use std::fmt;

/// Identifier of an element inside a [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the raw index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single element of the page.
///
/// Attributes are kept as written, except `class`, which is split into the
/// class list. Form-control state (`value`, `checked`, `selected`) lives in
/// separate properties that start out from the matching attributes and can
/// then change independently, the way a browser's live properties do.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) classes: Vec<String>,
    pub(crate) content: String,
    pub(crate) value: String,
    pub(crate) checked: bool,
    pub(crate) selected: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Element {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: HashMap::new(),
            classes: Vec::new(),
            content: String::new(),
            value: String::new(),
            checked: false,
            selected: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Returns an attribute value, treating an empty value as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    /// Returns whether the attribute is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Returns the class list.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns whether the element carries the class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Returns the inner markup.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the live value property.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the live checked property.
    pub fn checked(&self) -> bool {
        self.checked
    }

    /// Returns the live selected property of an `<option>`.
    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Returns whether the control is disabled.
    pub fn disabled(&self) -> bool {
        self.has_attr("disabled")
    }

    /// Returns whether a `<select>` accepts several values.
    pub fn multiple(&self) -> bool {
        self.has_attr("multiple")
    }

    /// Returns the control type used for form serialization.
    ///
    /// `<input>` without a `type` is a text input and `<button>` without one
    /// is a submit button.
    pub fn control_type(&self) -> String {
        let default = match self.tag.as_str() {
            "button" => "submit",
            "input" => "text",
            other => other,
        };
        self.attr("type")
            .map_or_else(|| default.to_string(), str::to_ascii_lowercase)
    }

    /// Returns the parent element.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the child elements.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub(crate) fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}
