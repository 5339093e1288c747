//! The element tree.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::builder::ElementBuilder;
use crate::error::{PageError, Result};
use crate::node::{Element, NodeId};
use crate::selector::Selector;
use crate::value::FieldValue;

/// A document shared between an event loop and asynchronous completions.
pub type SharedDocument = Arc<Mutex<Document>>;

/// An in-memory element tree.
///
/// Nodes are never removed, so a [`NodeId`] stays valid for the lifetime of
/// the document that issued it.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    /// Pressed submit button per form.
    pressed: HashMap<NodeId, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with an `<html>` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("html")],
            pressed: HashMap::new(),
        }
    }

    /// Creates a document holding a single subtree under the root.
    ///
    /// Returns the document and the id of the subtree's top element.
    pub fn build(body: ElementBuilder) -> (Self, NodeId) {
        let mut doc = Self::new();
        let id = doc.insert(doc.root(), body);
        (doc, id)
    }

    /// Wraps the document for shared access.
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    /// Returns the root element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the number of elements, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a document has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an element.
    pub fn element(&self, id: NodeId) -> Result<&Element> {
        self.nodes.get(id.0).ok_or(PageError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.nodes.get_mut(id.0).ok_or(PageError::UnknownNode(id))
    }

    /// Appends a subtree under `parent` and returns the id of its top element.
    pub fn append(&mut self, parent: NodeId, builder: ElementBuilder) -> Result<NodeId> {
        self.element(parent)?;
        Ok(self.insert(parent, builder))
    }

    fn insert(&mut self, parent: NodeId, builder: ElementBuilder) -> NodeId {
        let mut element = Element::new(&builder.tag);
        for (key, value) in builder.attrs {
            if key == "class" {
                for class in value.split_whitespace() {
                    element.add_class(class);
                }
            } else {
                element.attrs.insert(key, value);
            }
        }
        if let Some(content) = builder.content {
            element.content = content;
        }
        element.checked = element.has_attr("checked");
        element.selected = element.has_attr("selected");
        element.value = initial_value(&element);
        element.parent = Some(parent);

        let id = NodeId(self.nodes.len());
        self.nodes.push(element);
        self.nodes[parent.0].children.push(id);
        for child in builder.children {
            self.insert(id, child);
        }
        id
    }

    /// Returns the parent of an element.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|el| el.parent)
    }

    /// Returns the nearest element, starting with `id` itself and walking up,
    /// that matches the selector.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            let element = self.nodes.get(node.0)?;
            if selector.matches(element) {
                return Some(node);
            }
            current = element.parent;
        }
        None
    }

    /// Returns all descendants of `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(element) = self.nodes.get(id.0) else {
            return out;
        };
        let mut stack: Vec<NodeId> = element.children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    /// Returns the descendants of `id` matching the selector.
    pub fn find(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| selector.matches(&self.nodes[node.0]))
            .collect()
    }

    /// Returns every element of the document matching the selector.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        let root = self.root();
        let mut found = Vec::new();
        if selector.matches(&self.nodes[root.0]) {
            found.push(root);
        }
        found.extend(self.find(root, selector));
        found
    }

    /// Looks up an element by its `id` attribute.
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.nodes[node.0].attr("id") == Some(id))
    }

    /// Returns the `href` of the first `<base>` element.
    pub fn base_href(&self) -> Option<&str> {
        self.query_all(&Selector::tag("base"))
            .into_iter()
            .find_map(|node| self.nodes[node.0].attr("href"))
    }

    /// Sets an attribute.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) -> Result<()> {
        self.element_mut(id)?
            .attrs
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Adds a class.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.element_mut(id)?.add_class(class);
        Ok(())
    }

    /// Removes a class.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.element_mut(id)?.remove_class(class);
        Ok(())
    }

    /// Replaces the inner markup.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<()> {
        self.element_mut(id)?.content = markup.to_string();
        Ok(())
    }

    /// Sets the live value of a control.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }

    /// Sets the live checked state of a checkbox or radio button.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<()> {
        self.element_mut(id)?.checked = checked;
        Ok(())
    }

    /// Selects exactly the options of a `<select>` whose values are listed.
    pub fn select_values(&mut self, select: NodeId, values: &[&str]) -> Result<()> {
        self.expect_tag(select, "select")?;
        for option in self.options(select) {
            let value = self.option_value(option);
            self.nodes[option.0].selected = values.contains(&value.as_str());
        }
        Ok(())
    }

    /// Marks a submit button as the one pressed in its enclosing form.
    ///
    /// A button outside any form is ignored.
    pub fn press_button(&mut self, button: NodeId) -> Result<()> {
        self.element(button)?;
        if let Some(form) = self.closest(button, &Selector::tag("form")) {
            self.pressed.insert(form, button);
        }
        Ok(())
    }

    /// Clears the pressed-button marker of a form.
    pub fn release_button(&mut self, form: NodeId) {
        self.pressed.remove(&form);
    }

    /// Returns the pressed submit button of a form.
    pub fn pressed_button(&self, form: NodeId) -> Option<NodeId> {
        self.pressed.get(&form).copied()
    }

    /// Reads the current value of a control.
    ///
    /// Checkboxes report their `value` whatever their checked state; a
    /// `<select multiple>` reports its selected values, possibly none.
    pub fn field_value(&self, id: NodeId) -> Result<FieldValue> {
        let element = self.element(id)?;
        if element.tag() != "select" {
            return Ok(FieldValue::Single(element.value.clone()));
        }

        let options = self.options(id);
        let selected: Vec<String> = options
            .iter()
            .filter(|option| self.nodes[option.0].selected)
            .map(|option| self.option_value(*option))
            .collect();

        if element.multiple() {
            return Ok(FieldValue::Multiple(selected));
        }
        let single = match selected.into_iter().next() {
            Some(value) => value,
            None => options
                .first()
                .map(|first| self.option_value(*first))
                .unwrap_or_default(),
        };
        Ok(FieldValue::Single(single))
    }

    /// Serializes the successful controls of a form into name/value pairs,
    /// in document order.
    ///
    /// Unnamed, disabled and file controls are skipped. Checkboxes and radio
    /// buttons count only when checked, and a submit button only when it is
    /// the form's pressed button.
    pub fn serialize_form(&self, form: NodeId) -> Result<Vec<(String, String)>> {
        self.expect_tag(form, "form")?;
        let pressed = self.pressed_button(form);
        let mut pairs = Vec::new();

        for node in self.descendants(form) {
            let element = &self.nodes[node.0];
            let Some(name) = element.non_empty_attr("name") else {
                continue;
            };
            if element.disabled() {
                continue;
            }

            match element.tag() {
                "input" | "button" => match element.control_type().as_str() {
                    "checkbox" | "radio" => {
                        if element.checked {
                            pairs.push((name.to_string(), element.value.clone()));
                        }
                    }
                    "submit" | "image" => {
                        if pressed == Some(node) {
                            pairs.push((name.to_string(), element.value.clone()));
                        }
                    }
                    "file" | "reset" | "button" => {}
                    _ => pairs.push((name.to_string(), element.value.clone())),
                },
                "textarea" => pairs.push((name.to_string(), element.value.clone())),
                "select" => {
                    for value in self.field_value(node)?.values() {
                        pairs.push((name.to_string(), value.to_string()));
                    }
                }
                _ => {}
            }
        }
        Ok(pairs)
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.find(select, &Selector::tag("option"))
    }

    fn option_value(&self, option: NodeId) -> String {
        let element = &self.nodes[option.0];
        element
            .attr("value")
            .map_or_else(|| element.content.trim().to_string(), str::to_string)
    }

    fn expect_tag(&self, id: NodeId, expected: &'static str) -> Result<()> {
        let element = self.element(id)?;
        if element.tag() == expected {
            Ok(())
        } else {
            Err(PageError::WrongElement {
                expected,
                found: element.tag().to_string(),
            })
        }
    }
}

fn initial_value(element: &Element) -> String {
    match element.tag() {
        "textarea" => element.content.clone(),
        "input" => match element.attr("value") {
            Some(value) => value.to_string(),
            None if matches!(element.control_type().as_str(), "checkbox" | "radio") => {
                "on".to_string()
            }
            None => String::new(),
        },
        _ => element.attr("value").unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{el, ElementBuilder};

    fn sample() -> (Document, NodeId) {
        Document::build(
            el("form")
                .attr("action", "http://nohost/plone/edit")
                .attr("method", "post")
                .children([
                    el("div")
                        .class("field")
                        .attr("data-fieldname", "title")
                        .children([
                            ElementBuilder::input("text")
                                .id("title")
                                .name("form.widgets.title")
                                .value("Welcome"),
                            el("div").class("fieldErrorBox"),
                        ]),
                    el("div").class("field").children([el("select")
                        .id("tags")
                        .name("tags")
                        .flag("multiple")
                        .children([
                            el("option").value("a").text("A"),
                            el("option").value("b").text("B"),
                        ])]),
                    ElementBuilder::input("checkbox")
                        .id("agree")
                        .name("agree"),
                    el("textarea").id("body").name("body").text("Hello"),
                    ElementBuilder::input("text")
                        .id("locked")
                        .name("locked")
                        .flag("disabled"),
                    ElementBuilder::input("submit")
                        .id("save")
                        .name("form.buttons.save")
                        .value("Save"),
                ]),
        )
    }

    #[test]
    fn test_closest_includes_self() {
        let (doc, form) = sample();
        let input = doc.by_id("title").unwrap();
        let field = doc.closest(input, &Selector::class("field")).unwrap();
        assert_eq!(doc.element(field).unwrap().attr("data-fieldname"), Some("title"));
        assert_eq!(doc.closest(form, &Selector::tag("form")), Some(form));
        assert_eq!(doc.closest(input, &Selector::tag("fieldset")), None);
    }

    #[test]
    fn test_find_in_document_order() {
        let (doc, form) = sample();
        let fields = doc.find(form, &Selector::class("field"));
        assert_eq!(fields.len(), 2);
        assert!(fields[0] < fields[1]);
        assert!(doc.find(form, &Selector::tag("form")).is_empty());
    }

    #[test]
    fn test_initial_values() {
        let (doc, _) = sample();
        let body = doc.by_id("body").unwrap();
        assert_eq!(doc.field_value(body).unwrap(), FieldValue::from("Hello"));
        let agree = doc.by_id("agree").unwrap();
        assert_eq!(doc.field_value(agree).unwrap(), FieldValue::from("on"));
    }

    #[test]
    fn test_multi_select_values() {
        let (mut doc, _) = sample();
        let tags = doc.by_id("tags").unwrap();
        assert_eq!(doc.field_value(tags).unwrap(), FieldValue::Multiple(vec![]));

        doc.select_values(tags, &["b"]).unwrap();
        assert_eq!(
            doc.field_value(tags).unwrap(),
            FieldValue::Multiple(vec!["b".to_string()])
        );
    }

    #[test]
    fn test_single_select_defaults_to_first_option() {
        let (doc, select) = Document::build(
            el("select")
                .name("color")
                .children([el("option").text(" red "), el("option").text("blue")]),
        );
        assert_eq!(doc.field_value(select).unwrap(), FieldValue::from("red"));
    }

    #[test]
    fn test_serialize_form() {
        let (mut doc, form) = sample();
        let pairs = doc.serialize_form(form).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("form.widgets.title".to_string(), "Welcome".to_string()),
                ("body".to_string(), "Hello".to_string()),
            ]
        );

        let agree = doc.by_id("agree").unwrap();
        doc.set_checked(agree, true).unwrap();
        let save = doc.by_id("save").unwrap();
        doc.press_button(save).unwrap();
        let pairs = doc.serialize_form(form).unwrap();
        assert!(pairs.contains(&("agree".to_string(), "on".to_string())));
        assert!(pairs.contains(&("form.buttons.save".to_string(), "Save".to_string())));

        doc.release_button(form);
        let pairs = doc.serialize_form(form).unwrap();
        assert!(!pairs.iter().any(|(name, _)| name == "form.buttons.save"));
    }

    #[test]
    fn test_serialize_requires_form() {
        let (doc, _) = sample();
        let input = doc.by_id("title").unwrap();
        assert_eq!(
            doc.serialize_form(input),
            Err(PageError::WrongElement {
                expected: "form",
                found: "input".to_string(),
            })
        );
    }

    #[test]
    fn test_base_href() {
        let mut doc = Document::new();
        assert_eq!(doc.base_href(), None);
        let root = doc.root();
        doc.append(
            root,
            el("head").child(el("base").attr("href", "http://nohost/plone")),
        )
        .unwrap();
        assert_eq!(doc.base_href(), Some("http://nohost/plone"));
    }

    #[test]
    fn test_unknown_node() {
        let mut doc = Document::new();
        let ghost = NodeId(42);
        assert_eq!(doc.element(ghost).unwrap_err(), PageError::UnknownNode(ghost));
        assert!(doc.add_class(ghost, "error").is_err());
        assert!(doc.append(ghost, el("div")).is_err());
    }
}
