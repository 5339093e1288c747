//! Builder for element subtrees.

/// Describes an element subtree to be inserted with
/// [`Document::append`](crate::Document::append).
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) content: Option<String>,
    pub(crate) children: Vec<ElementBuilder>,
}

/// Starts building an element with the given tag.
pub fn el(tag: &str) -> ElementBuilder {
    ElementBuilder::new(tag)
}

impl ElementBuilder {
    /// Creates a new builder.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Creates an `<input>` of the given type.
    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Sets a boolean attribute such as `checked` or `multiple`.
    #[must_use]
    pub fn flag(self, key: impl Into<String>) -> Self {
        self.attr(key, "")
    }

    /// Adds one or more space-separated classes.
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Sets the element's `id`.
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Sets the element's `name`.
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> Self {
        self.attr("name", name)
    }

    /// Sets the element's `value` attribute.
    #[must_use]
    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    /// Sets the inner text or markup.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several child elements.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = ElementBuilder>) -> Self {
        self.children.extend(children);
        self
    }
}
