//! Element selectors.
//!
//! Supports the compound subset of CSS selectors:
//! - `tag`
//! - `.class`
//! - `[attr]` and `[attr="value"]`
//! - `:not(<selector list>)`
//! - comma-separated selector lists
//!
//! Combinators (descendant, child, sibling) are not supported.

use crate::error::{PageError, Result};
use crate::node::Element;

/// A parsed selector list.
///
/// # Example
///
/// ```
/// use oxide_page::Selector;
///
/// let selector = Selector::parse(
///     r#"input[type="text"]:not(.pattern-pickadate-date, .pattern-pickadate-time), textarea"#,
/// ).unwrap();
/// assert_eq!(selector.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    parts: Vec<Simple>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Class(String),
    Attr { name: String, value: Option<String> },
    Not(Selector),
}

impl Selector {
    /// Parses a selector list.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser {
            source: input,
            chars: input.chars().collect(),
            pos: 0,
        };
        let selector = parser.list()?;
        parser.skip_whitespace();
        if parser.pos < parser.chars.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(selector)
    }

    /// Creates a selector matching a tag name.
    pub fn tag(tag: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                tag: Some(tag.to_ascii_lowercase()),
                parts: Vec::new(),
            }],
        }
    }

    /// Creates a selector matching a class.
    pub fn class(class: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                tag: None,
                parts: vec![Simple::Class(class.to_string())],
            }],
        }
    }

    /// Narrows every alternative to elements that also carry the class.
    #[must_use]
    pub fn and_class(mut self, class: &str) -> Self {
        for compound in &mut self.alternatives {
            compound.parts.push(Simple::Class(class.to_string()));
        }
        self
    }

    /// Returns the number of comma-separated alternatives.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Returns whether the list has no alternatives.
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Returns whether the element matches any alternative.
    pub fn matches(&self, element: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        self.parts.iter().all(|part| match part {
            Simple::Class(class) => element.has_class(class),
            Simple::Attr { name, value: None } => element.has_attr(name),
            Simple::Attr {
                name,
                value: Some(value),
            } => element.attr(name) == Some(value.as_str()),
            Simple::Not(inner) => !inner.matches(element),
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn list(&mut self) -> Result<Selector> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.compound()?);
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
        }
        Ok(Selector { alternatives })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    compound.parts.push(Simple::Class(self.ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    let value = if self.eat('=') {
                        Some(self.attr_value()?)
                    } else {
                        None
                    };
                    self.expect(']')?;
                    compound.parts.push(Simple::Attr { name, value });
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.ident()?;
                    if pseudo != "not" {
                        return Err(self.error("only :not() is supported"));
                    }
                    self.expect('(')?;
                    let inner = self.list()?;
                    self.skip_whitespace();
                    self.expect(')')?;
                    compound.parts.push(Simple::Not(inner));
                }
                _ => break,
            }
        }

        if compound.tag.is_none() && compound.parts.is_empty() {
            return Err(self.error("empty selector"));
        }
        Ok(compound)
    }

    fn attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.expect(quote)?;
                Ok(value)
            }
            _ => self.ident(),
        }
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> PageError {
        PageError::InvalidSelector {
            selector: self.source.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
