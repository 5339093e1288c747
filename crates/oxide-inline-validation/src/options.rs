//! Pattern options.

use std::time::Duration;

use oxide_page::{Document, NodeId};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Result, ValidationError};
use crate::queue::DEFAULT_QUEUE;

/// Attribute on the bound root holding the options.
pub const OPTIONS_ATTR: &str = "data-pat-inlinevalidation";

/// Default settle delay for date and time pickers.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Options of a bound controller.
///
/// Read from the root's [`OPTIONS_ATTR`] either as JSON
/// (`{"type": "z3c.form"}`) or as `key: value` pairs separated by `;`
/// (`type: z3c.form; settle_delay_ms: 300`).
///
/// # Example
///
/// ```
/// use oxide_inline_validation::{Backend, Options};
///
/// let options = Options::parse(r#"{"type": "formlib"}"#).unwrap();
/// assert_eq!(options.backend(), Some(Backend::Formlib));
///
/// let options = Options::parse("type: plone.app.other").unwrap();
/// assert_eq!(options.backend(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Backend name: `archetypes`, `z3c.form` or `formlib`.
    ///
    /// A JSON `type` that is not a string is kept as its JSON text and so
    /// names no backend.
    #[serde(rename = "type", deserialize_with = "lenient_type")]
    pub backend_type: Option<String>,
    /// Delay between a picker's change event and the validation dispatch.
    pub settle_delay_ms: u64,
    /// Serial queue the round-trips run on.
    pub queue: String,
}

fn lenient_type<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(name) => Some(name),
        other => Some(other.to_string()),
    })
}

impl Default for Options {
    fn default() -> Self {
        Self {
            backend_type: None,
            settle_delay_ms: u64::try_from(DEFAULT_SETTLE_DELAY.as_millis()).unwrap_or(200),
            queue: DEFAULT_QUEUE.to_string(),
        }
    }
}

impl Options {
    /// Creates default options: no backend, 200ms settle delay, default queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options in either supported syntax.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            return Ok(serde_json::from_str(trimmed)?);
        }

        let mut options = Self::default();
        for pair in trimmed.split(';') {
            let Some((key, value)) = pair.split_once(':') else {
                if pair.trim().is_empty() {
                    continue;
                }
                return Err(ValidationError::InvalidOption {
                    key: pair.trim().to_string(),
                    value: String::new(),
                });
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "type" => options.backend_type = Some(value.to_string()),
                "settle_delay_ms" => {
                    options.settle_delay_ms =
                        value.parse().map_err(|_| ValidationError::InvalidOption {
                            key: key.to_string(),
                            value: value.to_string(),
                        })?;
                }
                "queue" => options.queue = value.to_string(),
                _ => {}
            }
        }
        Ok(options)
    }

    /// Reads the options of a bind root; a root without the attribute gets
    /// the defaults.
    pub fn from_root(doc: &Document, root: NodeId) -> Result<Self> {
        match doc.element(root)?.attr(OPTIONS_ATTR) {
            Some(raw) => Self::parse(raw),
            None => Ok(Self::default()),
        }
    }

    /// Sets the backend name.
    #[must_use]
    pub fn backend_type(mut self, name: impl Into<String>) -> Self {
        self.backend_type = Some(name.into());
        self
    }

    /// Sets the picker settle delay.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the serial queue name.
    #[must_use]
    pub fn queue(mut self, name: impl Into<String>) -> Self {
        self.queue = name.into();
        self
    }

    /// Returns the configured backend, if the name is recognized.
    pub fn backend(&self) -> Option<Backend> {
        self.backend_type.as_deref().and_then(Backend::from_type)
    }

    /// Returns the picker settle delay.
    pub fn settle_delay_duration(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
