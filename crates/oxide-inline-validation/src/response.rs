//! HTTP response and validation result types.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// An HTTP response as delivered by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a new response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Creates a response with JSON content.
    pub fn json<T: Serialize>(data: &T) -> Self {
        match serde_json::to_vec(data) {
            Ok(body) => Self {
                status: 200,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body,
            },
            Err(_) => Self::new(500),
        }
    }

    /// Creates a validation answer carrying `errmsg`.
    pub fn errmsg(message: &str) -> Self {
        Self::json(&ValidationResponse {
            errmsg: message.to_string(),
        })
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The answer of a validation endpoint.
///
/// An empty `errmsg` means the value is valid; anything else is the message
/// to show next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Error message, empty when valid.
    pub errmsg: String,
}

impl ValidationResponse {
    /// Interprets an HTTP response.
    ///
    /// Non-2xx statuses, bodies that are not JSON and JSON documents without
    /// a string `errmsg` are all errors; other members are ignored.
    pub fn from_response(response: &Response) -> Result<Self, TransportError> {
        if !response.is_success() {
            return Err(TransportError::Status(response.status));
        }
        serde_json::from_slice(&response.body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Returns whether the value was accepted.
    pub fn is_valid(&self) -> bool {
        self.errmsg.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_and_invalid() {
        let ok = ValidationResponse::from_response(&Response::errmsg("")).unwrap();
        assert!(ok.is_valid());

        let bad = ValidationResponse::from_response(&Response::errmsg("Required")).unwrap();
        assert_eq!(bad.errmsg, "Required");
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_extra_members_ignored() {
        let response = Response::ok().body(r#"{"errmsg": "Too short", "field": "title"}"#);
        let parsed = ValidationResponse::from_response(&response).unwrap();
        assert_eq!(parsed.errmsg, "Too short");
    }

    #[test]
    fn test_unusable_responses() {
        assert_eq!(
            ValidationResponse::from_response(&Response::new(500)),
            Err(TransportError::Status(500))
        );
        for body in ["not json", "{}", r#"{"errmsg": null}"#, r#"{"errmsg": 3}"#] {
            let result = ValidationResponse::from_response(&Response::ok().body(body));
            assert!(
                matches!(result, Err(TransportError::Decode(_))),
                "{body} should not decode"
            );
        }
    }
}
