//! The seam between validation requests and the network.

use std::future::Future;
use std::pin::Pin;

use crate::error::TransportError;
use crate::request::Request;
use crate::response::Response;

/// A boxed future for asynchronous transport and scheduler operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Delivers validation requests.
///
/// Implementations report connection problems as [`TransportError`]; the
/// caller interprets the status and body.
///
/// # Example
///
/// ```
/// use oxide_inline_validation::{BoxFuture, Request, Response, Transport, TransportError};
///
/// struct AlwaysValid;
///
/// impl Transport for AlwaysValid {
///     fn send(&self, _req: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
///         Box::pin(async { Ok(Response::errmsg("")) })
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Sends a request and waits for its response.
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>>;
}

#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::{BoxFuture, Transport};
    use crate::error::TransportError;
    use crate::request::{Method, Request};
    use crate::response::Response;

    /// A [`Transport`] backed by a `reqwest` client.
    ///
    /// URLs must be absolute.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Creates a transport with a default client.
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a transport around an existing client.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            Box::pin(async move {
                let method = match request.method {
                    Method::Get => reqwest::Method::GET,
                    Method::Post => reqwest::Method::POST,
                };
                let mut builder = self.client.request(method, &request.url);
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                if !request.body.is_empty() {
                    builder = builder.body(request.body);
                }

                let response = builder
                    .send()
                    .await
                    .map_err(|e| TransportError::Connection(e.to_string()))?;
                let status = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(k, v)| {
                        v.to_str()
                            .ok()
                            .map(|v| (k.as_str().to_string(), v.to_string()))
                    })
                    .collect();
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| TransportError::Connection(e.to_string()))?
                    .to_vec();

                Ok(Response {
                    status,
                    headers,
                    body,
                })
            })
        }
    }
}
