//! HTTP transport types and the injected transport seam.
//!
//! # Design
//! Requests and responses are plain data. `Client` builds `HttpRequest`
//! values and parses `HttpResponse` values; the actual I/O happens behind the
//! [`Transport`] trait, which the caller supplies. Connection pooling, TLS,
//! proxies, timeouts and cancellation all belong to the transport.
//!
//! A transport must hand non-2xx responses back as data. Only failures to
//! complete the round-trip (refused connection, TLS, timeout) are errors.

use std::sync::Arc;

/// Boxed cause of a failed round-trip, produced by a [`Transport`].
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `Client::build_*` methods. `url` is absolute.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one request/response round-trip.
///
/// Implementations must be safe to share if the `Client` is shared; the
/// client adds no synchronization of its own.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// `ureq` agents as a transport.
///
/// The agent's own `http_status_as_error` setting is overridden per request so
/// 4xx/5xx bodies reach the error decoder.
#[cfg(feature = "ureq")]
impl Transport for ureq::Agent {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.get(&request.url), &request.headers)
                .config()
                .http_status_as_error(false)
                .build()
                .call()?,
            (HttpMethod::Put, Some(body)) => with_headers(self.put(&request.url), &request.headers)
                .config()
                .http_status_as_error(false)
                .build()
                .send(body.as_bytes())?,
            (HttpMethod::Put, None) => with_headers(self.put(&request.url), &request.headers)
                .config()
                .http_status_as_error(false)
                .build()
                .send_empty()?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(feature = "ureq")]
fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
