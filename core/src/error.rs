//! Error types for the mailing-list client and the provider error decoder.
//!
//! # Design
//! The provider reports business failures as a problem-details JSON body
//! (`type`, `title`, `status`, `detail`). Those decode into `ErrorResponse`
//! and surface as `ApiError::Response`. When the body cannot be decoded, the
//! serde failure itself is returned as `ApiError::Decode`; no placeholder
//! `ErrorResponse` is invented. Transport failures stay separate so callers
//! can tell "the provider said no" from "we never got an answer".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::http::{HttpResponse, TransportError};

/// Crate-wide result alias.
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors returned by `Client`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API key has no `-<datacenter>` suffix.
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    /// A base URL could not be parsed or cannot carry path segments.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The round-trip did not complete.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The request payload could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A response body was not the JSON we expected.
    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    /// The provider rejected the request with a structured error.
    #[error(transparent)]
    Response(#[from] ErrorResponse),
}

impl ApiError {
    /// Provider status code, for `Response` errors only.
    pub fn status(&self) -> Option<u16> {
        self.error_response().map(|e| e.status)
    }

    pub fn error_response(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Response(response) => Some(response),
            _ => None,
        }
    }
}

/// A per-field validation failure attached to some provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub message: String,
}

/// The provider's problem-details error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Problem-type URI.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {} {} ({}).", self.status, self.title, self.detail)
    }
}

impl std::error::Error for ErrorResponse {}

/// Turn a non-2xx response into an error.
///
/// A body matching the problem-details schema becomes `ApiError::Response`;
/// anything else (empty, truncated, not JSON, missing `title`/`status`/
/// `detail`) becomes `ApiError::Decode` carrying the parse failure.
pub fn decode_error_response(response: &HttpResponse) -> ApiError {
    match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(error) => ApiError::Response(error),
        Err(e) => ApiError::Decode(e),
    }
}
