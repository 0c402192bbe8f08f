//! Client for the Mailchimp Marketing API's list-member endpoints.
//!
//! # Overview
//! Translates subscriber operations into HTTP requests against the
//! datacenter named by the API key, and translates responses back into a
//! typed `Member` or a typed `ApiError`. The HTTP round-trip itself is done by
//! a caller-supplied [`Transport`]; with the default `ureq` feature a
//! `ureq::Agent` can be used directly.
//!
//! # Design
//! - `Client` holds the API key, the base URL and the transport. It is
//!   immutable apart from `set_base_url`.
//! - Each operation has a `build_*` half (no I/O) and shares `parse_member`,
//!   so the request shape can be tested without a network.
//! - Provider errors keep their structure (`ErrorResponse`); unparseable
//!   bodies surface as `ApiError::Decode`.
//!
//! ```no_run
//! use mailchimp_core::{Client, Fields};
//!
//! let agent = ureq::Agent::new_with_defaults();
//! let client = Client::new("0123456789abcdef-us13", &agent)?;
//! let member = client.subscribe("list_id", "john@reese.com", &Fields::new())?;
//! println!("{} is {}", member.id, member.status);
//! # Ok::<(), mailchimp_core::ApiError>(())
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod subscriber;
pub mod types;

pub use client::Client;
pub use error::{decode_error_response, ApiError, ErrorResponse, FieldError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use subscriber::subscriber_hash;
pub use types::{merge_fields, Fields, Member, MemberStatus};
