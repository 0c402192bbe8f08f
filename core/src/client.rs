//! Request builder, response parser and executor for list-member operations.
//!
//! # Design
//! Every operation is split into a `build_*` method that produces an
//! `HttpRequest` and `parse_member`, which consumes an `HttpResponse`. The
//! convenience methods (`subscribe`, `update_subscription`, `get_member`)
//! run the round-trip through the injected `Transport` in between. Nothing is
//! retried, cached or logged-and-swallowed; every failure is returned.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::{debug, field, info_span};
use url::Url;

use crate::error::{decode_error_response, ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::subscriber::subscriber_hash;
use crate::types::{merge_fields, Fields, Member, MemberStatus};

/// Host suffix of the provider's API; prefixed with the datacenter.
pub const API_DOMAIN: &str = "api.mailchimp.com";

/// Pinned API version path.
pub const API_VERSION: &str = "3.0";

/// Client for one API key's datacenter.
///
/// Holds no mutable state besides the base URL, which only changes through
/// [`Client::set_base_url`].
#[derive(Clone)]
pub struct Client<T> {
    api_key: String,
    datacenter: String,
    base_url: Url,
    transport: T,
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("datacenter", &self.datacenter)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl<T> Client<T> {
    /// Create a client for `api_key`, targeting the datacenter named by the
    /// key's suffix (`<key>-<dc>`). No network call is made.
    ///
    /// Pass `&transport` or an `Arc` to keep ownership of a shared transport.
    ///
    /// # Errors
    /// `ApiError::InvalidApiKey` if the key has no usable datacenter suffix.
    pub fn new(api_key: &str, transport: T) -> Result<Self> {
        let datacenter = parse_datacenter(api_key)?;
        let base_url = Url::parse(&format!("https://{datacenter}.{API_DOMAIN}/{API_VERSION}/"))?;
        Ok(Self {
            api_key: api_key.to_string(),
            datacenter: datacenter.to_string(),
            base_url,
            transport,
        })
    }

    /// Point the client somewhere else, e.g. a test double. A trailing `/` is
    /// added to the path when missing.
    pub fn set_base_url(&mut self, mut base_url: Url) {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upsert request that enrolls a new subscriber but leaves an existing
    /// subscriber's status alone unless `fields` sets `status`.
    ///
    /// Defaults: `email_address = email`, `status_if_new = "subscribed"`.
    pub fn build_subscribe(&self, list_id: &str, email: &str, fields: &Fields) -> Result<HttpRequest> {
        let mut defaults = Fields::new();
        defaults.insert("email_address".to_string(), Value::String(email.to_string()));
        defaults.insert("status_if_new".to_string(), MemberStatus::Subscribed.into());
        self.build_upsert(list_id, email, merge_fields(defaults, fields))
    }

    /// Upsert request that always sets the member's status.
    ///
    /// Defaults: `email_address = email`, `status = "subscribed"`.
    pub fn build_update_subscription(
        &self,
        list_id: &str,
        email: &str,
        fields: &Fields,
    ) -> Result<HttpRequest> {
        let mut defaults = Fields::new();
        defaults.insert("email_address".to_string(), Value::String(email.to_string()));
        defaults.insert("status".to_string(), MemberStatus::Subscribed.into());
        self.build_upsert(list_id, email, merge_fields(defaults, fields))
    }

    pub fn build_get_member(&self, list_id: &str, email: &str) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.member_url(list_id, email)?.into(),
            headers: self.headers(false),
            body: None,
        })
    }

    /// Decode a member response. 2xx bodies become a `Member`; anything else
    /// goes through the provider error decoder.
    pub fn parse_member(&self, response: HttpResponse) -> Result<Member> {
        if !response.is_success() {
            return Err(decode_error_response(&response));
        }
        serde_json::from_str(&response.body).map_err(ApiError::Decode)
    }

    fn build_upsert(&self, list_id: &str, email: &str, payload: Fields) -> Result<HttpRequest> {
        let body = serde_json::to_string(&payload).map_err(ApiError::Encode)?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.member_url(list_id, email)?.into(),
            headers: self.headers(true),
            body: Some(body),
        })
    }

    /// `{base}lists/{list_id}/members/{hash}`, each segment percent-encoded.
    fn member_url(&self, list_id: &str, email: &str) -> Result<Url> {
        let hash = subscriber_hash(email);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["lists", list_id, "members", hash.as_str()]);
        Ok(url)
    }

    fn headers(&self, with_body: bool) -> Vec<(String, String)> {
        let credentials = STANDARD.encode(format!("anystring:{}", self.api_key));
        let mut headers = vec![
            ("authorization".to_string(), format!("Basic {credentials}")),
            ("accept".to_string(), "application/json".to_string()),
        ];
        if with_body {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers
    }
}

impl<T: Transport> Client<T> {
    /// Add `email` to `list_id`, or update an existing member without
    /// touching its status unless `fields` contains `status`.
    ///
    /// # Errors
    /// `Transport` if the round-trip fails, `Response` for provider errors,
    /// `Decode` for bodies that are not the expected JSON.
    pub fn subscribe(&self, list_id: &str, email: &str, fields: &Fields) -> Result<Member> {
        let request = self.build_subscribe(list_id, email, fields)?;
        self.send(&request)
    }

    /// Create or update `email` on `list_id`, setting `status` to
    /// `subscribed` unless `fields` overrides it.
    ///
    /// # Errors
    /// Same as [`Client::subscribe`].
    pub fn update_subscription(&self, list_id: &str, email: &str, fields: &Fields) -> Result<Member> {
        let request = self.build_update_subscription(list_id, email, fields)?;
        self.send(&request)
    }

    /// Fetch the member for `email`. An unknown member is a 404
    /// `ApiError::Response`.
    ///
    /// # Errors
    /// Same as [`Client::subscribe`].
    pub fn get_member(&self, list_id: &str, email: &str) -> Result<Member> {
        let request = self.build_get_member(list_id, email)?;
        self.send(&request)
    }

    fn send(&self, request: &HttpRequest) -> Result<Member> {
        let span = info_span!(
            "member_request",
            http.method = request.method.as_str(),
            http.url = %request.url,
            http.status_code = field::Empty,
        );
        let _guard = span.enter();

        debug!("sending request");
        let response = self.transport.execute(request).map_err(ApiError::Transport)?;
        span.record("http.status_code", response.status);
        debug!(status = response.status, "received response");

        self.parse_member(response)
    }
}

/// Datacenter suffix of an API key: the text after the last `-`.
fn parse_datacenter(api_key: &str) -> Result<&str> {
    let (key, datacenter) = api_key
        .rsplit_once('-')
        .ok_or_else(|| ApiError::InvalidApiKey("missing datacenter suffix".to_string()))?;
    if key.is_empty() {
        return Err(ApiError::InvalidApiKey("empty key".to_string()));
    }
    if datacenter.is_empty() || !datacenter.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::InvalidApiKey(format!(
            "invalid datacenter suffix {datacenter:?}"
        )));
    }
    Ok(datacenter)
}
