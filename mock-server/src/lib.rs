use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const STATUSES: &[&str] = &[
    "subscribed",
    "unsubscribed",
    "cleaned",
    "pending",
    "transactional",
    "archived",
];

/// A stored list member.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub email_address: String,
    pub status: String,
    pub list_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Problem-details error body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
}

impl Problem {
    fn new(status: StatusCode, title: &str, detail: &str) -> Self {
        Self {
            kind: "https://mailchimp.com/developer/marketing/docs/errors/".to_string(),
            title: title.to_string(),
            status: status.as_u16(),
            detail: detail.to_string(),
            instance: String::new(),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self),
        )
            .into_response()
    }
}

#[derive(Default)]
pub struct Store {
    /// Keyed by `(list_id, subscriber_hash)`.
    pub members: HashMap<(String, String), Member>,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Store>>,
    /// `None` accepts any non-empty key.
    pub api_key: Option<Arc<str>>,
}

pub fn subscriber_hash(email: &str) -> String {
    hex::encode(Md5::digest(email.to_lowercase().as_bytes()))
}

/// Router accepting any non-empty API key.
pub fn app() -> Router {
    router(AppState {
        db: Arc::default(),
        api_key: None,
    })
}

/// Router accepting only `api_key`.
pub fn app_with_key(api_key: &str) -> Router {
    router(AppState {
        db: Arc::default(),
        api_key: Some(Arc::from(api_key)),
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/3.0/lists/{list_id}/members/{subscriber_hash}",
            put(upsert_member).get(get_member),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Problem> {
    let missing = || {
        Problem::new(
            StatusCode::UNAUTHORIZED,
            "API Key Missing",
            "Your request did not include an API key.",
        )
    };
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or_else(missing)?;
    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(missing)?;
    let (_, key) = decoded.split_once(':').ok_or_else(missing)?;
    if key.is_empty() {
        return Err(missing());
    }
    match &state.api_key {
        Some(expected) if expected.as_ref() != key => Err(Problem::new(
            StatusCode::UNAUTHORIZED,
            "API Key Invalid",
            "Your API key may be invalid, or you've attempted to access the wrong datacenter.",
        )),
        _ => Ok(()),
    }
}

fn invalid(detail: &str) -> Problem {
    Problem::new(StatusCode::BAD_REQUEST, "Invalid Resource", detail)
}

fn status_field(body: &Map<String, Value>, name: &str) -> Result<Option<String>, Problem> {
    match body.get(name) {
        None => Ok(None),
        Some(Value::String(s)) if STATUSES.contains(&s.as_str()) => Ok(Some(s.clone())),
        Some(_) => Err(invalid("The resource submitted could not be validated.")),
    }
}

async fn upsert_member(
    State(state): State<AppState>,
    Path((list_id, hash)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Member>, Problem> {
    authorize(&state, &headers)?;

    let mut body = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(invalid("The request body is not a valid JSON object.")),
    };

    let email = match body.remove("email_address") {
        Some(Value::String(email)) if !email.is_empty() => email,
        _ => return Err(invalid("The resource submitted could not be validated.")),
    };
    if subscriber_hash(&email) != hash {
        return Err(invalid(
            "The subscriber hash in the path does not match the email address.",
        ));
    }
    if body.get("merge_fields").is_some_and(|v| !v.is_object()) {
        return Err(invalid("Your merge fields were invalid."));
    }
    let status = status_field(&body, "status")?;
    let status_if_new = status_field(&body, "status_if_new")?;
    body.remove("status");
    body.remove("status_if_new");
    body.remove("id");
    body.remove("list_id");

    let mut db = state.db.write().await;
    let key = (list_id.clone(), hash.clone());
    let member = match db.members.get_mut(&key) {
        Some(existing) => {
            existing.email_address = email;
            if let Some(status) = status {
                existing.status = status;
            }
            existing.extra.extend(body);
            existing.clone()
        }
        None => {
            let status = status.or(status_if_new).ok_or_else(|| {
                invalid("The resource submitted could not be validated.")
            })?;
            let member = Member {
                id: hash,
                email_address: email,
                status,
                list_id,
                extra: body,
            };
            db.members.insert(key, member.clone());
            member
        }
    };
    tracing::debug!(id = %member.id, status = %member.status, "upserted member");
    Ok(Json(member))
}

async fn get_member(
    State(state): State<AppState>,
    Path((list_id, hash)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Member>, Problem> {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    db.members
        .get(&(list_id, hash))
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            Problem::new(
                StatusCode::NOT_FOUND,
                "Resource Not Found",
                "The requested resource could not be found.",
            )
        })
}
