//! Member DTOs and the caller field bag.
//!
//! # Design
//! The provider's member resource has dozens of fields and grows new ones
//! without notice. `Member` types only what callers branch on (`id`,
//! `status`) and keeps every other top-level key in `extra`, so unknown fields
//! survive a decode/encode cycle untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value bag of member attributes, ordered by field name.
pub type Fields = Map<String, Value>;

/// Subscription state of a list member.
///
/// Unknown wire values decode into `Other` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberStatus {
    Subscribed,
    Unsubscribed,
    Cleaned,
    Pending,
    Transactional,
    Archived,
    Other(String),
}

impl MemberStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MemberStatus::Subscribed => "subscribed",
            MemberStatus::Unsubscribed => "unsubscribed",
            MemberStatus::Cleaned => "cleaned",
            MemberStatus::Pending => "pending",
            MemberStatus::Transactional => "transactional",
            MemberStatus::Archived => "archived",
            MemberStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for MemberStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "subscribed" => MemberStatus::Subscribed,
            "unsubscribed" => MemberStatus::Unsubscribed,
            "cleaned" => MemberStatus::Cleaned,
            "pending" => MemberStatus::Pending,
            "transactional" => MemberStatus::Transactional,
            "archived" => MemberStatus::Archived,
            _ => MemberStatus::Other(raw),
        }
    }
}

impl From<&str> for MemberStatus {
    fn from(raw: &str) -> Self {
        MemberStatus::from(raw.to_string())
    }
}

impl From<MemberStatus> for String {
    fn from(status: MemberStatus) -> Self {
        match status {
            MemberStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl From<MemberStatus> for Value {
    fn from(status: MemberStatus) -> Self {
        Value::String(status.into())
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list member as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Subscriber identifier (lower-case email MD5, hex).
    pub id: String,
    pub status: MemberStatus,
    /// Every other top-level field of the response.
    #[serde(flatten)]
    pub extra: Fields,
}

impl Member {
    pub fn email_address(&self) -> Option<&str> {
        self.extra.get("email_address").and_then(Value::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Merge caller `fields` over `defaults`. For a key present in both, the
/// caller's value wins.
pub fn merge_fields(defaults: Fields, fields: &Fields) -> Fields {
    let mut merged = defaults;
    for (key, value) in fields {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn member_keeps_unknown_fields() {
        let member: Member = serde_json::from_str(
            r#"{"id":"abc","status":"pending","email_address":"a@b.c","merge_fields":{"FNAME":"Ann"}}"#,
        )
        .unwrap();
        assert_eq!(member.id, "abc");
        assert_eq!(member.status, MemberStatus::Pending);
        assert_eq!(member.email_address(), Some("a@b.c"));
        assert_eq!(member.field("merge_fields"), Some(&json!({"FNAME":"Ann"})));
        assert!(member.field("id").is_none());

        let back = serde_json::to_value(&member).unwrap();
        assert_eq!(
            back,
            json!({"id":"abc","status":"pending","email_address":"a@b.c","merge_fields":{"FNAME":"Ann"}})
        );
    }

    #[test]
    fn member_requires_id_and_status() {
        assert!(serde_json::from_str::<Member>(r#"{"status":"subscribed"}"#).is_err());
        assert!(serde_json::from_str::<Member>(r#"{"id":"abc"}"#).is_err());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let member: Member =
            serde_json::from_str(r#"{"id":"abc","status":"quarantined"}"#).unwrap();
        assert_eq!(member.status, MemberStatus::Other("quarantined".to_string()));
        assert_eq!(serde_json::to_value(&member.status).unwrap(), json!("quarantined"));
    }

    #[test]
    fn known_statuses_use_wire_names() {
        for status in [
            MemberStatus::Subscribed,
            MemberStatus::Unsubscribed,
            MemberStatus::Cleaned,
            MemberStatus::Pending,
            MemberStatus::Transactional,
            MemberStatus::Archived,
        ] {
            assert_eq!(MemberStatus::from(status.as_str()), status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(Value::from(MemberStatus::Subscribed), json!("subscribed"));
    }

    #[test]
    fn caller_fields_override_defaults() {
        let defaults = fields(json!({"email_address":"john@reese.com","status":"subscribed"}));
        let caller = fields(json!({"email_address":"another@email.com","merge_fields":{"LNAME":"Reese"}}));

        let merged = merge_fields(defaults, &caller);
        assert_eq!(
            Value::Object(merged),
            json!({
                "email_address":"another@email.com",
                "status":"subscribed",
                "merge_fields":{"LNAME":"Reese"}
            })
        );
    }

    #[test]
    fn empty_caller_fields_keep_defaults() {
        let defaults = fields(json!({"status_if_new":"subscribed"}));
        let merged = merge_fields(defaults.clone(), &Fields::new());
        assert_eq!(merged, defaults);
    }
}
