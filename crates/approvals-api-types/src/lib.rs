//! Shared request and response types for the approvals backend REST API.
//!
//! Field names follow the backend's camelCase wire format. Only the endpoints
//! the console consumes are modelled here.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

/// The state of a grant as reported by the access handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantStatus {
    Pending,
    Active,
    Error,
    Revoked,
    Expired,
}

impl GrantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GrantStatus::Pending => "PENDING",
            GrantStatus::Active => "ACTIVE",
            GrantStatus::Error => "ERROR",
            GrantStatus::Revoked => "REVOKED",
            GrantStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The review status of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Approved,
    Declined,
    Cancelled,
    Pending,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested access window. A missing start time means "as soon as approved".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTiming {
    pub duration_seconds: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
}

/// Free-form key/value payload attached to an event by an integration.
///
/// Entries keep the order in which they appeared on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedEvent(Vec<(String, String)>);

impl RecordedEvent {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RecordedEvent
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for RecordedEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RecordedEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = RecordedEvent;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of string keys to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, FieldValue(value))) =
                    access.next_entry::<String, FieldValue>()?
                {
                    entries.push((key, value));
                }
                Ok(RecordedEvent(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// A recorded field value. Scalars are kept in their textual form and null
/// becomes an empty string; nested objects and arrays are rejected.
struct FieldValue(String);

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = FieldValue;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a string, number, boolean or null")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(FieldValue(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(FieldValue(value))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
                Ok(FieldValue(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(FieldValue(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(FieldValue(value.to_string()))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Ok(FieldValue(value.to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FieldValue(String::new()))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FieldValue(String::new()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// A single lifecycle event recorded against an access request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_grant_status: Option<GrantStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_grant_status: Option<GrantStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_timing: Option<RequestTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_timing: Option<RequestTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_status: Option<RequestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_status: Option<RequestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_event: Option<RecordedEvent>,
}

impl RequestEvent {
    /// An event carrying no payload fields at all.
    pub fn bare(created_at: OffsetDateTime) -> Self {
        Self {
            id: String::new(),
            request_id: String::new(),
            created_at,
            actor: None,
            grant_created: None,
            request_created: None,
            from_grant_status: None,
            to_grant_status: None,
            grant_failure_reason: None,
            from_timing: None,
            to_timing: None,
            from_status: None,
            to_status: None,
            recorded_event: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestEventsResponse {
    pub events: Vec<RequestEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    pub id: String,
    pub requestor: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGroupsResponse {
    pub groups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfiguration {
    pub identity_provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_event_keeps_wire_order() {
        let raw = r#"{"zeta":"1","alpha":"2","mid":"3"}"#;
        let event: RecordedEvent = serde_json::from_str(raw).expect("valid map");
        let keys: Vec<&str> = event.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(serde_json::to_string(&event).expect("serialize"), raw);
    }

    #[test]
    fn recorded_event_keeps_scalar_values_as_text() {
        let raw = r#"{"code":500,"retry":false,"ratio":0.5,"note":null,"ticket":"OPS-1"}"#;
        let event: RecordedEvent = serde_json::from_str(raw).expect("scalar map");
        let pairs: Vec<(&str, &str)> = event.iter().collect();
        assert_eq!(
            pairs,
            [
                ("code", "500"),
                ("retry", "false"),
                ("ratio", "0.5"),
                ("note", ""),
                ("ticket", "OPS-1"),
            ]
        );
    }

    #[test]
    fn recorded_event_rejects_nested_values() {
        let raw = r#"{"nested":{"a":"b"}}"#;
        assert!(serde_json::from_str::<RecordedEvent>(raw).is_err());
    }

    #[test]
    fn request_event_decodes_camel_case_payload() {
        let raw = r#"{
            "id": "evt_1",
            "requestId": "req_1",
            "createdAt": "2024-03-01T10:00:00Z",
            "actor": "usr_1",
            "fromGrantStatus": "PENDING",
            "toGrantStatus": "ACTIVE"
        }"#;
        let event: RequestEvent = serde_json::from_str(raw).expect("valid event");
        assert_eq!(event.request_id, "req_1");
        assert_eq!(event.actor.as_deref(), Some("usr_1"));
        assert_eq!(event.from_grant_status, Some(GrantStatus::Pending));
        assert_eq!(event.to_grant_status, Some(GrantStatus::Active));
        assert!(event.grant_created.is_none());
        assert!(event.recorded_event.is_none());
    }

    #[test]
    fn timing_without_start_time_decodes() {
        let timing: RequestTiming =
            serde_json::from_str(r#"{"durationSeconds":3600}"#).expect("valid timing");
        assert_eq!(timing.duration_seconds, 3600);
        assert!(timing.start_time.is_none());
    }
}
