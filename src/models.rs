//! Wire types exchanged with the PC builder service.
//!
//! Everything here is produced by the service; the client only assembles or
//! replaces these values and never recomputes their content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Sessions & messages
// ============================================================================

/// One conversation thread as listed by `GET /api/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A message stamped with the client clock.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// `GET /api/sessions/{id}`: session fields plus its transcript and latest build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub build: Option<Build>,
}

// ============================================================================
// Builds
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPart {
    pub id: String,
    pub category: String,
    pub name: String,
    #[serde(rename = "price_usd", alias = "price")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A priced set of parts. `total` is the service's figure and is never
/// recomputed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    #[serde(default)]
    pub parts: Vec<BuildPart>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub total: f64,
}

impl Build {
    /// Tax amount for display, derived from the subtotal rather than `total`.
    pub fn tax_amount(&self) -> f64 {
        self.subtotal * self.tax_rate
    }
}

// ============================================================================
// Chat turn
// ============================================================================

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn<'a> {
    pub session_id: Option<&'a str>,
    pub message: &'a str,
}

/// `POST /api/chat` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
    #[serde(default)]
    pub build: Option<Build>,
}

/// `GET /health` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ============================================================================
// Serde helpers
// ============================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// ISO-8601 timestamps with or without an offset. Offset-less values are UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_naive_timestamp_is_read_as_utc() {
        let dt = timestamp::parse("2025-03-01T10:15:30.123456").unwrap();
        assert_eq!(
            dt.timestamp(),
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap().timestamp()
        );
    }

    #[test]
    fn test_offset_timestamp_is_normalized() {
        let dt = timestamp::parse("2025-03-01T12:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        assert!(timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn test_session_detail_from_service_json() {
        let json = r#"{
            "id": "s1",
            "title": null,
            "created_at": "2025-03-01T10:00:00",
            "updated_at": "2025-03-01T10:05:00",
            "messages": [
                {"role": "user", "content": "hi", "created_at": "2025-03-01T10:00:01"},
                {"role": "assistant", "content": "hello", "created_at": "2025-03-01T10:00:02"}
            ],
            "build": {
                "id": "b1",
                "parts": [
                    {"id": "p1", "category": "CPU", "name": "X", "price_usd": 300.0},
                    {"id": "p2", "category": "GPU", "name": "Y", "price_usd": 700.0, "link": null}
                ],
                "subtotal": 1000.0,
                "tax_rate": 0.08,
                "total": 1080.0
            }
        }"#;
        let detail: SessionDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.title, "");
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[0].role, Role::User);
        assert_eq!(detail.messages[1].role, Role::Assistant);
        let build = detail.build.unwrap();
        assert_eq!(build.parts[0].price, 300.0);
        assert_eq!(build.parts[1].link, None);
    }

    #[test]
    fn test_part_accepts_plain_price_alias() {
        let part: BuildPart = serde_json::from_str(
            r#"{"id":"p","category":"RAM","name":"Z","price":89.99,"link":"https://x.test/z"}"#,
        )
        .unwrap();
        assert_eq!(part.price, 89.99);
        assert_eq!(part.link.as_deref(), Some("https://x.test/z"));
    }

    #[test]
    fn test_chat_turn_serializes_null_session() {
        let body = serde_json::to_value(ChatTurn { session_id: None, message: "hi" }).unwrap();
        assert_eq!(body, serde_json::json!({ "session_id": null, "message": "hi" }));
    }

    #[test]
    fn test_chat_reply_without_build() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"session_id":"s1","reply":"ok","build":null}"#).unwrap();
        assert!(reply.build.is_none());
    }

    #[test]
    fn test_tax_amount_uses_subtotal() {
        let build = Build {
            id: "b".into(),
            parts: vec![],
            subtotal: 1000.0,
            tax_rate: 0.08,
            total: 1234.0,
        };
        assert!((build.tax_amount() - 80.0).abs() < 1e-9);
    }
}
