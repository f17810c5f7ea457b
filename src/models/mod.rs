// src/models/mod.rs

pub mod chat;
pub mod experiment;
pub mod monitoring;
pub mod reagent;
pub mod user;

pub use chat::*;
pub use experiment::*;
pub use monitoring::*;
pub use reagent::*;
pub use user::*;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ==================== COMMON / SHARED ====================

/// Amount with unit, e.g. `{"value": 50, "unit": "ml"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Quantity {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl Quantity {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value: Some(value),
            unit: Some(unit.to_string()),
        }
    }

    pub fn ml(value: f64) -> Self {
        Self::new(value, "ml")
    }
}

/// Cursor-paginated list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub next_cursor: Option<String>,
}

/// List envelope that also reports the total row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountedListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub next_cursor: Option<String>,
}

/// Acknowledgement bodies: `{"status": "ok"}`, `{"success": true, "deleted_count": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub deleted_count: Option<u64>,
}

/// Cursors arrive as strings for some collections and integers for others.
fn deserialize_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_accepts_string_and_number() {
        let a: ListResponse<Value> =
            serde_json::from_str(r#"{"items": [], "nextCursor": "abc"}"#).unwrap();
        assert_eq!(a.next_cursor.as_deref(), Some("abc"));

        let b: CountedListResponse<Value> =
            serde_json::from_str(r#"{"items": [1], "total": 7, "nextCursor": 42}"#).unwrap();
        assert_eq!(b.next_cursor.as_deref(), Some("42"));
        assert_eq!(b.total, 7);

        let c: ListResponse<Value> = serde_json::from_str(r#"{"items": [], "nextCursor": null}"#).unwrap();
        assert_eq!(c.next_cursor, None);

        let d: ListResponse<Value> = serde_json::from_str(r#"{}"#).unwrap();
        assert!(d.items.is_empty());
    }

    #[test]
    fn test_status_response_shapes() {
        let ok: StatusResponse = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert_eq!(ok.status.as_deref(), Some("ok"));

        let cleared: StatusResponse =
            serde_json::from_str(r#"{"success": true, "deleted_count": 3}"#).unwrap();
        assert_eq!(cleared.deleted_count, Some(3));
    }
}
