//! Normalization of raw pending items into [`Notification`] records.
//!
//! The reminder service has shipped two item shapes over time
//! (`id`/`message`/`timestamp` and `id`/`text`/`when`/`created_at`) and two
//! envelope shapes (bare array or `{"notifications": [...]}`). Both are
//! accepted here so the rest of the client only ever sees one record type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::{MalformedInputError, ShapeError};
use crate::notification::{Category, Notification, NotificationId};

/// Label used when an item carries no message text.
pub const DEFAULT_TEXT: &str = "Reminder";

const ENVELOPE_FIELD: &str = "notifications";
const TEXT_FIELDS: [&str; 2] = ["message", "text"];
const TIMESTAMP_FIELDS: [&str; 3] = ["timestamp", "when", "created_at"];

const MEDICATION_KEYWORDS: [&str; 9] = [
    "medication",
    "medicine",
    "meds",
    "pill",
    "dose",
    "prescription",
    "effexor",
    "adderall",
    "vitamin",
];

/// Infers a category from free text. First match wins, default `Reminder`.
pub fn infer_category(text: &str) -> Category {
    let lowered = text.to_lowercase();
    if MEDICATION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Category::Medication
    } else if lowered.contains("habit") {
        Category::Habit
    } else {
        Category::Reminder
    }
}

/// Splits a pending-notifications body into its raw items, in arrival order.
pub fn extract_items(body: Value) -> Result<Vec<Value>, ShapeError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(ENVELOPE_FIELD) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(ShapeError::UnexpectedShape {
                found: json_kind(&other),
            }),
            None => Err(ShapeError::UnexpectedShape {
                found: "object without notifications",
            }),
        },
        other => Err(ShapeError::UnexpectedShape {
            found: json_kind(&other),
        }),
    }
}

/// Converts one raw item into a notification.
///
/// `now` stamps items that arrive without any timestamp field.
pub fn classify(raw: &Value, now: DateTime<Utc>) -> Result<Notification, MalformedInputError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| MalformedInputError::new(format!("expected object, got {}", json_kind(raw))))?;

    let id = extract_id(obj)?;

    let text = first_string(obj, &TEXT_FIELDS).unwrap_or_else(|| DEFAULT_TEXT.to_string());

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .and_then(|c| c.parse::<Category>().ok())
        .unwrap_or_else(|| infer_category(&text));

    let occurred_at = first_string(obj, &TIMESTAMP_FIELDS)
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));

    Ok(Notification {
        id,
        category,
        text,
        occurred_at,
        title: first_string(obj, &["title"]),
        priority: first_string(obj, &["priority"]),
    })
}

fn extract_id(obj: &Map<String, Value>) -> Result<NotificationId, MalformedInputError> {
    match obj.get("id") {
        None | Some(Value::Null) => Err(MalformedInputError::new("missing id")),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| MalformedInputError::new(format!("id {n} is not an integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<NotificationId>()
            .map_err(|_| MalformedInputError::new(format!("id '{s}' is not an integer"))),
        Some(other) => Err(MalformedInputError::new(format!(
            "id has unsupported type {}",
            json_kind(other)
        ))),
    }
}

/// First non-blank string among `fields`. Numeric timestamps are accepted as text.
fn first_string(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match obj.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
