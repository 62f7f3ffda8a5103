use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A flat entity record exactly as the API returned it.
pub type Record = Map<String, Value>;

// Option for a <select>: clients, services and employees all carry id + name
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NamedOption {
    pub id: Value,
    pub name: String,
}

impl NamedOption {
    pub fn value(&self) -> String {
        display_value(&self.id).unwrap_or_default()
    }
}

/// Scalar JSON value as text; `None` for null, missing or empty values.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// First non-empty value among `keys`.
pub fn field_text(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(display_value)
}

pub fn record_id(record: &Record) -> Option<String> {
    record.get("id").and_then(display_value)
}

const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    // Accept RFC 3339 timestamps by dropping fractional seconds and offset
    let trimmed = raw.get(..19).unwrap_or(raw);
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| TIME_FORMATS.iter().find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok()))
}

/// Reservation time for tables; unparseable input is shown as-is.
pub fn display_time(raw: &str) -> String {
    parse_time(raw)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Reservation time in the shape a `datetime-local` input expects.
pub fn input_time(raw: &str) -> String {
    parse_time(raw)
        .map(|t| t.format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn field_text_falls_back_to_later_keys() {
        let item = record(json!({"id": 3, "name": "Shampoo", "product_name": ""}));
        assert_eq!(field_text(&item, &["product_name", "name"]), Some("Shampoo".into()));
        assert_eq!(field_text(&item, &["phone"]), None);
        assert_eq!(record_id(&item), Some("3".into()));
    }

    #[test]
    fn numbers_render_without_quotes() {
        assert_eq!(display_value(&json!(12.5)), Some("12.5".into()));
        assert_eq!(display_value(&json!("x")), Some("x".into()));
        assert_eq!(display_value(&Value::Null), None);
    }

    #[test]
    fn reservation_times_are_normalised() {
        assert_eq!(display_time("2025-03-01 10:30:00"), "2025-03-01 10:30");
        assert_eq!(display_time("2025-03-01T10:30:00.000000Z"), "2025-03-01 10:30");
        assert_eq!(input_time("2025-03-01 10:30:00"), "2025-03-01T10:30");
        assert_eq!(display_time("tomorrow"), "tomorrow");
    }

    #[test]
    fn named_option_accepts_numeric_ids() {
        let option: NamedOption = serde_json::from_value(json!({"id": 7, "name": "Anna", "email": "a@b.com"})).unwrap();
        assert_eq!(option.value(), "7");
    }
}
