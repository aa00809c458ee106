//! Runtime values for validation input and output.
//!
//! The validator consumes and produces `Value` graphs rather than raw
//! JSON so that date/datetime coercions have a typed representation.
//! Conversions to and from `serde_json::Value` are lossless except that
//! date and datetime leaves render as their canonical ISO-8601 strings.

use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use time::{Date, OffsetDateTime};

/// A JSON-compatible runtime value, extended with typed date leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(Date),
    Datetime(OffsetDateTime),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Runtime type name used in validation diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Datetime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// JSON repr for diagnostics, truncated to `max_len` characters.
    pub fn repr(&self, max_len: usize) -> String {
        let json = serde_json::Value::from(self);
        let mut text = json.to_string();
        if text.chars().count() > max_len {
            text = text.chars().take(max_len).collect();
        }
        text
    }
}

/// Canonical ISO-8601 rendering of a date.
pub fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
}

/// Canonical ISO-8601 rendering of a datetime: seconds always present,
/// milliseconds only when non-zero, offset as `Z` or `+HH:MM`.
pub fn format_datetime(dt: OffsetDateTime) -> String {
    let mut text = format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        dt.year(),
        dt.month() as u8,
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    );
    let millis = dt.millisecond();
    if millis != 0 {
        text.push_str(&format!(".{:03}", millis));
    }
    let offset = dt.offset();
    if offset.is_utc() {
        text.push('Z');
    } else {
        let total = offset.whole_minutes();
        let sign = if total < 0 { '-' } else { '+' };
        let abs = total.abs();
        text.push_str(&format!("{}{:02}:{:02}", sign, abs / 60, abs % 60));
    }
    text
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> serde_json::Value {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(format_date(*d)),
            Value::Datetime(dt) => serde_json::Value::String(format_datetime(*dt)),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}
