//! Captured field values
//!
//! [`FieldValue`] is what a snapshot records for one field: a string,
//! number, boolean, list of strings, or the explicit "no-value" marker.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Wire representation of [`FieldValue::NoValue`]
pub const NO_VALUE: &str = "no-value";

/// Value captured for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", from = "Value")]
pub enum FieldValue {
    /// Text content
    Text(String),
    /// Numeric content
    Number(f64),
    /// Boolean content
    Bool(bool),
    /// Selected labels or composite leaf renderings
    List(Vec<String>),
    /// Field could not be read; distinct from an empty string
    NoValue,
}

/// Normalised form used for equality checks
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Normalized {
    /// Trimmed scalar rendering
    Scalar(String),
    /// Trimmed, sorted list
    List(Vec<String>),
    /// Unreadable
    Missing,
}

impl FieldValue {
    /// Text value
    #[inline]
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Check for the "no-value" marker
    #[inline]
    #[must_use]
    pub fn is_no_value(&self) -> bool {
        matches!(self, Self::NoValue)
    }

    /// Empty text, empty list, or no value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|i| i.trim().is_empty()),
            Self::NoValue => true,
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Scalar text rendering, if the value is a scalar
    #[must_use]
    pub fn as_scalar_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(render_number(*n)),
            Self::Bool(b) => Some(b.to_string()),
            Self::List(_) | Self::NoValue => None,
        }
    }

    /// Normalise: trim strings, render numbers canonically, sort lists
    #[must_use]
    pub fn normalized(&self) -> Normalized {
        match self {
            Self::Text(s) => Normalized::Scalar(s.trim().to_string()),
            Self::Number(n) => Normalized::Scalar(render_number(*n)),
            Self::Bool(b) => Normalized::Scalar(b.to_string()),
            Self::List(items) => {
                let mut items: Vec<String> = items
                    .iter()
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty())
                    .collect();
                items.sort();
                Normalized::List(items)
            }
            Self::NoValue => Normalized::Missing,
        }
    }

    /// Equality after normalisation
    #[inline]
    #[must_use]
    pub fn normalized_eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }

    /// JSON-encoded rendering for reports
    #[must_use]
    pub fn to_json_string(&self) -> String {
        Value::from(self.clone()).to_string()
    }
}

/// Render a number without a trailing `.0` for integral values
#[must_use]
pub fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let int = n as i64;
        int.to_string()
    } else {
        n.to_string()
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Number(n) => serde_json::Number::from_f64(n)
                .map_or_else(|| Value::String(render_number(n)), Value::Number),
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            FieldValue::NoValue => Value::String(NO_VALUE.to_string()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) if s == NO_VALUE => Self::NoValue,
            Value::String(s) => Self::Text(s),
            Value::Number(n) => n.as_f64().map_or(Self::NoValue, Self::Number),
            Value::Bool(b) => Self::Bool(b),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|i| match i {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Null | Value::Object(_) => Self::NoValue,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::NoValue => f.write_str(NO_VALUE),
            other => f.write_str(&other.as_scalar_text().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_compare_trimmed() {
        assert!(FieldValue::text(" Intro ").normalized_eq(&FieldValue::text("Intro")));
    }

    #[test]
    fn number_equals_its_text_rendering() {
        assert!(FieldValue::Number(2.0).normalized_eq(&FieldValue::text("2")));
        assert!(!FieldValue::Number(2.5).normalized_eq(&FieldValue::text("2")));
    }

    #[test]
    fn lists_are_order_insensitive() {
        let a = FieldValue::List(vec!["b".into(), "a".into()]);
        let b = FieldValue::List(vec!["a".into(), " b".into()]);
        assert!(a.normalized_eq(&b));
    }

    #[test]
    fn no_value_differs_from_empty_string() {
        assert!(!FieldValue::NoValue.normalized_eq(&FieldValue::text("")));
        assert!(FieldValue::NoValue.is_empty());
    }

    #[test]
    fn json_wire_form() {
        assert_eq!(FieldValue::NoValue.to_json_string(), "\"no-value\"");
        assert_eq!(FieldValue::Number(3.0).to_json_string(), "3.0");
        let parsed: FieldValue = serde_json::from_str("\"no-value\"").unwrap();
        assert_eq!(parsed, FieldValue::NoValue);
        let list: FieldValue = serde_json::from_str(r#"["x","y"]"#).unwrap();
        assert_eq!(list, FieldValue::List(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn display_rendering() {
        assert_eq!(FieldValue::Number(15.0).to_string(), "15");
        assert_eq!(FieldValue::List(vec!["a".into(), "b".into()]).to_string(), "[a, b]");
    }
}
