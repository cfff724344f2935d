use std::{borrow::Cow, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A scalar exactly as a source system handed it over.
///
/// Every resolver first re-expresses the cell as text (see [`RawCell::as_text`])
/// before classifying it, so a native date and its textual rendering resolve
/// identically.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum RawCell {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Text rendering used ahead of format classification. `None` only for null.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        let text = match self {
            RawCell::Null => return None,
            RawCell::Text(s) => Cow::Borrowed(s.as_str()),
            RawCell::Integer(i) => Cow::Owned(i.to_string()),
            RawCell::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Cow::Owned((*f as i64).to_string())
                } else {
                    Cow::Owned(f.to_string())
                }
            }
            RawCell::Decimal(d) => Cow::Owned(d.to_string()),
            RawCell::Boolean(b) => Cow::Owned(b.to_string()),
            RawCell::Date(d) => Cow::Owned(d.format(DATE_DISPLAY_FORMAT).to_string()),
            RawCell::DateTime(dt) => Cow::Owned(dt.format(DATETIME_DISPLAY_FORMAT).to_string()),
        };
        Some(text)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

impl From<Option<&str>> for RawCell {
    fn from(value: Option<&str>) -> Self {
        value.map(RawCell::from).unwrap_or_default()
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        RawCell::Integer(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Float(value)
    }
}

impl From<Decimal> for RawCell {
    fn from(value: Decimal) -> Self {
        RawCell::Decimal(value)
    }
}

impl From<bool> for RawCell {
    fn from(value: bool) -> Self {
        RawCell::Boolean(value)
    }
}

impl From<NaiveDate> for RawCell {
    fn from(value: NaiveDate) -> Self {
        RawCell::Date(value)
    }
}

impl From<NaiveDateTime> for RawCell {
    fn from(value: NaiveDateTime) -> Self {
        RawCell::DateTime(value)
    }
}

/// A normalized result of any resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Decimal(Option<Decimal>),
    Integer(i64),
    Text(Option<String>),
}

impl Value {
    /// Absent decimals and null text render as an empty field.
    pub fn as_display(&self) -> String {
        match self {
            Value::Date(d) => d.format(DATE_DISPLAY_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_DISPLAY_FORMAT).to_string(),
            Value::Decimal(Some(d)) => d.to_string(),
            Value::Decimal(None) => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Text(Some(s)) => s.clone(),
            Value::Text(None) => String::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Decimal(None) | Value::Text(None))
    }

    /// Feeds a normalized value back in as a raw cell.
    pub fn to_raw(&self) -> RawCell {
        match self {
            Value::Date(d) => RawCell::Date(*d),
            Value::DateTime(dt) => RawCell::DateTime(*dt),
            Value::Decimal(Some(d)) => RawCell::Decimal(*d),
            Value::Integer(i) => RawCell::Integer(*i),
            Value::Text(Some(s)) => RawCell::Text(s.clone()),
            Value::Decimal(None) | Value::Text(None) => RawCell::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn as_text_renders_native_values() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(RawCell::Date(date).as_text().unwrap(), "2024-03-05");
        assert_eq!(RawCell::Integer(20240305).as_text().unwrap(), "20240305");
        assert_eq!(RawCell::Float(42.0).as_text().unwrap(), "42");
        assert_eq!(RawCell::Float(1.5).as_text().unwrap(), "1.5");
        assert_eq!(RawCell::Boolean(true).as_text().unwrap(), "true");
        assert!(RawCell::Null.as_text().is_none());
    }

    #[test]
    fn as_text_borrows_text_cells() {
        let cell = RawCell::from("2024-03-05");
        assert!(matches!(cell.as_text(), Some(Cow::Borrowed(_))));
    }

    #[test]
    fn datetime_text_keeps_fractional_seconds() {
        let dt = NaiveDateTime::parse_from_str("2024-03-05 14:30:00.25", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();
        assert_eq!(
            RawCell::DateTime(dt).as_text().unwrap(),
            "2024-03-05 14:30:00.250"
        );
        let whole = NaiveDateTime::parse_from_str("2024-03-05 14:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(
            RawCell::DateTime(whole).as_text().unwrap(),
            "2024-03-05 14:30:00"
        );
    }

    #[test]
    fn optional_str_maps_none_to_null() {
        assert_eq!(RawCell::from(None::<&str>), RawCell::Null);
        assert_eq!(RawCell::from(Some("x")), RawCell::Text("x".into()));
    }

    #[test]
    fn absent_values_render_empty() {
        assert_eq!(Value::Decimal(None).as_display(), "");
        assert_eq!(Value::Text(None).as_display(), "");
        assert!(Value::Decimal(None).is_absent());
        assert!(!Value::Integer(0).is_absent());
        let amount = Decimal::from_str("1234.56").unwrap();
        assert_eq!(Value::Decimal(Some(amount)).to_string(), "1234.56");
    }

    #[test]
    fn value_serializes_with_type_tag() {
        let json = serde_json::to_string(&Value::Integer(42)).unwrap();
        assert_eq!(json, r#"{"type":"integer","value":42}"#);
    }
}
