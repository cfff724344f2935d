use std::{borrow::Cow, fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
    data::{RawCell, Value},
    numeric, sql,
    temporal::{self, Shape},
};

/// Text pass-through. Null stays null; nothing is trimmed or truncated.
pub fn resolve_text(raw: impl Into<RawCell>) -> Option<String> {
    text_from_cell(&raw.into())
}

/// Single-character columns share the text pass-through; width is enforced
/// downstream.
pub fn resolve_char(raw: impl Into<RawCell>) -> Option<String> {
    text_from_cell(&raw.into())
}

fn text_from_cell(cell: &RawCell) -> Option<String> {
    cell.as_text().map(Cow::into_owned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolver {
    Date,
    DateTime,
    Decimal,
    Integer,
    Text,
    Char,
}

/// A resolved value together with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub value: Value,
    pub strategy: String,
    /// True when a sentinel, default or absent value was substituted.
    pub fallback: bool,
}

impl Resolver {
    pub const ALL: [Resolver; 6] = [
        Resolver::Date,
        Resolver::DateTime,
        Resolver::Decimal,
        Resolver::Integer,
        Resolver::Text,
        Resolver::Char,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolver::Date => "date",
            Resolver::DateTime => "datetime",
            Resolver::Decimal => "decimal",
            Resolver::Integer => "integer",
            Resolver::Text => "text",
            Resolver::Char => "char",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Resolver::Date => &["date", "safe_date"],
            Resolver::DateTime => &["datetime", "temporal", "timestamp", "safe_sas_datetime"],
            Resolver::Decimal => &["decimal", "numeric", "dec15"],
            Resolver::Integer => &["integer", "int", "safe_int"],
            Resolver::Text => &["text", "string", "str"],
            Resolver::Char => &["char", "str1"],
        }
    }

    /// Value substituted when the input cannot be resolved; `None` for the
    /// resolvers that never substitute.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Resolver::Date => Some(Value::Date(temporal::sentinel_date())),
            Resolver::DateTime => Some(Value::DateTime(temporal::sentinel_datetime())),
            Resolver::Decimal => Some(Value::Decimal(None)),
            Resolver::Integer => Some(Value::Integer(0)),
            Resolver::Text | Resolver::Char => None,
        }
    }

    pub fn apply(&self, cell: &RawCell) -> Value {
        match self {
            Resolver::Date => Value::Date(temporal::default_date_resolver().resolve(cell)),
            Resolver::DateTime => {
                Value::DateTime(temporal::default_temporal_resolver().resolve(cell))
            }
            Resolver::Decimal => Value::Decimal(numeric::decimal_from_cell(cell)),
            Resolver::Integer => Value::Integer(numeric::integer_from_cell(cell)),
            Resolver::Text | Resolver::Char => Value::Text(text_from_cell(cell)),
        }
    }

    /// Resolves a cell and reports the format, shape or cast that applied.
    pub fn explain(&self, cell: &RawCell) -> Resolution {
        match self {
            Resolver::Date => match temporal::default_date_resolver().resolve_with_format(cell) {
                Some((date, fmt)) => Resolution::matched(Value::Date(date), fmt),
                None => Resolution::fallback(Value::Date(temporal::sentinel_date()), "sentinel"),
            },
            Resolver::DateTime => {
                match temporal::default_temporal_resolver().resolve_with_shape(cell) {
                    (value, Some(shape)) => {
                        Resolution::matched(Value::DateTime(value), shape.as_str())
                    }
                    (value, None) => {
                        let reason = if cell_is_missing(cell) {
                            Shape::Missing.as_str()
                        } else {
                            "sentinel"
                        };
                        Resolution::fallback(Value::DateTime(value), reason)
                    }
                }
            }
            Resolver::Decimal => match numeric::decimal_from_cell(cell) {
                Some(value) => Resolution::matched(Value::Decimal(Some(value)), "numeric"),
                None => Resolution::fallback(Value::Decimal(None), "absent"),
            },
            Resolver::Integer => {
                let parsed = cell
                    .as_text()
                    .and_then(|text| numeric::parse_whole_number(&text));
                match parsed {
                    Some(value) => Resolution::matched(Value::Integer(value), "int64"),
                    None => Resolution::fallback(Value::Integer(0), "default"),
                }
            }
            Resolver::Text | Resolver::Char => {
                Resolution::matched(Value::Text(text_from_cell(cell)), "identity")
            }
        }
    }

    /// BigQuery expression computing this resolver over `column`, which is
    /// interpolated verbatim.
    pub fn render_sql(&self, column: &str) -> String {
        match self {
            Resolver::Date => sql::safe_date(column, temporal::default_date_resolver()),
            Resolver::DateTime => {
                sql::safe_datetime(column, temporal::default_temporal_resolver())
            }
            Resolver::Decimal => sql::dec15(column),
            Resolver::Integer => sql::safe_int(column),
            Resolver::Text | Resolver::Char => sql::safe_string(column),
        }
    }

    pub fn variants() -> Vec<&'static str> {
        Resolver::ALL.iter().map(Resolver::as_str).collect()
    }
}

fn cell_is_missing(cell: &RawCell) -> bool {
    cell.as_text()
        .is_none_or(|text| Shape::Missing.matches(text.trim()))
}

impl Resolution {
    fn matched(value: Value, strategy: &str) -> Self {
        Self {
            value,
            strategy: strategy.to_string(),
            fallback: false,
        }
    }

    fn fallback(value: Value, strategy: &str) -> Self {
        Self {
            value,
            strategy: strategy.to_string(),
            fallback: true,
        }
    }
}

impl fmt::Display for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolver {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Resolver::ALL
            .into_iter()
            .find(|resolver| resolver.aliases().contains(&normalized.as_str()))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown resolver '{value}'. Supported resolvers: {}",
                    Resolver::variants().join(", ")
                )
            })
    }
}

impl Serialize for Resolver {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Resolver {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Resolver::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn from_str_accepts_aliases() {
        assert_eq!("safe_date".parse::<Resolver>().unwrap(), Resolver::Date);
        assert_eq!(
            " SAFE_SAS_DATETIME ".parse::<Resolver>().unwrap(),
            Resolver::DateTime
        );
        assert_eq!("dec15".parse::<Resolver>().unwrap(), Resolver::Decimal);
        assert_eq!("str1".parse::<Resolver>().unwrap(), Resolver::Char);
        let err = "money".parse::<Resolver>().unwrap_err();
        assert!(err.to_string().contains("Supported resolvers"));
    }

    #[test]
    fn every_canonical_name_round_trips() {
        for resolver in Resolver::ALL {
            assert_eq!(resolver.to_string().parse::<Resolver>().unwrap(), resolver);
        }
    }

    #[test]
    fn explain_reports_format_and_fallback() {
        let hit = Resolver::Date.explain(&RawCell::from("2024/03/05"));
        assert_eq!(hit.strategy, "%Y/%m/%d");
        assert!(!hit.fallback);
        assert_eq!(
            hit.value,
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );

        let miss = Resolver::Date.explain(&RawCell::from("yesterday"));
        assert!(miss.fallback);
        assert_eq!(Some(miss.value), Resolver::Date.default_value());
    }

    #[test]
    fn explain_distinguishes_missing_from_unrecognised() {
        let missing = Resolver::DateTime.explain(&RawCell::from("NULL"));
        assert_eq!(missing.strategy, "missing");
        assert!(missing.fallback);
        let garbage = Resolver::DateTime.explain(&RawCell::from("garbage"));
        assert_eq!(garbage.strategy, "sentinel");
        let shaped = Resolver::DateTime.explain(&RawCell::from("45:08.3"));
        assert_eq!(shaped.strategy, "minute_second");
    }

    #[test]
    fn text_resolvers_pass_values_through() {
        assert_eq!(resolve_text("  padded "), Some("  padded ".to_string()));
        assert_eq!(resolve_char("Y"), Some("Y".to_string()));
        assert_eq!(resolve_text(RawCell::Null), None);
        assert_eq!(resolve_text(RawCell::Integer(7)), Some("7".to_string()));
        assert_eq!(Resolver::Text.default_value(), None);
    }

    #[test]
    fn resolver_serializes_as_canonical_name() {
        let json = serde_json::to_string(&Resolver::DateTime).unwrap();
        assert_eq!(json, "\"datetime\"");
        let parsed: Resolver = serde_json::from_str("\"safe_int\"").unwrap();
        assert_eq!(parsed, Resolver::Integer);
    }
}
