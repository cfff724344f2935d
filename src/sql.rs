//! BigQuery renderings of the resolvers.
//!
//! Each function returns an expression over a caller-supplied column
//! reference. The column text is interpolated verbatim, so callers pass an
//! already-quoted identifier or any other SQL expression. The renderings
//! evaluate the same priority lists as the native resolvers in
//! [`crate::temporal`] and [`crate::numeric`].
//!
//! The renderings start from `SAFE_CAST(col AS STRING)`. For FLOAT64 columns
//! BigQuery renders whole values as `12.0`, so the integer and date
//! renderings reject them. The native resolvers render whole floats as `12`
//! (see [`crate::data::RawCell::as_text`]) and accept them. Cast float
//! columns to INT64 or NUMERIC before normalizing them in SQL.

use std::{borrow::Cow, fmt::Write as _, sync::LazyLock};

use regex::Regex;

use crate::{
    numeric::{DECIMAL_TEXT_LIMIT, THOUSANDS_SEPARATOR},
    temporal::{
        CLOCK_TIME_PATTERN, DATE_ONLY_PATTERN, DateResolver, FULL_DATETIME_PATTERN,
        MINUTE_SECOND_PATTERN, MISSING_MARKERS, SENTINEL_DATE_TEXT, SENTINEL_DATETIME_TEXT, Shape,
        TemporalResolver,
    },
};

static PLAIN_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles"));

const MIDNIGHT_LITERAL: &str = "TIME '00:00:00'";

pub fn safe_string(column: &str) -> String {
    format!("SAFE_CAST({column} AS STRING)")
}

pub fn safe_date(column: &str, resolver: &DateResolver) -> String {
    let text = safe_string(column);
    let mut sql = String::from("COALESCE(\n");
    for fmt in resolver.formats() {
        let _ = writeln!(
            sql,
            "  SAFE.PARSE_DATE({}, {text}),",
            string_literal(fmt)
        );
    }
    let _ = write!(sql, "  DATE '{SENTINEL_DATE_TEXT}'\n)");
    sql
}

pub fn safe_datetime(column: &str, resolver: &TemporalResolver) -> String {
    let trimmed = format!("TRIM({})", safe_string(column));
    let sentinel = sentinel_datetime_literal();
    let mut sql = String::from("(\n  CASE\n");
    for shape in resolver.order() {
        let (condition, result) = shape_branch(*shape, &trimmed);
        let _ = writeln!(sql, "    WHEN {condition}\n      THEN {result}");
    }
    let _ = write!(sql, "    ELSE {sentinel}\n  END\n)");
    sql
}

pub fn dec15(column: &str) -> String {
    format!(
        "SAFE_CAST(TRIM(REGEXP_REPLACE(SUBSTR({}, 1, {DECIMAL_TEXT_LIMIT}), r'{THOUSANDS_SEPARATOR}', '')) AS NUMERIC)",
        safe_string(column)
    )
}

pub fn safe_int(column: &str) -> String {
    format!(
        "COALESCE(SAFE_CAST(TRIM({}) AS INT64), 0)",
        safe_string(column)
    )
}

fn shape_branch(shape: Shape, text: &str) -> (String, String) {
    let sentinel = sentinel_datetime_literal();
    match shape {
        Shape::Missing => {
            let markers = MISSING_MARKERS
                .iter()
                .map(|marker| string_literal(marker))
                .collect::<Vec<_>>()
                .join(", ");
            (
                format!("{text} IS NULL OR {text} IN ({markers})"),
                sentinel,
            )
        }
        Shape::DateTime => (
            regexp_contains(text, FULL_DATETIME_PATTERN),
            format!(
                "COALESCE(SAFE.PARSE_DATETIME('%Y-%m-%d %H:%M:%E*S', {text}), SAFE.PARSE_DATETIME('%Y-%m-%d %H:%M', {text}), {sentinel})"
            ),
        ),
        Shape::DateOnly => (
            regexp_contains(text, DATE_ONLY_PATTERN),
            format!(
                "COALESCE(DATETIME(SAFE.PARSE_DATE('%Y-%m-%d', {text}), {MIDNIGHT_LITERAL}), {sentinel})"
            ),
        ),
        Shape::MinuteSecond => (
            format!(
                "{} AND (STRPOS({text}, '.') > 0 OR SAFE_CAST(SPLIT({text}, ':')[SAFE_OFFSET(0)] AS INT64) > 23)",
                regexp_contains(text, MINUTE_SECOND_PATTERN)
            ),
            format!(
                "DATETIME(DATE '{SENTINEL_DATE_TEXT}', COALESCE(SAFE.PARSE_TIME('%H:%M:%E*S', CONCAT('00:', {text})), {MIDNIGHT_LITERAL}))"
            ),
        ),
        Shape::ClockTime => (
            regexp_contains(text, CLOCK_TIME_PATTERN),
            format!(
                "DATETIME(DATE '{SENTINEL_DATE_TEXT}', COALESCE(SAFE.PARSE_TIME('%H:%M:%E*S', {text}), SAFE.PARSE_TIME('%H:%M', {text}), {MIDNIGHT_LITERAL}))"
            ),
        ),
    }
}

fn regexp_contains(text: &str, pattern: &str) -> String {
    format!("REGEXP_CONTAINS({text}, r'{pattern}')")
}

fn sentinel_datetime_literal() -> String {
    format!("DATETIME '{SENTINEL_DATETIME_TEXT}'")
}

/// Single-quoted SQL string literal.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Backtick-quotes identifiers that are not plain `[A-Za-z_][A-Za-z0-9_]*`.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    if PLAIN_IDENTIFIER.is_match(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "\\`")))
    }
}

/// Renders `SELECT expr AS alias, ... FROM source`.
pub fn select_statement<'a, I>(items: I, source: &str) -> String
where
    I: IntoIterator<Item = (String, &'a str)>,
{
    let projections = items
        .into_iter()
        .map(|(expr, alias)| format!("  {} AS {}", indent(&expr), quote_identifier(alias)))
        .collect::<Vec<_>>();
    format!("SELECT\n{}\nFROM {source}", projections.join(",\n"))
}

fn indent(expr: &str) -> String {
    expr.replace('\n', "\n  ")
}
