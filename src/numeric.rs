//! Decimal and integer coercion.
//!
//! The decimal resolver distinguishes "could not parse" (`None`) from zero;
//! the integer resolver cannot, and defaults to `0`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{data::RawCell, transform::string_ops};

/// Characters of source text considered before separators are stripped.
pub const DECIMAL_TEXT_LIMIT: usize = 15;
pub const THOUSANDS_SEPARATOR: char = ',';
/// Fractional digits kept by the warehouse NUMERIC type.
pub const NUMERIC_SCALE: u32 = 9;

pub fn resolve_decimal(raw: impl Into<RawCell>) -> Option<Decimal> {
    decimal_from_cell(&raw.into())
}

pub fn resolve_int(raw: impl Into<RawCell>) -> i64 {
    integer_from_cell(&raw.into())
}

pub fn decimal_from_cell(cell: &RawCell) -> Option<Decimal> {
    let text = cell.as_text()?;
    let prefix = string_ops::substring(&text, 0, DECIMAL_TEXT_LIMIT);
    let cleaned = string_ops::strip_char(&prefix, THOUSANDS_SEPARATOR);
    parse_decimal_literal(&cleaned)
}

pub fn integer_from_cell(cell: &RawCell) -> i64 {
    cell.as_text()
        .and_then(|text| parse_whole_number(&text))
        .unwrap_or(0)
}

/// Parses plain or scientific decimal notation with an optional sign.
pub fn parse_decimal_literal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains('_') {
        return None;
    }
    let parsed = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed).ok()?
    } else {
        Decimal::from_str(trimmed).ok()?
    };
    let rounded =
        parsed.round_dp_with_strategy(NUMERIC_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // A value is only kept if its canonical text survives the prefix cut, so
    // feeding it back in yields the same number.
    if rounded.to_string().chars().count() > DECIMAL_TEXT_LIMIT {
        return None;
    }
    Some(rounded)
}

pub fn parse_whole_number(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}
