use chrono::{NaiveDate, NaiveDateTime};
use column_normalizer::{
    RawCell,
    temporal::{self, DateResolver, Shape, TemporalResolver},
};
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn datetime(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").unwrap()
}

#[test]
fn equivalent_calendar_dates_agree_across_formats() {
    let expected = date(2024, 3, 5);
    for input in ["2024-03-05", "20240305", "03/05/2024", "2024/03/05"] {
        assert_eq!(temporal::resolve_date(input), expected, "input {input}");
    }
}

#[test]
fn unrecognised_dates_resolve_to_sentinel() {
    for input in ["", "garbage", "2024-13-01", "02/30/2024", "2024.03.05", "5 March 2024"] {
        assert_eq!(temporal::resolve_date(input), temporal::sentinel_date());
    }
    assert_eq!(temporal::resolve_date(RawCell::Null), temporal::sentinel_date());
}

#[test]
fn typed_cells_resolve_through_their_text() {
    assert_eq!(temporal::resolve_date(20240305_i64), date(2024, 3, 5));
    assert_eq!(temporal::resolve_date(date(2020, 2, 29)), date(2020, 2, 29));
    assert_eq!(
        temporal::resolve_datetime(datetime("2024-03-05 14:30:00.25")),
        datetime("2024-03-05 14:30:00.25")
    );
}

#[test]
fn missing_markers_resolve_to_sentinel_datetime() {
    for input in ["", "0", "NULL", "   "] {
        assert_eq!(temporal::resolve_datetime(input), temporal::sentinel_datetime());
    }
    assert_eq!(
        temporal::resolve_datetime(Option::<&str>::None),
        temporal::sentinel_datetime()
    );
}

#[test]
fn datetime_shapes_follow_priority() {
    assert_eq!(
        temporal::resolve_datetime("2024-03-05 14:30:00"),
        datetime("2024-03-05 14:30:00")
    );
    assert_eq!(
        temporal::resolve_datetime("2024-03-05"),
        datetime("2024-03-05 00:00:00")
    );
    assert_eq!(
        temporal::resolve_datetime("45:08.3"),
        datetime("1900-01-01 00:45:08.3")
    );
    assert_eq!(
        temporal::resolve_datetime("14:30"),
        datetime("1900-01-01 14:30:00")
    );
    assert_eq!(
        temporal::resolve_datetime("garbage"),
        temporal::sentinel_datetime()
    );
}

#[test]
fn fractional_seconds_keep_source_precision() {
    assert_eq!(
        temporal::resolve_datetime("2024-03-05 14:30:00.123456789"),
        datetime("2024-03-05 14:30:00.123456789")
    );
}

#[test]
fn classify_reports_the_winning_shape() {
    assert_eq!(temporal::classify("NULL"), Some(Shape::Missing));
    assert_eq!(temporal::classify(" 2024-03-05 "), Some(Shape::DateOnly));
    assert_eq!(temporal::classify("45:08.3"), Some(Shape::MinuteSecond));
    assert_eq!(temporal::classify("14:30"), Some(Shape::ClockTime));
    assert_eq!(temporal::classify("garbage"), None);
}

#[test]
fn injected_formats_extend_the_date_resolver() {
    let resolver = DateResolver::new(["%d.%m.%Y", "%Y-%m-%d"]);
    assert_eq!(
        resolver.resolve(&RawCell::from("05.03.2024")),
        date(2024, 3, 5)
    );
    assert_eq!(
        resolver.resolve_with_format(&RawCell::from("2024-03-05")),
        Some((date(2024, 3, 5), "%Y-%m-%d"))
    );
    assert_eq!(
        resolver.resolve(&RawCell::from("20240305")),
        temporal::sentinel_date()
    );
}

#[test]
fn narrowed_shape_order_skips_minute_seconds() {
    let resolver = TemporalResolver::new(vec![Shape::Missing, Shape::ClockTime]);
    assert_eq!(
        resolver.resolve(&RawCell::from("14:30:15")),
        datetime("1900-01-01 14:30:15")
    );
    assert_eq!(
        resolver.resolve(&RawCell::from("2024-03-05")),
        temporal::sentinel_datetime()
    );
}

fn date_text() -> impl Strategy<Value = String> {
    (1i32..=9999, 1u32..=12, 1u32..=31, 0usize..4).prop_map(|(y, m, d, style)| match style {
        0 => format!("{y:04}-{m:02}-{d:02}"),
        1 => format!("{y:04}{m:02}{d:02}"),
        2 => format!("{m:02}/{d:02}/{y:04}"),
        _ => format!("{y:04}/{m:02}/{d:02}"),
    })
}

fn temporal_text() -> impl Strategy<Value = String> {
    prop_oneof![
        date_text(),
        (0u32..100, 0u32..100, proptest::option::of(0u32..1000))
            .prop_map(|(a, b, frac)| match frac {
                Some(f) => format!("{a}:{b:02}.{f}"),
                None => format!("{a}:{b:02}"),
            }),
        (date_text(), 0u32..30, 0u32..70, 0u32..70)
            .prop_map(|(d, h, m, s)| format!("{d} {h}:{m:02}:{s:02}")),
        "\\PC{0,24}",
    ]
}

proptest! {
    #[test]
    fn resolvers_are_total(input in "\\PC{0,32}") {
        let resolved = temporal::resolve_date(input.as_str());
        prop_assert!(resolved >= date(1, 1, 1));
        let _ = temporal::resolve_datetime(input.as_str());
    }

    #[test]
    fn resolved_dates_are_fixed_points(input in date_text()) {
        let first = temporal::resolve_date(input.as_str());
        let again = temporal::resolve_date(first.format("%Y-%m-%d").to_string());
        prop_assert_eq!(first, again);
    }

    #[test]
    fn resolved_datetimes_are_fixed_points(input in temporal_text()) {
        let first = temporal::resolve_datetime(input.as_str());
        let again =
            temporal::resolve_datetime(first.format("%Y-%m-%d %H:%M:%S%.f").to_string());
        prop_assert_eq!(first, again);
    }
}
