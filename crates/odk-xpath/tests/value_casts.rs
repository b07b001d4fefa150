mod common;

use common::{Harness, V, ZONE_MINUTES, call, n, s};
use chrono::FixedOffset;
use odk_xpath::XPathNode;
use odk_xpath::simple_node::{doc, elem};
use odk_xpath::value::{format_number, string_to_number};
use odk_xpath::{LocalZone, Moment, as_boolean, as_number, as_string};
use rstest::rstest;

fn zone() -> LocalZone {
    LocalZone::Fixed(FixedOffset::east_opt(ZONE_MINUTES * 60).unwrap())
}

#[rstest]
#[case(V::Boolean(true), true)]
#[case(V::Number(0.0), false)]
#[case(V::Number(-0.0), false)]
#[case(V::Number(f64::NAN), false)]
#[case(V::Number(0.1), true)]
#[case(V::from(""), false)]
#[case(V::from("false"), true)]
#[case(V::NodeSet(vec![]), false)]
#[case(V::Date(Moment::Blank), false)]
#[case(V::Date(Moment::Invalid), false)]
fn boolean_cast(#[case] v: V, #[case] expected: bool) {
    assert_eq!(as_boolean(&v), expected);
}

#[rstest]
#[case("12", 12.0)]
#[case(" 12.5 ", 12.5)]
#[case("-3", -3.0)]
#[case("Infinity", f64::INFINITY)]
#[case("2018-01-01", 17532.0)]
#[case("1970-01-01T00:00:00+02:00", 0.0)]
#[case("1970-01-01T00:00:00Z", 1.0 / 12.0)]
fn number_cast_of_strings(#[case] text: &str, #[case] expected: f64) {
    assert_eq!(string_to_number(text, &zone()), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("abc")]
#[case("1,5")]
#[case("2018-13-01")]
fn number_cast_failures_are_nan(#[case] text: &str) {
    let v = string_to_number(text, &zone());
    assert!(v.is_nan());
    assert!(v != v);
}

#[rstest]
fn booleans_cast_to_zero_and_one() {
    assert_eq!(as_number(&V::Boolean(true), &zone()), 1.0);
    assert_eq!(as_number(&V::Boolean(false), &zone()), 0.0);
}

#[rstest]
#[case(V::Boolean(false), "false")]
#[case(V::Number(1.0 / 0.0), "Infinity")]
#[case(V::Number(-1.0 / 0.0), "-Infinity")]
#[case(V::Number(f64::NAN), "NaN")]
#[case(V::Number(0.1 + 0.2), "0.30000000000000004")]
#[case(V::Number(-0.0), "0")]
#[case(V::Date(Moment::Blank), "")]
#[case(V::Date(Moment::Invalid), "")]
fn string_cast(#[case] v: V, #[case] expected: &str) {
    assert_eq!(as_string(&v), expected);
}

#[rstest]
fn nodeset_string_is_first_in_document_order() {
    let d = doc()
        .child(elem("a").text("first"))
        .child(elem("b").text("second"))
        .build();
    let kids = d.children();
    let reversed = V::NodeSet(vec![kids[1].clone(), kids[0].clone()]);
    assert_eq!(as_string(&reversed), "first");
    assert!(as_number(&V::NodeSet(vec![]), &zone()).is_nan());
}

#[rstest]
#[case(0.5)]
#[case(-12.25)]
#[case(1e21)]
#[case(1.5e-7)]
#[case(123_456_789.123)]
fn number_string_round_trip(#[case] x: f64) {
    let text = format_number(x);
    assert_eq!(string_to_number(&text, &zone()), x);
}

#[rstest]
#[case(17532.0)]
#[case(17532.5)]
#[case(-1.25)]
#[case(0.0)]
fn day_count_round_trips_through_date(#[case] days: f64) {
    let h = Harness::new();
    let back = h.number(&call("number", vec![call("date", vec![n(days)])]));
    assert!((back - days).abs() < 1e-9, "{days} -> {back}");
}

#[rstest]
#[case("2018-01-01")]
#[case("1999-12-31")]
#[case("2020-2-9")]
fn date_string_keeps_its_date_portion(#[case] text: &str) {
    let h = Harness::new();
    let out = h.string(&call("string", vec![call("date", vec![s(text)])]));
    let expected = {
        let mut parts = text.split('-');
        let y = parts.next().unwrap();
        let m: u32 = parts.next().unwrap().parse().unwrap();
        let d: u32 = parts.next().unwrap().parse().unwrap();
        format!("{y}-{m:02}-{d:02}")
    };
    assert_eq!(out, expected);
}
