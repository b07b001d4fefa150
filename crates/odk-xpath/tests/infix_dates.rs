mod common;

use common::{Expr, Harness, V, b, bin, call, n, nodes, s};
use odk_xpath::simple_node::{doc, elem};
use odk_xpath::{ErrorCode, InfixOutcome, Operator, XPathNode};
use rstest::rstest;

fn date(text: &str) -> Expr {
    call("date", vec![s(text)])
}

#[rstest]
fn date_string_plus_days_matches_explicit_date() {
    let h = Harness::new();
    let implicit = h.number(&bin(s("2018-01-01"), Operator::Plus, n(1.0)));
    let explicit = h.number(&bin(date("2018-01-01"), Operator::Plus, n(1.0)));
    let next_day = h.number(&call("number", vec![date("2018-01-02")]));
    assert_eq!(implicit, 17533.0);
    assert_eq!(implicit, explicit);
    assert_eq!(explicit, next_day);
}

#[rstest]
#[case(bin(s("2018-01-03"), Operator::Minus, s("2018-01-01")), 2.0)]
#[case(bin(n(1.0), Operator::Plus, s("2018-01-01")), 17533.0)]
#[case(bin(date("2018-01-03"), Operator::Minus, date("2018-01-01")), 2.0)]
#[case(bin(date("2018-01-01"), Operator::Multiply, n(2.0)), 35064.0)]
#[case(bin(date("2018-01-02"), Operator::Mod, n(7.0)), 17533.0 % 7.0)]
fn date_arithmetic(#[case] e: Expr, #[case] expected: f64) {
    assert_eq!(Harness::new().number(&e), expected);
}

#[rstest]
#[case(bin(s("2018-01-01"), Operator::Lt, s("2018-01-02")), true)]
#[case(bin(s("2018-01-02"), Operator::Ge, date("2018-01-02")), true)]
#[case(bin(date("2018-01-02"), Operator::Eq, s("2018-01-02")), true)]
#[case(bin(date("2018-01-02"), Operator::Eq, n(17533.0)), true)]
#[case(bin(date("2018-01-02"), Operator::Gt, s("2018-01-01T23:59:59.999+02:00")), true)]
#[case(bin(date("2018-01-01T10:00:00Z"), Operator::Eq, s("2018-01-01T12:00:00+02:00")), true)]
#[case(bin(date("2018-01-01"), Operator::Ne, s("abc")), true)]
#[case(bin(s("abc"), Operator::Lt, s("abd")), false)]
fn date_comparisons(#[case] e: Expr, #[case] expected: bool) {
    assert_eq!(Harness::new().boolean(&e), expected);
}

#[rstest]
#[case(bin(b(true), Operator::Eq, date("2018-01-01")), true)]
#[case(bin(b(false), Operator::Eq, date("2018-01-01")), false)]
#[case(bin(b(false), Operator::Eq, date("")), true)]
#[case(bin(s("2018-01-01"), Operator::Eq, b(true)), true)]
fn booleans_compare_as_booleans(#[case] e: Expr, #[case] expected: bool) {
    assert_eq!(Harness::new().boolean(&e), expected);
}

#[rstest]
fn nodeset_holding_a_date_string_is_coerced() {
    let d = doc().child(elem("start").text("2018-01-01")).build();
    let h = Harness::new();
    let out = h.number(&bin(nodes(d.children()), Operator::Plus, n(2.0)));
    assert_eq!(out, 17534.0);
}

#[rstest]
fn hook_outcomes() {
    let h = Harness::new();
    let rewritten = h
        .ext
        .handle_infix(&V::Date(odk_xpath::Moment::Blank), Operator::Lt, &V::Number(1.0));
    match rewritten {
        Some(InfixOutcome::Continue { lhs, op, rhs }) => {
            assert!(matches!(lhs, V::Number(x) if x.is_nan()));
            assert_eq!(op, Operator::Lt);
            assert_eq!(rhs, V::Number(1.0));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    let direct = h.ext.handle_infix(&V::from("2018-01-01"), Operator::Minus, &V::Number(1.0));
    assert_eq!(direct, Some(InfixOutcome::Value(V::Number(17531.0))));
    assert_eq!(h.ext.handle_infix(&V::Number(1.0), Operator::Plus, &V::Number(2.0)), None);
    assert_eq!(
        h.ext.handle_infix(&V::from("2018-01-01"), Operator::And, &V::Number(2.0)),
        None
    );
}

#[rstest]
fn union_of_scalars_is_rejected() {
    let err = Harness::new()
        .eval(&bin(s("a"), Operator::Union, s("b")))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOperands);
}

#[rstest]
fn union_merges_in_document_order() {
    let d = doc()
        .child(elem("a"))
        .child(elem("b"))
        .child(elem("c"))
        .build();
    let k = d.children();
    let out = Harness::new()
        .eval(&bin(
            nodes(vec![k[2].clone(), k[0].clone()]),
            Operator::Union,
            nodes(vec![k[1].clone(), k[0].clone()]),
        ))
        .unwrap();
    assert_eq!(out, V::NodeSet(k));
}
