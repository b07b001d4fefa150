mod common;

use common::{Harness, Expr, call, n, nodes, s};
use odk_xpath::XPathNode;
use odk_xpath::simple_node::{doc, elem};
use odk_xpath::{ErrorCode, SimpleNode};
use rstest::rstest;

fn items(values: &[&str]) -> (SimpleNode, Vec<SimpleNode>) {
    let d = doc()
        .child(elem("list").children(values.iter().map(|v| elem("item").text(v))))
        .build();
    let list = d.children()[0].children();
    (d, list)
}

fn string(e: Expr) -> String {
    Harness::new().string(&e)
}

#[rstest]
#[case(call("substring", vec![s("12345"), n(2.0), n(3.0)]), "234")]
#[case(call("substring", vec![s("12345"), n(2.0)]), "2345")]
#[case(call("substring", vec![s("12345"), n(1.5), n(2.6)]), "234")]
#[case(call("substring", vec![s("12345"), n(0.0), n(3.0)]), "12")]
#[case(call("substring", vec![s("12345"), n(f64::NAN), n(3.0)]), "")]
#[case(call("substring", vec![s("12345"), n(1.0), n(f64::NAN)]), "")]
#[case(call("substring", vec![s("12345"), n(-42.0), n(f64::INFINITY)]), "12345")]
#[case(call("substring", vec![s("12345"), n(f64::NEG_INFINITY), n(f64::INFINITY)]), "")]
#[case(call("substr", vec![s("hello"), n(1.0), n(3.0)]), "el")]
#[case(call("substr", vec![s("hello"), n(-3.0)]), "llo")]
#[case(call("substr", vec![s("hello"), n(3.0), n(1.0)]), "")]
#[case(call("translate", vec![s("bar"), s("abc"), s("ABC")]), "BAr")]
#[case(call("translate", vec![s("--aaa--"), s("abc-"), s("ABC")]), "AAA")]
#[case(call("normalize-space", vec![s("  a \t b\n ")]), "a b")]
#[case(call("substring-before", vec![s("1999/04/01"), s("/")]), "1999")]
#[case(call("substring-after", vec![s("1999/04/01"), s("/")]), "04/01")]
#[case(call("substring-after", vec![s("abc"), s("x")]), "")]
#[case(call("coalesce", vec![s(""), s("fallback")]), "fallback")]
#[case(call("coalesce", vec![s("first"), s("fallback")]), "first")]
#[case(call("selected-at", vec![s("a b c"), n(1.0)]), "b")]
#[case(call("selected-at", vec![s("a b c"), n(3.0)]), "")]
#[case(call("selected-at", vec![s("a b c"), n(-1.0)]), "")]
#[case(call("base64-decode", vec![s("aGVsbG8=")]), "hello")]
#[case(call("base64-decode", vec![s("%%%")]), "")]
#[case(call("string", vec![n(5.0)]), "5")]
fn string_results(#[case] e: Expr, #[case] expected: &str) {
    assert_eq!(string(e), expected);
}

#[rstest]
fn concat_and_join_flatten_nodesets() {
    let (_d, list) = items(&["a", "b", "c"]);
    let h = Harness::new();
    assert_eq!(h.string(&call("concat", vec![nodes(list.clone()), s("!")])), "abc!");
    assert_eq!(h.string(&call("join", vec![s(", "), nodes(list), s("d")])), "a, b, c, d");
    assert_eq!(h.string(&call("join", vec![s("-")])), "");
}

#[rstest]
#[case(call("contains", vec![s("abc"), s("b")]), true)]
#[case(call("contains", vec![s("abc"), s("")]), true)]
#[case(call("starts-with", vec![s("abc"), s("ab")]), true)]
#[case(call("ends-with", vec![s("abc"), s("ab")]), false)]
#[case(call("selected", vec![s("yes no maybe"), s("no")]), true)]
#[case(call("selected", vec![s("yes no maybe"), s(" no ")]), true)]
#[case(call("selected", vec![s("yes no maybe"), s("n")]), false)]
#[case(call("regex", vec![s("abc"), s("a.c")]), true)]
#[case(call("regex", vec![s("abc"), s("b")]), false)]
#[case(call("regex", vec![s("12345"), s("[0-9]{5}")]), true)]
#[case(call("boolean-from-string", vec![s("1")]), true)]
#[case(call("boolean-from-string", vec![s("true")]), true)]
#[case(call("boolean-from-string", vec![s("yes")]), false)]
fn boolean_results(#[case] e: Expr, #[case] expected: bool) {
    assert_eq!(Harness::new().boolean(&e), expected);
}

#[rstest]
fn malformed_regex_is_an_error() {
    let err = Harness::new()
        .eval(&call("regex", vec![s("x"), s("(")]))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRegex);
}

#[rstest]
fn lengths_count_characters() {
    let h = Harness::new();
    assert_eq!(h.number(&call("string-length", vec![s("héllo")])), 5.0);
    assert_eq!(h.number(&call("count-selected", vec![s(" a  b c ")])), 3.0);
    assert_eq!(h.number(&call("count-selected", vec![s("")])), 0.0);
}

#[rstest]
fn zero_argument_forms_use_the_context_node() {
    let d = doc().child(elem("q").text("  seven  words ")).build();
    let h = Harness::new().at(d.children()[0].clone());
    assert_eq!(h.string(&call("string", vec![])), "  seven  words ");
    assert_eq!(h.string(&call("normalize-space", vec![])), "seven words");
    assert_eq!(h.number(&call("string-length", vec![])), 15.0);
}
