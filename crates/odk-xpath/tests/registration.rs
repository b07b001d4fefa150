mod common;

use common::{Harness, V, env};
use odk_xpath::XPathNode;
use odk_xpath::simple_node::{SimpleNode, doc, elem};
use odk_xpath::value::as_number;
use odk_xpath::{
    ErrorCode, EvaluationContext, ExternalResult, FunctionDescriptor, Moment, OdkExtensions,
    ResultKind, ValueKind, XPathValue,
};
use rstest::rstest;

fn descriptor(arg_types: Vec<ValueKind>, return_type: ValueKind) -> FunctionDescriptor<SimpleNode> {
    FunctionDescriptor::new(arg_types, return_type, |args| {
        Ok(args.first().cloned().unwrap_or(V::from("none")))
    })
}

#[rstest]
#[case("abs")]
#[case("date")]
#[case("format-date")]
fn builtin_names_cannot_be_reused(#[case] name: &str) {
    let err = OdkExtensions::<SimpleNode>::builder()
        .add_function(name, descriptor(vec![ValueKind::Number], ValueKind::Number))
        .err()
        .unwrap();
    assert_eq!(err.code, ErrorCode::FunctionExists);
}

#[rstest]
fn second_registration_of_a_host_name_fails() {
    let builder = OdkExtensions::<SimpleNode>::builder()
        .add_function("twice", descriptor(vec![], ValueKind::String))
        .unwrap();
    let err = builder
        .add_function("twice", descriptor(vec![], ValueKind::String))
        .err()
        .unwrap();
    assert_eq!(err.code, ErrorCode::FunctionExists);
}

#[rstest]
#[case(ValueKind::NodeSet)]
#[case(ValueKind::Date)]
fn unsupported_argument_kinds(#[case] kind: ValueKind) {
    let err = OdkExtensions::<SimpleNode>::builder()
        .add_function("host-fn", descriptor(vec![ValueKind::String, kind], ValueKind::String))
        .err()
        .unwrap();
    assert_eq!(err.code, ErrorCode::UnsupportedType);
}

fn with_host_functions() -> Harness {
    let ext = OdkExtensions::builder()
        .with_environment(env())
        .add_function(
            "double-it",
            FunctionDescriptor::new(vec![ValueKind::Number], ValueKind::Number, |args| {
                match &args[0] {
                    XPathValue::Number(x) => Ok(XPathValue::Number(x * 2.0)),
                    other => panic!("argument not cast: {other:?}"),
                }
            }),
        )
        .unwrap()
        .add_function(
            "echo-number",
            descriptor(vec![ValueKind::String], ValueKind::Number),
        )
        .unwrap()
        .add_function("flag", descriptor(vec![ValueKind::Boolean], ValueKind::Boolean))
        .unwrap()
        .build();
    Harness::with_extensions(ext)
}

#[rstest]
fn arguments_are_cast_and_results_retagged() {
    let h = with_host_functions();
    assert_eq!(h.call("double-it", vec![V::from("21")]).unwrap(), V::Number(42.0));
    assert_eq!(h.call("echo-number", vec![V::from(" 5 ")]).unwrap(), V::Number(5.0));
    assert_eq!(h.call("flag", vec![V::from("")]).unwrap(), V::Boolean(false));
    assert_eq!(h.call("flag", vec![V::Number(3.0)]).unwrap(), V::Boolean(true));
    assert!(h.ext.has_function("double-it"));
}

#[rstest]
#[case(0, ErrorCode::TooFewArgs)]
#[case(2, ErrorCode::TooManyArgs)]
fn host_functions_check_exact_arity(#[case] argc: usize, #[case] code: ErrorCode) {
    let h = with_host_functions();
    let err = h.call("double-it", vec![V::Number(1.0); argc]).unwrap_err();
    assert_eq!(err.code, code);
}

#[rstest]
fn date_results_bridge_to_every_kind() {
    let h = Harness::new();
    let date = h.call("date", vec![V::from("2018-01-01T06:00:00Z")]).unwrap();
    let ext = &h.ext;
    assert_eq!(
        ext.to_external_result(&date, ResultKind::Boolean).unwrap(),
        ExternalResult::Boolean(true)
    );
    match ext.to_external_result(&date, ResultKind::Number).unwrap() {
        ExternalResult::Number(days) => assert!((days - (17532.0 + 8.0 / 24.0)).abs() < 1e-9),
        other => panic!("expected a number, got {other:?}"),
    }
    assert_eq!(
        ext.to_external_result(&date, ResultKind::String).unwrap(),
        ExternalResult::String("2018-01-01T08:00:00.000+02:00".into())
    );
    assert_eq!(
        ext.to_external_result(&date, ResultKind::Any).unwrap(),
        ExternalResult::String("2018-01-01T08:00:00.000+02:00".into())
    );
}

#[rstest]
#[case(Moment::Blank, "")]
#[case(Moment::Invalid, "Invalid Date")]
fn unusable_dates_as_strings(#[case] m: Moment, #[case] expected: &str) {
    let ext = Harness::new().ext;
    let v = V::Date(m);
    assert_eq!(
        ext.to_external_result(&v, ResultKind::String).unwrap(),
        ExternalResult::String(expected.into())
    );
    assert_eq!(
        ext.to_external_result(&v, ResultKind::Boolean).unwrap(),
        ExternalResult::Boolean(false)
    );
}

#[rstest]
fn nodeset_with_date_text_requested_as_number() {
    let d = doc().child(elem("dob").text("2018-01-02")).build();
    let ext = Harness::new().ext;
    let v = V::NodeSet(d.children());
    assert_eq!(
        ext.to_external_result(&v, ResultKind::Number).unwrap(),
        ExternalResult::Number(17533.0)
    );
    assert_eq!(
        ext.to_external_result(&v, ResultKind::NodeSet).unwrap(),
        ExternalResult::NodeSet(d.children())
    );
    assert_eq!(
        ext.to_external_result(&V::from("x"), ResultKind::NodeSet).unwrap_err().code,
        ErrorCode::InvalidArgType
    );
}

#[rstest]
fn scalar_results_pass_through() {
    let ext = Harness::new().ext;
    assert_eq!(
        ext.to_external_result(&V::Number(2.5), ResultKind::String).unwrap(),
        ExternalResult::String("2.5".into())
    );
    assert_eq!(
        ext.to_external_result(&V::from("7"), ResultKind::Any).unwrap(),
        ExternalResult::String("7".into())
    );
    assert_eq!(
        ext.to_external_result(&V::from("7"), ResultKind::Number).unwrap(),
        ExternalResult::Number(as_number(&V::from("7"), &ext.environment().zone))
    );
}

#[rstest]
fn default_extensions_are_usable_without_configuration() {
    let ext = OdkExtensions::<SimpleNode>::default();
    let out = ext
        .call("concat", &EvaluationContext::default(), &[V::from("a"), V::from("b")])
        .unwrap();
    assert_eq!(out, V::from("ab"));
    assert!(ext.registry().len() > 60);
}
