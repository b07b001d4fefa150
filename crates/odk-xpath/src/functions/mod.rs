//! Built-in function table: the XPath 1.0 core library re-expressed over
//! [`XPathValue`] plus the ODK/OpenRosa extensions.
//!
//! Registration conventions:
//! - One registration per function name, with an arity range. Optional
//!   parameters are dispatched inside the function on `args.len()`.
//! - `None` as max arity marks a variadic function.
//! - Arguments arrive fully evaluated; functions never see unevaluated
//!   expressions.
use crate::model::XPathNode;
use crate::runtime::FunctionRegistry;
use crate::value::{XPathValue, as_string};

pub mod aggregate;
pub mod boolean;
pub mod datetime;
pub mod geo;
pub mod nodes;
pub mod numeric;
pub mod odk;
pub mod strings;

/// Spread NodeSet arguments into one String per node; scalars pass through.
pub(crate) fn flatten<N: XPathNode>(args: &[XPathValue<N>]) -> Vec<XPathValue<N>> {
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        match a {
            XPathValue::NodeSet(nodes) => {
                out.extend(nodes.iter().map(|n| XPathValue::String(n.string_value())));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

/// Every argument as text, NodeSets contributing one string per node.
pub(crate) fn flatten_strings<N: XPathNode>(args: &[XPathValue<N>]) -> Vec<String> {
    flatten(args).iter().map(as_string).collect()
}

fn register_default_functions<N: XPathNode>(reg: &mut FunctionRegistry<N>) {
    macro_rules! reg {
        ($name:expr, $arity:expr, $func:expr $(,)?) => {{
            reg.register_fn($name, $arity, $func);
        }};
    }
    macro_rules! reg_range {
        ($name:expr, $min:expr, $max:expr, $func:expr $(,)?) => {{
            reg.register_fn_range($name, $min, Some($max), $func);
        }};
    }
    macro_rules! reg_variadic {
        ($name:expr, $min:expr, $func:expr $(,)?) => {{
            reg.register_fn_range($name, $min, None, $func);
        }};
    }

    // ===== Booleans =====
    reg!("true", 0, boolean::true_fn::<N>);
    reg!("false", 0, boolean::false_fn::<N>);
    reg!("not", 1, boolean::not_fn::<N>);
    reg!("boolean", 1, boolean::boolean_fn::<N>);
    reg!("boolean-from-string", 1, boolean::boolean_from_string_fn::<N>);

    // ===== Numbers =====
    reg_range!("number", 0, 1, numeric::number_fn::<N>);
    reg!("floor", 1, numeric::floor_fn::<N>);
    reg!("ceiling", 1, numeric::ceiling_fn::<N>);
    reg!("abs", 1, numeric::abs_fn::<N>);
    reg!("int", 1, numeric::int_fn::<N>);
    reg_range!("round", 1, 2, numeric::round_fn::<N>);
    reg!("sqrt", 1, numeric::sqrt_fn::<N>);
    reg!("exp", 1, numeric::exp_fn::<N>);
    reg!("exp10", 1, numeric::exp10_fn::<N>);
    reg!("log", 1, numeric::log_fn::<N>);
    reg!("log10", 1, numeric::log10_fn::<N>);
    reg!("sin", 1, numeric::sin_fn::<N>);
    reg!("cos", 1, numeric::cos_fn::<N>);
    reg!("tan", 1, numeric::tan_fn::<N>);
    reg!("asin", 1, numeric::asin_fn::<N>);
    reg!("acos", 1, numeric::acos_fn::<N>);
    reg!("atan", 1, numeric::atan_fn::<N>);
    reg!("atan2", 2, numeric::atan2_fn::<N>);
    reg!("pow", 2, numeric::pow_fn::<N>);
    reg!("pi", 0, numeric::pi_fn::<N>);
    reg!("random", 0, numeric::random_fn::<N>);

    // ===== Strings =====
    reg_range!("string", 0, 1, strings::string_fn::<N>);
    reg_range!("string-length", 0, 1, strings::string_length_fn::<N>);
    reg_range!("normalize-space", 0, 1, strings::normalize_space_fn::<N>);
    reg_variadic!("concat", 0, strings::concat_fn::<N>);
    reg_variadic!("join", 1, strings::join_fn::<N>);
    reg!("contains", 2, strings::contains_fn::<N>);
    reg!("starts-with", 2, strings::starts_with_fn::<N>);
    reg!("ends-with", 2, strings::ends_with_fn::<N>);
    reg!("substring-before", 2, strings::substring_before_fn::<N>);
    reg!("substring-after", 2, strings::substring_after_fn::<N>);
    reg_range!("substring", 2, 3, strings::substring_fn::<N>);
    reg_range!("substr", 2, 3, strings::substr_fn::<N>);
    reg!("translate", 3, strings::translate_fn::<N>);
    reg!("coalesce", 2, strings::coalesce_fn::<N>);

    // ===== Nodes & context =====
    reg!("last", 0, nodes::last_fn::<N>);
    reg_range!("position", 0, 1, nodes::position_fn::<N>);
    reg!("count", 1, nodes::count_fn::<N>);
    reg!("count-non-empty", 1, nodes::count_non_empty_fn::<N>);
    reg_range!("name", 0, 1, nodes::name_fn::<N>);
    reg_range!("local-name", 0, 1, nodes::local_name_fn::<N>);
    reg_range!("namespace-uri", 0, 1, nodes::namespace_uri_fn::<N>);
    reg!("lang", 1, nodes::lang_fn::<N>);

    // ===== Aggregates =====
    reg!("sum", 1, aggregate::sum_fn::<N>);
    reg_variadic!("max", 1, aggregate::max_fn::<N>);
    reg_variadic!("min", 1, aggregate::min_fn::<N>);
    reg_variadic!("checklist", 2, aggregate::checklist_fn::<N>);
    reg_variadic!("weighted-checklist", 2, aggregate::weighted_checklist_fn::<N>);

    // ===== Dates =====
    reg!("date", 1, datetime::date_fn::<N>);
    reg!("date-time", 1, datetime::date_fn::<N>);
    reg!("decimal-date-time", 1, datetime::decimal_date_time_fn::<N>);
    reg!("decimal-time", 1, datetime::decimal_time_fn::<N>);
    reg!("today", 0, datetime::today_fn::<N>);
    reg!("now", 0, datetime::now_fn::<N>);
    reg!("format-date", 2, datetime::format_date_fn::<N>);
    reg!("format-date-time", 2, datetime::format_date_fn::<N>);

    // ===== Geo =====
    reg_variadic!("area", 1, geo::area_fn::<N>);
    reg_variadic!("distance", 1, geo::distance_fn::<N>);

    // ===== ODK helpers =====
    reg!("once", 1, odk::once_fn::<N>);
    reg!("if", 3, odk::if_fn::<N>);
    reg!("selected", 2, odk::selected_fn::<N>);
    reg!("selected-at", 2, odk::selected_at_fn::<N>);
    reg!("count-selected", 1, odk::count_selected_fn::<N>);
    reg_range!("randomize", 1, 2, odk::randomize_fn::<N>);
    reg_range!("uuid", 0, 1, odk::uuid_fn::<N>);
    reg_range!("digest", 2, 3, odk::digest_fn::<N>);
    reg!("regex", 2, odk::regex_fn::<N>);
    reg!("base64-decode", 1, odk::base64_decode_fn::<N>);
}

/// The complete built-in function table.
pub fn default_function_registry<N: XPathNode>() -> FunctionRegistry<N> {
    let mut reg = FunctionRegistry::new();
    register_default_functions(&mut reg);
    tracing::debug!(functions = reg.len(), "built default function registry");
    reg
}
