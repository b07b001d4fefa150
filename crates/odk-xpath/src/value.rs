//! Tagged XPath values and the XPath 1.0 conversion rules, extended with a
//! `Date` variant.
//!
//! All three casts are total: bad input yields NaN, `""` or `false`.
use crate::date::{self, LocalZone, Moment};
use crate::model::XPathNode;
use crate::support;
use core::fmt;

/// Value-kind discriminator, displayed with the short XPR tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    Date,
    NodeSet,
}

impl ValueKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "bool",
            ValueKind::Number => "num",
            ValueKind::String => "str",
            ValueKind::Date => "date",
            ValueKind::NodeSet => "arr",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    Boolean(bool),
    Number(f64),
    String(String),
    Date(Moment),
    NodeSet(Vec<N>),
}

impl<N> XPathValue<N> {
    pub fn kind(&self) -> ValueKind {
        match self {
            XPathValue::Boolean(_) => ValueKind::Boolean,
            XPathValue::Number(_) => ValueKind::Number,
            XPathValue::String(_) => ValueKind::String,
            XPathValue::Date(_) => ValueKind::Date,
            XPathValue::NodeSet(_) => ValueKind::NodeSet,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        XPathValue::String(s.into())
    }

    pub fn as_nodes(&self) -> Option<&[N]> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl<N> From<bool> for XPathValue<N> {
    fn from(b: bool) -> Self {
        XPathValue::Boolean(b)
    }
}

impl<N> From<f64> for XPathValue<N> {
    fn from(n: f64) -> Self {
        XPathValue::Number(n)
    }
}

impl<N> From<&str> for XPathValue<N> {
    fn from(s: &str) -> Self {
        XPathValue::String(s.to_string())
    }
}

impl<N> From<String> for XPathValue<N> {
    fn from(s: String) -> Self {
        XPathValue::String(s)
    }
}

impl<N> From<Moment> for XPathValue<N> {
    fn from(m: Moment) -> Self {
        XPathValue::Date(m)
    }
}

/// The node first in document order, if any.
pub fn first_in_document_order<N: XPathNode>(nodes: &[N]) -> Option<&N> {
    let ranks = support::tree_ranks(nodes);
    nodes
        .iter()
        .zip(ranks)
        .min_by(|(a, ra), (b, rb)| support::compare_ranked(*a, *ra, *b, *rb))
        .map(|(n, _)| n)
}

pub fn as_boolean<N: XPathNode>(v: &XPathValue<N>) -> bool {
    match v {
        XPathValue::Boolean(b) => *b,
        XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
        XPathValue::String(s) => !s.is_empty(),
        XPathValue::Date(m) => m.is_valid(),
        XPathValue::NodeSet(nodes) => !nodes.is_empty(),
    }
}

/// A bare node reference is truthy when its trimmed string-value is non-empty.
pub fn node_as_boolean<N: XPathNode>(node: &N) -> bool {
    !node.string_value().trim().is_empty()
}

pub fn as_number<N: XPathNode>(v: &XPathValue<N>, zone: &LocalZone) -> f64 {
    match v {
        XPathValue::Number(n) => *n,
        XPathValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        XPathValue::Date(m) => date::date_to_days(m),
        XPathValue::String(s) => string_to_number(s, zone),
        XPathValue::NodeSet(_) => string_to_number(&as_string(v), zone),
    }
}

/// String → Number with date-string detection.
pub fn string_to_number(s: &str, zone: &LocalZone) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return f64::NAN;
    }
    if date::is_date_string(t) {
        return date::date_string_to_days(t, zone);
    }
    parse_number(t)
}

/// JS-style numeric parse of already-trimmed text; NaN on failure.
/// Accepts `Infinity` but not Rust's `inf`/`nan` spellings.
pub fn parse_number(t: &str) -> f64 {
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let well_formed = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
        && t.bytes().any(|b| b.is_ascii_digit());
    if !well_formed {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn as_string<N: XPathNode>(v: &XPathValue<N>) -> String {
    match v {
        XPathValue::String(s) => s.clone(),
        XPathValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        XPathValue::Number(n) => format_number(*n),
        XPathValue::Date(m) => date::date_as_string(m),
        XPathValue::NodeSet(nodes) => first_in_document_order(nodes)
            .map(XPathNode::string_value)
            .unwrap_or_default(),
    }
}

/// Number → String following JavaScript's `Number.prototype.toString`:
/// integral values without a fraction, `Infinity`, `-0` as `0`, and
/// exponent notation outside `[1e-6, 1e21)`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }
    // Rust prints `1e21` / `1.5e-7`; JS wants an explicit sign on positive exponents
    let s = format!("{n:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// `Math.round`: halves round towards +∞, and results in `[-0.5, 0)` keep
/// their negative sign.
pub fn js_round(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let f = x.floor();
    let r = if x - f >= 0.5 { f + 1.0 } else { f };
    if r == 0.0 && x < 0.0 { -0.0 } else { r }
}
