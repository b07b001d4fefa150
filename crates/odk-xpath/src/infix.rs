//! Binary-operator interception.
//!
//! The base evaluator hands every binary operation to an [`InfixHook`] before
//! applying it. [`DateInfix`] rewrites date and date-string operands into
//! day-counts so that dates compare and add like numbers.
//! [`apply_operator`] is a plain XPath 1.0 operator applier for hosts (and
//! tests) that do not bring their own.
use crate::date::{LocalZone, is_date_string};
use crate::model::XPathNode;
use crate::runtime::{Error, ErrorCode};
use crate::support::sort_document_order;
use crate::value::{XPathValue, as_boolean, as_number, as_string};
use core::fmt;
use smallvec::{SmallVec, smallvec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Multiply,
    Div,
    Mod,
    Union,
}

impl Operator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge
        )
    }

    pub fn is_additive(self) -> bool {
        matches!(self, Operator::Plus | Operator::Minus)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Or => "or",
            Operator::And => "and",
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Div => "div",
            Operator::Mod => "mod",
            Operator::Union => "|",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfixOutcome<N> {
    /// Proceed with the native operator on rewritten operands.
    Continue {
        lhs: XPathValue<N>,
        op: Operator,
        rhs: XPathValue<N>,
    },
    /// Final result; the operator is not applied.
    Value(XPathValue<N>),
}

pub trait InfixHook<N>: Send + Sync {
    /// `None` means no coercion applies and the operation proceeds unchanged.
    fn handle_infix(
        &self,
        lhs: &XPathValue<N>,
        op: Operator,
        rhs: &XPathValue<N>,
    ) -> Option<InfixOutcome<N>>;
}

/// Date-aware coercion. Booleans are never coerced, so `true() = date(...)`
/// stays a boolean comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateInfix {
    pub zone: LocalZone,
}

impl DateInfix {
    pub fn new(zone: LocalZone) -> Self {
        Self { zone }
    }
}

fn looks_like_date<N: XPathNode>(v: &XPathValue<N>) -> bool {
    match v {
        XPathValue::String(_) | XPathValue::NodeSet(_) => is_date_string(as_string(v).trim()),
        _ => false,
    }
}

impl<N: XPathNode> InfixHook<N> for DateInfix {
    fn handle_infix(
        &self,
        lhs: &XPathValue<N>,
        op: Operator,
        rhs: &XPathValue<N>,
    ) -> Option<InfixOutcome<N>> {
        if matches!(op, Operator::Or | Operator::And | Operator::Union) {
            return None;
        }
        if matches!(lhs, XPathValue::Boolean(_)) || matches!(rhs, XPathValue::Boolean(_)) {
            return None;
        }
        let tagged = matches!(lhs, XPathValue::Date(_)) || matches!(rhs, XPathValue::Date(_));
        let string_date = (op.is_additive() || op.is_comparison())
            && (looks_like_date(lhs) || looks_like_date(rhs));
        if !tagged && !string_date {
            return None;
        }
        let l = as_number(lhs, &self.zone);
        let r = as_number(rhs, &self.zone);
        if string_date && op.is_additive() {
            let days = if op == Operator::Plus { l + r } else { l - r };
            tracing::trace!(%op, days, "date-string arithmetic");
            return Some(InfixOutcome::Value(XPathValue::Number(days)));
        }
        tracing::trace!(%op, lhs = l, rhs = r, "date operands coerced to day-counts");
        Some(InfixOutcome::Continue {
            lhs: XPathValue::Number(l),
            op,
            rhs: XPathValue::Number(r),
        })
    }
}

/// NodeSets spread into one string per node; scalars stay as they are.
fn atoms<N: XPathNode>(v: &XPathValue<N>) -> SmallVec<[XPathValue<N>; 4]> {
    match v {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|n| XPathValue::String(n.string_value()))
            .collect(),
        other => smallvec![other.clone()],
    }
}

fn compare_numbers(op: Operator, l: f64, r: f64) -> bool {
    match op {
        Operator::Eq => l == r,
        Operator::Ne => l != r,
        Operator::Lt => l < r,
        Operator::Le => l <= r,
        Operator::Gt => l > r,
        Operator::Ge => l >= r,
        _ => false,
    }
}

fn compare_atoms<N: XPathNode>(
    op: Operator,
    l: &XPathValue<N>,
    r: &XPathValue<N>,
    zone: &LocalZone,
) -> bool {
    let boolean = matches!(l, XPathValue::Boolean(_)) || matches!(r, XPathValue::Boolean(_));
    let numeric = matches!(l, XPathValue::Number(_) | XPathValue::Date(_))
        || matches!(r, XPathValue::Number(_) | XPathValue::Date(_));
    match op {
        Operator::Eq | Operator::Ne if boolean => {
            (as_boolean(l) == as_boolean(r)) == (op == Operator::Eq)
        }
        Operator::Eq | Operator::Ne if !numeric => {
            (as_string(l) == as_string(r)) == (op == Operator::Eq)
        }
        _ => compare_numbers(op, as_number(l, zone), as_number(r, zone)),
    }
}

/// Existential comparison: true if some pair of atoms satisfies `op`. A
/// NodeSet against a Boolean compares the NodeSet's own truth value.
fn compare<N: XPathNode>(
    op: Operator,
    lhs: &XPathValue<N>,
    rhs: &XPathValue<N>,
    zone: &LocalZone,
) -> bool {
    let set_vs_bool = matches!(
        (lhs, rhs),
        (XPathValue::NodeSet(_), XPathValue::Boolean(_))
            | (XPathValue::Boolean(_), XPathValue::NodeSet(_))
    );
    if set_vs_bool {
        let l = XPathValue::<N>::Boolean(as_boolean(lhs));
        let r = XPathValue::<N>::Boolean(as_boolean(rhs));
        return compare_atoms(op, &l, &r, zone);
    }
    let right = atoms(rhs);
    atoms(lhs)
        .iter()
        .any(|l| right.iter().any(|r| compare_atoms(op, l, r, zone)))
}

/// XPath 1.0 semantics for an already-evaluated binary operation.
pub fn apply_operator<N: XPathNode>(
    lhs: &XPathValue<N>,
    op: Operator,
    rhs: &XPathValue<N>,
    zone: &LocalZone,
) -> Result<XPathValue<N>, Error> {
    let num = |v: &XPathValue<N>| as_number(v, zone);
    Ok(match op {
        Operator::Or => XPathValue::Boolean(as_boolean(lhs) || as_boolean(rhs)),
        Operator::And => XPathValue::Boolean(as_boolean(lhs) && as_boolean(rhs)),
        Operator::Plus => XPathValue::Number(num(lhs) + num(rhs)),
        Operator::Minus => XPathValue::Number(num(lhs) - num(rhs)),
        Operator::Multiply => XPathValue::Number(num(lhs) * num(rhs)),
        Operator::Div => XPathValue::Number(num(lhs) / num(rhs)),
        Operator::Mod => XPathValue::Number(num(lhs) % num(rhs)),
        Operator::Union => match (lhs, rhs) {
            (XPathValue::NodeSet(a), XPathValue::NodeSet(b)) => {
                let mut nodes = a.clone();
                for n in b {
                    if !nodes.contains(n) {
                        nodes.push(n.clone());
                    }
                }
                sort_document_order(&mut nodes);
                XPathValue::NodeSet(nodes)
            }
            _ => {
                return Err(Error::from_code(
                    ErrorCode::InvalidOperands,
                    format!("union requires nodesets, got {} | {}", lhs.kind(), rhs.kind()),
                ));
            }
        },
        _ => XPathValue::Boolean(compare(op, lhs, rhs, zone)),
    })
}

/// Run `hook` first, then apply whatever operation remains.
pub fn evaluate_infix<N: XPathNode>(
    hook: Option<&dyn InfixHook<N>>,
    lhs: &XPathValue<N>,
    op: Operator,
    rhs: &XPathValue<N>,
    zone: &LocalZone,
) -> Result<XPathValue<N>, Error> {
    match hook.and_then(|h| h.handle_infix(lhs, op, rhs)) {
        Some(InfixOutcome::Value(v)) => Ok(v),
        Some(InfixOutcome::Continue { lhs, op, rhs }) => apply_operator(&lhs, op, &rhs, zone),
        None => apply_operator(lhs, op, rhs, zone),
    }
}
