use super::flatten;
use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error};
use crate::value::{XPathValue, as_boolean, node_as_boolean, string_to_number};

/// Sum of member string-values cast to Number; an empty set sums to 0 and any
/// non-numeric member poisons the result with NaN.
pub(super) fn sum_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let nodes = args[0]
        .as_nodes()
        .ok_or_else(|| Error::nodeset_required(ctx.function))?;
    let total = nodes
        .iter()
        .map(|n| string_to_number(&n.string_value(), &ctx.env.zone))
        .sum();
    Ok(XPathValue::Number(total))
}

fn extremum<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
    pick: fn(f64, f64) -> f64,
) -> Result<XPathValue<N>, Error> {
    let values: Vec<f64> = flatten(args).iter().map(|v| ctx.number(v)).collect();
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return Ok(XPathValue::Number(f64::NAN));
    }
    Ok(XPathValue::Number(
        values.into_iter().reduce(pick).unwrap_or(f64::NAN),
    ))
}

pub(super) fn max_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    extremum(ctx, args, f64::max)
}

pub(super) fn min_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    extremum(ctx, args, f64::min)
}

/// A negative bound disables that side of the check.
fn within_bounds(min: f64, max: f64, total: f64) -> bool {
    (min < 0.0 || total >= min) && (max < 0.0 || total <= max)
}

pub(super) fn checklist_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let min = ctx.number(&args[0]);
    let max = ctx.number(&args[1]);
    let checked: usize = args[2..]
        .iter()
        .map(|v| match v {
            XPathValue::NodeSet(nodes) => nodes.iter().filter(|n| node_as_boolean(*n)).count(),
            other => usize::from(as_boolean(other)),
        })
        .sum();
    Ok(XPathValue::Boolean(within_bounds(min, max, checked as f64)))
}

/// `weighted-checklist(min, max, (value, weight)*)`. When both halves of a
/// pair are NodeSets they are zipped node by node.
pub(super) fn weighted_checklist_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let pairs = &args[2..];
    if pairs.len() % 2 != 0 {
        return Err(Error::too_few_args(ctx.function));
    }
    let min = ctx.number(&args[0]);
    let max = ctx.number(&args[1]);
    let mut total = 0.0;
    for pair in pairs.chunks_exact(2) {
        match (&pair[0], &pair[1]) {
            (XPathValue::NodeSet(values), XPathValue::NodeSet(weights)) => {
                for (v, w) in values.iter().zip(weights) {
                    if node_as_boolean(v) {
                        total += string_to_number(&w.string_value(), &ctx.env.zone);
                    }
                }
            }
            (value, weight) => {
                if as_boolean(value) {
                    total += ctx.number(weight);
                }
            }
        }
    }
    Ok(XPathValue::Boolean(within_bounds(min, max, total)))
}
