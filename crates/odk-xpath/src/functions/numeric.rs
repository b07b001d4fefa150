use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error};
use crate::value::{XPathValue, js_round, string_to_number};

fn num_unary<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
    f: impl FnOnce(f64) -> f64,
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Number(f(ctx.number(&args[0]))))
}

fn num_binary<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
    f: impl FnOnce(f64, f64) -> f64,
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Number(f(
        ctx.number(&args[0]),
        ctx.number(&args[1]),
    )))
}

pub(super) fn number_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let n = match args.first() {
        Some(v) => ctx.number(v),
        None => string_to_number(&ctx.context_string(), &ctx.env.zone),
    };
    Ok(XPathValue::Number(n))
}

pub(super) fn floor_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::floor)
}

pub(super) fn ceiling_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::ceil)
}

pub(super) fn abs_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::abs)
}

/// Truncation towards zero.
pub(super) fn int_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::trunc)
}

/// `round(x)` is `Math.round`; `round(x, digits)` rounds to `digits` decimal
/// places (negative digits round to tens, hundreds, ...).
pub(super) fn round_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let x = ctx.number(&args[0]);
    let Some(digits) = args.get(1) else {
        return Ok(XPathValue::Number(js_round(x)));
    };
    let digits = ctx.number(digits).trunc();
    let scale = 10f64.powf(digits.abs());
    let rounded = if digits >= 0.0 {
        js_round(x * scale) / scale
    } else {
        js_round(x / scale) * scale
    };
    Ok(XPathValue::Number(rounded))
}

pub(super) fn sqrt_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::sqrt)
}

pub(super) fn exp_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::exp)
}

pub(super) fn exp10_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, |n| 10f64.powf(n))
}

/// Natural logarithm.
pub(super) fn log_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::ln)
}

pub(super) fn log10_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::log10)
}

pub(super) fn sin_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::sin)
}

pub(super) fn cos_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::cos)
}

pub(super) fn tan_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::tan)
}

pub(super) fn asin_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::asin)
}

pub(super) fn acos_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::acos)
}

pub(super) fn atan_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_unary(ctx, args, f64::atan)
}

pub(super) fn atan2_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_binary(ctx, args, f64::atan2)
}

pub(super) fn pow_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    num_binary(ctx, args, |base, exp| {
        // IEEE pow gives 1 here; Math.pow gives NaN
        if base.abs() == 1.0 && !exp.is_finite() {
            f64::NAN
        } else {
            base.powf(exp)
        }
    })
}

pub(super) fn pi_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Number(core::f64::consts::PI))
}

pub(super) fn random_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Number(fastrand::f64()))
}
