use crate::date::{self, Moment};
use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error};
use crate::value::{XPathValue, as_string};

/// `date(x)` / `date-time(x)`. Never fails: unusable input yields a blank or
/// invalid moment.
pub(super) fn date_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Date(ctx.date(&args[0])))
}

pub(super) fn decimal_date_time_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let days = match &args[0] {
        XPathValue::Number(n) => *n,
        XPathValue::Date(m) => date::date_to_days(m),
        other => date::date_string_to_days(as_string(other).trim(), &ctx.env.zone),
    };
    Ok(XPathValue::Number(days))
}

pub(super) fn decimal_time_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let today = ctx.env.now().date_naive();
    let s = as_string(&args[0]);
    Ok(XPathValue::Number(date::decimal_time(
        s.trim(),
        today,
        &ctx.env.zone,
    )))
}

pub(super) fn today_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Date(date::local_midnight(
        &ctx.env.now(),
        &ctx.env.zone,
    )))
}

pub(super) fn now_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Date(Moment::Valid(ctx.env.now())))
}

/// `format-date(date, format)` and its `format-date-time` alias.
pub(super) fn format_date_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let moment = ctx.date(&args[0]);
    let format = as_string(&args[1]);
    date::format_date(&moment, &format).map(XPathValue::String)
}
