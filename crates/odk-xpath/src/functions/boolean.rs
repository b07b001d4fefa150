use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error};
use crate::value::{XPathValue, as_boolean, as_string};

pub(super) fn true_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Boolean(true))
}

pub(super) fn false_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Boolean(false))
}

pub(super) fn not_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Boolean(!as_boolean(&args[0])))
}

pub(super) fn boolean_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Boolean(as_boolean(&args[0])))
}

pub(super) fn boolean_from_string_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let s = as_string(&args[0]);
    Ok(XPathValue::Boolean(s == "true" || s == "1"))
}
