use super::flatten_strings;
use crate::geo::{self, GeoPoint};
use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error};
use crate::value::XPathValue;

fn points<N: XPathNode>(args: &[XPathValue<N>]) -> Option<Vec<GeoPoint>> {
    let inputs = flatten_strings(args);
    geo::parse_points(inputs.iter().map(String::as_str))
}

pub(super) fn area_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let area = points(args).map_or(f64::NAN, |p| geo::area(&p));
    Ok(XPathValue::Number(area))
}

pub(super) fn distance_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let distance = points(args).map_or(f64::NAN, |p| geo::distance(&p));
    Ok(XPathValue::Number(distance))
}
