use super::flatten_strings;
use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error};
use crate::value::{XPathValue, as_string, js_round};
use itertools::Itertools as _;

fn string_or_context<N: XPathNode>(ctx: &CallCtx<N>, args: &[XPathValue<N>]) -> String {
    match args.first() {
        Some(v) => as_string(v),
        None => ctx.context_string(),
    }
}

fn str_binary<N: XPathNode>(
    args: &[XPathValue<N>],
    f: impl FnOnce(&str, &str) -> XPathValue<N>,
) -> Result<XPathValue<N>, Error> {
    Ok(f(&as_string(&args[0]), &as_string(&args[1])))
}

pub(super) fn string_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::String(string_or_context(ctx, args)))
}

pub(super) fn string_length_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let len = string_or_context(ctx, args).chars().count();
    Ok(XPathValue::Number(len as f64))
}

pub(super) fn normalize_space_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let s = string_or_context(ctx, args);
    Ok(XPathValue::String(s.split_whitespace().join(" ")))
}

pub(super) fn concat_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::String(flatten_strings(args).concat()))
}

pub(super) fn join_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let sep = as_string(&args[0]);
    Ok(XPathValue::String(flatten_strings(&args[1..]).join(&sep)))
}

pub(super) fn contains_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    str_binary(args, |s, sub| XPathValue::Boolean(s.contains(sub)))
}

pub(super) fn starts_with_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    str_binary(args, |s, prefix| XPathValue::Boolean(s.starts_with(prefix)))
}

pub(super) fn ends_with_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    str_binary(args, |s, suffix| XPathValue::Boolean(s.ends_with(suffix)))
}

pub(super) fn substring_before_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    str_binary(args, |s, sep| {
        XPathValue::string(s.split_once(sep).map_or("", |(before, _)| before))
    })
}

pub(super) fn substring_after_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    str_binary(args, |s, sep| {
        XPathValue::string(s.split_once(sep).map_or("", |(_, after)| after))
    })
}

/// XPath 1.0 `substring`: 1-based character positions `p` with
/// `round(start) <= p < round(start) + round(len)`. NaN bounds select nothing.
pub(super) fn substring_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let s = as_string(&args[0]);
    let start = js_round(ctx.number(&args[1]));
    let end = match args.get(2) {
        Some(len) => start + js_round(ctx.number(len)),
        None => f64::INFINITY,
    };
    let out: String = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let p = (*i + 1) as f64;
            p >= start && p < end
        })
        .map(|(_, c)| c)
        .collect();
    Ok(XPathValue::String(out))
}

/// JS `slice` index normalization: truncate, count negatives from the end,
/// clamp into `[0, len]`.
fn slice_index(n: f64, len: usize) -> usize {
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let len_f = len as f64;
    let idx = if n < 0.0 { (len_f + n).max(0.0) } else { n.min(len_f) };
    idx as usize
}

/// `substr(s, start[, end])` with 0-based, end-exclusive character indices.
pub(super) fn substr_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let chars: Vec<char> = as_string(&args[0]).chars().collect();
    let start = slice_index(ctx.number(&args[1]), chars.len());
    let end = args
        .get(2)
        .map_or(chars.len(), |e| slice_index(ctx.number(e), chars.len()));
    let out: String = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(XPathValue::String(out))
}

pub(super) fn translate_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let s = as_string(&args[0]);
    let from: Vec<char> = as_string(&args[1]).chars().collect();
    let to: Vec<char> = as_string(&args[2]).chars().collect();
    let out: String = s
        .chars()
        .filter_map(|c| match from.iter().position(|f| *f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect();
    Ok(XPathValue::String(out))
}

pub(super) fn coalesce_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let first = as_string(&args[0]);
    if first.is_empty() {
        Ok(XPathValue::String(as_string(&args[1])))
    } else {
        Ok(XPathValue::String(first))
    }
}
