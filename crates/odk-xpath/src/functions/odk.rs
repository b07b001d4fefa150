use crate::model::XPathNode;
use crate::runtime::{CallCtx, Error, ErrorCode};
use crate::support;
use crate::value::{XPathValue, as_boolean, as_string};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// The context node's value when it already has one, else the argument.
/// Persisting the result is the host's job.
pub(super) fn once_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let current = ctx.context_string();
    if current.is_empty() {
        Ok(args[0].clone())
    } else {
        Ok(XPathValue::String(current))
    }
}

/// Both branches arrive already evaluated; this only selects.
pub(super) fn if_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let picked = if as_boolean(&args[0]) { &args[1] } else { &args[2] };
    Ok(picked.clone())
}

pub(super) fn selected_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let list = as_string(&args[0]);
    let wanted = as_string(&args[1]);
    let wanted = wanted.trim();
    Ok(XPathValue::Boolean(
        list.split_whitespace().any(|item| item == wanted),
    ))
}

/// 0-based lookup into a space-separated list; `""` when out of range.
pub(super) fn selected_at_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let list = as_string(&args[0]);
    let index = ctx.number(&args[1]);
    let item = if index.is_finite() && index >= 0.0 {
        list.split_whitespace().nth(index.trunc() as usize)
    } else {
        None
    };
    Ok(XPathValue::string(item.unwrap_or_default()))
}

pub(super) fn count_selected_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let n = as_string(&args[0]).split_whitespace().count();
    Ok(XPathValue::Number(n as f64))
}

/// `randomize(nodeset[, seed])`: the set in document order, then shuffled.
/// A seed must be a finite integer.
pub(super) fn randomize_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let mut nodes = args[0]
        .as_nodes()
        .ok_or_else(|| Error::nodeset_required(ctx.function))?
        .to_vec();
    let seed = match args.get(1) {
        Some(v) => {
            let seed = ctx.number(v);
            if !seed.is_finite() || seed.fract() != 0.0 {
                return Err(Error::from_code(
                    ErrorCode::InvalidArgType,
                    format!("{}() seed must be an integer, got {}", ctx.function, as_string(v)),
                ));
            }
            Some(seed)
        }
        None => None,
    };
    support::sort_document_order(&mut nodes);
    Ok(XPathValue::NodeSet(support::shuffle(&nodes, seed)))
}

/// Longest token `uuid(length)` produces; anything above yields `""`.
pub const MAX_TOKEN_LEN: usize = 1024;

/// A v4 UUID, or with a length argument a random hex token of that length.
pub(super) fn uuid_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let Some(len) = args.first() else {
        return Ok(XPathValue::String(uuid::Uuid::new_v4().to_string()));
    };
    let len = ctx.number(len);
    let len = if len.is_finite() && len > 0.0 && len <= MAX_TOKEN_LEN as f64 {
        len.trunc() as usize
    } else {
        0
    };
    Ok(XPathValue::String(support::random_token(len)))
}

/// `digest(message, algorithm[, encoding])`; encoding is `base64` (default)
/// or `hex`.
pub(super) fn digest_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let message = as_string(&args[0]);
    let algorithm = as_string(&args[1]);
    let encoding = args.get(2).map_or_else(|| "base64".to_string(), as_string);
    let bytes = ctx.env.digester.digest(&algorithm, message.as_bytes())?;
    let encoded = match encoding.to_ascii_lowercase().as_str() {
        "base64" => STANDARD.encode(bytes),
        "hex" => hex::encode(bytes),
        other => {
            return Err(Error::from_code(
                ErrorCode::InvalidFormat,
                format!("unsupported digest encoding: {other}"),
            ));
        }
    };
    Ok(XPathValue::String(encoded))
}

/// Whole-string match. A malformed pattern is an error, not a mismatch.
pub(super) fn regex_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let s = as_string(&args[0]);
    let pattern = as_string(&args[1]);
    let re = fancy_regex::Regex::new(&format!("^(?:{pattern})$"))?;
    Ok(XPathValue::Boolean(re.is_match(&s)?))
}

pub(super) fn base64_decode_fn<N: XPathNode>(
    _ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let input = as_string(&args[0]);
    let decoded = STANDARD
        .decode(input.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default();
    Ok(XPathValue::String(decoded))
}
