use crate::consts::XML_URI;
use crate::model::{NodeKind, XPathNode};
use crate::runtime::{CallCtx, Error};
use crate::value::{XPathValue, as_string, first_in_document_order};

pub(super) fn last_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    _args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    Ok(XPathValue::Number(ctx.eval.size as f64))
}

/// Without arguments the context position. With a NodeSet, the 1-based index
/// of its first node among same-named siblings.
pub(super) fn position_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let Some(arg) = args.first() else {
        return Ok(XPathValue::Number(ctx.eval.position as f64));
    };
    let nodes = arg
        .as_nodes()
        .ok_or_else(|| Error::nodeset_required(ctx.function))?;
    let Some(node) = first_in_document_order(nodes) else {
        return Ok(XPathValue::Number(f64::NAN));
    };
    let Some(parent) = node.parent() else {
        return Ok(XPathValue::Number(1.0));
    };
    let name = node.name();
    let mut index = 0usize;
    for sibling in parent.children() {
        if sibling.kind() == node.kind() && sibling.name() == name {
            index += 1;
        }
        if &sibling == node {
            break;
        }
    }
    Ok(XPathValue::Number(index.max(1) as f64))
}

pub(super) fn count_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let nodes = args[0]
        .as_nodes()
        .ok_or_else(|| Error::nodeset_required(ctx.function))?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

pub(super) fn count_non_empty_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let nodes = args[0]
        .as_nodes()
        .ok_or_else(|| Error::nodeset_required(ctx.function))?;
    let n = nodes.iter().filter(|n| !n.string_value().is_empty()).count();
    Ok(XPathValue::Number(n as f64))
}

/// Context node for the 0-arity form, else the document-order-first node of
/// the NodeSet argument.
fn subject_node<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<Option<N>, Error> {
    match args.first() {
        None => Ok(ctx.eval.node.clone()),
        Some(XPathValue::NodeSet(nodes)) => Ok(first_in_document_order(nodes).cloned()),
        Some(_) => Err(Error::nodeset_required(ctx.function)),
    }
}

fn is_named(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Element
            | NodeKind::Attribute
            | NodeKind::ProcessingInstruction
            | NodeKind::DocumentType
    )
}

pub(super) fn name_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let name = subject_node(ctx, args)?
        .filter(|n| is_named(n.kind()))
        .and_then(|n| n.qualified_name())
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

pub(super) fn local_name_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let name = subject_node(ctx, args)?
        .filter(|n| is_named(n.kind()))
        .and_then(|n| n.name())
        .map(|q| q.local)
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

pub(super) fn namespace_uri_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let uri = subject_node(ctx, args)?
        .filter(|n| matches!(n.kind(), NodeKind::Element | NodeKind::Attribute))
        .and_then(|n| n.namespace_uri())
        .unwrap_or_default();
    Ok(XPathValue::String(uri))
}

fn xml_lang<N: XPathNode>(node: &N) -> Option<String> {
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        let found = n.attributes().into_iter().find(|a| {
            a.name().is_some_and(|q| {
                q.local == "lang"
                    && (q.ns_uri.as_deref() == Some(XML_URI) || q.prefix.as_deref() == Some("xml"))
            })
        });
        if let Some(attr) = found {
            return Some(attr.string_value());
        }
        cur = n.parent();
    }
    None
}

/// True when the nearest `xml:lang` on the context node or its ancestors
/// equals the argument or is a sub-language of it, ignoring case.
pub(super) fn lang_fn<N: XPathNode>(
    ctx: &CallCtx<N>,
    args: &[XPathValue<N>],
) -> Result<XPathValue<N>, Error> {
    let wanted = as_string(&args[0]).to_ascii_lowercase();
    let Some(lang) = ctx.eval.node.as_ref().and_then(xml_lang) else {
        return Ok(XPathValue::Boolean(false));
    };
    let lang = lang.to_ascii_lowercase();
    let matches = lang == wanted
        || lang
            .strip_prefix(wanted.as_str())
            .is_some_and(|rest| rest.starts_with('-'));
    Ok(XPathValue::Boolean(matches))
}
