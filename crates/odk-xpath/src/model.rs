use crate::runtime::{Error, ErrorCode};
use core::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    DocumentType,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            ns_uri: None,
        }
    }

    /// `prefix:local`, or just `local` when unprefixed.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) if !p.is_empty() => format!("{}:{}", p, self.local),
            _ => self.local.clone(),
        }
    }
}

/// Fallback comparator for document order based on ancestry and stable
/// sibling ordering.
///
/// - If one node is an ancestor of the other, the ancestor precedes the descendant.
/// - Among siblings, attributes come first, then child nodes; within each group
///   the order provided by the host is preserved.
/// - Nodes from different roots cannot be ordered by this fallback and fail
///   with [`ErrorCode::DisjointTrees`]; hosts that need a global order across
///   trees override `XPathNode::compare_document_order`.
pub fn try_compare_by_ancestry<N: XPathNode>(a: &N, b: &N) -> Result<Ordering, Error> {
    if a == b {
        return Ok(Ordering::Equal);
    }
    fn path_to_root<N: XPathNode>(mut n: N) -> Vec<N> {
        let mut p = vec![n.clone()];
        while let Some(parent) = n.parent() {
            p.push(parent.clone());
            n = parent;
        }
        p.reverse();
        p
    }
    let pa = path_to_root(a.clone());
    let pb = path_to_root(b.clone());
    let len = core::cmp::min(pa.len(), pb.len());
    let mut i = 0usize;
    while i < len && pa[i] == pb[i] {
        i += 1;
    }
    // One path is a prefix of the other: the shorter one is the ancestor
    if i == len {
        return Ok(pa.len().cmp(&pb.len()));
    }
    if i == 0 {
        return Err(Error::from_code(
            ErrorCode::DisjointTrees,
            "document order requires a common root: nodes from different trees",
        ));
    }
    let parent = &pa[i - 1];
    let mut sibs: Vec<N> = parent.attributes();
    sibs.extend(parent.children());
    let posa = sibs.iter().position(|n| n == &pa[i]);
    let posb = sibs.iter().position(|n| n == &pb[i]);
    Ok(match (posa, posb) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    })
}

/// Minimal capability set this layer needs from the host tree. Node handles
/// are opaque: they are only read, never constructed or mutated.
pub trait XPathNode: Clone + Eq + core::fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> NodeKind;
    fn name(&self) -> Option<QName>;

    /// Text content following the DOM rules: concatenated descendant text for
    /// documents and elements, the value for attributes, raw content otherwise.
    fn string_value(&self) -> String;

    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Vec<Self>;
    fn attributes(&self) -> Vec<Self>;

    fn qualified_name(&self) -> Option<String> {
        self.name().map(|q| q.qualified())
    }

    fn namespace_uri(&self) -> Option<String> {
        self.name().and_then(|q| q.ns_uri)
    }

    /// Default document order comparison uses ancestry and sibling order.
    fn compare_document_order(&self, other: &Self) -> Result<Ordering, Error> {
        try_compare_by_ancestry(self, other)
    }
}
