//! Simple in-memory tree implementing [`XPathNode`], for tests and hosts that
//! prototype without a DOM.
//!
//! Nodes are immutable once built; parents are attached when the enclosing
//! builder is finalized.
//!
//! ```
//! use odk_xpath::simple_node::{attr, doc, elem, text};
//! use odk_xpath::XPathNode;
//!
//! // <data id="f"><q1>yes</q1><q2/></data>
//! let document = doc()
//!     .child(
//!         elem("data")
//!             .attr(attr("id", "f"))
//!             .child(elem("q1").child(text("yes")))
//!             .child(elem("q2")),
//!     )
//!     .build();
//! let data = document.children()[0].clone();
//! assert_eq!(data.string_value(), "yes");
//! assert_eq!(data.attributes()[0].string_value(), "f");
//! ```
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::model::{NodeKind, QName, XPathNode};

struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    parent: OnceLock<Weak<Inner>>,
    attributes: Vec<SimpleNode>,
    children: Vec<SimpleNode>,
}

/// An Arc-backed node handle; equality is identity.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}

impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("value", &self.0.value)
            .finish_non_exhaustive()
    }
}

impl SimpleNode {
    fn leaf(kind: NodeKind, name: Option<QName>, value: &str) -> Self {
        SimpleNodeBuilder::new(kind, name, Some(value.to_string())).build()
    }

    pub fn document() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Document, None, None)
    }
    pub fn element(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Element, Some(parse_name(name, None)), None)
    }
    pub fn element_ns(name: &str, ns_uri: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(
            NodeKind::Element,
            Some(parse_name(name, Some(ns_uri))),
            None,
        )
    }
    pub fn attribute(name: &str, value: &str) -> SimpleNode {
        Self::leaf(NodeKind::Attribute, Some(parse_name(name, None)), value)
    }
    pub fn attribute_ns(name: &str, ns_uri: &str, value: &str) -> SimpleNode {
        Self::leaf(
            NodeKind::Attribute,
            Some(parse_name(name, Some(ns_uri))),
            value,
        )
    }
    pub fn text(value: &str) -> SimpleNode {
        Self::leaf(NodeKind::Text, None, value)
    }
    pub fn cdata(value: &str) -> SimpleNode {
        Self::leaf(NodeKind::CData, None, value)
    }
    pub fn comment(value: &str) -> SimpleNode {
        Self::leaf(NodeKind::Comment, None, value)
    }
    pub fn pi(target: &str, data: &str) -> SimpleNode {
        Self::leaf(
            NodeKind::ProcessingInstruction,
            Some(QName::local(target)),
            data,
        )
    }
    pub fn doctype(name: &str) -> SimpleNode {
        Self::leaf(NodeKind::DocumentType, Some(QName::local(name)), "")
    }

    /// Convenience for tests: first child element with the given local name.
    pub fn child_element(&self, local: &str) -> Option<SimpleNode> {
        self.0
            .children
            .iter()
            .find(|c| {
                c.0.kind == NodeKind::Element && c.0.name.as_ref().is_some_and(|q| q.local == local)
            })
            .cloned()
    }
}

fn parse_name(name: &str, ns_uri: Option<&str>) -> QName {
    let (prefix, local) = match name.split_once(':') {
        Some((p, l)) => (Some(p.to_string()), l.to_string()),
        None => (None, name.to_string()),
    };
    // The xml prefix is bound implicitly
    let ns_uri = match (ns_uri, prefix.as_deref()) {
        (Some(u), _) => Some(u.to_string()),
        (None, Some("xml")) => Some(crate::consts::XML_URI.to_string()),
        _ => None,
    };
    QName {
        prefix,
        local,
        ns_uri,
    }
}

pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    pending_children: Vec<SimpleNode>,
    pending_attrs: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            pending_children: Vec::new(),
            pending_attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        self.pending_children.push(child.into().finish());
        self
    }

    #[must_use]
    pub fn children<I>(mut self, it: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SimpleNodeOrBuilder>,
    {
        self.pending_children
            .extend(it.into_iter().map(|c| c.into().finish()));
        self
    }

    #[must_use]
    pub fn attr(mut self, attr: SimpleNode) -> Self {
        debug_assert!(attr.kind() == NodeKind::Attribute);
        self.pending_attrs.push(attr);
        self
    }

    /// Shorthand for an element whose only child is a text node.
    #[must_use]
    pub fn text(self, value: &str) -> Self {
        self.child(SimpleNode::text(value))
    }

    pub fn build(self) -> SimpleNode {
        let node = SimpleNode(Arc::new(Inner {
            kind: self.kind,
            name: self.name,
            value: self.value,
            parent: OnceLock::new(),
            attributes: self.pending_attrs,
            children: self.pending_children,
        }));
        for n in node.0.attributes.iter().chain(node.0.children.iter()) {
            let attached = n.0.parent.set(Arc::downgrade(&node.0)).is_ok();
            debug_assert!(attached, "node attached to two parents");
        }
        node
    }
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl SimpleNodeOrBuilder {
    fn finish(self) -> SimpleNode {
        match self {
            SimpleNodeOrBuilder::Built(n) => n,
            SimpleNodeOrBuilder::Builder(b) => b.build(),
        }
    }
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}
impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

// Convenience helper functions for concise test code
pub fn doc() -> SimpleNodeBuilder {
    SimpleNode::document()
}
pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNode::element(name)
}
pub fn elem_ns(name: &str, ns_uri: &str) -> SimpleNodeBuilder {
    SimpleNode::element_ns(name, ns_uri)
}
pub fn attr(name: &str, v: &str) -> SimpleNode {
    SimpleNode::attribute(name, v)
}
pub fn text(v: &str) -> SimpleNode {
    SimpleNode::text(v)
}
pub fn comment(v: &str) -> SimpleNode {
    SimpleNode::comment(v)
}

impl XPathNode for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }
    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }
    fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Document | NodeKind::Element => {
                fn collect(n: &SimpleNode, out: &mut String) {
                    for c in &n.0.children {
                        match c.0.kind {
                            NodeKind::Text | NodeKind::CData => {
                                out.push_str(c.0.value.as_deref().unwrap_or_default());
                            }
                            NodeKind::Element => collect(c, out),
                            _ => {}
                        }
                    }
                }
                let mut out = String::new();
                collect(self, &mut out);
                out
            }
            _ => self.0.value.clone().unwrap_or_default(),
        }
    }
    fn parent(&self) -> Option<Self> {
        self.0.parent.get().and_then(Weak::upgrade).map(SimpleNode)
    }
    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }
    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.clone()
    }
}
