//! ODK/OpenRosa XForms extensions for an XPath 1.0 evaluator: value casts
//! with a Date variant, the extension function library, date-aware infix
//! coercion, geo calculations and a registration facade.
//!
//! The base evaluator (parsing, axes, predicates) and the node tree belong
//! to the host; the tree is reached only through [`XPathNode`].
pub mod consts;
pub mod date;
pub mod extensions;
pub mod functions;
pub mod geo;
pub mod infix;
pub mod model;
pub mod runtime;
pub mod simple_node;
pub mod support;
pub mod value;

pub use date::{LocalZone, Moment};
pub use extensions::{
    ExternalResult, FunctionDescriptor, OdkExtensions, OdkExtensionsBuilder, ResultKind,
};
pub use functions::default_function_registry;
pub use infix::{DateInfix, InfixHook, InfixOutcome, Operator};
pub use model::{NodeKind, QName, XPathNode};
pub use runtime::{
    Environment, EnvironmentBuilder, Error, ErrorCode, EvaluationContext, FunctionRegistry,
};
pub use simple_node::{SimpleNode, SimpleNodeBuilder, attr, doc, elem, text};
pub use value::{ValueKind, XPathValue, as_boolean, as_number, as_string};
