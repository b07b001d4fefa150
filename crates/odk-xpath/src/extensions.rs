//! The surface a host evaluator wires in: function dispatch, the infix hook,
//! result bridging, and registration of host-defined functions.
//!
//! ```
//! use odk_xpath::extensions::{FunctionDescriptor, OdkExtensions};
//! use odk_xpath::runtime::EvaluationContext;
//! use odk_xpath::simple_node::SimpleNode;
//! use odk_xpath::value::{ValueKind, XPathValue, as_string};
//!
//! let ext = OdkExtensions::<SimpleNode>::builder()
//!     .add_function(
//!         "shout",
//!         FunctionDescriptor::new(vec![ValueKind::String], ValueKind::String, |args| {
//!             Ok(XPathValue::String(as_string(&args[0]).to_uppercase()))
//!         }),
//!     )
//!     .unwrap()
//!     .build();
//! let out = ext
//!     .call("shout", &EvaluationContext::default(), &[XPathValue::from("hi")])
//!     .unwrap();
//! assert_eq!(out, XPathValue::from("HI"));
//! ```
use crate::date::{as_moment, date_to_days, to_local_offset_string};
use crate::functions::default_function_registry;
use crate::infix::{DateInfix, InfixHook, InfixOutcome, Operator, evaluate_infix};
use crate::model::XPathNode;
use crate::runtime::{Environment, Error, ErrorCode, EvaluationContext, FunctionRegistry};
use crate::value::{ValueKind, XPathValue, as_boolean, as_number, as_string};
use std::sync::Arc;

pub type HostFunction<N> =
    Arc<dyn Fn(&[XPathValue<N>]) -> Result<XPathValue<N>, Error> + Send + Sync>;

/// A host-defined function: positional arguments are cast to `arg_types`
/// before the call and the result is re-tagged as `return_type`.
pub struct FunctionDescriptor<N> {
    pub implementation: HostFunction<N>,
    pub arg_types: Vec<ValueKind>,
    pub return_type: ValueKind,
}

impl<N> FunctionDescriptor<N> {
    pub fn new<F>(arg_types: Vec<ValueKind>, return_type: ValueKind, f: F) -> Self
    where
        F: Fn(&[XPathValue<N>]) -> Result<XPathValue<N>, Error> + Send + Sync + 'static,
    {
        Self {
            implementation: Arc::new(f),
            arg_types,
            return_type,
        }
    }
}

/// Result type requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Any,
    Number,
    String,
    Boolean,
    NodeSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalResult<N> {
    Boolean(bool),
    Number(f64),
    String(String),
    NodeSet(Vec<N>),
}

fn cast_to<N: XPathNode>(
    v: &XPathValue<N>,
    kind: ValueKind,
    env: &Environment,
) -> Result<XPathValue<N>, Error> {
    Ok(match kind {
        ValueKind::Boolean => XPathValue::Boolean(as_boolean(v)),
        ValueKind::Number => XPathValue::Number(as_number(v, &env.zone)),
        ValueKind::String => XPathValue::String(as_string(v)),
        ValueKind::Date => XPathValue::Date(as_moment(v, &env.zone)),
        ValueKind::NodeSet => match v {
            XPathValue::NodeSet(_) => v.clone(),
            other => {
                return Err(Error::from_code(
                    ErrorCode::InvalidArgType,
                    format!("expected a nodeset, got {}", other.kind()),
                ));
            }
        },
    })
}

pub struct OdkExtensions<N> {
    registry: Arc<FunctionRegistry<N>>,
    env: Arc<Environment>,
    infix: Arc<dyn InfixHook<N>>,
}

impl<N> Clone for OdkExtensions<N> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            env: Arc::clone(&self.env),
            infix: Arc::clone(&self.infix),
        }
    }
}

impl<N: XPathNode> Default for OdkExtensions<N> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<N: XPathNode> OdkExtensions<N> {
    pub fn builder() -> OdkExtensionsBuilder<N> {
        OdkExtensionsBuilder::new()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn registry(&self) -> &FunctionRegistry<N> {
        &self.registry
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Invoke a function by name with already-evaluated arguments.
    pub fn call(
        &self,
        name: &str,
        eval: &EvaluationContext<N>,
        args: &[XPathValue<N>],
    ) -> Result<XPathValue<N>, Error> {
        self.registry.call(name, eval, &self.env, args)
    }

    pub fn handle_infix(
        &self,
        lhs: &XPathValue<N>,
        op: Operator,
        rhs: &XPathValue<N>,
    ) -> Option<InfixOutcome<N>> {
        self.infix.handle_infix(lhs, op, rhs)
    }

    /// Hook first, then XPath 1.0 operator semantics.
    pub fn evaluate_infix(
        &self,
        lhs: &XPathValue<N>,
        op: Operator,
        rhs: &XPathValue<N>,
    ) -> Result<XPathValue<N>, Error> {
        evaluate_infix(Some(self.infix.as_ref()), lhs, op, rhs, &self.env.zone)
    }

    /// Bridge an internal value to the shape the host asked for. Dates map to
    /// validity, day-count or the local-offset string.
    pub fn to_external_result(
        &self,
        value: &XPathValue<N>,
        kind: ResultKind,
    ) -> Result<ExternalResult<N>, Error> {
        let zone = &self.env.zone;
        Ok(match (kind, value) {
            (ResultKind::NodeSet | ResultKind::Any, XPathValue::NodeSet(nodes)) => {
                ExternalResult::NodeSet(nodes.clone())
            }
            (ResultKind::NodeSet, other) => {
                return Err(Error::from_code(
                    ErrorCode::InvalidArgType,
                    format!("cannot convert {} to a nodeset", other.kind()),
                ));
            }
            (ResultKind::Any, XPathValue::Boolean(b)) => ExternalResult::Boolean(*b),
            (ResultKind::Any, XPathValue::Number(n)) => ExternalResult::Number(*n),
            (ResultKind::Any, XPathValue::String(s)) => ExternalResult::String(s.clone()),
            (ResultKind::Any | ResultKind::String, XPathValue::Date(m)) => {
                ExternalResult::String(to_local_offset_string(m))
            }
            (ResultKind::Number, XPathValue::Date(m)) => ExternalResult::Number(date_to_days(m)),
            (ResultKind::Boolean, v) => ExternalResult::Boolean(as_boolean(v)),
            (ResultKind::Number, v) => ExternalResult::Number(as_number(v, zone)),
            (ResultKind::String, v) => ExternalResult::String(as_string(v)),
        })
    }
}

/// Collects configuration and host functions; `build` freezes the function
/// table so evaluation never sees it change.
pub struct OdkExtensionsBuilder<N> {
    registry: FunctionRegistry<N>,
    env: Environment,
    infix: Option<Arc<dyn InfixHook<N>>>,
}

impl<N: XPathNode> Default for OdkExtensionsBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: XPathNode> OdkExtensionsBuilder<N> {
    pub fn new() -> Self {
        Self {
            registry: default_function_registry(),
            env: Environment::default(),
            infix: None,
        }
    }

    #[must_use]
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Replace the date-aware hook, e.g. with a stub in tests.
    #[must_use]
    pub fn with_infix_hook(mut self, hook: Arc<dyn InfixHook<N>>) -> Self {
        self.infix = Some(hook);
        self
    }

    /// Register a host function. Names must be new; argument kinds are
    /// limited to Boolean, Number and String.
    pub fn add_function(
        mut self,
        name: &str,
        descriptor: FunctionDescriptor<N>,
    ) -> Result<Self, Error> {
        if self.registry.contains(name) {
            return Err(Error::from_code(
                ErrorCode::FunctionExists,
                format!("function already registered: {name}()"),
            ));
        }
        if let Some(bad) = descriptor
            .arg_types
            .iter()
            .find(|k| !matches!(k, ValueKind::Boolean | ValueKind::Number | ValueKind::String))
        {
            return Err(Error::from_code(
                ErrorCode::UnsupportedType,
                format!("unsupported argument type for {name}(): {bad}"),
            ));
        }
        let FunctionDescriptor {
            implementation,
            arg_types,
            return_type,
        } = descriptor;
        let arity = arg_types.len();
        tracing::debug!(function = name, arity, %return_type, "registering host function");
        self.registry.register_fn_range(name, 0, None, move |ctx, args| {
            if args.len() < arg_types.len() {
                return Err(Error::too_few_args(ctx.function));
            }
            if args.len() > arg_types.len() {
                return Err(Error::too_many_args(ctx.function));
            }
            let cast = args
                .iter()
                .zip(&arg_types)
                .map(|(a, k)| cast_to(a, *k, ctx.env))
                .collect::<Result<Vec<_>, _>>()?;
            let raw = implementation(&cast)?;
            cast_to(&raw, return_type, ctx.env)
        });
        Ok(self)
    }

    pub fn build(self) -> OdkExtensions<N> {
        let zone = self.env.zone;
        let infix = self
            .infix
            .unwrap_or_else(|| Arc::new(DateInfix::new(zone)) as Arc<dyn InfixHook<N>>);
        OdkExtensions {
            registry: Arc::new(self.registry),
            env: Arc::new(self.env),
            infix,
        }
    }
}
