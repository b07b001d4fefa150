use crate::date::{LocalZone, Moment};
use crate::model::XPathNode;
use crate::value::XPathValue;
use chrono::{DateTime, FixedOffset, Utc};
use core::fmt;
use sha2::Digest as _;
use std::collections::HashMap;
use std::sync::Arc;

pub type Arity = usize;

/// Failure categories surfaced to the host. Everything else degrades to
/// NaN, `""` or `false` inside the functions themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TooFewArgs,
    TooManyArgs,
    /// Argument of the wrong kind where a NodeSet (or an integer seed) is required.
    InvalidArgType,
    UnknownFunction,
    /// Unknown or unsupported `format-date` escape.
    InvalidFormat,
    InvalidRegex,
    UnsupportedAlgorithm,
    FunctionExists,
    /// Registration with an arg/return kind outside the supported set.
    UnsupportedType,
    InvalidOperands,
    /// Document order asked of nodes that share no root.
    DisjointTrees,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TooFewArgs => "too-few-args",
            ErrorCode::TooManyArgs => "too-many-args",
            ErrorCode::InvalidArgType => "invalid-arg-type",
            ErrorCode::UnknownFunction => "unknown-function",
            ErrorCode::InvalidFormat => "invalid-format",
            ErrorCode::InvalidRegex => "invalid-regex",
            ErrorCode::UnsupportedAlgorithm => "unsupported-algorithm",
            ErrorCode::FunctionExists => "function-exists",
            ErrorCode::UnsupportedType => "unsupported-type",
            ErrorCode::InvalidOperands => "invalid-operands",
            ErrorCode::DisjointTrees => "disjoint-trees",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("error: {message} ({code})")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            source: None,
        }
    }

    /// Compose an error with a source cause.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }

    pub fn too_few_args(function: &str) -> Self {
        Self::from_code(
            ErrorCode::TooFewArgs,
            format!("too few arguments for {function}()"),
        )
    }

    pub fn too_many_args(function: &str) -> Self {
        Self::from_code(
            ErrorCode::TooManyArgs,
            format!("too many arguments for {function}()"),
        )
    }

    pub fn nodeset_required(function: &str) -> Self {
        Self::from_code(
            ErrorCode::InvalidArgType,
            format!("{function}() must be called with a nodeset"),
        )
    }
}

impl From<fancy_regex::Error> for Error {
    fn from(e: fancy_regex::Error) -> Self {
        Error::from_code(ErrorCode::InvalidRegex, "regex error")
            .with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    }
}

/// Hash collaborator behind `digest()`. Algorithm names use the XForms
/// spelling (`SHA-256`, `MD5`, ...).
pub trait Digester: Send + Sync {
    fn digest(&self, algorithm: &str, message: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Default digester: MD5, SHA-1 and the SHA-2 family.
pub struct StandardDigester;

impl Digester for StandardDigester {
    fn digest(&self, algorithm: &str, message: &[u8]) -> Result<Vec<u8>, Error> {
        match algorithm.to_ascii_uppercase().as_str() {
            "MD5" => Ok(md5::Md5::digest(message).to_vec()),
            "SHA-1" => Ok(sha1::Sha1::digest(message).to_vec()),
            "SHA-256" => Ok(sha2::Sha256::digest(message).to_vec()),
            "SHA-384" => Ok(sha2::Sha384::digest(message).to_vec()),
            "SHA-512" => Ok(sha2::Sha512::digest(message).to_vec()),
            other => Err(Error::from_code(
                ErrorCode::UnsupportedAlgorithm,
                format!("no support for digest algorithm {other}"),
            )),
        }
    }
}

/// Evaluator-wide settings shared by every call: the local zone that all
/// day-count arithmetic is computed against, an optional frozen clock, and
/// the hash collaborator.
#[derive(Clone)]
pub struct Environment {
    pub zone: LocalZone,
    pub now: Option<DateTime<FixedOffset>>,
    pub digester: Arc<dyn Digester>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("zone", &self.zone)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            zone: LocalZone::System,
            now: None,
            digester: Arc::new(StandardDigester),
        }
    }
}

impl Environment {
    /// Current instant expressed in the local zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        let instant = self.now.unwrap_or_else(|| Utc::now().fixed_offset());
        self.zone.to_local(&instant)
    }
}

pub struct EnvironmentBuilder {
    env: Environment,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            env: Environment::default(),
        }
    }

    // Fixed local zone instead of the system zone
    #[must_use]
    pub fn with_timezone(mut self, offset_minutes: i32) -> Self {
        if let Some(tz) = FixedOffset::east_opt(offset_minutes * 60) {
            self.env.zone = LocalZone::Fixed(tz);
        }
        self
    }

    #[must_use]
    pub fn with_zone(mut self, zone: LocalZone) -> Self {
        self.env.zone = zone;
        self
    }

    // Set a fixed 'now' instant for deterministic date/time functions
    #[must_use]
    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.env.now = Some(now);
        self
    }

    #[must_use]
    pub fn with_digester(mut self, digester: Arc<dyn Digester>) -> Self {
        self.env.digester = digester;
        self
    }

    pub fn build(self) -> Environment {
        self.env
    }
}

/// Per-call dynamic context supplied by the base evaluator.
#[derive(Debug, Clone)]
pub struct EvaluationContext<N> {
    /// Current node (`cN`).
    pub node: Option<N>,
    pub size: usize,
    pub position: usize,
}

impl<N> Default for EvaluationContext<N> {
    fn default() -> Self {
        Self {
            node: None,
            size: 1,
            position: 1,
        }
    }
}

impl<N> EvaluationContext<N> {
    pub fn new(node: N) -> Self {
        Self {
            node: Some(node),
            size: 1,
            position: 1,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: usize, size: usize) -> Self {
        self.position = position;
        self.size = size;
        self
    }
}

pub struct CallCtx<'a, N> {
    pub function: &'a str,
    pub eval: &'a EvaluationContext<N>,
    pub env: &'a Environment,
}

impl<N: XPathNode> CallCtx<'_, N> {
    pub fn number(&self, v: &XPathValue<N>) -> f64 {
        crate::value::as_number(v, &self.env.zone)
    }

    pub fn date(&self, v: &XPathValue<N>) -> Moment {
        crate::date::as_moment(v, &self.env.zone)
    }

    /// String-value of `cN`, or `""` without a context node.
    pub fn context_string(&self) -> String {
        self.eval
            .node
            .as_ref()
            .map(XPathNode::string_value)
            .unwrap_or_default()
    }
}

pub type FunctionImpl<N> = Arc<
    dyn Fn(&CallCtx<N>, &[XPathValue<N>]) -> Result<XPathValue<N>, Error> + Send + Sync,
>;

pub struct FunctionEntry<N> {
    pub min_arity: Arity,
    /// `None` for variadic functions.
    pub max_arity: Option<Arity>,
    pub func: FunctionImpl<N>,
}

impl<N> Clone for FunctionEntry<N> {
    fn clone(&self) -> Self {
        Self {
            min_arity: self.min_arity,
            max_arity: self.max_arity,
            func: Arc::clone(&self.func),
        }
    }
}

/// Name-keyed function table. Each entry carries an arity range so that
/// calls outside it fail with a distinct too-few/too-many error.
pub struct FunctionRegistry<N> {
    fns: HashMap<String, FunctionEntry<N>>,
}

impl<N> Default for FunctionRegistry<N> {
    fn default() -> Self {
        Self {
            fns: HashMap::new(),
        }
    }
}

impl<N> Clone for FunctionRegistry<N> {
    fn clone(&self) -> Self {
        Self {
            fns: self.fns.clone(),
        }
    }
}

impl<N: XPathNode> FunctionRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function with an arity range; `max_arity = None` is variadic.
    /// A later registration under the same name replaces the earlier one.
    pub fn register_range(
        &mut self,
        name: &str,
        min_arity: Arity,
        max_arity: Option<Arity>,
        func: FunctionImpl<N>,
    ) {
        self.fns.insert(
            name.to_string(),
            FunctionEntry {
                min_arity,
                max_arity,
                func,
            },
        );
    }

    /// Convenience: register a plain function with an exact arity.
    pub fn register_fn<F>(&mut self, name: &str, arity: Arity, f: F)
    where
        F: 'static
            + Send
            + Sync
            + Fn(&CallCtx<N>, &[XPathValue<N>]) -> Result<XPathValue<N>, Error>,
    {
        self.register_range(name, arity, Some(arity), Arc::new(f));
    }

    /// Convenience: register a plain function with an arity range.
    pub fn register_fn_range<F>(&mut self, name: &str, min: Arity, max: Option<Arity>, f: F)
    where
        F: 'static
            + Send
            + Sync
            + Fn(&CallCtx<N>, &[XPathValue<N>]) -> Result<XPathValue<N>, Error>,
    {
        self.register_range(name, min, max, Arc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fns.keys().map(String::as_str)
    }

    pub fn resolve(&self, name: &str) -> Result<&FunctionEntry<N>, Error> {
        self.fns.get(name).ok_or_else(|| {
            Error::from_code(
                ErrorCode::UnknownFunction,
                format!("function not found: {name}()"),
            )
        })
    }

    /// Resolve `name`, enforce its arity range and invoke it.
    pub fn call(
        &self,
        name: &str,
        eval: &EvaluationContext<N>,
        env: &Environment,
        args: &[XPathValue<N>],
    ) -> Result<XPathValue<N>, Error> {
        let entry = self.resolve(name)?;
        if args.len() < entry.min_arity {
            return Err(Error::too_few_args(name));
        }
        if entry.max_arity.is_some_and(|max| args.len() > max) {
            return Err(Error::too_many_args(name));
        }
        tracing::trace!(function = name, argc = args.len(), "dispatch");
        let ctx = CallCtx {
            function: name,
            eval,
            env,
        };
        (entry.func)(&ctx, args)
    }
}
