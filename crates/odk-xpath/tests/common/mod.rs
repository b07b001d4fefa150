#![allow(dead_code)]
//! A stand-in base evaluator: literal operands, function calls and binary
//! operators, evaluated the way a host would drive the extension layer.
use chrono::DateTime;
use odk_xpath::{
    Environment, EnvironmentBuilder, Error, EvaluationContext, OdkExtensions, Operator,
    SimpleNode, XPathValue, as_boolean,
};

pub type V = XPathValue<SimpleNode>;

/// Local zone used by every test harness.
pub const ZONE_MINUTES: i32 = 120;
pub const NOW: &str = "2018-06-15T10:20:30.250+02:00";

pub enum Expr {
    Lit(V),
    Call(String, Vec<Expr>),
    Binary(Box<Expr>, Operator, Box<Expr>),
}

pub fn s(v: &str) -> Expr {
    Expr::Lit(V::from(v))
}

pub fn n(v: f64) -> Expr {
    Expr::Lit(V::Number(v))
}

pub fn b(v: bool) -> Expr {
    Expr::Lit(V::Boolean(v))
}

pub fn nodes(v: Vec<SimpleNode>) -> Expr {
    Expr::Lit(V::NodeSet(v))
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(name.to_string(), args)
}

pub fn bin(lhs: Expr, op: Operator, rhs: Expr) -> Expr {
    Expr::Binary(Box::new(lhs), op, Box::new(rhs))
}

pub fn env() -> Environment {
    EnvironmentBuilder::new()
        .with_timezone(ZONE_MINUTES)
        .with_now(DateTime::parse_from_rfc3339(NOW).unwrap())
        .build()
}

pub struct Harness {
    pub ext: OdkExtensions<SimpleNode>,
    pub eval: EvaluationContext<SimpleNode>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_extensions(OdkExtensions::builder().with_environment(env()).build())
    }

    pub fn with_extensions(ext: OdkExtensions<SimpleNode>) -> Self {
        Self {
            ext,
            eval: EvaluationContext::default(),
        }
    }

    pub fn at(mut self, node: SimpleNode) -> Self {
        self.eval.node = Some(node);
        self
    }

    pub fn eval(&self, e: &Expr) -> Result<V, Error> {
        match e {
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                self.ext.call(name, &self.eval, &args)
            }
            // `and` / `or` short-circuit before the right side is evaluated
            Expr::Binary(lhs, Operator::And, rhs) => {
                Ok(V::Boolean(as_boolean(&self.eval(lhs)?) && as_boolean(&self.eval(rhs)?)))
            }
            Expr::Binary(lhs, Operator::Or, rhs) => {
                Ok(V::Boolean(as_boolean(&self.eval(lhs)?) || as_boolean(&self.eval(rhs)?)))
            }
            Expr::Binary(lhs, op, rhs) => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                self.ext.evaluate_infix(&l, *op, &r)
            }
        }
    }

    pub fn call(&self, name: &str, args: Vec<V>) -> Result<V, Error> {
        self.ext.call(name, &self.eval, &args)
    }

    pub fn number(&self, e: &Expr) -> f64 {
        match self.eval(e).unwrap() {
            V::Number(x) => x,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    pub fn string(&self, e: &Expr) -> String {
        match self.eval(e).unwrap() {
            V::String(x) => x,
            other => panic!("expected a string, got {other:?}"),
        }
    }

    pub fn boolean(&self, e: &Expr) -> bool {
        match self.eval(e).unwrap() {
            V::Boolean(x) => x,
            other => panic!("expected a boolean, got {other:?}"),
        }
    }
}
