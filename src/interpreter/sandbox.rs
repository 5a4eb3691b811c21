use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use crate::{
    config::SandboxConfig,
    interpreter::{
        sandbox::eval::{EvalResult, Evaluator},
        value::core::Value,
    },
};

/// Expression tokens, produced by `logos`.
pub mod lexer;

/// The expression syntax tree.
///
/// Only constructs with a node here can be evaluated at all.
pub mod syntax;

/// Recursive-descent expression parser.
///
/// Rejects statement-only tokens up front and enforces the source length and
/// nesting limits.
pub mod parser;

/// Reference checks over a parsed tree: forbidden names and `__` names.
pub mod audit;

/// Operator semantics: arithmetic, bitwise, comparison, membership,
/// subscripts.
pub mod operators;

/// Safe functions and value methods.
pub mod builtin;

/// Tree-walking evaluation against a read-only scope.
pub mod eval;

/// Read-only view of the variables an expression may use.
///
/// The sandbox can only ever read through this trait; it has no way to bind,
/// rebind or delete names.
pub trait Scope {
    /// Returns the value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Scope for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Evaluates a raw expression in the sandbox.
///
/// The expression is parsed, audited and only then evaluated, so a rejected
/// expression never runs any part of itself. Variables come from `scope` and
/// are never modified.
///
/// # Errors
/// Any [`EvalError`](crate::error::EvalError): `SecurityViolation` for
/// disallowed constructs or names, `Syntax`, `UnknownName`, type and
/// arithmetic errors, or `LimitExceeded`.
///
/// # Example
/// ```
/// use std::collections::HashMap;
///
/// use solar::{
///     config::SandboxConfig,
///     interpreter::{sandbox::evaluate, value::core::Value},
/// };
///
/// let mut scope = HashMap::new();
/// scope.insert("x".to_string(), Value::Integer(4));
///
/// let v = evaluate("x * 2 + 1", &scope, &SandboxConfig::default()).unwrap();
/// assert_eq!(v, Value::Integer(9));
/// assert!(evaluate("x := 1", &scope, &SandboxConfig::default()).is_err());
/// ```
pub fn evaluate(source: &str, scope: &dyn Scope, limits: &SandboxConfig) -> EvalResult<Value> {
    let node = parser::parse(source, limits)?;
    audit::audit(&node)?;
    Evaluator::new(scope, limits).eval(&node)
}
