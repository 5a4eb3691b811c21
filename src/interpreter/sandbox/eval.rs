use std::{collections::BTreeMap, rc::Rc};

use crate::{
    config::SandboxConfig,
    error::EvalError,
    interpreter::{
        sandbox::{
            Scope,
            builtin::{attribute, call_function, call_method, is_safe_function},
            operators::{binary, compare, subscript, unary},
            syntax::{LogicalOperator, Node},
        },
        value::{core::Value, map_key::MapKey},
    },
};

/// Result type for sandbox evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates audited syntax trees against a read-only scope.
pub struct Evaluator<'a> {
    scope:  &'a dyn Scope,
    limits: &'a SandboxConfig,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator reading names from `scope`.
    #[must_use]
    pub fn new(scope: &'a dyn Scope, limits: &'a SandboxConfig) -> Self {
        Self { scope, limits }
    }

    /// Evaluates a node to a value.
    ///
    /// # Errors
    /// Any [`EvalError`] other than `Syntax`, which the parser has already
    /// ruled out.
    pub fn eval(&self, node: &Node) -> EvalResult<Value> {
        match node {
            Node::Literal(value) => Ok(value.clone()),
            Node::Name(name) => self.lookup(name),
            Node::List(items) => Ok(Value::List(Rc::new(self.eval_items(items)?))),
            Node::Tuple(items) => Ok(Value::Tuple(Rc::new(self.eval_items(items)?))),
            Node::Map(entries) => self.eval_map(entries),
            Node::Unary { op, operand } => unary(*op, &self.eval(operand)?),
            Node::Binary { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right, self.limits.max_collection_len)
            },
            Node::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, operand) in rest {
                    let right = self.eval(operand)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            },
            Node::Logical { left, op, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (LogicalOperator::And, false) | (LogicalOperator::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            },
            Node::Ternary { condition,
                            then,
                            otherwise, } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            },
            Node::Attribute { object, name } => attribute(&self.eval(object)?, name),
            Node::Subscript { object, index } => subscript(&self.eval(object)?, &self.eval(index)?),
            Node::Call { callee, args } => self.eval_call(callee, args),
        }
    }

    /// Resolves a name: variables first, then safe functions, which are only
    /// usable when called.
    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.scope.lookup(name) {
            return Ok(value.clone());
        }
        if is_safe_function(name) {
            return Err(EvalError::TypeError { details: format!("function `{name}` can only be called") });
        }
        Err(EvalError::UnknownName { name: name.to_string() })
    }

    fn eval_items(&self, items: &[Node]) -> EvalResult<Vec<Value>> {
        self.check_len(items.len())?;
        items.iter().map(|item| self.eval(item)).collect()
    }

    fn eval_map(&self, entries: &[(Node, Node)]) -> EvalResult<Value> {
        self.check_len(entries.len())?;
        let mut map = BTreeMap::new();
        for (key, value) in entries {
            let key = MapKey::try_from(&self.eval(key)?)?;
            map.insert(key, self.eval(value)?);
        }
        Ok(Value::Map(Rc::new(map)))
    }

    /// Calls a safe function or a method. Variables are never callable.
    fn eval_call(&self, callee: &Node, args: &[Node]) -> EvalResult<Value> {
        match callee {
            Node::Name(name) => {
                if self.scope.lookup(name).is_some() {
                    return Err(EvalError::TypeError { details: format!("variable `{name}` is not callable") });
                }
                let args = self.eval_items(args)?;
                let result = call_function(name, &args)?;
                self.check_result(result)
            },
            Node::Attribute { object, name } => {
                let object = self.eval(object)?;
                let args = self.eval_items(args)?;
                let result = call_method(&object, name, &args, self.limits.max_collection_len)?;
                self.check_result(result)
            },
            other => {
                let value = self.eval(other)?;
                Err(EvalError::TypeError { details: format!("{} is not callable", value.type_name()) })
            },
        }
    }

    fn check_len(&self, len: usize) -> EvalResult<()> {
        if len > self.limits.max_collection_len {
            return Err(EvalError::LimitExceeded { details: format!("a collection of {len} items exceeds the limit of {}",
                                                                   self.limits.max_collection_len) });
        }
        Ok(())
    }

    /// Applies the collection limit to a function or method result.
    fn check_result(&self, value: Value) -> EvalResult<Value> {
        let len = match &value {
            Value::Str(s) => s.len(),
            Value::List(items) | Value::Tuple(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        };
        self.check_len(len)?;
        Ok(value)
    }
}
