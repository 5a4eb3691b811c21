use crate::{error::EvalError, interpreter::sandbox::syntax::Node};

/// Names that are refused wherever they appear, whether or not a variable of
/// that name exists.
pub const FORBIDDEN_NAMES: &[&str] = &["eval",
                                       "exec",
                                       "compile",
                                       "open",
                                       "input",
                                       "__import__",
                                       "globals",
                                       "locals",
                                       "vars",
                                       "getattr",
                                       "setattr",
                                       "delattr",
                                       "breakpoint",
                                       "dir",
                                       "type",
                                       "help",
                                       "memoryview",
                                       "object",
                                       "super",
                                       "exit",
                                       "quit"];

/// Walks a parsed expression and rejects references that could reach outside
/// the sandbox.
///
/// Rejected are names and attributes beginning with `__`, and any name in
/// [`FORBIDDEN_NAMES`].
///
/// # Errors
/// `SecurityViolation` naming the first offending reference.
///
/// # Example
/// ```
/// use solar::{
///     config::SandboxConfig,
///     interpreter::sandbox::{audit::audit, parser::parse},
/// };
///
/// let limits = SandboxConfig::default();
/// assert!(audit(&parse("len(name)", &limits).unwrap()).is_ok());
/// assert!(audit(&parse("open('x')", &limits).unwrap()).is_err());
/// assert!(audit(&parse("name.__class__", &limits).unwrap()).is_err());
/// ```
pub fn audit(node: &Node) -> Result<(), EvalError> {
    match node {
        Node::Literal(_) => Ok(()),
        Node::Name(name) => check_name(name),
        Node::List(items) | Node::Tuple(items) => items.iter().try_for_each(audit),
        Node::Map(entries) => entries.iter().try_for_each(|(key, value)| {
                                                 audit(key)?;
                                                 audit(value)
                                             }),
        Node::Unary { operand, .. } => audit(operand),
        Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
            audit(left)?;
            audit(right)
        },
        Node::Compare { first, rest } => {
            audit(first)?;
            rest.iter().try_for_each(|(_, operand)| audit(operand))
        },
        Node::Ternary { condition,
                        then,
                        otherwise, } => {
            audit(condition)?;
            audit(then)?;
            audit(otherwise)
        },
        Node::Attribute { object, name } => {
            if name.starts_with("__") {
                return Err(violation(format!("attribute `{name}`")));
            }
            audit(object)
        },
        Node::Subscript { object, index } => {
            audit(object)?;
            audit(index)
        },
        Node::Call { callee, args } => {
            audit(callee)?;
            args.iter().try_for_each(audit)
        },
    }
}

fn check_name(name: &str) -> Result<(), EvalError> {
    if name.starts_with("__") || FORBIDDEN_NAMES.contains(&name) {
        return Err(violation(format!("name `{name}`")));
    }
    Ok(())
}

fn violation(construct: String) -> EvalError {
    EvalError::SecurityViolation { construct }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SandboxConfig, interpreter::sandbox::parser::parse};

    fn audit_source(source: &str) -> Result<(), EvalError> {
        audit(&parse(source, &SandboxConfig::default()).unwrap())
    }

    #[test]
    fn forbidden_names_are_rejected_anywhere() {
        assert!(audit_source("[1, eval]").is_err());
        assert!(audit_source("x if True else exec").is_err());
        assert!(audit_source("{'k': globals()}").is_err());
    }

    #[test]
    fn dunder_references_are_rejected() {
        assert!(audit_source("__builtins__").is_err());
        assert!(audit_source("(1).__add__(2)").is_err());
    }

    #[test]
    fn ordinary_expressions_pass() {
        assert!(audit_source("name.upper() + str(len(items)) if items else 'none'").is_ok());
    }
}
