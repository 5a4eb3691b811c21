use thiserror::Error;

/// Errors raised by the expression sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The expression used a construct or name outside the allowed set.
    #[error("Security violation: {construct} is not allowed in expressions.")]
    SecurityViolation {
        /// The rejected construct or name.
        construct: String,
    },
    /// The expression text is not valid expression syntax.
    #[error("Invalid expression: {details}.")]
    Syntax {
        /// What the parser expected or found.
        details: String,
    },
    /// A name was neither a variable nor a safe function.
    #[error("Name `{name}` is not defined.")]
    UnknownName {
        /// The unresolved name.
        name: String,
    },
    /// An operation received values of the wrong type.
    #[error("Type error: {details}.")]
    TypeError {
        /// Details about the mismatch.
        details: String,
    },
    /// Division or modulo by zero.
    #[error("Division by zero.")]
    DivisionByZero,
    /// Integer arithmetic overflowed.
    #[error("Integer overflow in `{operation}`.")]
    Overflow {
        /// The operation that overflowed.
        operation: String,
    },
    /// A subscript was outside the sequence.
    #[error("Index {index} is out of bounds for length {len}.")]
    IndexOutOfBounds {
        /// The index as written.
        index: i64,
        /// The length of the indexed sequence.
        len:   usize,
    },
    /// A map lookup missed.
    #[error("Key {key} not found.")]
    KeyNotFound {
        /// The key that was looked up.
        key: String,
    },
    /// A safe function received the wrong number of arguments.
    #[error("Function `{name}` does not accept {found} arguments.")]
    ArgumentCountMismatch {
        /// The function name.
        name:  String,
        /// The number of arguments supplied.
        found: usize,
    },
    /// A size or depth limit was exceeded.
    #[error("Limit exceeded: {details}.")]
    LimitExceeded {
        /// Which limit and by how much.
        details: String,
    },
}
