use thiserror::Error;

use crate::error::EvalError;

/// Represents all errors that can occur while running a lowered program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A call target is not in the function registry.
    #[error("Error on line {line}: Unknown function `{name}`.")]
    UnknownFunction {
        /// The name that could not be resolved.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A variable reference is not in the variable store.
    #[error("Error on line {line}: Unknown variable `{name}`.")]
    UnknownVariable {
        /// The name that could not be resolved.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `use` directive named a module that does not exist.
    #[error("Error on line {line}: Unknown module `{name}`.")]
    UnknownModule {
        /// The requested module.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// The sandbox rejected an expression.
    #[error("Error on line {line}: Security violation: {construct} is not allowed in expressions.")]
    SecurityViolation {
        /// The rejected construct or name.
        construct: String,
        /// The source line where the error occurred.
        line:      usize,
    },
    /// A raw expression failed to evaluate.
    #[error("Error on line {line}: {source}")]
    Eval {
        /// The sandbox error.
        source: EvalError,
        /// The source line where the error occurred.
        line:   usize,
    },
    /// A function was called with the wrong number of arguments.
    #[error("Error on line {line}: `{name}` expects {expected} arguments but got {found}.")]
    ArgumentCountMismatch {
        /// The function name.
        name:     String,
        /// The declared parameter count.
        expected: usize,
        /// The supplied argument count.
        found:    usize,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// User function calls nested too deeply.
    #[error("Error on line {line}: Call depth limit of {limit} exceeded.")]
    CallDepthExceeded {
        /// The configured limit.
        limit: usize,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// A native function received a value it cannot use.
    #[error("Error on line {line}: {details}")]
    TypeError {
        /// Details about the mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// The host collaborator failed to carry out an external command.
    #[error("Error on line {line}: {details}")]
    Host {
        /// The host's description of the failure.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A frame loop kept running past the configured frame cap.
    #[error("Error on line {line}: Loop over `{handle}` exceeded {limit} frames.")]
    LoopLimit {
        /// The handle the loop was driven by.
        handle: String,
        /// The configured limit.
        limit:  usize,
        /// The line of the loop header.
        line:   usize,
    },
}

impl RuntimeError {
    /// Attaches a line number to a sandbox error.
    ///
    /// Security violations become [`RuntimeError::SecurityViolation`] so they
    /// are never mistaken for an ordinary evaluation failure.
    ///
    /// # Example
    /// ```
    /// use solar::error::{EvalError, RuntimeError};
    ///
    /// let err = RuntimeError::from_eval(EvalError::SecurityViolation { construct: "`open`".into() }, 3);
    /// assert!(matches!(err, RuntimeError::SecurityViolation { line: 3, .. }));
    /// ```
    #[must_use]
    pub fn from_eval(error: EvalError, line: usize) -> Self {
        match error {
            EvalError::SecurityViolation { construct } => Self::SecurityViolation { construct, line },
            source => Self::Eval { source, line },
        }
    }
}
