use std::{collections::HashMap, fmt, rc::Rc};

use crate::{
    error::RuntimeError,
    interpreter::{
        lowering::program::UserFunction,
        runtime::host::Host,
        value::core::Value,
    },
};

/// What a native function sees when it is called.
pub struct NativeCall<'a> {
    /// Evaluated arguments.
    pub args: Vec<Value>,
    /// Line of the calling instruction.
    pub line: usize,
    /// The run's host, for output.
    pub host: &'a mut dyn Host,
}

impl NativeCall<'_> {
    /// Builds a type error located at the call.
    #[must_use]
    pub fn type_error(&self, details: impl Into<String>) -> RuntimeError {
        RuntimeError::TypeError { details: details.into(),
                                  line:    self.line, }
    }

    /// Fails unless exactly `count` arguments were passed.
    ///
    /// # Errors
    /// `ArgumentCountMismatch` naming `name`.
    pub fn expect_args(&self, name: &str, count: usize) -> Result<(), RuntimeError> {
        if self.args.len() == count {
            return Ok(());
        }
        Err(RuntimeError::ArgumentCountMismatch { name:     name.to_string(),
                                                  expected: count,
                                                  found:    self.args.len(),
                                                  line:     self.line, })
    }
}

/// Type alias for native function handlers.
pub type NativeFn = Rc<dyn Fn(&mut NativeCall<'_>) -> Result<Value, RuntimeError>>;

/// An entry of the function registry.
#[derive(Clone)]
pub enum Callable {
    /// A function provided by the runtime or a library.
    Native(NativeFn),
    /// A function defined with `solar_def`.
    User(Rc<UserFunction>),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => write!(f, "Native(..)"),
            Self::User(function) => write!(f, "User({})", function.name),
        }
    }
}

/// Maps callable names to functions.
///
/// Names are late-bound: a call looks its target up when it runs, and a
/// later registration replaces an earlier one.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Callable>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native function.
    pub fn register_native(&mut self,
                           name: &str,
                           function: impl Fn(&mut NativeCall<'_>) -> Result<Value, RuntimeError> + 'static) {
        self.functions.insert(name.to_string(), Callable::Native(Rc::new(function)));
    }

    /// Registers a user function under its own name.
    pub fn install(&mut self, function: Rc<UserFunction>) {
        self.functions.insert(function.name.clone(), Callable::User(function));
    }

    /// Looks a name up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Callable> {
        self.functions.get(name).cloned()
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}
