use thiserror::Error;

use crate::{
    ast::{Expression, ExternalCommand},
    interpreter::{
        parser::expression::parse_expression,
        sandbox::Scope,
        tokenizer::Token,
        value::core::{Handle, Value},
    },
};

/// An external command on its way to the host, with read access to the
/// variables so the host can resolve bare-name arguments.
pub struct Command<'a> {
    external: &'a ExternalCommand,
    scope:    &'a dyn Scope,
}

impl<'a> Command<'a> {
    /// Wraps a parsed command.
    #[must_use]
    pub fn new(external: &'a ExternalCommand, scope: &'a dyn Scope) -> Self {
        Self { external, scope }
    }

    /// The command family, `ui` or `gfx`.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.external.category
    }

    /// The sub-command, such as `button`.
    #[must_use]
    pub fn sub_command(&self) -> &str {
        &self.external.sub_command
    }

    /// The raw argument tokens, exactly as parsed.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.external
            .raw_tokens
            .iter()
            .zip(&self.external.quoted_flags)
            .map(|(text, &was_quoted)| Token { text: text.clone(),
                                               was_quoted })
            .collect()
    }

    /// The text of argument `index`.
    ///
    /// # Errors
    /// `MissingArgument` if there is no such argument.
    pub fn text(&self, index: usize) -> Result<&str, HostError> {
        self.external
            .raw_tokens
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| self.missing(&format!("argument {}", index + 1)))
    }

    /// Argument `index` resolved to a value, see [`resolve_token`].
    ///
    /// # Errors
    /// `MissingArgument` if there is no such argument.
    pub fn value(&self, index: usize) -> Result<Value, HostError> {
        let text = self.text(index)?;
        let token = Token { text:       text.to_string(),
                            was_quoted: self.external.quoted_flags.get(index).copied().unwrap_or(false), };
        Ok(resolve_token(&token, self.scope))
    }

    /// Argument `index` as a number. Bare names are looked up first.
    ///
    /// # Errors
    /// `MissingArgument`, or `BadArgument` if the value is not numeric.
    pub fn number(&self, index: usize) -> Result<f64, HostError> {
        let value = self.value(index)?;
        value.as_real().map_err(|_| HostError::BadArgument { command: self.name(),
                                                              token:   value.to_string(),
                                                              details: "expected a number".to_string(), })
    }

    /// The index of the token following the first unquoted `marker`.
    ///
    /// # Errors
    /// `MissingArgument` if the marker is absent.
    pub fn after(&self, marker: &str) -> Result<usize, HostError> {
        self.external
            .marker_position(marker)
            .map(|position| position + 1)
            .ok_or_else(|| self.missing(&format!("`{marker}`")))
    }

    /// `category sub_command`, for messages.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.external.category, self.external.sub_command)
    }

    fn missing(&self, what: &str) -> HostError {
        HostError::MissingArgument { command: self.name(),
                                     what:    what.to_string(), }
    }
}

/// What the runtime should do after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing further.
    Done,
    /// A read form produced a value to bind.
    Store {
        /// The variable to bind.
        name:  String,
        /// The value read.
        value: Value,
    },
    /// The command entered an event loop; pump [`Host::poll`] for `handle`.
    EventLoop {
        /// The window whose events to pump.
        handle: String,
    },
}

/// Something the host asks the program to do while an event loop runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Call a registry function. Arguments are raw callback tokens, resolved
    /// against the variables when the call happens.
    Invoke {
        /// The registry name.
        function: String,
        /// The callback's argument tokens.
        args:     Vec<Token>,
    },
}

/// Errors a host reports for a command it cannot carry out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The command refers to a window, widget or variable that does not exist.
    #[error("Unknown {kind} `{name}`.")]
    UnknownHandle {
        /// What kind of object was expected.
        kind: String,
        /// The name used.
        name: String,
    },
    /// An argument is missing.
    #[error("`{command}` is missing {what}.")]
    MissingArgument {
        /// The command.
        command: String,
        /// The missing argument.
        what:    String,
    },
    /// An argument has the wrong form.
    #[error("`{command}` cannot use `{token}`: {details}.")]
    BadArgument {
        /// The command.
        command: String,
        /// The offending argument.
        token:   String,
        /// Why it was rejected.
        details: String,
    },
    /// The host does not implement the command.
    #[error("Unknown command `{command}`.")]
    Unsupported {
        /// The command.
        command: String,
    },
}

/// The collaborator that owns windows, widgets, drawing and program output.
///
/// The runtime never interprets external command arguments itself; it hands
/// every `ui`/`gfx` command to [`Host::dispatch`] and acts on the reply.
/// Event loops are driven by the runtime pulling events with
/// [`Host::poll`], so callbacks run on the same variables and registry as
/// the rest of the program.
pub trait Host {
    /// Carries out an external command.
    ///
    /// # Errors
    /// Any [`HostError`]; the runtime reports it with the command's line.
    fn dispatch(&mut self, command: &Command<'_>) -> Result<Reply, HostError>;

    /// Returns the next event for the event loop of `handle`, or `None` when
    /// the loop is over.
    fn poll(&mut self, handle: &str) -> Option<Event>;

    /// Starts a frame of the `loop` over `handle`. Returns `false` when the
    /// loop should stop.
    fn frame(&mut self, handle: &str) -> bool;

    /// Receives program output.
    fn emit(&mut self, text: &str);

    /// Receives passthrough text, in program order.
    fn verbatim(&mut self, text: &str);

    /// Reads the current value behind a handle, such as the text of an entry.
    fn read(&self, _handle: &Handle) -> Option<Value> {
        None
    }
}

/// Resolves a raw command or callback token to a value.
///
/// Quoted tokens are strings. Numeric tokens are numbers. A bare name bound in
/// `scope` gives its value; any other token stands for its own text.
///
/// # Example
/// ```
/// use std::collections::HashMap;
///
/// use solar::interpreter::{runtime::host::resolve_token, tokenizer::Token, value::core::Value};
///
/// let scope = HashMap::from([("name".to_string(), Value::from("Ada"))]);
/// assert_eq!(resolve_token(&Token::bare("name"), &scope), Value::from("Ada"));
/// assert_eq!(resolve_token(&Token::quoted("name"), &scope), Value::from("name"));
/// assert_eq!(resolve_token(&Token::bare("other"), &scope), Value::from("other"));
/// assert_eq!(resolve_token(&Token::bare("7"), &scope), Value::Integer(7));
/// ```
#[must_use]
pub fn resolve_token(token: &Token, scope: &dyn Scope) -> Value {
    match parse_expression(&token.text, token.was_quoted) {
        Expression::NumberLiteral(literal) => Value::from(literal),
        Expression::VariableRef(name) => scope.lookup(&name)
                                              .cloned()
                                              .unwrap_or_else(|| Value::from(token.text.as_str())),
        Expression::StringLiteral(text) | Expression::RawExpression(text) => Value::from(text),
    }
}

/// Formats a value for program output. Handles show the value the host
/// holds behind them when there is one.
#[must_use]
pub fn display_value(host: &dyn Host, value: &Value) -> String {
    match value {
        Value::Handle(handle) => host.read(handle).map_or_else(|| value.to_string(), |v| v.to_string()),
        other => other.to_string(),
    }
}
