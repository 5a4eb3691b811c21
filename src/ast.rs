/// Represents a numeric literal as written in the source.
///
/// A token without a decimal point parses as an integer, a token with one as a
/// real, so `let n = 3` and `let n = 3.0` bind different values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    /// A 64-bit signed integer literal.
    Integer(i64),
    /// A 64-bit floating-point literal.
    Real(f64),
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// An expression as the statement parser sees it.
///
/// Only the four shapes the line grammar can recognize on its own are
/// modelled; everything else is kept as source text and handed to the
/// sandbox when the program runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A bare numeric token such as `42` or `2.5`.
    NumberLiteral(LiteralValue),
    /// A quoted token. Never reinterpreted as a number or a name.
    StringLiteral(String),
    /// A bare identifier, resolved against the variable store at run time.
    VariableRef(String),
    /// Source text for the sandboxed evaluator, such as `(x + 1)` or `a > b`.
    RawExpression(String),
}

/// A `solar_def` function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// The function name.
    pub name:   String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// Body statements in document order. May be empty.
    pub body:   Vec<Statement>,
    /// Line of the `solar_def` header.
    pub line:   usize,
}

/// A `ui`/`gfx` statement, kept as raw tokens for the host collaborator.
///
/// `raw_tokens` and `quoted_flags` are parallel and hold everything after the
/// sub-command exactly as tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    /// The command family, `ui` or `gfx`.
    pub category:     String,
    /// The sub-command, such as `button` or `rect`.
    pub sub_command:  String,
    /// Argument token texts.
    pub raw_tokens:   Vec<String>,
    /// Whether each argument token was quote-delimited.
    pub quoted_flags: Vec<bool>,
    /// Line number in the source code.
    pub line:         usize,
}

impl ExternalCommand {
    /// Returns the token following the first unquoted occurrence of `marker`.
    ///
    /// # Example
    /// ```
    /// use solar::ast::ExternalCommand;
    ///
    /// let cmd = ExternalCommand { category:     "ui".into(),
    ///                             sub_command:  "button".into(),
    ///                             raw_tokens:   vec!["main".into(), "ok".into(), "do".into(), "greet".into()],
    ///                             quoted_flags: vec![false; 4],
    ///                             line:         1 };
    /// assert_eq!(cmd.after_marker("do", 0), Some("greet"));
    /// assert_eq!(cmd.after_marker("at", 0), None);
    /// ```
    #[must_use]
    pub fn after_marker(&self, marker: &str, offset: usize) -> Option<&str> {
        let position = self.marker_position(marker)?;
        self.raw_tokens.get(position + 1 + offset).map(String::as_str)
    }

    /// Returns the index of the first unquoted token equal to `marker`.
    #[must_use]
    pub fn marker_position(&self, marker: &str) -> Option<usize> {
        self.raw_tokens
            .iter()
            .zip(&self.quoted_flags)
            .position(|(text, quoted)| !quoted && text == marker)
    }
}

/// A single parsed line (or block) of a Solar program.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let name = value`
    Binding {
        /// The variable being bound.
        name: String,
        /// The bound value.
        expr: Expression,
        /// Line number in the source code.
        line: usize,
    },
    /// `print a [b ...]`
    Output {
        /// One or more values to print.
        exprs: Vec<Expression>,
        /// Line number in the source code.
        line:  usize,
    },
    /// `call target args...` or a bare `target args...`
    Call {
        /// The registry name to call.
        target: String,
        /// Call arguments.
        args:   Vec<Expression>,
        /// Line number in the source code.
        line:   usize,
    },
    /// `if condition then statement`
    Conditional {
        /// The guard expression.
        cond: Expression,
        /// The single guarded statement.
        then: Box<Self>,
        /// Line number in the source code.
        line: usize,
    },
    /// `solar_def name(params):` ... `end`
    FunctionDef(FunctionDef),
    /// `loop handle:` ... `end`
    Loop {
        /// The host handle that decides whether another frame runs.
        handle: String,
        /// Statements run once per frame.
        body:   Vec<Self>,
        /// Line number in the source code.
        line:   usize,
    },
    /// `use module`
    Directive {
        /// The library to install.
        module_name: String,
        /// Line number in the source code.
        line:        usize,
    },
    /// A line or block the language does not interpret.
    Passthrough {
        /// The text exactly as written, lines joined with `\n`.
        raw_text: String,
        /// Line number of the first line.
        line:     usize,
    },
    /// A `ui`/`gfx` command for the host.
    ExternalCommand(ExternalCommand),
}

impl Statement {
    /// Returns the source line number associated with this statement.
    ///
    /// # Example
    /// ```
    /// use solar::ast::Statement;
    ///
    /// let stmt = Statement::Directive { module_name: "math".into(),
    ///                                   line:        5 };
    /// assert_eq!(stmt.line_number(), 5);
    /// ```
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::Binding { line, .. }
            | Self::Output { line, .. }
            | Self::Call { line, .. }
            | Self::Conditional { line, .. }
            | Self::Loop { line, .. }
            | Self::Directive { line, .. }
            | Self::Passthrough { line, .. } => *line,
            Self::FunctionDef(def) => def.line,
            Self::ExternalCommand(cmd) => cmd.line,
        }
    }
}
