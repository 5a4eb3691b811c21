use thiserror::Error;

use crate::error::LexError;

/// Represents all errors that can occur while classifying and parsing lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// A `let` line did not have the shape `let name = value`.
    #[error("Error on line {line}: Malformed binding, {details}. Example: let x = 1")]
    MalformedBinding {
        /// What was wrong with the binding.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A statement had the wrong number or kind of tokens.
    #[error("Error on line {line}: Malformed statement, {details}.")]
    MalformedStatement {
        /// What was wrong with the statement.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A `ui`/`gfx` command was unknown, too short or missing a marker.
    #[error("Error on line {line}: Malformed `{category} {sub_command}` command, {details}.")]
    MalformedExternalCommand {
        /// The command family, `ui` or `gfx`.
        category:    String,
        /// The sub-command as written.
        sub_command: String,
        /// What was wrong with the command.
        details:     String,
        /// The source line where the error occurred.
        line:        usize,
    },
    /// A `solar_def` header was invalid.
    #[error("Error on line {line}: Malformed function definition, {details}. Example: solar_def greet(name):")]
    MalformedFunction {
        /// What was wrong with the header.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A block reached the end of the input without its `end` line.
    #[error("Error on line {line}: `{opener}` block is never closed with `end`.")]
    UnterminatedBlock {
        /// The keyword that opened the block.
        opener: String,
        /// The line of the block header.
        line:   usize,
    },
    /// A line would have been downgraded to passthrough but strict mode is on.
    #[error("Error on line {line}: Line is not valid Solar (strict mode): {cause}")]
    Downgraded {
        /// The error that caused the downgrade.
        cause: Box<Self>,
        /// The source line where the error occurred.
        line:  usize,
    },
}

impl ParseError {
    /// Returns the source line the error was raised on.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Lex(e) => e.line(),
            Self::MalformedBinding { line, .. }
            | Self::MalformedStatement { line, .. }
            | Self::MalformedExternalCommand { line, .. }
            | Self::MalformedFunction { line, .. }
            | Self::UnterminatedBlock { line, .. }
            | Self::Downgraded { line, .. } => *line,
        }
    }

    /// Whether the classifier may downgrade this error to a passthrough line.
    ///
    /// Only statement-shape errors qualify. Lexical errors are decided by the
    /// classifier itself and structural errors are always fatal.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self,
                 Self::MalformedBinding { .. }
                 | Self::MalformedStatement { .. }
                 | Self::MalformedExternalCommand { .. }
                 | Self::MalformedFunction { .. })
    }
}
