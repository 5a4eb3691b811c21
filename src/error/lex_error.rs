use thiserror::Error;

/// Represents all errors that can occur while tokenizing a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A quoted token was never closed.
    #[error("Error on line {line}: Unterminated string literal.")]
    UnterminatedString {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A parenthesis group was opened but never closed.
    #[error("Error on line {line}: Unbalanced parenthesis group.")]
    UnbalancedGroup {
        /// The source line where the error occurred.
        line: usize,
    },
}

impl LexError {
    /// Returns the source line the error was raised on.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnterminatedString { line } | Self::UnbalancedGroup { line } => *line,
        }
    }
}
