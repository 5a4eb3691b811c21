use std::{io, path::PathBuf};

use thiserror::Error;

/// Configuration errors.
///
/// Raised while reading or decoding a `solar.toml` file.
pub mod config_error;
/// Sandboxed expression errors.
///
/// Defines the errors produced by the expression sandbox: rejected constructs,
/// syntax mistakes inside a raw expression, type mismatches and exceeded
/// resource limits. These carry no line number; the runtime attaches one when
/// it lifts them into a [`RuntimeError`].
pub mod eval_error;
/// Lexical errors.
///
/// Errors raised by the line tokenizer for unterminated strings and unbalanced
/// parenthesis groups.
pub mod lex_error;
/// Parsing errors.
///
/// Defines all error types that can occur while classifying and parsing source
/// lines into statements, including malformed statements, malformed external
/// commands and unterminated blocks.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised while executing a lowered
/// program: unresolved names, rejected expressions, arity mismatches and
/// collaborator failures.
pub mod runtime_error;

pub use config_error::ConfigError;
pub use eval_error::EvalError;
pub use lex_error::LexError;
pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// Any error produced while loading, compiling or running a Solar program.
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The lowered program failed while executing.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A source file could not be read.
    #[error("Could not read `{}`: {source}", path.display())]
    Io {
        /// The file that failed.
        path:   PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}
