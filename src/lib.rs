//! # solar
//!
//! Solar is a small line-oriented scripting language. Each line is a binding,
//! an output, a call, a conditional, a directive, a function or loop block, or
//! a `ui`/`gfx` command for a host. Anything else is kept as passthrough text.
//! Compound expressions run in a sandboxed evaluator that can read variables
//! and call a fixed set of safe functions, and nothing else.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use tracing::info;

use crate::{
    config::Config,
    error::{Error, ParseError},
    interpreter::{
        lowering::program::{IntermediateProgram, lower},
        parser::core::{ParsedProgram, parse_program},
        runtime::{core::Runtime, host::Host},
    },
};

/// Defines the structure of parsed programs.
///
/// Declares the `Statement` enum, the four expression shapes the line grammar
/// recognizes, function definitions and external commands. The parser builds
/// these and the lowering pass consumes them.
pub mod ast;
/// Loads run settings from `solar.toml`.
///
/// # Responsibilities
/// - Parser strictness.
/// - Frame and call depth limits, output echo.
/// - Sandbox resource limits.
pub mod config;
/// Provides unified error types for every phase.
///
/// This module defines the errors raised while tokenizing, parsing,
/// evaluating expressions, running programs and loading configuration. Each
/// carries the line it happened on where there is one.
pub mod error;
/// Orchestrates the pipeline from source text to a finished run.
///
/// # Responsibilities
/// - Tokenizing, classifying and parsing lines.
/// - Lowering statements to an intermediate program.
/// - Evaluating expressions in the sandbox and running programs against a
///   host.
pub mod interpreter;
/// General utilities for safe numeric conversion.
pub mod util;

/// The version of this crate.
pub const SOLAR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parses a program, honouring the parser settings of `config`.
///
/// # Errors
/// Returns a [`ParseError`] for structural errors, lexical errors on keyword
/// lines, and, in strict mode, any line that would be downgraded.
///
/// # Example
/// ```
/// use solar::{config::Config, parse_source};
///
/// let program = parse_source("let x = 1\nprint x", &Config::default()).unwrap();
/// assert_eq!(program.statements.len(), 2);
/// assert!(program.diagnostics.is_empty());
/// ```
pub fn parse_source(source: &str, config: &Config) -> Result<ParsedProgram, ParseError> {
    let parsed = parse_program(source, config.parser.strict)?;
    info!(statements = parsed.statements.len(),
          downgraded = parsed.diagnostics.len(),
          "parsed program");
    Ok(parsed)
}

/// Parses and lowers a program.
///
/// # Errors
/// Any error from [`parse_source`].
///
/// # Example
/// ```
/// use solar::{compile_source, config::Config};
///
/// let program = compile_source("use math\nlet x = (2 * 3)", &Config::default()).unwrap();
/// assert_eq!(program.to_string(), "import math\nstore x = `(2 * 3)`\n");
/// ```
pub fn compile_source(source: &str, config: &Config) -> Result<IntermediateProgram, Error> {
    let parsed = parse_source(source, config)?;
    Ok(lower(&parsed.statements))
}

/// Compiles and runs a program against `host`.
///
/// The finished runtime is returned so its variables and host can be
/// inspected.
///
/// # Errors
/// The first parse or runtime error.
///
/// # Example
/// ```
/// use solar::{
///     config::Config,
///     interpreter::{runtime::headless::HeadlessHost, value::core::Value},
///     run_source,
/// };
///
/// let source = "let n = 4\nif (n > 3) then print \"big\"";
/// let runtime = run_source(source, HeadlessHost::new(false), &Config::default()).unwrap();
/// assert_eq!(runtime.host().output(), ["big"]);
/// assert_eq!(runtime.store().get("n"), Some(&Value::Integer(4)));
///
/// assert!(run_source("print missing", HeadlessHost::new(false), &Config::default()).is_err());
/// ```
pub fn run_source<H: Host>(source: &str, host: H, config: &Config) -> Result<Runtime<H>, Error> {
    let program = compile_source(source, config)?;
    let mut runtime = Runtime::new(host, config);
    runtime.run(&program)?;
    Ok(runtime)
}
