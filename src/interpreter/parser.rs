/// The block-aware line parser.
///
/// Walks the source line by line, asks the classifier how each line takes part
/// in the program, collects verbatim blocks, recurses into `solar_def` and
/// `loop` bodies, and records every downgraded line.
pub mod core;

/// Single-token and token-span expressions.
///
/// Turns tokens into number, string, variable or raw expressions.
pub mod expression;

/// Statement forms.
///
/// Parses bindings, output, calls, conditionals, directives and the block
/// headers, dispatching on the first token of a line.
pub mod statement;

/// The `ui` and `gfx` command families.
///
/// Checks sub-command names, token counts and marker keywords against a static
/// command table. Argument meaning is left to the host.
pub mod external;

/// Shared lexical helpers: identifier rules and keyword sets.
pub mod utils;
