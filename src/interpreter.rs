/// Splits source lines into tokens.
///
/// Whitespace separates tokens; quoted strings and parenthesis groups are kept
/// whole. Tokens remember whether they were quoted, so a quoted keyword is
/// never mistaken for a real one.
pub mod tokenizer;
/// Decides what kind of line each source line is.
///
/// # Responsibilities
/// - Recognizes comments, language statements and passthrough lines.
/// - Opens and continues verbatim blocks by indentation.
/// - Turns a single line into a statement or a literal.
pub mod classifier;
/// Builds statements from classified lines.
///
/// Handles the statement forms, function and loop blocks, external commands
/// and the downgrade of malformed lines to passthrough.
pub mod parser;
/// Turns statements into an intermediate program.
pub mod lowering;
/// Evaluates raw expressions without access to anything but a read-only view
/// of the variables and a fixed set of safe functions.
///
/// # Responsibilities
/// - Tokenizes and parses expressions into a closed syntax tree.
/// - Rejects statements, dangerous names and `__` references before
///   evaluation.
/// - Enforces limits on source length, nesting and produced sizes.
pub mod sandbox;
/// Runtime values: numbers, strings, collections and host handles.
pub mod value;
/// Executes intermediate programs against a host.
pub mod runtime;
