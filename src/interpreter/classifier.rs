use crate::{
    ast::Statement,
    error::ParseError,
    interpreter::{
        parser::{
            core::ParseResult,
            statement::parse_statement,
            utils::{BLOCK_OPENERS, first_word, starts_with_keyword},
        },
        tokenizer::tokenize,
    },
};

/// Prefixes that reach into the host registries directly.
const REGISTRY_PREFIXES: &[&str] = &["vars_[", "funcs[", "__"];

/// Assignment operators, longest first so `//=` is not read as `/=`.
const ASSIGNMENT_OPERATORS: &[&str] = &["//=", "**=", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=", "="];

/// How a physical line takes part in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Blank or comment line outside a verbatim block. Produces nothing.
    Skip,
    /// Joins the currently open verbatim block.
    ContinueBlock,
    /// Opens a new verbatim block.
    StartBlock,
    /// A single verbatim line.
    VerbatimLine,
    /// A line for the statement parser.
    Statement,
}

/// The two outcomes of parsing a statement line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The line is a Solar statement.
    Parsed(Statement),
    /// The line is not valid Solar and is kept as verbatim text.
    Literal {
        /// The line as written.
        text:  String,
        /// Why the line could not be parsed.
        cause: ParseError,
    },
}

/// Decides how a raw line should be handled.
///
/// # Parameters
/// - `raw`: The line as written, indentation included.
/// - `open_block`: The indentation width of the open verbatim block's first
///   line, or `None` when no block is open.
///
/// # Example
/// ```
/// use solar::interpreter::classifier::{LineKind, classify};
///
/// assert_eq!(classify("def helper():", None), LineKind::StartBlock);
/// assert_eq!(classify("    return 1", Some(0)), LineKind::ContinueBlock);
/// assert_eq!(classify("import math", None), LineKind::VerbatimLine);
/// assert_eq!(classify("total += 1", None), LineKind::VerbatimLine);
/// assert_eq!(classify("let total = 1", None), LineKind::Statement);
/// assert_eq!(classify("  # note", None), LineKind::Skip);
/// ```
#[must_use]
pub fn classify(raw: &str, open_block: Option<usize>) -> LineKind {
    let trimmed = raw.trim();

    if let Some(indent) = open_block
       && (trimmed.is_empty() || trimmed.starts_with('#') || indentation(raw) > indent)
    {
        return LineKind::ContinueBlock;
    }
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineKind::Skip;
    }
    if opens_block(trimmed) {
        return LineKind::StartBlock;
    }
    if is_verbatim_line(trimmed) {
        return LineKind::VerbatimLine;
    }
    LineKind::Statement
}

/// Returns the width of a line's leading whitespace.
#[must_use]
pub fn indentation(raw: &str) -> usize {
    raw.len() - raw.trim_start().len()
}

/// Checks whether a trimmed line opens an indented verbatim block.
fn opens_block(trimmed: &str) -> bool {
    let word = first_word(trimmed);
    if word == "solar_def" || word == "loop" {
        return false;
    }
    let named = BLOCK_OPENERS.iter().any(|opener| {
                                        trimmed.strip_prefix(opener)
                                               .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
                                    });
    named || trimmed.ends_with(':')
}

/// Checks whether a trimmed line is a single verbatim line.
fn is_verbatim_line(trimmed: &str) -> bool {
    if trimmed.starts_with("import ") || trimmed.starts_with("from ") {
        return true;
    }
    if REGISTRY_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix)) {
        return true;
    }
    !trimmed.starts_with("let ") && !trimmed.starts_with("if ") && has_bare_assignment(trimmed)
}

/// Checks for an assignment operator outside quotes that is not part of a
/// comparison.
fn has_bare_assignment(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            },
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None => {
                if let Some(op) = ASSIGNMENT_OPERATORS.iter().find(|op| bytes[i..].starts_with(op.as_bytes())) {
                    if is_assignment_at(bytes, i, op.len()) {
                        return true;
                    }
                    i += op.len();
                    continue;
                }
            },
        }
        i += 1;
    }
    false
}

/// Rules out `==`, `!=`, `<=` and `>=` around an `=` found at `at`.
fn is_assignment_at(bytes: &[u8], at: usize, len: usize) -> bool {
    if len > 1 {
        return true;
    }
    let before = at.checked_sub(1).map(|j| bytes[j]);
    let after = bytes.get(at + 1).copied();
    !matches!(before, Some(b'=' | b'!' | b'<' | b'>')) && after != Some(b'=')
}

/// Parses a statement line, downgrading shape errors to a literal.
///
/// Lexical errors on a line whose first word is a language keyword are fatal,
/// since the line was clearly meant as Solar. On any other line they downgrade
/// like shape errors.
///
/// # Errors
/// Returns the lexical error for keyword lines, and any error that is not a
/// statement-shape error.
///
/// # Example
/// ```
/// use solar::interpreter::classifier::{ParseOutcome, parse_line};
///
/// assert!(matches!(parse_line("print 1", 1), Ok(ParseOutcome::Parsed(_))));
/// assert!(matches!(parse_line("let x", 2), Ok(ParseOutcome::Literal { .. })));
/// assert!(parse_line("print \"oops", 3).is_err());
/// assert!(matches!(parse_line("shout \"oops", 4), Ok(ParseOutcome::Literal { .. })));
/// ```
pub fn parse_line(raw: &str, line: usize) -> ParseResult<ParseOutcome> {
    let trimmed = raw.trim();
    let literal = |cause: ParseError| ParseOutcome::Literal { text: raw.to_string(),
                                                              cause };

    let tokens = match tokenize(trimmed, line) {
        Ok(tokens) => tokens,
        Err(e) if starts_with_keyword(trimmed) => return Err(e.into()),
        Err(e) => return Ok(literal(e.into())),
    };

    match parse_statement(&tokens, line) {
        Ok(statement) => Ok(ParseOutcome::Parsed(statement)),
        Err(e) if e.is_malformed() => Ok(literal(e)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_are_not_assignments() {
        assert!(!has_bare_assignment("a == b"));
        assert!(!has_bare_assignment("a != b"));
        assert!(!has_bare_assignment("a <= b"));
        assert!(!has_bare_assignment("a >= b"));
        assert!(has_bare_assignment("a = b"));
        assert!(has_bare_assignment("a //= 2"));
    }

    #[test]
    fn quoted_equals_is_ignored() {
        assert!(!has_bare_assignment("print \"a = b\""));
        assert!(!has_bare_assignment("print 'it\\'s = fine'"));
    }

    #[test]
    fn language_blocks_are_not_verbatim_openers() {
        assert_eq!(classify("solar_def greet(name):", None), LineKind::Statement);
        assert_eq!(classify("loop screen:", None), LineKind::Statement);
    }

    #[test]
    fn opener_needs_a_word_boundary() {
        assert_eq!(classify("format_name x", None), LineKind::Statement);
        assert_eq!(classify("for i in range(3):", None), LineKind::StartBlock);
        assert_eq!(classify("else:", None), LineKind::StartBlock);
    }

    #[test]
    fn continuation_requires_deeper_indentation() {
        assert_eq!(classify("    x = 1", Some(4)), LineKind::VerbatimLine);
        assert_eq!(classify("        x = 1", Some(4)), LineKind::ContinueBlock);
        assert_eq!(classify("", Some(4)), LineKind::ContinueBlock);
    }

    #[test]
    fn registry_prefixes_are_verbatim() {
        assert_eq!(classify("vars_['x']", None), LineKind::VerbatimLine);
        assert_eq!(classify("__debug()", None), LineKind::VerbatimLine);
    }

    #[test]
    fn equals_in_a_call_argument_is_verbatim() {
        assert_eq!(classify("greet name=1", None), LineKind::VerbatimLine);
        assert_eq!(classify("if x == 1 then print x", None), LineKind::Statement);
    }
}
