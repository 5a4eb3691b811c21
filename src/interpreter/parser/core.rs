use tracing::{debug, warn};

use crate::{
    ast::{FunctionDef, Statement},
    error::ParseError,
    interpreter::{
        classifier::{LineKind, ParseOutcome, classify, indentation, parse_line},
        parser::{
            statement::{parse_function_header, parse_loop_header},
            utils::first_word,
        },
    },
};

pub type ParseResult<T> = Result<T, ParseError>;

/// A line that could not be parsed and was kept as verbatim text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The line number of the downgraded line.
    pub line:  usize,
    /// The line as written.
    pub text:  String,
    /// The error the line would have raised.
    pub cause: ParseError,
}

/// The result of parsing a whole source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedProgram {
    /// Top-level statements in document order.
    pub statements:  Vec<Statement>,
    /// Every line that was downgraded to passthrough.
    pub diagnostics: Vec<Diagnostic>,
}

/// The block a nested parse is reading the body of.
#[derive(Clone, Copy)]
struct Opener<'a> {
    keyword: &'a str,
    line:    usize,
}

/// A verbatim block being collected.
struct VerbatimBlock {
    indent: usize,
    line:   usize,
    lines:  Vec<String>,
}

impl VerbatimBlock {
    fn finish(self) -> Statement {
        Statement::Passthrough { raw_text: self.lines.join("\n"),
                                 line:     self.line, }
    }
}

/// Line-by-line parser over a whole source file.
///
/// Blocks (`solar_def`, `loop`) recurse into [`Parser::parse_block`] and
/// consume their own `end`.
pub struct Parser<'a> {
    lines:       Vec<&'a str>,
    position:    usize,
    strict:      bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `source`.
    ///
    /// In strict mode a line that would be downgraded to passthrough is an
    /// error instead.
    #[must_use]
    pub fn new(source: &'a str, strict: bool) -> Self {
        Self { lines: source.lines().collect(),
               position: 0,
               strict,
               diagnostics: Vec::new() }
    }

    /// Parses every line into a program.
    ///
    /// # Errors
    /// - `Lex` for a lexical error on a keyword line.
    /// - `UnterminatedBlock` for a block without `end`.
    /// - `Downgraded` in strict mode.
    pub fn parse(mut self) -> ParseResult<ParsedProgram> {
        let statements = self.parse_block(None)?;
        Ok(ParsedProgram { statements,
                           diagnostics: self.diagnostics })
    }

    /// Returns the next line with its 1-based number.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let raw = self.lines.get(self.position).copied()?;
        self.position += 1;
        Some((self.position, raw))
    }

    /// Parses lines until end of input, or until the `end` closing `opener`.
    fn parse_block(&mut self, opener: Option<Opener<'_>>) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut verbatim: Option<VerbatimBlock> = None;

        while let Some((number, raw)) = self.next_line() {
            let kind = classify(raw, verbatim.as_ref().map(|block| block.indent));
            if kind == LineKind::ContinueBlock {
                if let Some(block) = verbatim.as_mut() {
                    block.lines.push(raw.to_string());
                }
                continue;
            }
            if let Some(block) = verbatim.take() {
                statements.push(block.finish());
            }

            let trimmed = raw.trim();
            if opener.is_some() && trimmed == "end" {
                return Ok(statements);
            }

            match kind {
                LineKind::Skip | LineKind::ContinueBlock => {},
                LineKind::StartBlock => {
                    verbatim = Some(VerbatimBlock { indent: indentation(raw),
                                                    line:   number,
                                                    lines:  vec![raw.to_string()], });
                },
                LineKind::VerbatimLine => {
                    statements.push(Statement::Passthrough { raw_text: raw.to_string(),
                                                             line:     number, });
                },
                LineKind::Statement => statements.push(self.parse_statement_line(raw, number)?),
            }
        }

        if let Some(block) = verbatim.take() {
            statements.push(block.finish());
        }
        match opener {
            Some(opener) => Err(ParseError::UnterminatedBlock { opener: opener.keyword.to_string(),
                                                                line:   opener.line, }),
            None => Ok(statements),
        }
    }

    /// Parses one statement line, recursing for block headers.
    fn parse_statement_line(&mut self, raw: &str, number: usize) -> ParseResult<Statement> {
        let trimmed = raw.trim();
        match first_word(trimmed) {
            "solar_def" => self.parse_function(raw, number),
            "loop" => self.parse_loop(raw, number),
            _ => match parse_line(raw, number)? {
                ParseOutcome::Parsed(statement) => {
                    debug!(line = number, "parsed statement");
                    Ok(statement)
                },
                ParseOutcome::Literal { text, cause } => self.downgrade(text, cause, number),
            },
        }
    }

    /// Parses a `solar_def` header and its body.
    ///
    /// A malformed header downgrades the whole block, header to `end`, so the
    /// body does not leak into the enclosing scope.
    fn parse_function(&mut self, raw: &str, number: usize) -> ParseResult<Statement> {
        let (name, params) = match parse_function_header(raw, number) {
            Ok(header) => header,
            Err(cause) => {
                let text = self.skip_block(raw, "solar_def", number)?;
                return self.downgrade(text, cause, number);
            },
        };
        let body = self.parse_block(Some(Opener { keyword: "solar_def",
                                                  line:    number, }))?;

        Ok(Statement::FunctionDef(FunctionDef { name,
                                                params,
                                                body,
                                                line: number }))
    }

    /// Parses a `loop` header and its body.
    fn parse_loop(&mut self, raw: &str, number: usize) -> ParseResult<Statement> {
        let handle = match parse_loop_header(raw, number) {
            Ok(handle) => handle,
            Err(cause) => {
                let text = self.skip_block(raw, "loop", number)?;
                return self.downgrade(text, cause, number);
            },
        };
        let body = self.parse_block(Some(Opener { keyword: "loop",
                                                  line:    number, }))?;

        Ok(Statement::Loop { handle,
                             body,
                             line: number })
    }

    /// Collects the raw lines of a block, up to and including its `end`.
    fn skip_block(&mut self, header: &str, keyword: &str, number: usize) -> ParseResult<String> {
        let mut lines = vec![header.to_string()];
        let mut depth = 1usize;
        while let Some((_, raw)) = self.next_line() {
            lines.push(raw.to_string());
            match first_word(raw) {
                "solar_def" | "loop" => depth += 1,
                "end" if raw.trim() == "end" => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(lines.join("\n"));
                    }
                },
                _ => {},
            }
        }
        Err(ParseError::UnterminatedBlock { opener: keyword.to_string(),
                                            line:   number, })
    }

    /// Records a downgraded line, or fails in strict mode.
    fn downgrade(&mut self, text: String, cause: ParseError, line: usize) -> ParseResult<Statement> {
        if self.strict {
            return Err(ParseError::Downgraded { cause: Box::new(cause),
                                                line });
        }
        warn!(line, error = %cause, "line is not valid Solar, keeping it as passthrough");
        self.diagnostics.push(Diagnostic { line,
                                           text: text.clone(),
                                           cause });
        Ok(Statement::Passthrough { raw_text: text,
                                    line })
    }
}

/// Parses a whole source file into statements.
///
/// # Parameters
/// - `source`: Newline-delimited program text.
/// - `strict`: Fail instead of downgrading unparsable lines.
///
/// # Errors
/// See [`Parser::parse`].
///
/// # Example
/// ```
/// use solar::interpreter::parser::core::parse_program;
///
/// let program = parse_program("let x = 1\nlet y\nprint x", false).unwrap();
/// assert_eq!(program.statements.len(), 3);
/// assert_eq!(program.diagnostics.len(), 1);
/// assert_eq!(program.diagnostics[0].line, 2);
///
/// assert!(parse_program("let y", true).is_err());
/// ```
pub fn parse_program(source: &str, strict: bool) -> ParseResult<ParsedProgram> {
    Parser::new(source, strict).parse()
}
