use crate::{
    ast::Statement,
    error::ParseError,
    interpreter::{
        parser::{
            core::ParseResult,
            expression::{parse_span, parse_token},
            external::parse_external_command,
            utils::{is_bindable_name, is_function_name, is_identifier},
        },
        tokenizer::Token,
    },
};

/// Parses a tokenized line into a statement, dispatching on the first token.
///
/// - `let` starts a binding,
/// - `print` an output statement,
/// - `call` an explicit call,
/// - `if` a conditional,
/// - `use` a directive,
/// - `ui`/`gfx` an external command.
///
/// Any other head token is the target of a bare call. Block headers
/// (`solar_def`, `loop`) and `end` are handled by the block parser and are
/// malformed here.
///
/// # Parameters
/// - `tokens`: The tokens of one line.
/// - `line`: The line number, stored on the statement.
///
/// # Errors
/// Returns a `Malformed*` error describing the first shape problem found.
///
/// # Example
/// ```
/// use solar::{
///     ast::{Expression, LiteralValue, Statement},
///     interpreter::{parser::statement::parse_statement, tokenizer::tokenize},
/// };
///
/// let tokens = tokenize("let x = 5", 1).unwrap();
/// let stmt = parse_statement(&tokens, 1).unwrap();
/// assert_eq!(stmt,
///            Statement::Binding { name: "x".into(),
///                                 expr: Expression::NumberLiteral(LiteralValue::Integer(5)),
///                                 line: 1 });
/// ```
pub fn parse_statement(tokens: &[Token], line: usize) -> ParseResult<Statement> {
    let Some((head, rest)) = tokens.split_first() else {
        return Err(ParseError::MalformedStatement { details: "empty statement".to_string(),
                                                    line });
    };
    if head.was_quoted {
        return Err(ParseError::MalformedStatement { details: format!("a statement cannot start with the string \"{}\"",
                                                                     head.text),
                                                    line });
    }

    match head.text.as_str() {
        "let" => parse_binding(rest, line),
        "print" => parse_output(rest, line),
        "call" => parse_call_keyword(rest, line),
        "if" => parse_conditional(rest, line),
        "use" => parse_directive(rest, line),
        "ui" | "gfx" => parse_external_command(&head.text, rest, line),
        "solar_def" | "loop" | "end" => {
            Err(ParseError::MalformedStatement { details: format!("`{}` must start its own line", head.text),
                                                 line })
        },
        _ => parse_call(head, rest, line),
    }
}

/// Parses `let name = span`.
fn parse_binding(rest: &[Token], line: usize) -> ParseResult<Statement> {
    let [name, equals, span @ ..] = rest else {
        return Err(ParseError::MalformedBinding { details: "expected a name, `=` and a value".to_string(),
                                                  line });
    };
    if !equals.is_keyword("=") {
        return Err(ParseError::MalformedBinding { details: format!("expected `=` after `{}`", name.text),
                                                  line });
    }
    if span.is_empty() {
        return Err(ParseError::MalformedBinding { details: "missing value after `=`".to_string(),
                                                  line });
    }
    if name.was_quoted || !is_bindable_name(&name.text) {
        return Err(ParseError::MalformedBinding { details: format!("`{}` is not a valid variable name", name.text),
                                                  line });
    }

    Ok(Statement::Binding { name: name.text.clone(),
                            expr: parse_span(span),
                            line })
}

/// Parses `print expr [expr ...]`. Each token is its own expression.
fn parse_output(rest: &[Token], line: usize) -> ParseResult<Statement> {
    if rest.is_empty() {
        return Err(ParseError::MalformedStatement { details: "`print` needs at least one value".to_string(),
                                                    line });
    }
    Ok(Statement::Output { exprs: rest.iter().map(parse_token).collect(),
                           line })
}

/// Parses `call target [args ...]`.
fn parse_call_keyword(rest: &[Token], line: usize) -> ParseResult<Statement> {
    let Some((target, args)) = rest.split_first() else {
        return Err(ParseError::MalformedStatement { details: "`call` needs a function name".to_string(),
                                                    line });
    };
    parse_call(target, args, line)
}

/// Parses a call whose target token has already been split off.
fn parse_call(target: &Token, args: &[Token], line: usize) -> ParseResult<Statement> {
    if target.was_quoted || !is_identifier(&target.text) {
        return Err(ParseError::MalformedStatement { details: format!("`{}` is not a valid function name", target.text),
                                                    line });
    }
    Ok(Statement::Call { target: target.text.clone(),
                         args: args.iter().map(parse_token).collect(),
                         line })
}

/// Parses `if condition-span then statement`.
///
/// The body is parsed recursively, so `if a then if b then print c` nests.
fn parse_conditional(rest: &[Token], line: usize) -> ParseResult<Statement> {
    let Some(then_at) = rest.iter().position(|t| t.is_keyword("then")) else {
        return Err(ParseError::MalformedStatement { details: "`if` needs a `then`".to_string(),
                                                    line });
    };
    let (condition, body) = (&rest[..then_at], &rest[then_at + 1..]);
    if condition.is_empty() {
        return Err(ParseError::MalformedStatement { details: "`if` needs a condition before `then`".to_string(),
                                                    line });
    }
    if body.is_empty() {
        return Err(ParseError::MalformedStatement { details: "`then` needs a statement".to_string(),
                                                    line });
    }

    Ok(Statement::Conditional { cond: parse_span(condition),
                                then: Box::new(parse_statement(body, line)?),
                                line })
}

/// Parses `use module`.
fn parse_directive(rest: &[Token], line: usize) -> ParseResult<Statement> {
    match rest {
        [module] if !module.was_quoted && is_identifier(&module.text) => {
            Ok(Statement::Directive { module_name: module.text.clone(),
                                      line })
        },
        _ => Err(ParseError::MalformedStatement { details: "`use` takes exactly one module name".to_string(),
                                                  line }),
    }
}

/// Parses a `solar_def` header line into the function name and parameters.
///
/// Accepted shapes are `solar_def name:`, `solar_def name():` and
/// `solar_def name(a, b):`, with optional whitespace around the parameter
/// list.
///
/// # Errors
/// Returns `MalformedFunction` for a missing `:`, an invalid or reserved name,
/// an invalid or duplicate parameter, or an unclosed parameter list.
///
/// # Example
/// ```
/// use solar::interpreter::parser::statement::parse_function_header;
///
/// let (name, params) = parse_function_header("solar_def greet(who, times):", 3).unwrap();
/// assert_eq!(name, "greet");
/// assert_eq!(params, vec!["who".to_string(), "times".to_string()]);
///
/// assert!(parse_function_header("solar_def greet(who)", 3).is_err());
/// ```
pub fn parse_function_header(header: &str, line: usize) -> ParseResult<(String, Vec<String>)> {
    let malformed = |details: &str| ParseError::MalformedFunction { details: details.to_string(),
                                                                    line };

    let rest = header.trim().strip_prefix("solar_def").ok_or_else(|| malformed("expected `solar_def`"))?;
    let rest = rest.strip_suffix(':').ok_or_else(|| malformed("the header must end with `:`"))?.trim();

    let (name, params) = match rest.split_once('(') {
        Some((name, list)) => {
            let list = list.trim_end()
                           .strip_suffix(')')
                           .ok_or_else(|| malformed("the parameter list is not closed"))?;
            (name.trim(), parse_parameters(list, line)?)
        },
        None => (rest, Vec::new()),
    };

    if !is_function_name(name) {
        return Err(malformed(&format!("`{name}` is not a valid function name")));
    }

    Ok((name.to_string(), params))
}

/// Parses the comma-separated parameter list between the header parentheses.
fn parse_parameters(list: &str, line: usize) -> ParseResult<Vec<String>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut params: Vec<String> = Vec::new();
    for param in list.split(',').map(str::trim) {
        if !is_bindable_name(param) {
            return Err(ParseError::MalformedFunction { details: format!("`{param}` is not a valid parameter name"),
                                                       line });
        }
        if params.iter().any(|p| p == param) {
            return Err(ParseError::MalformedFunction { details: format!("parameter `{param}` is declared twice"),
                                                       line });
        }
        params.push(param.to_string());
    }
    Ok(params)
}

/// Parses a `loop` header line into the handle it is driven by.
///
/// # Errors
/// Returns `MalformedStatement` unless the line is `loop <identifier>:`.
///
/// # Example
/// ```
/// use solar::interpreter::parser::statement::parse_loop_header;
///
/// assert_eq!(parse_loop_header("loop screen:", 1).unwrap(), "screen");
/// assert!(parse_loop_header("loop:", 1).is_err());
/// ```
pub fn parse_loop_header(header: &str, line: usize) -> ParseResult<String> {
    let handle = header.trim()
                       .strip_prefix("loop")
                       .and_then(|rest| rest.strip_suffix(':'))
                       .map(str::trim)
                       .filter(|handle| is_identifier(handle));

    handle.map(str::to_string)
          .ok_or_else(|| ParseError::MalformedStatement { details: "expected `loop <handle>:`".to_string(),
                                                          line })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::Expression, interpreter::tokenizer::tokenize};

    fn parse(line: &str) -> ParseResult<Statement> {
        parse_statement(&tokenize(line, 1).unwrap(), 1)
    }

    #[test]
    fn binding_requires_equals_and_value() {
        assert!(matches!(parse("let x"), Err(ParseError::MalformedBinding { .. })));
        assert!(matches!(parse("let x 5"), Err(ParseError::MalformedBinding { .. })));
        assert!(matches!(parse("let x ="), Err(ParseError::MalformedBinding { .. })));
        assert!(matches!(parse("let __x = 1"), Err(ParseError::MalformedBinding { .. })));
    }

    #[test]
    fn quoted_equals_is_not_a_binding_marker() {
        assert!(matches!(parse("let x \"=\" 5"), Err(ParseError::MalformedBinding { .. })));
    }

    #[test]
    fn conditional_body_is_parsed_recursively() {
        let stmt = parse("if x > 1 then print \"big\"").unwrap();
        let Statement::Conditional { cond, then, .. } = stmt else {
            panic!("expected a conditional");
        };
        assert_eq!(cond, Expression::RawExpression("x > 1".into()));
        assert!(matches!(*then, Statement::Output { .. }));
    }

    #[test]
    fn quoted_then_does_not_split_condition() {
        assert!(parse("if \"then\" == x").is_err());
    }

    #[test]
    fn unknown_head_is_a_bare_call() {
        let stmt = parse("greet \"Ada\" 3").unwrap();
        assert!(matches!(stmt, Statement::Call { ref target, ref args, .. } if target == "greet" && args.len() == 2));
    }

    #[test]
    fn header_without_parentheses_has_no_parameters() {
        let (name, params) = parse_function_header("solar_def tick:", 1).unwrap();
        assert_eq!(name, "tick");
        assert!(params.is_empty());
    }

    #[test]
    fn passthrough_words_cannot_name_functions() {
        for header in ["solar_def match():", "solar_def try(x):", "solar_def import:"] {
            assert!(matches!(parse_function_header(header, 1), Err(ParseError::MalformedFunction { .. })),
                    "{header}");
        }
        assert!(parse_function_header("solar_def matcher():", 1).is_ok());
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        assert!(matches!(parse_function_header("solar_def f(a, a):", 1),
                         Err(ParseError::MalformedFunction { .. })));
    }
}
