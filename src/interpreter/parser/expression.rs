use crate::{
    ast::{Expression, LiteralValue},
    interpreter::{
        parser::utils::is_identifier,
        tokenizer::Token,
    },
};

/// Parses a single token into an expression.
///
/// Quoted tokens are always string literals. Unquoted tokens are tried as an
/// integer, then as a real when they contain a decimal point, then as an
/// identifier. Anything else is kept as raw source for the sandbox.
///
/// # Parameters
/// - `token`: The token text.
/// - `was_quoted`: Whether the token was quote-delimited.
///
/// # Example
/// ```
/// use solar::{
///     ast::{Expression, LiteralValue},
///     interpreter::parser::expression::parse_expression,
/// };
///
/// assert_eq!(parse_expression("42", false), Expression::NumberLiteral(LiteralValue::Integer(42)));
/// assert_eq!(parse_expression("42", true), Expression::StringLiteral("42".into()));
/// assert_eq!(parse_expression("x", false), Expression::VariableRef("x".into()));
/// assert_eq!(parse_expression("(x*2)", false), Expression::RawExpression("(x*2)".into()));
/// ```
#[must_use]
pub fn parse_expression(token: &str, was_quoted: bool) -> Expression {
    if was_quoted {
        return Expression::StringLiteral(token.to_string());
    }
    if let Ok(n) = token.parse::<i64>() {
        return Expression::NumberLiteral(LiteralValue::Integer(n));
    }
    if token.contains('.')
       && let Ok(r) = token.parse::<f64>()
    {
        return Expression::NumberLiteral(LiteralValue::Real(r));
    }
    if is_identifier(token) {
        return Expression::VariableRef(token.to_string());
    }
    Expression::RawExpression(token.to_string())
}

/// Parses a token for use as a single expression.
#[must_use]
pub fn parse_token(token: &Token) -> Expression {
    parse_expression(&token.text, token.was_quoted)
}

/// Parses a span of tokens into one expression.
///
/// A one-token span goes through [`parse_expression`]. A longer span is
/// re-joined with single spaces into a raw expression, re-quoting quoted
/// tokens so the sandbox sees them as strings.
///
/// # Example
/// ```
/// use solar::{
///     ast::Expression,
///     interpreter::{parser::expression::parse_span, tokenizer::Token},
/// };
///
/// let span = [Token::bare("x"), Token::bare("+"), Token::quoted("1")];
/// assert_eq!(parse_span(&span), Expression::RawExpression("x + \"1\"".into()));
/// ```
#[must_use]
pub fn parse_span(tokens: &[Token]) -> Expression {
    match tokens {
        [single] => parse_token(single),
        _ => Expression::RawExpression(join_tokens(tokens)),
    }
}

/// Re-joins tokens into source text with single spaces.
#[must_use]
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(Token::to_source).collect::<Vec<_>>().join(" ")
}

