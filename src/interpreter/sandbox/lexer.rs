use logos::Logos;

/// Represents a lexical token of the expression language.
///
/// Words the language refuses to give any meaning (statement keywords,
/// `lambda`, `for`, ...) are lexed as [`Token::Forbidden`] so the parser can
/// reject them structurally before building a tree.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    /// Numeric literal tokens, such as `3.14`, `.5`, `2.` or `2.1e-10`.
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    Real(f64),
    /// Integer literal tokens, such as `42`.
    #[regex(r"[0-9]+", parse_integer)]
    Integer(i64),
    /// String literal tokens in single or double quotes.
    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    #[regex(r"'([^'\\]|\\.)*'", parse_string)]
    Str(String),
    /// Boolean literal tokens, such as `True` or `true`.
    #[token("True", |_| true)]
    #[token("true", |_| true)]
    #[token("False", |_| false)]
    #[token("false", |_| false)]
    Bool(bool),
    /// `None` or `none`
    #[token("None")]
    #[token("none")]
    None,
    /// `and`
    #[token("and")]
    And,
    /// `or`
    #[token("or")]
    Or,
    /// `not`
    #[token("not")]
    Not,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `in`
    #[token("in")]
    In,
    /// `is`
    #[token("is")]
    Is,
    /// Keywords with no meaning in an expression.
    #[token("lambda", keyword)]
    #[token("for", keyword)]
    #[token("import", keyword)]
    #[token("from", keyword)]
    #[token("yield", keyword)]
    #[token("await", keyword)]
    #[token("async", keyword)]
    #[token("def", keyword)]
    #[token("class", keyword)]
    #[token("del", keyword)]
    #[token("global", keyword)]
    #[token("nonlocal", keyword)]
    #[token("return", keyword)]
    #[token("raise", keyword)]
    #[token("with", keyword)]
    #[token("assert", keyword)]
    #[token("while", keyword)]
    #[token("try", keyword)]
    Forbidden(String),
    /// Identifier tokens; variable or function names such as `x` or `len`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `=`
    #[token("=")]
    Assign,
    /// `:=`
    #[token(":=")]
    Walrus,
    /// Augmented assignment operators such as `+=`.
    #[token("+=", keyword)]
    #[token("-=", keyword)]
    #[token("*=", keyword)]
    #[token("/=", keyword)]
    #[token("//=", keyword)]
    #[token("%=", keyword)]
    #[token("**=", keyword)]
    #[token("&=", keyword)]
    #[token("|=", keyword)]
    #[token("^=", keyword)]
    #[token("<<=", keyword)]
    #[token(">>=", keyword)]
    AugAssign(String),
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `**`
    #[token("**")]
    DoubleStar,
    /// `/`
    #[token("/")]
    Slash,
    /// `//`
    #[token("//")]
    DoubleSlash,
    /// `%`
    #[token("%")]
    Percent,
    /// `&`
    #[token("&")]
    Ampersand,
    /// `|`
    #[token("|")]
    Pipe,
    /// `^`
    #[token("^")]
    Caret,
    /// `~`
    #[token("~")]
    Tilde,
    /// `<<`
    #[token("<<")]
    ShiftLeft,
    /// `>>`
    #[token(">>")]
    ShiftRight,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `:`
    #[token(":")]
    Colon,
    /// `.`
    #[token(".")]
    Dot,
    /// Whitespace, newlines included.
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Ignored,
}

/// Parses a floating-point literal from the current token slice.
///
/// # Returns
/// - `Some(f64)`: The parsed floating-point value if successful.
/// - `None`: If the token slice is not a valid float.
fn parse_float(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Parses an integer literal from the current token slice.
///
/// # Returns
/// - `Some(i64)`: The parsed integer value if successful.
/// - `None`: If the literal does not fit an `i64`.
fn parse_integer(lex: &logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

/// The text of a keyword or operator the parser refuses.
fn keyword(lex: &logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

/// Strips the quotes from a string literal and resolves its escapes.
///
/// `\n`, `\t`, `\r` and `\0` have their usual meaning; any other escaped
/// character stands for itself.
fn parse_string(lex: &logos::Lexer<Token>) -> Option<String> {
    let slice = lex.slice();
    let inner = slice.get(1..slice.len() - 1)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            other => out.push(other),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn operators_prefer_the_longest_match() {
        assert_eq!(lex("a // b ** c"),
                   vec![Token::Identifier("a".into()),
                        Token::DoubleSlash,
                        Token::Identifier("b".into()),
                        Token::DoubleStar,
                        Token::Identifier("c".into())]);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(lex("lambda"), vec![Token::Forbidden("lambda".to_string())]);
        assert_eq!(lex("lambdas"), vec![Token::Identifier("lambdas".into())]);
        assert_eq!(lex("None"), vec![Token::None]);
    }

    #[test]
    fn strings_resolve_escapes() {
        assert_eq!(lex(r#""a\"b\n""#), vec![Token::Str("a\"b\n".into())]);
        assert_eq!(lex(r"'it\'s'"), vec![Token::Str("it's".into())]);
    }

    #[test]
    fn reals_and_integers() {
        assert_eq!(lex("2 2.5 .5 1e3"),
                   vec![Token::Integer(2), Token::Real(2.5), Token::Real(0.5), Token::Real(1000.0)]);
    }
}
