use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// Result type used by the tokenizer.
pub type LexResult<T> = Result<T, LexError>;

/// Represents one whitespace-delimited token of a source line.
///
/// Quoted tokens hold their unescaped contents and are always string literals.
/// Parenthesis groups are kept whole, outer parentheses and inner whitespace
/// included, so `(a + b)` is a single unquoted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text. For quoted tokens, without the quotes.
    pub text:       String,
    /// Whether the token was quote-delimited in the source.
    pub was_quoted: bool,
}

impl Token {
    /// Creates an unquoted token.
    pub fn bare(text: impl Into<String>) -> Self {
        Self { text:       text.into(),
               was_quoted: false, }
    }

    /// Creates a quoted token.
    pub fn quoted(text: impl Into<String>) -> Self {
        Self { text:       text.into(),
               was_quoted: true, }
    }

    /// Whether this token is the unquoted keyword `word`.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        !self.was_quoted && self.text == word
    }

    /// Renders the token back to source form.
    ///
    /// Quoted tokens are re-quoted with escapes, and a bare token holding a
    /// literal `(` gets it escaped again, so that tokenizing the result yields
    /// the same token.
    ///
    /// # Example
    /// ```
    /// use solar::interpreter::tokenizer::{Token, tokenize};
    ///
    /// let token = Token::quoted("say \"hi\"");
    /// let again = tokenize(&token.to_source(), 1).unwrap();
    /// assert_eq!(again, vec![token]);
    ///
    /// let token = Token::bare("f(x");
    /// assert_eq!(tokenize(&token.to_source(), 1).unwrap(), vec![token]);
    /// ```
    #[must_use]
    pub fn to_source(&self) -> String {
        if self.was_quoted {
            return quote(&self.text);
        }
        let is_group = || tokenize(&self.text, 0).is_ok_and(|tokens| tokens.as_slice() == std::slice::from_ref(self));
        if !self.text.contains('(') || is_group() {
            return self.text.clone();
        }
        self.text.replace('(', "\\(")
    }
}

/// Wraps `text` in double quotes, escaping backslashes and double quotes.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Splits one source line into tokens.
///
/// Whitespace separates tokens. A token starting with `"` or `'` runs to the
/// matching unescaped quote, with `\x` producing a literal `x`. A token
/// starting with `(` runs to the matching `)`; quotes inside the group are
/// tracked so a string may contain unbalanced parentheses. Any other run of
/// characters ends at whitespace or at an unescaped `(`.
///
/// # Parameters
/// - `line`: The line text, without its newline.
/// - `line_number`: Used for error reporting.
///
/// # Errors
/// - `UnterminatedString` if a quote is never closed.
/// - `UnbalancedGroup` if a parenthesis group is never closed.
///
/// # Example
/// ```
/// use solar::interpreter::tokenizer::{Token, tokenize};
///
/// let tokens = tokenize(r#"print "a b" (x + 1) y"#, 1).unwrap();
/// assert_eq!(tokens,
///            vec![Token::bare("print"),
///                 Token::quoted("a b"),
///                 Token::bare("(x + 1)"),
///                 Token::bare("y")]);
/// ```
pub fn tokenize(line: &str, line_number: usize) -> LexResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let token = match c {
            '"' | '\'' => {
                chars.next();
                read_quoted(&mut chars, c, line_number)?
            },
            '(' => read_group(&mut chars, line_number)?,
            _ => read_bare(&mut chars),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Reads the rest of a quoted token; the opening quote is already consumed.
fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char, line: usize) -> LexResult<Token> {
    let mut text = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => text.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(Token::quoted(text)),
            c => text.push(c),
        }
    }
    Err(LexError::UnterminatedString { line })
}

/// Reads a balanced parenthesis group, keeping its text verbatim.
fn read_group(chars: &mut Peekable<Chars<'_>>, line: usize) -> LexResult<Token> {
    let mut text = String::new();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        text.push(c);
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(Token::bare(text));
                }
            },
            '"' | '\'' => copy_quoted(chars, c, &mut text, line)?,
            '\\' => {
                if let Some(next) = chars.next() {
                    text.push(next);
                }
            },
            _ => {},
        }
    }

    Err(LexError::UnbalancedGroup { line })
}

/// Copies a quoted section inside a group, escapes included, so the sandbox
/// sees the string exactly as written.
fn copy_quoted(chars: &mut Peekable<Chars<'_>>,
               quote: char,
               text: &mut String,
               line: usize)
               -> LexResult<()> {
    while let Some(c) = chars.next() {
        text.push(c);
        if c == '\\' {
            match chars.next() {
                Some(escaped) => text.push(escaped),
                None => break,
            }
        } else if c == quote {
            return Ok(());
        }
    }
    Err(LexError::UnterminatedString { line })
}

/// Reads an unquoted token up to whitespace or an unescaped `(`.
fn read_bare(chars: &mut Peekable<Chars<'_>>) -> Token {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '(' {
            break;
        }
        chars.next();
        if c == '\\' && chars.peek() == Some(&'(') {
            chars.next();
            text.push('(');
            continue;
        }
        text.push(c);
    }
    Token::bare(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_paren_stays_in_bare_token() {
        let tokens = tokenize(r"f\(x", 1).unwrap();
        assert_eq!(tokens, vec![Token::bare("f(x")]);
    }

    #[test]
    fn group_splits_from_preceding_word() {
        let tokens = tokenize("greet(name)", 1).unwrap();
        assert_eq!(tokens, vec![Token::bare("greet"), Token::bare("(name)")]);
    }

    #[test]
    fn single_quotes_are_strings_too() {
        let tokens = tokenize(r"print 'it\'s'", 2).unwrap();
        assert_eq!(tokens[1], Token::quoted("it's"));
    }

    #[test]
    fn trailing_backslash_is_unterminated() {
        assert_eq!(tokenize("\"abc\\", 4), Err(LexError::UnterminatedString { line: 4 }));
    }
}
