use logos::Logos;

use crate::{
    config::SandboxConfig,
    error::EvalError,
    interpreter::{
        sandbox::{
            eval::EvalResult,
            lexer::Token,
            syntax::{BinaryOperator, CompareOperator, LogicalOperator, Node, UnaryOperator},
        },
        value::core::Value,
    },
};

/// Parses expression source into a syntax tree.
///
/// The source is lexed, scanned for tokens that can only belong to
/// statements (assignment, `lambda`, `import`, ...), and then parsed by
/// recursive descent from the lowest-precedence level, the conditional
/// expression, down to atoms.
///
/// # Errors
/// - `LimitExceeded` if the source is too long or nests too deeply.
/// - `SecurityViolation` for a statement-only token or a starred argument.
/// - `Syntax` for anything else that does not parse.
///
/// # Example
/// ```
/// use solar::{
///     config::SandboxConfig,
///     error::EvalError,
///     interpreter::sandbox::{parser::parse, syntax::Node},
/// };
///
/// let limits = SandboxConfig::default();
/// assert!(matches!(parse("a + 1", &limits), Ok(Node::Binary { .. })));
/// assert!(matches!(parse("x = 1", &limits), Err(EvalError::SecurityViolation { .. })));
/// ```
pub fn parse(source: &str, limits: &SandboxConfig) -> EvalResult<Node> {
    if source.len() > limits.max_source_len {
        return Err(EvalError::LimitExceeded { details: format!("expression is {} bytes long, the limit is {}",
                                                               source.len(),
                                                               limits.max_source_len) });
    }
    let tokens = lex(source)?;
    reject_statement_tokens(&tokens)?;

    let mut parser = ExprParser { tokens,
                                  position: 0,
                                  depth: 0,
                                  max_depth: limits.max_depth };
    let node = parser.parse_expression()?;
    if let Some(token) = parser.peek() {
        return Err(EvalError::Syntax { details: format!("unexpected {token:?} after the expression") });
    }
    Ok(node)
}

/// Runs the lexer over the whole source.
fn lex(source: &str) -> EvalResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(EvalError::Syntax { details: format!("unexpected `{}`", lexer.slice()) });
            },
        }
    }
    Ok(tokens)
}

/// Rejects tokens that only make sense in statements.
fn reject_statement_tokens(tokens: &[Token]) -> EvalResult<()> {
    let construct = tokens.iter().find_map(|token| match token {
                                     Token::Forbidden(word) => Some(format!("`{word}`")),
                                     Token::Assign => Some("assignment `=`".to_string()),
                                     Token::Walrus => Some("assignment expression `:=`".to_string()),
                                     Token::AugAssign(op) => Some(format!("augmented assignment `{op}`")),
                                     _ => None,
                                 });
    match construct {
        Some(construct) => Err(EvalError::SecurityViolation { construct }),
        None => Ok(()),
    }
}

/// Maps a token to the arithmetic or bitwise operator it spells.
const fn token_to_binary_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Sub),
        Token::Star => Some(BinaryOperator::Mul),
        Token::Slash => Some(BinaryOperator::Div),
        Token::DoubleSlash => Some(BinaryOperator::FloorDiv),
        Token::Percent => Some(BinaryOperator::Mod),
        Token::Ampersand => Some(BinaryOperator::BitAnd),
        Token::Pipe => Some(BinaryOperator::BitOr),
        Token::Caret => Some(BinaryOperator::BitXor),
        Token::ShiftLeft => Some(BinaryOperator::Shl),
        Token::ShiftRight => Some(BinaryOperator::Shr),
        _ => None,
    }
}

/// Recursive-descent parser state.
struct ExprParser {
    tokens:    Vec<Token>,
    position:  usize,
    depth:     usize,
    max_depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Consumes the next token if it equals `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, expected: &Token, what: &str) -> EvalResult<()> {
        if self.eat(expected) {
            return Ok(());
        }
        Err(EvalError::Syntax { details: match self.peek() {
                                    Some(token) => format!("expected {what}, found {token:?}"),
                                    None => format!("expected {what}, found the end of the expression"),
                                } })
    }

    /// Enters one more nesting level.
    fn deepen(&mut self) -> EvalResult<()> {
        if self.depth >= self.max_depth {
            return Err(EvalError::LimitExceeded { details: format!("expression nests deeper than {}",
                                                                   self.max_depth) });
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.deepen()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Runs a parse whose loops deepen the tree, restoring the depth after.
    ///
    /// Every node a chain wraps around its left side is one level deeper, so
    /// `a + b + c` and `a.b.c` count like nested parentheses.
    fn chained<T>(&mut self, parse: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        let depth = self.depth;
        let result = parse(self);
        self.depth = depth;
        result
    }

    /// `expression := or_expr ("if" or_expr "else" expression)?`
    fn parse_expression(&mut self) -> EvalResult<Node> {
        self.nested(Self::parse_ternary)
    }

    fn parse_ternary(&mut self) -> EvalResult<Node> {
        let then = self.parse_or()?;
        if !self.eat(&Token::If) {
            return Ok(then);
        }
        let condition = self.parse_or()?;
        self.expect(&Token::Else, "`else` in the conditional expression")?;
        let otherwise = self.parse_expression()?;

        Ok(Node::Ternary { condition: Box::new(condition),
                           then:      Box::new(then),
                           otherwise: Box::new(otherwise), })
    }

    /// `or_expr := and_expr ("or" and_expr)*`
    fn parse_or(&mut self) -> EvalResult<Node> {
        self.chained(Self::or_chain)
    }

    fn or_chain(&mut self) -> EvalResult<Node> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            self.deepen()?;
            let right = self.parse_and()?;
            left = Node::Logical { left:  Box::new(left),
                                   op:    LogicalOperator::Or,
                                   right: Box::new(right), };
        }
        Ok(left)
    }

    /// `and_expr := not_expr ("and" not_expr)*`
    fn parse_and(&mut self) -> EvalResult<Node> {
        self.chained(Self::and_chain)
    }

    fn and_chain(&mut self) -> EvalResult<Node> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            self.deepen()?;
            let right = self.parse_not()?;
            left = Node::Logical { left:  Box::new(left),
                                   op:    LogicalOperator::And,
                                   right: Box::new(right), };
        }
        Ok(left)
    }

    /// `not_expr := "not" not_expr | comparison`
    fn parse_not(&mut self) -> EvalResult<Node> {
        if self.eat(&Token::Not) {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Node::Unary { op:      UnaryOperator::Not,
                                    operand: Box::new(operand), });
        }
        self.parse_comparison()
    }

    /// `comparison := bit_or (comp_op bit_or)*`
    ///
    /// Chains like `a < b < c` keep every link.
    fn parse_comparison(&mut self) -> EvalResult<Node> {
        let first = self.parse_bit_or()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_operator() {
            rest.push((op, self.parse_bit_or()?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Node::Compare { first: Box::new(first),
                           rest })
    }

    /// Consumes a comparison operator, including the two-word `not in` and
    /// `is not`.
    fn comparison_operator(&mut self) -> Option<CompareOperator> {
        let (op, width) = match (self.peek()?, self.peek_at(1)) {
            (Token::EqualEqual, _) => (CompareOperator::Eq, 1),
            (Token::BangEqual, _) => (CompareOperator::NotEq, 1),
            (Token::Less, _) => (CompareOperator::Lt, 1),
            (Token::LessEqual, _) => (CompareOperator::LtE, 1),
            (Token::Greater, _) => (CompareOperator::Gt, 1),
            (Token::GreaterEqual, _) => (CompareOperator::GtE, 1),
            (Token::In, _) => (CompareOperator::In, 1),
            (Token::Not, Some(Token::In)) => (CompareOperator::NotIn, 2),
            (Token::Is, Some(Token::Not)) => (CompareOperator::IsNot, 2),
            (Token::Is, _) => (CompareOperator::Is, 1),
            _ => return None,
        };
        self.position += width;
        Some(op)
    }

    /// Parses one left-associative binary precedence level.
    fn binary_level(&mut self,
                    operand: fn(&mut Self) -> EvalResult<Node>,
                    accepts: fn(BinaryOperator) -> bool)
                    -> EvalResult<Node> {
        self.chained(|parser| {
                let mut left = operand(parser)?;
                loop {
                    if let Some(token) = parser.peek()
                       && let Some(op) = token_to_binary_operator(token)
                       && accepts(op)
                    {
                        parser.position += 1;
                        parser.deepen()?;
                        let right = operand(parser)?;
                        left = Node::Binary { left: Box::new(left),
                                              op,
                                              right: Box::new(right) };
                        continue;
                    }
                    break;
                }
                Ok(left)
            })
    }

    /// `bit_or := bit_xor ("|" bit_xor)*`
    fn parse_bit_or(&mut self) -> EvalResult<Node> {
        self.binary_level(Self::parse_bit_xor, |op| op == BinaryOperator::BitOr)
    }

    /// `bit_xor := bit_and ("^" bit_and)*`
    fn parse_bit_xor(&mut self) -> EvalResult<Node> {
        self.binary_level(Self::parse_bit_and, |op| op == BinaryOperator::BitXor)
    }

    /// `bit_and := shift ("&" shift)*`
    fn parse_bit_and(&mut self) -> EvalResult<Node> {
        self.binary_level(Self::parse_shift, |op| op == BinaryOperator::BitAnd)
    }

    /// `shift := additive (("<<" | ">>") additive)*`
    fn parse_shift(&mut self) -> EvalResult<Node> {
        self.binary_level(Self::parse_additive,
                          |op| matches!(op, BinaryOperator::Shl | BinaryOperator::Shr))
    }

    /// `additive := multiplicative (("+" | "-") multiplicative)*`
    fn parse_additive(&mut self) -> EvalResult<Node> {
        self.binary_level(Self::parse_multiplicative,
                          |op| matches!(op, BinaryOperator::Add | BinaryOperator::Sub))
    }

    /// `multiplicative := unary (("*" | "/" | "//" | "%") unary)*`
    fn parse_multiplicative(&mut self) -> EvalResult<Node> {
        self.binary_level(Self::parse_unary,
                          |op| {
                              matches!(op,
                                       BinaryOperator::Mul
                                       | BinaryOperator::Div
                                       | BinaryOperator::FloorDiv
                                       | BinaryOperator::Mod)
                          })
    }

    /// `unary := ("-" | "+" | "~") unary | power`
    fn parse_unary(&mut self) -> EvalResult<Node> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOperator::Neg,
            Some(Token::Plus) => UnaryOperator::Pos,
            Some(Token::Tilde) => UnaryOperator::Invert,
            _ => return self.parse_power(),
        };
        self.position += 1;
        let operand = self.nested(Self::parse_unary)?;
        Ok(Node::Unary { op,
                         operand: Box::new(operand) })
    }

    /// `power := postfix ("**" unary)?`
    ///
    /// Right-associative: `2 ** 3 ** 2` is `2 ** (3 ** 2)`, and `-2 ** 2` is
    /// `-(2 ** 2)`.
    fn parse_power(&mut self) -> EvalResult<Node> {
        let base = self.parse_postfix()?;
        if !self.eat(&Token::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_unary)?;
        Ok(Node::Binary { left:  Box::new(base),
                          op:    BinaryOperator::Pow,
                          right: Box::new(exponent), })
    }

    /// `postfix := atom ("(" args ")" | "[" expression "]" | "." name)*`
    fn parse_postfix(&mut self) -> EvalResult<Node> {
        self.chained(Self::postfix_chain)
    }

    fn postfix_chain(&mut self) -> EvalResult<Node> {
        let mut node = self.parse_atom()?;
        loop {
            if matches!(self.peek(), Some(Token::LParen | Token::LBracket | Token::Dot)) {
                self.deepen()?;
            }
            if self.eat(&Token::LParen) {
                let args = self.parse_comma_separated(&Token::RParen)?;
                node = Node::Call { callee: Box::new(node),
                                    args };
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(&Token::RBracket, "`]`")?;
                node = Node::Subscript { object: Box::new(node),
                                         index:  Box::new(index), };
            } else if self.eat(&Token::Dot) {
                let Some(Token::Identifier(name)) = self.advance() else {
                    return Err(EvalError::Syntax { details: "expected an attribute name after `.`".to_string() });
                };
                node = Node::Attribute { object: Box::new(node),
                                         name };
            } else {
                return Ok(node);
            }
        }
    }

    /// Parses a literal, a name, or a bracketed construct.
    fn parse_atom(&mut self) -> EvalResult<Node> {
        let Some(token) = self.advance() else {
            return Err(EvalError::Syntax { details: "unexpected end of the expression".to_string() });
        };
        match token {
            Token::Integer(n) => Ok(Node::Literal(Value::Integer(n))),
            Token::Real(r) => Ok(Node::Literal(Value::Real(r))),
            Token::Str(s) => Ok(Node::Literal(Value::from(s))),
            Token::Bool(b) => Ok(Node::Literal(Value::Bool(b))),
            Token::None => Ok(Node::Literal(Value::None)),
            Token::Identifier(name) => Ok(Node::Name(name)),
            Token::LParen => self.parse_parenthesized(),
            Token::LBracket => Ok(Node::List(self.parse_comma_separated(&Token::RBracket)?)),
            Token::LBrace => self.parse_map(),
            Token::Star | Token::DoubleStar => {
                Err(EvalError::SecurityViolation { construct: "starred argument".to_string() })
            },
            other => Err(EvalError::Syntax { details: format!("unexpected {other:?}") }),
        }
    }

    /// Parses what follows `(`: a grouping, a tuple, or `()`.
    fn parse_parenthesized(&mut self) -> EvalResult<Node> {
        if self.eat(&Token::RParen) {
            return Ok(Node::Tuple(Vec::new()));
        }
        let first = self.parse_expression()?;
        if !self.eat(&Token::Comma) {
            self.expect(&Token::RParen, "`)`")?;
            return Ok(first);
        }
        let mut items = vec![first];
        items.extend(self.parse_comma_separated(&Token::RParen)?);
        Ok(Node::Tuple(items))
    }

    /// Parses `{k: v, ...}` after the opening brace.
    fn parse_map(&mut self) -> EvalResult<Node> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Node::Map(entries));
        }
        loop {
            let key = self.parse_expression()?;
            self.expect(&Token::Colon, "`:` after a map key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RBrace) {
                    break;
                }
                continue;
            }
            self.expect(&Token::RBrace, "`,` or `}`")?;
            break;
        }
        Ok(Node::Map(entries))
    }

    /// Parses a comma-separated list of expressions until `closing`.
    ///
    /// A trailing comma is allowed. An immediately encountered closing token
    /// produces an empty list.
    fn parse_comma_separated(&mut self, closing: &Token) -> EvalResult<Vec<Node>> {
        let mut items = Vec::new();
        if self.eat(closing) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.eat(&Token::Comma) {
                if self.eat(closing) {
                    break;
                }
                continue;
            }
            self.expect(closing, &format!("`,` or {closing:?}"))?;
            break;
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(source: &str) -> EvalResult<Node> {
        parse(source, &SandboxConfig::default())
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let node = parse_default("1 + 2 * 3").unwrap();
        let Node::Binary { op, right, .. } = node else {
            panic!("expected a binary node");
        };
        assert_eq!(op, BinaryOperator::Add);
        assert!(matches!(*right, Node::Binary { op: BinaryOperator::Mul, .. }));
    }

    #[test]
    fn not_in_is_one_operator() {
        let node = parse_default("a not in b").unwrap();
        assert!(matches!(node, Node::Compare { ref rest, .. } if rest[0].0 == CompareOperator::NotIn));
    }

    #[test]
    fn parenthesized_single_value_is_not_a_tuple() {
        assert_eq!(parse_default("(1)").unwrap(), Node::Literal(Value::Integer(1)));
        assert!(matches!(parse_default("(1,)").unwrap(), Node::Tuple(ref items) if items.len() == 1));
    }

    #[test]
    fn statement_tokens_are_violations() {
        for source in ["lambda: 1", "[x for x in y]", "import os", "x += 1", "(y := 2)", "f(*args)"] {
            assert!(matches!(parse_default(source), Err(EvalError::SecurityViolation { .. })),
                    "{source} should be rejected");
        }
    }

    #[test]
    fn nesting_is_limited() {
        let limits = SandboxConfig { max_depth: 4,
                                     ..SandboxConfig::default() };
        assert!(matches!(parse("((((((1))))))", &limits), Err(EvalError::LimitExceeded { .. })));
        assert!(parse("(1)", &limits).is_ok());
    }

    #[test]
    fn chains_count_toward_nesting() {
        let limits = SandboxConfig { max_depth: 4,
                                     ..SandboxConfig::default() };
        assert!(parse("1 + 1 + 1", &limits).is_ok());
        assert!(matches!(parse(&vec!["1"; 10].join(" + "), &limits), Err(EvalError::LimitExceeded { .. })));
        assert!(matches!(parse("a or b or c or d or e", &limits), Err(EvalError::LimitExceeded { .. })));
        assert!(matches!(parse("x.a.b.c.d", &limits), Err(EvalError::LimitExceeded { .. })));
        assert!(matches!(parse("x[0][0][0][0]", &limits), Err(EvalError::LimitExceeded { .. })));
        assert!(matches!(parse("f()()()()", &limits), Err(EvalError::LimitExceeded { .. })));
    }

    #[test]
    fn long_sources_are_rejected() {
        let limits = SandboxConfig { max_source_len: 8,
                                     ..SandboxConfig::default() };
        assert!(matches!(parse("1 + 2 + 3 + 4", &limits), Err(EvalError::LimitExceeded { .. })));
    }

    #[test]
    fn trailing_tokens_are_syntax_errors() {
        assert!(matches!(parse_default("1 2"), Err(EvalError::Syntax { .. })));
    }
}
