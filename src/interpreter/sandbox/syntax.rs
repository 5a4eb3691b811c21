use crate::interpreter::value::core::Value;

/// A node of a parsed sandbox expression.
///
/// The set of variants is the complete grammar of the sandbox: a construct
/// that has no variant here cannot be expressed, so it cannot be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal value.
    Literal(Value),
    /// A variable or safe-function name.
    Name(String),
    /// `[a, b]`
    List(Vec<Self>),
    /// `(a, b)`, `(a,)` or `()`
    Tuple(Vec<Self>),
    /// `{k: v}`
    Map(Vec<(Self, Self)>),
    /// `-a`, `+a`, `~a`, `not a`
    Unary {
        /// The operator.
        op:      UnaryOperator,
        /// The operand.
        operand: Box<Self>,
    },
    /// Arithmetic and bitwise operators.
    Binary {
        /// The left operand.
        left:  Box<Self>,
        /// The operator.
        op:    BinaryOperator,
        /// The right operand.
        right: Box<Self>,
    },
    /// A comparison chain such as `a < b <= c`.
    Compare {
        /// The leftmost operand.
        first: Box<Self>,
        /// Each following operator with its right operand.
        rest:  Vec<(CompareOperator, Self)>,
    },
    /// `a and b`, `a or b`; short-circuiting.
    Logical {
        /// The left operand.
        left:  Box<Self>,
        /// The operator.
        op:    LogicalOperator,
        /// The right operand, evaluated only when needed.
        right: Box<Self>,
    },
    /// `then if condition else otherwise`
    Ternary {
        /// The condition.
        condition: Box<Self>,
        /// The value when the condition is truthy.
        then:      Box<Self>,
        /// The value when the condition is falsy.
        otherwise: Box<Self>,
    },
    /// `object.name`
    Attribute {
        /// The object.
        object: Box<Self>,
        /// The attribute name.
        name:   String,
    },
    /// `object[index]`
    Subscript {
        /// The indexed value.
        object: Box<Self>,
        /// The index or key.
        index:  Box<Self>,
    },
    /// `callee(args...)`
    Call {
        /// The called expression, a name or an attribute.
        callee: Box<Self>,
        /// Positional arguments.
        args:   Vec<Self>,
    },
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-`
    Neg,
    /// `+`
    Pos,
    /// `~`
    Invert,
    /// `not`
    Not,
}

/// Arithmetic and bitwise infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtE,
    /// `>`
    Gt,
    /// `>=`
    GtE,
    /// `in`
    In,
    /// `not in`
    NotIn,
    /// `is`
    Is,
    /// `is not`
    IsNot,
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// `and`
    And,
    /// `or`
    Or,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        };
        write!(f, "{symbol}")
    }
}
