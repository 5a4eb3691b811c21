use std::{collections::BTreeMap, fmt::Display, rc::Rc};

use crate::{
    ast::LiteralValue,
    error::EvalError,
    interpreter::value::map_key::MapKey,
    util::num::promote,
};

/// An opaque reference to something the host owns, such as a window, a widget
/// or a UI variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    /// What the handle refers to, for example `entry` or `window`.
    pub kind: String,
    /// The name the script gave it.
    pub name: String,
}

impl Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} {}>", self.kind, self.name)
    }
}

/// Represents a runtime value in the interpreter.
///
/// This enum models every value a binding can hold, a sandboxed expression can
/// produce, or a host read form can store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value, `None`.
    None,
    /// A boolean value (`True` or `False`).
    Bool(bool),
    /// A integer value (64 bit integer).
    Integer(i64),
    /// A numeric value (double precision floating-point).
    Real(f64),
    /// An immutable string.
    Str(Rc<str>),
    /// A list such as `[1, 2, 3]`.
    List(Rc<Vec<Self>>),
    /// A tuple such as `(1, "a")`.
    Tuple(Rc<Vec<Self>>),
    /// A map such as `{"a": 1}`, ordered by key.
    Map(Rc<BTreeMap<MapKey, Self>>),
    /// A host-owned object.
    Handle(Handle),
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(Rc::new(v))
    }
}

impl From<Handle> for Value {
    fn from(v: Handle) -> Self {
        Self::Handle(v)
    }
}

impl From<LiteralValue> for Value {
    fn from(v: LiteralValue) -> Self {
        match v {
            LiteralValue::Integer(n) => Self::Integer(n),
            LiteralValue::Real(r) => Self::Real(r),
        }
    }
}

impl Value {
    /// Returns the name of the value's type, as used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "int",
            Self::Real(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Handle(_) => "handle",
        }
    }

    /// Returns the value's truthiness.
    ///
    /// `False`, `None`, zero and empty strings or collections are falsy.
    /// Everything else, handles included, is truthy.
    ///
    /// # Example
    /// ```
    /// use solar::interpreter::value::core::Value;
    ///
    /// assert!(!Value::Integer(0).is_truthy());
    /// assert!(!Value::from("").is_truthy());
    /// assert!(Value::from(vec![Value::None]).is_truthy());
    /// assert!(!Value::None.is_truthy());
    /// ```
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Integer(n) => *n != 0,
            Self::Real(r) => *r != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Handle(_) => true,
        }
    }

    /// Converts the value to an `f64`, or returns an error if not numeric.
    ///
    /// Accepts reals, integers and booleans. For integers, conversion fails if
    /// the value is too large to be represented as `f64` exactly.
    ///
    /// # Example
    /// ```
    /// use solar::interpreter::value::core::Value;
    ///
    /// assert_eq!(Value::Integer(10).as_real().unwrap(), 10.0);
    /// assert!(Value::from("10").as_real().is_err());
    /// ```
    pub fn as_real(&self) -> Result<f64, EvalError> {
        match self {
            Self::Real(r) => Ok(*r),
            Self::Integer(n) => promote(*n),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(self.expected("a number")),
        }
    }

    /// Converts the value to an `i64`. Booleans count as `0` and `1`.
    pub fn as_integer(&self) -> Result<i64, EvalError> {
        match self {
            Self::Integer(n) => Ok(*n),
            Self::Bool(b) => Ok(i64::from(*b)),
            _ => Err(self.expected("an integer")),
        }
    }

    /// Borrows the value as a string slice.
    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Self::Str(s) => Ok(&**s),
            _ => Err(self.expected("a string")),
        }
    }

    /// Borrows the elements of a list or tuple.
    pub fn as_sequence(&self) -> Result<&[Self], EvalError> {
        match self {
            Self::List(items) | Self::Tuple(items) => Ok(items.as_slice()),
            _ => Err(self.expected("a list or tuple")),
        }
    }

    /// Builds the type error for a value that is not what an operation needs.
    #[must_use]
    pub fn expected(&self, what: &str) -> EvalError {
        EvalError::TypeError { details: format!("expected {what}, found {}", self.type_name()) }
    }

    /// Returns the quoted form used when the value appears inside a
    /// collection, like `'a'` in `['a', 1]`.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

/// Formats a real so integral values keep their `.0`.
fn format_real(r: f64) -> String {
    if r.is_nan() {
        "nan".to_string()
    } else if r.is_infinite() {
        if r > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if r.fract() == 0.0 && r.abs() < 1e16 {
        format!("{r:.1}")
    } else {
        format!("{r:?}")
    }
}

/// Writes `items` separated by `, ` between `open` and `close`.
fn write_items(f: &mut std::fmt::Formatter<'_>,
               open: &str,
               items: impl Iterator<Item = String>,
               close: &str)
               -> std::fmt::Result {
    write!(f, "{open}")?;
    for (index, item) in items.enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(r) => write!(f, "{}", format_real(*r)),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => write_items(f, "[", items.iter().map(Self::repr), "]"),
            Self::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Self::Tuple(items) => write_items(f, "(", items.iter().map(Self::repr), ")"),
            Self::Map(map) => {
                write_items(f,
                            "{",
                            map.iter().map(|(k, v)| format!("{}: {}", Self::from(k).repr(), v.repr())),
                            "}")
            },
            Self::Handle(h) => write!(f, "{h}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reals_display_with_a_decimal_point() {
        assert_eq!(Value::Real(3.0).to_string(), "3.0");
        assert_eq!(Value::Real(0.25).to_string(), "0.25");
        assert_eq!(Value::Real(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn collections_quote_their_strings() {
        let list = Value::from(vec![Value::from("a"), Value::Integer(1)]);
        assert_eq!(list.to_string(), "['a', 1]");
        let single = Value::Tuple(Rc::new(vec![Value::Bool(true)]));
        assert_eq!(single.to_string(), "(True,)");
    }

    #[test]
    fn handles_are_truthy() {
        let handle = Value::from(Handle { kind: "entry".into(),
                                          name: "name".into() });
        assert!(handle.is_truthy());
        assert_eq!(handle.to_string(), "<entry name>");
    }
}
