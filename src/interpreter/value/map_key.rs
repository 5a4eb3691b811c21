use std::{fmt::Display, rc::Rc};

use ordered_float::OrderedFloat;

use crate::{error::EvalError, interpreter::value::core::Value};

/// Enum representing values allowed as map keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    /// A boolean such as `True`.
    Bool(bool),
    /// An integer such as `-4` or `42`. Integral reals are stored here too so
    /// that `1` and `1.0` find the same entry.
    Integer(i64),
    /// A non-integral real such as `0.5`.
    Real(OrderedFloat<f64>),
    /// A string such as `"name"`.
    Str(Rc<str>),
    /// A tuple of keys such as `(1, "a")`.
    Tuple(Vec<Self>),
}

impl TryFrom<&Value> for MapKey {
    type Error = EvalError;

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_precision_loss)]
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Integer(i) => Ok(Self::Integer(*i)),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < 9_007_199_254_740_992.0 => Ok(Self::Integer(*r as i64)),
            Value::Real(r) => Ok(Self::Real(OrderedFloat(*r))),
            Value::Str(s) => Ok(Self::Str(Rc::clone(s))),
            Value::Tuple(items) => items.iter().map(Self::try_from).collect::<Result<_, _>>().map(Self::Tuple),
            other => Err(EvalError::TypeError { details: format!("{} cannot be used as a map key",
                                                                 other.type_name()) }),
        }
    }
}

impl From<&MapKey> for Value {
    fn from(key: &MapKey) -> Self {
        match key {
            MapKey::Bool(b) => Self::Bool(*b),
            MapKey::Integer(i) => Self::Integer(*i),
            MapKey::Real(r) => Self::Real(r.into_inner()),
            MapKey::Str(s) => Self::Str(Rc::clone(s)),
            MapKey::Tuple(items) => Self::Tuple(Rc::new(items.iter().map(Self::from).collect())),
        }
    }
}

impl Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::from(self).repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_reals_share_integer_keys() {
        assert_eq!(MapKey::try_from(&Value::Real(2.0)).unwrap(), MapKey::Integer(2));
        assert_eq!(MapKey::try_from(&Value::Real(2.5)).unwrap(), MapKey::Real(OrderedFloat(2.5)));
    }

    #[test]
    fn lists_are_not_keys() {
        assert!(MapKey::try_from(&Value::from(vec![Value::Integer(1)])).is_err());
    }
}
