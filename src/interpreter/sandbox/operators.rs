use std::{cmp::Ordering, rc::Rc};

use crate::{
    error::EvalError,
    interpreter::{
        sandbox::{
            eval::EvalResult,
            syntax::{BinaryOperator, CompareOperator, UnaryOperator},
        },
        value::{core::Value, map_key::MapKey},
    },
    util::num::{promote, resolve_index},
};

/// A numeric operand after booleans have been folded into integers.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(Self::Int(*n)),
            Value::Bool(b) => Some(Self::Int(i64::from(*b))),
            Value::Real(r) => Some(Self::Real(*r)),
            _ => None,
        }
    }

    fn to_real(self) -> EvalResult<f64> {
        match self {
            Self::Int(n) => promote(n),
            Self::Real(r) => Ok(r),
        }
    }
}

fn overflow(op: impl ToString) -> EvalError {
    EvalError::Overflow { operation: op.to_string() }
}

fn unsupported(op: BinaryOperator, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeError { details: format!("unsupported operand types for {op}: {} and {}",
                                            left.type_name(),
                                            right.type_name()) }
}

/// Applies a prefix operator.
///
/// # Errors
/// `TypeError` for non-numeric operands of `-`, `+` and `~`, `Overflow` for
/// `-i64::MIN`.
pub fn unary(op: UnaryOperator, operand: &Value) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOperator::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOperator::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (UnaryOperator::Neg, v) => {
            let n = v.as_integer().map_err(|_| v.expected("a number"))?;
            n.checked_neg().map(Value::Integer).ok_or_else(|| overflow("-"))
        },
        (UnaryOperator::Pos, Value::Real(r)) => Ok(Value::Real(*r)),
        (UnaryOperator::Pos, v) => v.as_integer().map(Value::Integer).map_err(|_| v.expected("a number")),
        (UnaryOperator::Invert, v) => v.as_integer().map(|n| Value::Integer(!n)),
    }
}

/// Applies an arithmetic or bitwise operator.
///
/// Strings, lists and tuples support `+` (concatenation) and `*` with an
/// integer (repetition); any result longer than `max_len` is refused before it
/// is built.
///
/// # Errors
/// `TypeError`, `DivisionByZero`, `Overflow` or `LimitExceeded`.
///
/// # Example
/// ```
/// use solar::interpreter::{
///     sandbox::{operators::binary, syntax::BinaryOperator},
///     value::core::Value,
/// };
///
/// let v = binary(BinaryOperator::FloorDiv, &Value::Integer(-7), &Value::Integer(2), 100).unwrap();
/// assert_eq!(v, Value::Integer(-4));
/// let v = binary(BinaryOperator::Mul, &Value::from("ab"), &Value::Integer(2), 100).unwrap();
/// assert_eq!(v, Value::from("abab"));
/// ```
pub fn binary(op: BinaryOperator, left: &Value, right: &Value, max_len: usize) -> EvalResult<Value> {
    match (op, left, right) {
        (BinaryOperator::Add, Value::Str(a), Value::Str(b)) => {
            check_len(a.len() + b.len(), max_len)?;
            Ok(Value::from(format!("{a}{b}")))
        },
        (BinaryOperator::Add, Value::List(a), Value::List(b)) => {
            check_len(a.len() + b.len(), max_len)?;
            Ok(Value::List(Rc::new(a.iter().chain(b.iter()).cloned().collect())))
        },
        (BinaryOperator::Add, Value::Tuple(a), Value::Tuple(b)) => {
            check_len(a.len() + b.len(), max_len)?;
            Ok(Value::Tuple(Rc::new(a.iter().chain(b.iter()).cloned().collect())))
        },
        (BinaryOperator::Mul, Value::Str(_) | Value::List(_) | Value::Tuple(_), count)
            if matches!(count, Value::Integer(_) | Value::Bool(_)) =>
        {
            repeat(left, count.as_integer()?, max_len)
        },
        (BinaryOperator::Mul, count, Value::Str(_) | Value::List(_) | Value::Tuple(_))
            if matches!(count, Value::Integer(_) | Value::Bool(_)) =>
        {
            repeat(right, count.as_integer()?, max_len)
        },
        (BinaryOperator::BitAnd | BinaryOperator::BitOr | BinaryOperator::BitXor,
         Value::Bool(a),
         Value::Bool(b)) => Ok(Value::Bool(match op {
                                   BinaryOperator::BitAnd => a & b,
                                   BinaryOperator::BitOr => a | b,
                                   _ => a ^ b,
                               })),
        (BinaryOperator::BitAnd
         | BinaryOperator::BitOr
         | BinaryOperator::BitXor
         | BinaryOperator::Shl
         | BinaryOperator::Shr,
         ..) => bitwise(op, left, right),
        _ => arithmetic(op, left, right),
    }
}

fn check_len(len: usize, max_len: usize) -> EvalResult<()> {
    if len > max_len {
        return Err(EvalError::LimitExceeded { details: format!("a result of length {len} exceeds the limit of {max_len}") });
    }
    Ok(())
}

/// Repeats a string, list or tuple `count` times.
fn repeat(value: &Value, count: i64, max_len: usize) -> EvalResult<Value> {
    let times = usize::try_from(count.max(0)).map_err(|_| overflow("*"))?;
    let scaled = |unit: usize| -> EvalResult<()> {
        check_len(unit.checked_mul(times).ok_or_else(|| overflow("*"))?, max_len)
    };
    match value {
        Value::Str(s) => {
            scaled(s.len())?;
            Ok(Value::from(s.repeat(times)))
        },
        Value::List(items) => {
            scaled(items.len())?;
            Ok(Value::List(Rc::new(repeat_items(items, times))))
        },
        Value::Tuple(items) => {
            scaled(items.len())?;
            Ok(Value::Tuple(Rc::new(repeat_items(items, times))))
        },
        other => Err(other.expected("a string, list or tuple")),
    }
}

fn repeat_items(items: &[Value], times: usize) -> Vec<Value> {
    items.iter().cloned().cycle().take(items.len() * times).collect()
}

fn bitwise(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    let (Ok(a), Ok(b)) = (left.as_integer(), right.as_integer()) else {
        return Err(unsupported(op, left, right));
    };
    let result = match op {
        BinaryOperator::BitAnd => a & b,
        BinaryOperator::BitOr => a | b,
        BinaryOperator::BitXor => a ^ b,
        BinaryOperator::Shl | BinaryOperator::Shr => {
            if b < 0 {
                return Err(EvalError::TypeError { details: "negative shift count".to_string() });
            }
            let shift = u32::try_from(b).map_err(|_| overflow(op))?;
            if op == BinaryOperator::Shr {
                a.checked_shr(shift).unwrap_or(if a < 0 { -1 } else { 0 })
            } else {
                let shifted = a.checked_shl(shift).ok_or_else(|| overflow(op))?;
                if shifted >> shift != a {
                    return Err(overflow(op));
                }
                shifted
            }
        },
        _ => return Err(unsupported(op, left, right)),
    };
    Ok(Value::Integer(result))
}

/// Applies an arithmetic operator to two numbers.
///
/// Integer operands stay integers except under `/`, which always yields a
/// real, and `**` with a negative exponent. Floor division and modulo round
/// toward negative infinity, so the remainder takes the divisor's sign.
///
/// # Errors
/// `TypeError` for non-numeric operands, `DivisionByZero`, or `Overflow`
/// when an integer result does not fit.
pub fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) else {
        return Err(unsupported(op, left, right));
    };
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => integer_arithmetic(op, x, y),
        _ => real_arithmetic(op, a.to_real()?, b.to_real()?),
    }
}

fn integer_arithmetic(op: BinaryOperator, x: i64, y: i64) -> EvalResult<Value> {
    if y == 0 && matches!(op, BinaryOperator::Div | BinaryOperator::FloorDiv | BinaryOperator::Mod) {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinaryOperator::Add => x.checked_add(y),
        BinaryOperator::Sub => x.checked_sub(y),
        BinaryOperator::Mul => x.checked_mul(y),
        BinaryOperator::Div => return Ok(Value::Real(promote(x)? / promote(y)?)),
        BinaryOperator::FloorDiv => x.checked_div(y).map(|q| if (x % y != 0) && ((x < 0) != (y < 0)) { q - 1 } else { q }),
        BinaryOperator::Mod => x.checked_rem(y).map(|r| if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }),
        BinaryOperator::Pow => {
            if y < 0 {
                return Ok(Value::Real(promote(x)?.powf(promote(y)?)));
            }
            u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp))
        },
        _ => return Err(unsupported(op, &Value::Integer(x), &Value::Integer(y))),
    };
    result.map(Value::Integer).ok_or_else(|| overflow(op))
}

fn real_arithmetic(op: BinaryOperator, x: f64, y: f64) -> EvalResult<Value> {
    if y == 0.0 && matches!(op, BinaryOperator::Div | BinaryOperator::FloorDiv | BinaryOperator::Mod) {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinaryOperator::Add => x + y,
        BinaryOperator::Sub => x - y,
        BinaryOperator::Mul => x * y,
        BinaryOperator::Div => x / y,
        BinaryOperator::FloorDiv => (x / y).floor(),
        BinaryOperator::Mod => {
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }
        },
        BinaryOperator::Pow => x.powf(y),
        _ => return Err(unsupported(op, &Value::Real(x), &Value::Real(y))),
    };
    Ok(Value::Real(result))
}

/// Evaluates one link of a comparison chain.
///
/// # Errors
/// `TypeError` when ordering values that have no order between them, or when
/// testing membership in a value that is not a container.
pub fn compare(op: CompareOperator, left: &Value, right: &Value) -> EvalResult<bool> {
    Ok(match op {
        CompareOperator::Eq => values_equal(left, right),
        CompareOperator::NotEq => !values_equal(left, right),
        CompareOperator::Lt => ordering(left, right)? == Some(Ordering::Less),
        CompareOperator::LtE => matches!(ordering(left, right)?, Some(Ordering::Less | Ordering::Equal)),
        CompareOperator::Gt => ordering(left, right)? == Some(Ordering::Greater),
        CompareOperator::GtE => matches!(ordering(left, right)?, Some(Ordering::Greater | Ordering::Equal)),
        CompareOperator::In => contains(right, left)?,
        CompareOperator::NotIn => !contains(right, left)?,
        CompareOperator::Is => identical(left, right),
        CompareOperator::IsNot => !identical(left, right),
    })
}

/// Tests two values for equality. Numbers compare by value across `int`,
/// `float` and `bool`.
///
/// # Example
/// ```
/// use solar::interpreter::{sandbox::operators::values_equal, value::core::Value};
///
/// assert!(values_equal(&Value::Integer(1), &Value::Real(1.0)));
/// assert!(values_equal(&Value::Bool(true), &Value::Integer(1)));
/// assert!(!values_equal(&Value::from("1"), &Value::Integer(1)));
/// ```
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) {
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => x == y,
            (Number::Real(x), Number::Real(y)) => x == y,
            (Number::Int(n), Number::Real(r)) | (Number::Real(r), Number::Int(n)) => int_equals_real(n, r),
        };
    }
    match (left, right) {
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        },
        _ => left == right,
    }
}

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
fn int_equals_real(n: i64, r: f64) -> bool {
    r.fract() == 0.0 && r >= i64::MIN as f64 && r < i64::MAX as f64 && r as i64 == n
}

/// Orders two values. `None` means the values are unordered, as with NaN.
///
/// # Errors
/// `TypeError` when the types have no order between them.
pub fn ordering(left: &Value, right: &Value) -> EvalResult<Option<Ordering>> {
    if let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) {
        return Ok(match (a, b) {
            (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
            _ => a.to_real()?.partial_cmp(&b.to_real()?),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                if !values_equal(x, y) {
                    return ordering(x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        },
        _ => Err(EvalError::TypeError { details: format!("cannot order {} and {}",
                                                         left.type_name(),
                                                         right.type_name()) }),
    }
}

/// Tests whether `container` holds `item`: substring for strings, element
/// for lists and tuples, key for maps.
fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(haystack) => Ok(haystack.contains(item.as_str()?)),
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|x| values_equal(x, item))),
        Value::Map(map) => Ok(map.contains_key(&MapKey::try_from(item)?)),
        other => Err(EvalError::TypeError { details: format!("{} is not a container", other.type_name()) }),
    }
}

/// Identity test. Values here are immutable, so identity is equality for
/// scalars of the same type and pointer equality for shared collections.
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
        (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
        (Value::Handle(a), Value::Handle(b)) => a == b,
        _ => false,
    }
}

/// Evaluates `object[index]`.
///
/// Sequences and strings take integer indices, negative ones counting from
/// the end; maps take any hashable key.
///
/// # Errors
/// `IndexOutOfBounds`, `KeyNotFound`, or `TypeError` for values that cannot
/// be subscripted.
pub fn subscript(object: &Value, index: &Value) -> EvalResult<Value> {
    match object {
        Value::List(items) | Value::Tuple(items) => {
            let i = resolve_index(index.as_integer()?, items.len())?;
            Ok(items[i].clone())
        },
        Value::Str(s) => {
            let len = s.chars().count();
            let i = resolve_index(index.as_integer()?, len)?;
            Ok(s.chars().nth(i).map_or(Value::None, |c| Value::from(c.to_string())))
        },
        Value::Map(map) => {
            let key = MapKey::try_from(index)?;
            map.get(&key).cloned().ok_or_else(|| EvalError::KeyNotFound { key: index.repr() })
        },
        other => Err(EvalError::TypeError { details: format!("{} is not subscriptable", other.type_name()) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    #[test]
    fn modulo_takes_the_sign_of_the_divisor() {
        assert_eq!(arithmetic(BinaryOperator::Mod, &int(-7), &int(3)).unwrap(), int(2));
        assert_eq!(arithmetic(BinaryOperator::Mod, &int(7), &int(-3)).unwrap(), int(-2));
        assert_eq!(arithmetic(BinaryOperator::Mod, &Value::Real(-7.0), &int(3)).unwrap(), Value::Real(2.0));
    }

    #[test]
    fn true_division_always_gives_a_real() {
        assert_eq!(arithmetic(BinaryOperator::Div, &int(6), &int(3)).unwrap(), Value::Real(2.0));
        assert_eq!(arithmetic(BinaryOperator::Div, &int(1), &int(0)), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        assert!(matches!(arithmetic(BinaryOperator::Mul, &int(i64::MAX), &int(2)), Err(EvalError::Overflow { .. })));
        assert!(matches!(arithmetic(BinaryOperator::Pow, &int(10), &int(100)), Err(EvalError::Overflow { .. })));
        assert!(matches!(unary(UnaryOperator::Neg, &int(i64::MIN)), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn negative_exponents_give_reals() {
        assert_eq!(arithmetic(BinaryOperator::Pow, &int(2), &int(-1)).unwrap(), Value::Real(0.5));
    }

    #[test]
    fn repetition_respects_the_length_limit() {
        let err = binary(BinaryOperator::Mul, &Value::from("ab"), &int(1000), 100).unwrap_err();
        assert!(matches!(err, EvalError::LimitExceeded { .. }));
        assert_eq!(binary(BinaryOperator::Mul, &int(-1), &Value::from("ab"), 100).unwrap(), Value::from(""));
    }

    #[test]
    fn sequences_repeat_their_items() {
        let list = Value::from(vec![int(1), int(2)]);
        assert_eq!(binary(BinaryOperator::Mul, &list, &int(2), 100).unwrap(),
                   Value::from(vec![int(1), int(2), int(1), int(2)]));
        let tuple = Value::Tuple(Rc::new(vec![int(7)]));
        assert_eq!(binary(BinaryOperator::Mul, &int(3), &tuple, 100).unwrap(),
                   Value::Tuple(Rc::new(vec![int(7), int(7), int(7)])));
    }

    #[test]
    fn mixed_types_do_not_add() {
        assert!(matches!(binary(BinaryOperator::Add, &Value::from("a"), &int(1), 100),
                         Err(EvalError::TypeError { .. })));
    }

    #[test]
    fn comparisons_are_lexicographic_for_sequences() {
        let a = Value::from(vec![int(1), int(2)]);
        let b = Value::from(vec![int(1), int(3)]);
        assert!(compare(CompareOperator::Lt, &a, &b).unwrap());
        assert!(compare(CompareOperator::Lt, &Value::from("abc"), &Value::from("abd")).unwrap());
        assert!(compare(CompareOperator::Lt, &Value::from("a"), &int(1)).is_err());
    }

    #[test]
    fn nan_is_unordered() {
        let nan = Value::Real(f64::NAN);
        assert!(!compare(CompareOperator::Lt, &nan, &int(1)).unwrap());
        assert!(!compare(CompareOperator::GtE, &nan, &int(1)).unwrap());
    }

    #[test]
    fn membership() {
        assert!(compare(CompareOperator::In, &Value::from("ell"), &Value::from("hello")).unwrap());
        assert!(compare(CompareOperator::NotIn, &int(4), &Value::from(vec![int(1), int(2)])).unwrap());
        assert!(compare(CompareOperator::In, &int(1), &int(2)).is_err());
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let list = Value::from(vec![int(1), int(2), int(3)]);
        assert_eq!(subscript(&list, &int(-1)).unwrap(), int(3));
        assert_eq!(subscript(&Value::from("héllo"), &int(1)).unwrap(), Value::from("é"));
        assert!(matches!(subscript(&list, &int(3)), Err(EvalError::IndexOutOfBounds { index: 3, len: 3 })));
    }
}
