use crate::error::EvalError;

/// Integers beyond `2^53 - 1` in absolute value have no exact `f64`.
const MAX_EXACT_INT: u64 = (1 << 53) - 1;

/// Converts an `i64` to `f64` for mixed arithmetic.
///
/// ## Errors
/// A type error when the integer has no exact `f64` representation.
///
/// ## Example
/// ```
/// use solar::util::num::promote;
///
/// assert_eq!(promote(42).unwrap(), 42.0);
/// assert!(promote(i64::MAX).is_err());
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn promote(value: i64) -> Result<f64, EvalError> {
    if value.unsigned_abs() > MAX_EXACT_INT {
        return Err(EvalError::TypeError { details: format!("integer {value} is too large to mix with a real") });
    }
    Ok(value as f64)
}

/// Safely converts an `f64` to `i64`, truncating toward zero.
///
/// ## Errors
/// Fails for NaN, infinities and values outside the `i64` range.
///
/// ## Example
/// ```
/// use solar::util::num::f64_to_i64_truncated;
///
/// assert_eq!(f64_to_i64_truncated(3.9).unwrap(), 3);
/// assert_eq!(f64_to_i64_truncated(-3.9).unwrap(), -3);
/// assert!(f64_to_i64_truncated(f64::NAN).is_err());
/// assert!(f64_to_i64_truncated(1e20).is_err());
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
pub fn f64_to_i64_truncated(value: f64) -> Result<i64, EvalError> {
    if !value.is_finite() {
        return Err(EvalError::TypeError { details: format!("cannot convert {value} to an integer") });
    }
    let truncated = value.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(EvalError::TypeError { details: format!("{value} is too large for an integer") });
    }
    Ok(truncated as i64)
}

/// Converts a collection length to an `i64` value.
///
/// ## Errors
/// Fails only on platforms where `usize` is wider than `i64`.
pub fn usize_to_i64_checked(value: usize) -> Result<i64, EvalError> {
    i64::try_from(value).map_err(|_| EvalError::LimitExceeded { details: format!("length {value} does not fit an integer") })
}

/// Resolves a possibly negative index against a sequence length.
///
/// Negative indices count from the end, as in `items[-1]`.
///
/// ## Errors
/// Returns `IndexOutOfBounds` when the index falls outside `0..len`.
///
/// ## Example
/// ```
/// use solar::util::num::resolve_index;
///
/// assert_eq!(resolve_index(-1, 3).unwrap(), 2);
/// assert_eq!(resolve_index(0, 3).unwrap(), 0);
/// assert!(resolve_index(3, 3).is_err());
/// assert!(resolve_index(-4, 3).is_err());
/// ```
pub fn resolve_index(index: i64, len: usize) -> Result<usize, EvalError> {
    let out_of_bounds = EvalError::IndexOutOfBounds { index, len };
    let len_i = usize_to_i64_checked(len)?;
    let resolved = if index < 0 { len_i + index } else { index };
    if resolved < 0 || resolved >= len_i {
        return Err(out_of_bounds);
    }
    usize::try_from(resolved).map_err(|_| out_of_bounds)
}
