use std::{cmp::Ordering, rc::Rc};

use rand::Rng;

use crate::{
    error::EvalError,
    interpreter::{
        sandbox::{
            eval::EvalResult,
            operators::{arithmetic, ordering, values_equal},
            syntax::BinaryOperator,
        },
        value::{core::Value, map_key::MapKey},
    },
    util::num::{f64_to_i64_truncated, usize_to_i64_checked},
};

/// Type alias for safe function handlers.
///
/// A safe function receives a slice of evaluated argument values and returns
/// a value. Safe functions never touch variables or the host.
type SafeFn = fn(&[Value]) -> EvalResult<Value>;

/// Specifies the allowed number of arguments for a safe function.
///
/// - `Exact(n)` means the function must receive exactly `n` arguments.
/// - `OneOf(slice)` means the function accepts any arity listed in `slice`.
/// - `AtLeast(n)` means `n` or more arguments.
#[derive(Clone, Copy)]
enum Arity {
    Exact(usize),
    OneOf(&'static [usize]),
    AtLeast(usize),
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    fn check(&self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == *m,
            Self::OneOf(arr) => arr.contains(&n),
            Self::AtLeast(m) => n >= *m,
        }
    }
}

/// Defines the safe functions by generating a lookup table and a name list.
///
/// Each entry provides:
/// - a string name,
/// - an arity specification,
/// - a function pointer implementing the function.
///
/// The macro produces:
/// - `SafeDef` (internal metadata),
/// - `SAFE_TABLE` (static table for lookup),
/// - `SAFE_FUNCTIONS` (public list of safe function names).
macro_rules! safe_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        struct SafeDef {
            name:  &'static str,
            arity: Arity,
            func:  SafeFn,
        }
        static SAFE_TABLE: &[SafeDef] = &[
            $(
                SafeDef { name: $name, arity: $arity, func: $func },
            )*
        ];
        /// Names callable from every expression.
        pub const SAFE_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

safe_functions! {
    "abs"     => { arity: Arity::Exact(1), func: abs },
    "min"     => { arity: Arity::AtLeast(1), func: |args| extreme("min", args, Ordering::Less) },
    "max"     => { arity: Arity::AtLeast(1), func: |args| extreme("max", args, Ordering::Greater) },
    "round"   => { arity: Arity::OneOf(&[1, 2]), func: round },
    "int"     => { arity: Arity::Exact(1), func: int },
    "float"   => { arity: Arity::Exact(1), func: float },
    "str"     => { arity: Arity::Exact(1), func: |args| Ok(Value::from(args[0].to_string())) },
    "len"     => { arity: Arity::Exact(1), func: len },
    "bool"    => { arity: Arity::Exact(1), func: |args| Ok(Value::Bool(args[0].is_truthy())) },
    "sqrt"    => { arity: Arity::Exact(1), func: sqrt },
    "floor"   => { arity: Arity::Exact(1), func: |args| to_integral(&args[0], f64::floor) },
    "ceil"    => { arity: Arity::Exact(1), func: |args| to_integral(&args[0], f64::ceil) },
    "pow"     => { arity: Arity::Exact(2), func: |args| arithmetic(BinaryOperator::Pow, &args[0], &args[1]) },
    "sum"     => { arity: Arity::OneOf(&[1, 2]), func: sum },
    "random"  => { arity: Arity::Exact(0), func: |_| Ok(Value::Real(rand::thread_rng().r#gen::<f64>())) },
    "randint" => { arity: Arity::Exact(2), func: randint },
    "upper"   => { arity: Arity::Exact(1), func: |args| Ok(Value::from(args[0].as_str()?.to_uppercase())) },
    "lower"   => { arity: Arity::Exact(1), func: |args| Ok(Value::from(args[0].as_str()?.to_lowercase())) },
}

/// Returns whether `name` is a safe function.
#[must_use]
pub fn is_safe_function(name: &str) -> bool {
    SAFE_TABLE.iter().any(|f| f.name == name)
}

/// Calls a safe function by name.
///
/// # Errors
/// - `UnknownName` if no safe function has that name.
/// - `ArgumentCountMismatch` if the arity does not match.
/// - Any error the function itself raises.
///
/// # Example
/// ```
/// use solar::interpreter::{sandbox::builtin::call_function, value::core::Value};
///
/// let v = call_function("max", &[Value::Integer(3), Value::Integer(9)]).unwrap();
/// assert_eq!(v, Value::Integer(9));
/// assert!(call_function("max", &[]).is_err());
/// ```
pub fn call_function(name: &str, args: &[Value]) -> EvalResult<Value> {
    let Some(def) = SAFE_TABLE.iter().find(|f| f.name == name) else {
        return Err(EvalError::UnknownName { name: name.to_string() });
    };
    if !def.arity.check(args.len()) {
        return Err(EvalError::ArgumentCountMismatch { name:  name.to_string(),
                                                      found: args.len(), });
    }
    (def.func)(args)
}

fn abs(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Real(r) => Ok(Value::Real(r.abs())),
        other => {
            let n = other.as_integer().map_err(|_| other.expected("a number"))?;
            n.checked_abs()
             .map(Value::Integer)
             .ok_or_else(|| EvalError::Overflow { operation: "abs".to_string() })
        },
    }
}

/// Returns the smallest or largest of the arguments, or of the single
/// sequence argument.
fn extreme(name: &str, args: &[Value], wanted: Ordering) -> EvalResult<Value> {
    let items = match args {
        [single @ (Value::List(_) | Value::Tuple(_))] => single.as_sequence()?,
        _ => args,
    };
    let Some((first, rest)) = items.split_first() else {
        return Err(EvalError::TypeError { details: format!("{name}() of an empty sequence") });
    };
    let mut best = first;
    for item in rest {
        if ordering(item, best)? == Some(wanted) {
            best = item;
        }
    }
    Ok(best.clone())
}

/// Rounds half to even, like banker's rounding.
///
/// Without `ndigits` the result is an integer; with it, a real (or the
/// integer itself when the argument already is one).
fn round(args: &[Value]) -> EvalResult<Value> {
    let value = &args[0];
    let Some(ndigits) = args.get(1) else {
        return match value {
            Value::Real(r) => f64_to_i64_truncated(r.round_ties_even()).map(Value::Integer),
            other => other.as_integer().map(Value::Integer).map_err(|_| other.expected("a number")),
        };
    };
    let digits = i32::try_from(ndigits.as_integer()?).map_err(|_| EvalError::Overflow { operation: "round".to_string() })?;
    match value {
        Value::Real(r) => {
            let factor = 10f64.powi(digits);
            Ok(Value::Real((r * factor).round_ties_even() / factor))
        },
        other => other.as_integer().map(Value::Integer).map_err(|_| other.expected("a number")),
    }
}

fn int(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Bool(b) => Ok(Value::Integer(i64::from(*b))),
        Value::Real(r) => f64_to_i64_truncated(*r).map(Value::Integer),
        Value::Str(s) => s.trim()
                          .parse()
                          .map(Value::Integer)
                          .map_err(|_| EvalError::TypeError { details: format!("invalid literal for int(): '{s}'") }),
        other => Err(other.expected("a number or string")),
    }
}

fn float(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Str(s) => s.trim()
                          .parse()
                          .map(Value::Real)
                          .map_err(|_| EvalError::TypeError { details: format!("could not convert '{s}' to float") }),
        other => other.as_real().map(Value::Real),
    }
}

fn len(args: &[Value]) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Map(map) => map.len(),
        other => return Err(other.expected("a string or collection")),
    };
    usize_to_i64_checked(n).map(Value::Integer)
}

fn sqrt(args: &[Value]) -> EvalResult<Value> {
    let x = args[0].as_real()?;
    if x < 0.0 {
        return Err(EvalError::TypeError { details: "math domain error in sqrt()".to_string() });
    }
    Ok(Value::Real(x.sqrt()))
}

/// Applies `round` (`floor` or `ceil`) and converts the result to an integer.
fn to_integral(value: &Value, round: fn(f64) -> f64) -> EvalResult<Value> {
    match value {
        Value::Real(r) => f64_to_i64_truncated(round(*r)).map(Value::Integer),
        other => other.as_integer().map(Value::Integer).map_err(|_| other.expected("a number")),
    }
}

fn sum(args: &[Value]) -> EvalResult<Value> {
    let start = args.get(1).cloned().unwrap_or(Value::Integer(0));
    args[0].as_sequence()?
           .iter()
           .try_fold(start, |acc, item| arithmetic(BinaryOperator::Add, &acc, item))
}

fn randint(args: &[Value]) -> EvalResult<Value> {
    let (low, high) = (args[0].as_integer()?, args[1].as_integer()?);
    if low > high {
        return Err(EvalError::TypeError { details: format!("empty range for randint({low}, {high})") });
    }
    Ok(Value::Integer(rand::thread_rng().gen_range(low..=high)))
}

/// Checks a method's argument count.
fn expect_args(name: &str, args: &[Value], accepted: Arity) -> EvalResult<()> {
    if accepted.check(args.len()) {
        return Ok(());
    }
    Err(EvalError::ArgumentCountMismatch { name:  name.to_string(),
                                           found: args.len(), })
}

/// Calls a method on a value, as in `name.upper()` or `scores.get("a", 0)`.
///
/// Strings, lists, tuples and maps each expose a fixed set of methods; any
/// other method name is a type error.
///
/// # Errors
/// `TypeError` for unknown methods, `ArgumentCountMismatch` for a wrong
/// number of arguments, `LimitExceeded` when a string result would be longer
/// than `max_len`, and errors from argument conversions.
///
/// # Example
/// ```
/// use solar::interpreter::{sandbox::builtin::call_method, value::core::Value};
///
/// let v = call_method(&Value::from(" hi "), "strip", &[], 100).unwrap();
/// assert_eq!(v, Value::from("hi"));
/// assert!(call_method(&Value::Integer(1), "strip", &[], 100).is_err());
/// ```
pub fn call_method(object: &Value, name: &str, args: &[Value], max_len: usize) -> EvalResult<Value> {
    match object {
        Value::Str(s) => string_method(s, name, args, max_len),
        Value::List(items) | Value::Tuple(items) => sequence_method(items, name, args),
        Value::Map(map) => {
            let map = &**map;
            match name {
                "get" => {
                    expect_args(name, args, Arity::OneOf(&[1, 2]))?;
                    let key = MapKey::try_from(&args[0])?;
                    Ok(map.get(&key).cloned().unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
                },
                "keys" => {
                    expect_args(name, args, Arity::Exact(0))?;
                    Ok(Value::from(map.keys().map(Value::from).collect::<Vec<_>>()))
                },
                "values" => {
                    expect_args(name, args, Arity::Exact(0))?;
                    Ok(Value::from(map.values().cloned().collect::<Vec<_>>()))
                },
                "items" => {
                    expect_args(name, args, Arity::Exact(0))?;
                    Ok(Value::from(map.iter()
                                      .map(|(k, v)| Value::Tuple(Rc::new(vec![Value::from(k), v.clone()])))
                                      .collect::<Vec<_>>()))
                },
                _ => Err(no_method(object, name)),
            }
        },
        _ => Err(no_method(object, name)),
    }
}

fn no_method(object: &Value, name: &str) -> EvalError {
    EvalError::TypeError { details: format!("{} has no method `{name}`", object.type_name()) }
}

fn string_method(s: &str, name: &str, args: &[Value], max_len: usize) -> EvalResult<Value> {
    let text = |args: &[Value], i: usize| -> EvalResult<String> { Ok(args[i].as_str()?.to_string()) };
    match name {
        "upper" | "lower" | "strip" | "lstrip" | "rstrip" | "title" | "isdigit" | "isalpha" => {
            expect_args(name, args, Arity::Exact(0))?;
            Ok(match name {
                "upper" => Value::from(s.to_uppercase()),
                "lower" => Value::from(s.to_lowercase()),
                "strip" => Value::from(s.trim()),
                "lstrip" => Value::from(s.trim_start()),
                "rstrip" => Value::from(s.trim_end()),
                "title" => Value::from(title_case(s)),
                "isdigit" => Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())),
                _ => Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic)),
            })
        },
        "startswith" => {
            expect_args(name, args, Arity::Exact(1))?;
            Ok(Value::Bool(s.starts_with(&text(args, 0)?)))
        },
        "endswith" => {
            expect_args(name, args, Arity::Exact(1))?;
            Ok(Value::Bool(s.ends_with(&text(args, 0)?)))
        },
        "find" => {
            expect_args(name, args, Arity::Exact(1))?;
            let needle = text(args, 0)?;
            match s.find(&needle) {
                Some(byte) => usize_to_i64_checked(s[..byte].chars().count()).map(Value::Integer),
                None => Ok(Value::Integer(-1)),
            }
        },
        "count" => {
            expect_args(name, args, Arity::Exact(1))?;
            let needle = text(args, 0)?;
            let n = if needle.is_empty() { s.chars().count() + 1 } else { s.matches(&needle).count() };
            usize_to_i64_checked(n).map(Value::Integer)
        },
        "replace" => {
            expect_args(name, args, Arity::Exact(2))?;
            let (from, to) = (text(args, 0)?, text(args, 1)?);
            let hits = if from.is_empty() { s.chars().count() + 1 } else { s.matches(&from).count() };
            let grown = hits.saturating_mul(to.len()).saturating_add(s.len());
            if grown > max_len {
                return Err(EvalError::LimitExceeded { details: format!("replace() would produce {grown} bytes, the limit is {max_len}") });
            }
            Ok(Value::from(s.replace(&from, &to)))
        },
        "split" => {
            expect_args(name, args, Arity::OneOf(&[0, 1]))?;
            let parts: Vec<Value> = match args.first() {
                None => s.split_whitespace().map(Value::from).collect(),
                Some(sep) => {
                    let sep = sep.as_str()?;
                    if sep.is_empty() {
                        return Err(EvalError::TypeError { details: "empty separator".to_string() });
                    }
                    s.split(sep).map(Value::from).collect()
                },
            };
            Ok(Value::from(parts))
        },
        "join" => {
            expect_args(name, args, Arity::Exact(1))?;
            let parts = args[0].as_sequence()?
                               .iter()
                               .map(|v| v.as_str().map(str::to_string))
                               .collect::<EvalResult<Vec<_>>>()?;
            let joined = parts.join(s);
            if joined.len() > max_len {
                return Err(EvalError::LimitExceeded { details: format!("join() produced {} bytes, the limit is {max_len}",
                                                                       joined.len()) });
            }
            Ok(Value::from(joined))
        },
        _ => Err(no_method(&Value::from(s), name)),
    }
}

fn sequence_method(items: &[Value], name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "count" => {
            expect_args(name, args, Arity::Exact(1))?;
            let n = items.iter().filter(|v| values_equal(v, &args[0])).count();
            usize_to_i64_checked(n).map(Value::Integer)
        },
        "index" => {
            expect_args(name, args, Arity::Exact(1))?;
            match items.iter().position(|v| values_equal(v, &args[0])) {
                Some(i) => usize_to_i64_checked(i).map(Value::Integer),
                None => Err(EvalError::TypeError { details: format!("{} is not in the sequence", args[0].repr()) }),
            }
        },
        _ => Err(EvalError::TypeError { details: format!("sequence has no method `{name}`") }),
    }
}

/// Upper-cases the first letter of each word and lower-cases the rest.
///
/// # Example
/// ```
/// use solar::interpreter::sandbox::builtin::title_case;
///
/// assert_eq!(title_case("hello wide WORLD"), "Hello Wide World");
/// ```
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Reads a non-call attribute. Only handles expose plain attributes: `kind`
/// and `name`.
///
/// # Errors
/// `TypeError` for any other attribute.
pub fn attribute(object: &Value, name: &str) -> EvalResult<Value> {
    match (object, name) {
        (Value::Handle(handle), "kind") => Ok(Value::from(handle.kind.as_str())),
        (Value::Handle(handle), "name") => Ok(Value::from(handle.name.as_str())),
        _ => Err(EvalError::TypeError { details: format!("{} has no attribute `{name}`", object.type_name()) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_uses_ties_to_even() {
        assert_eq!(call_function("round", &[Value::Real(2.5)]).unwrap(), Value::Integer(2));
        assert_eq!(call_function("round", &[Value::Real(3.5)]).unwrap(), Value::Integer(4));
        assert_eq!(call_function("round", &[Value::Real(1.25), Value::Integer(1)]).unwrap(), Value::Real(1.2));
    }

    #[test]
    fn min_and_max_accept_a_sequence() {
        let list = Value::from(vec![Value::Integer(4), Value::Real(1.5), Value::Integer(9)]);
        assert_eq!(call_function("min", std::slice::from_ref(&list)).unwrap(), Value::Real(1.5));
        assert_eq!(call_function("max", &[list]).unwrap(), Value::Integer(9));
        assert!(call_function("min", &[Value::from(Vec::new())]).is_err());
    }

    #[test]
    fn arity_is_checked() {
        assert!(matches!(call_function("len", &[]), Err(EvalError::ArgumentCountMismatch { found: 0, .. })));
        assert!(matches!(call_function("open", &[]), Err(EvalError::UnknownName { .. })));
    }

    #[test]
    fn int_parses_strings() {
        assert_eq!(call_function("int", &[Value::from(" 42 ")]).unwrap(), Value::Integer(42));
        assert!(call_function("int", &[Value::from("4.2")]).is_err());
        assert_eq!(call_function("int", &[Value::Real(-3.7)]).unwrap(), Value::Integer(-3));
    }

    #[test]
    fn randint_stays_in_range() {
        for _ in 0..50 {
            let Value::Integer(n) = call_function("randint", &[Value::Integer(1), Value::Integer(6)]).unwrap() else {
                panic!("randint must return an integer");
            };
            assert!((1..=6).contains(&n));
        }
    }

    #[test]
    fn string_methods() {
        let s = Value::from("hello world");
        assert_eq!(call_method(&s, "title", &[], 100).unwrap(), Value::from("Hello World"));
        assert_eq!(call_method(&s, "find", &[Value::from("world")], 100).unwrap(), Value::Integer(6));
        assert_eq!(call_method(&s, "split", &[], 100).unwrap(),
                   Value::from(vec![Value::from("hello"), Value::from("world")]));
        let joined = call_method(&Value::from("-"), "join", &[Value::from(vec![Value::from("a"), Value::from("b")])], 100);
        assert_eq!(joined.unwrap(), Value::from("a-b"));
    }

    #[test]
    fn replace_cannot_outgrow_the_limit() {
        let err = call_method(&Value::from("aaaa"), "replace", &[Value::from("a"), Value::from("bbbbbbbbbb")], 20);
        assert!(matches!(err, Err(EvalError::LimitExceeded { .. })));
    }

    #[test]
    fn map_get_falls_back_to_the_default() {
        let map = Value::Map(Rc::new([(MapKey::Str(Rc::from("a")), Value::Integer(1))].into_iter().collect()));
        assert_eq!(call_method(&map, "get", &[Value::from("a")], 100).unwrap(), Value::Integer(1));
        assert_eq!(call_method(&map, "get", &[Value::from("b"), Value::Integer(0)], 100).unwrap(), Value::Integer(0));
    }
}
