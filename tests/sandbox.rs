use std::collections::HashMap;

use solar::{
    config::SandboxConfig,
    error::EvalError,
    interpreter::{
        sandbox::{builtin::SAFE_FUNCTIONS, evaluate},
        value::core::Value,
    },
};

fn scope() -> HashMap<String, Value> {
    HashMap::from([("x".to_string(), Value::Integer(4)),
                   ("name".to_string(), Value::from("solar")),
                   ("xs".to_string(), Value::from(vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)])),
                   ("open".to_string(), Value::Integer(1)),
                   ("exec".to_string(), Value::Integer(1)),
                   ("__class__".to_string(), Value::Integer(1))])
}

fn eval(src: &str) -> Result<Value, EvalError> {
    evaluate(src, &scope(), &SandboxConfig::default())
}

fn assert_value(src: &str, expected: Value) {
    match eval(src) {
        Ok(v) => assert_eq!(v, expected, "{src}"),
        Err(e) => panic!("{src} failed: {e}"),
    }
}

fn assert_violation(src: &str) {
    match eval(src) {
        Err(EvalError::SecurityViolation { .. }) => {},
        other => panic!("{src} was not rejected: {other:?}"),
    }
}

#[test]
fn arithmetic_follows_precedence() {
    assert_value("1 + 2 * 3", Value::Integer(7));
    assert_value("(1 + 2) * 3", Value::Integer(9));
    assert_value("2 ** 3 ** 2", Value::Integer(512));
    assert_value("-2 ** 2", Value::Integer(-4));
    assert_value("7 // -2", Value::Integer(-4));
    assert_value("-7 % 3", Value::Integer(2));
    assert_value("1 / 4", Value::Real(0.25));
    assert_value("x * 2.5", Value::Real(10.0));
}

#[test]
fn comparisons_and_logic() {
    assert_value("1 < x <= 4", Value::Bool(true));
    assert_value("1 < x < 3", Value::Bool(false));
    assert_value("0 or \"fallback\"", Value::from("fallback"));
    assert_value("x and name", Value::from("solar"));
    assert_value("not xs", Value::Bool(false));
    assert_value("2 in xs and 5 not in xs", Value::Bool(true));
    assert_value("\"big\" if x > 3 else \"small\"", Value::from("big"));
    assert_value("1 == 1.0", Value::Bool(true));
}

#[test]
fn bitwise_operators() {
    assert_value("6 & 3 | 8", Value::Integer(10));
    assert_value("5 ^ 1", Value::Integer(4));
    assert_value("~0", Value::Integer(-1));
    assert_value("1 << 4 >> 2", Value::Integer(4));
}

#[test]
fn collections_and_subscripts() {
    assert_value("xs[-1]", Value::Integer(2));
    assert_value("name[0]", Value::from("s"));
    assert_value("(1, 2)[1]", Value::Integer(2));
    assert_value("{\"a\": 1, \"b\": x}[\"b\"]", Value::Integer(4));
    assert_value("len([])", Value::Integer(0));
    assert_value("len(())", Value::Integer(0));
    assert_value("[1] + [2]", Value::from(vec![Value::Integer(1), Value::Integer(2)]));
    assert!(matches!(eval("xs[3]"), Err(EvalError::IndexOutOfBounds { .. })));
    assert!(matches!(eval("{\"a\": 1}[\"z\"]"), Err(EvalError::KeyNotFound { .. })));
}

#[test]
fn safe_functions_and_methods() {
    assert_value("max(xs)", Value::Integer(3));
    assert_value("min(5, x)", Value::Integer(4));
    assert_value("sum(xs) + abs(-1)", Value::Integer(7));
    assert_value("round(2.5)", Value::Integer(2));
    assert_value("sqrt(16)", Value::Real(4.0));
    assert_value("str(x) + \"!\"", Value::from("4!"));
    assert_value("int(\"12\") + float(1)", Value::Real(13.0));
    assert_value("name.upper()", Value::from("SOLAR"));
    assert_value("upper(name)", Value::from("SOLAR"));
    assert_value("\"a,b\".split(\",\")", Value::from(vec![Value::from("a"), Value::from("b")]));
    assert_value("{\"k\": 2}.get(\"k\")", Value::Integer(2));
    assert_value("randint(3, 3)", Value::Integer(3));
    assert!(SAFE_FUNCTIONS.contains(&"random"));
}

#[test]
fn dangerous_names_are_rejected_even_when_bound() {
    assert_violation("__class__");
    assert_violation("open('f')");
    assert_violation("exec('1')");
    assert_violation("open");
    assert_violation("eval(\"1\")");
    assert_violation("getattr(x, \"real\")");
    assert_violation("name.__class__");
    assert_violation("xs[0] if x else __import__(\"os\")");
}

#[test]
fn statements_are_rejected_structurally() {
    assert_violation("x = 1");
    assert_violation("(y := 2)");
    assert_violation("x += 1");
    assert_violation("lambda: 1");
    assert_violation("[i for i in xs]");
    assert_violation("import os");
    assert_violation("print(*xs)");
    assert_violation("f(**x)");
}

#[test]
fn rejected_expressions_never_run() {
    // The division would fail first if anything were evaluated.
    assert_violation("(1 / 0) + open(\"f\")");
}

#[test]
fn unknown_and_uncallable_names() {
    assert!(matches!(eval("missing + 1"), Err(EvalError::UnknownName { .. })));
    assert!(matches!(eval("x(1)"), Err(EvalError::TypeError { .. })));
    assert!(matches!(eval("len"), Err(EvalError::TypeError { .. })));
    assert!(matches!(eval("nosuch(1)"), Err(EvalError::UnknownName { .. })));
    assert!(matches!(eval("len(1, 2)"), Err(EvalError::ArgumentCountMismatch { .. })));
}

#[test]
fn syntax_errors() {
    assert!(matches!(eval("1 +"), Err(EvalError::Syntax { .. })));
    assert!(matches!(eval("(1, 2"), Err(EvalError::Syntax { .. })));
    assert!(matches!(eval("1 2"), Err(EvalError::Syntax { .. })));
}

#[test]
fn limits_are_enforced() {
    let limits = SandboxConfig { max_source_len:     16,
                                 max_depth:          4,
                                 max_collection_len: 10, };
    let scope = scope();
    let limited = |src: &str| evaluate(src, &scope, &limits);

    assert!(matches!(limited("1 + 1 + 1 + 1 + 1 + 1"), Err(EvalError::LimitExceeded { .. })));
    assert!(matches!(limited("((((((1))))))"), Err(EvalError::LimitExceeded { .. })));
    assert!(matches!(limited("\"ab\" * 6"), Err(EvalError::LimitExceeded { .. })));
    assert!(matches!(limited("[0] * 11"), Err(EvalError::LimitExceeded { .. })));
    assert_eq!(limited("[0] * 10").map(|v| v.to_string()).ok().as_deref(),
               Some("[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]"));
}

#[test]
fn the_scope_is_never_modified() {
    let scope = scope();
    let before = scope.clone();
    let _ = evaluate("xs.count(1)", &scope, &SandboxConfig::default());
    let _ = evaluate("x = 5", &scope, &SandboxConfig::default());
    assert_eq!(scope, before);
}

#[test]
fn long_chains_hit_the_nesting_limit() {
    let sum = format!("1{}", "+1".repeat(2047));
    assert_eq!(sum.len(), 4095);
    assert!(matches!(eval(&sum), Err(EvalError::LimitExceeded { .. })));

    let attributes = format!("name{}", ".upper".repeat(500));
    assert!(matches!(eval(&attributes), Err(EvalError::LimitExceeded { .. })));

    let subscripts = format!("xs{}", "[0]".repeat(500));
    assert!(matches!(eval(&subscripts), Err(EvalError::LimitExceeded { .. })));

    assert_value(&vec!["1"; 32].join(" + "), Value::Integer(32));
}
