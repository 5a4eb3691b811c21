use rand::{Rng, seq::SliceRandom};

use crate::{
    error::RuntimeError,
    interpreter::{
        runtime::{
            host::display_value,
            registry::{FunctionRegistry, NativeCall},
        },
        sandbox::{builtin::title_case, operators::arithmetic, syntax::BinaryOperator},
        value::core::Value,
    },
};

/// Libraries a `use` directive can install.
pub const MODULES: &[&str] = &["math", "random", "text"];

/// Installs the functions every program starts with: `print`, `print_many`,
/// `add` and `mul`.
pub fn install_core(registry: &mut FunctionRegistry) {
    registry.register_native("print", print_many);
    registry.register_native("print_many", print_many);
    registry.register_native("add", |call| binary("add", BinaryOperator::Add, call));
    registry.register_native("mul", |call| binary("mul", BinaryOperator::Mul, call));
}

/// Installs the library `name`.
///
/// Returns `false` if there is no such library.
pub fn install_module(registry: &mut FunctionRegistry, name: &str) -> bool {
    match name {
        "math" => {
            registry.register_native("add", |call| binary("add", BinaryOperator::Add, call));
            registry.register_native("sub", |call| binary("sub", BinaryOperator::Sub, call));
            registry.register_native("mul", |call| binary("mul", BinaryOperator::Mul, call));
            registry.register_native("div", |call| binary("div", BinaryOperator::Div, call));
            registry.register_native("pow", |call| binary("pow", BinaryOperator::Pow, call));
        },
        "random" => {
            registry.register_native("roll", roll);
            registry.register_native("pick", pick);
        },
        "text" => {
            registry.register_native("upper", |call| text("upper", call, str::to_uppercase));
            registry.register_native("lower", |call| text("lower", call, str::to_lowercase));
            registry.register_native("title", |call| text("title", call, title_case));
        },
        _ => return false,
    }
    true
}

/// Prints every argument, separated by single spaces.
fn print_many(call: &mut NativeCall<'_>) -> Result<Value, RuntimeError> {
    let line = call.args
                   .iter()
                   .map(|value| display_value(&*call.host, value))
                   .collect::<Vec<_>>()
                   .join(" ");
    call.host.emit(&line);
    Ok(Value::None)
}

/// Prints `value` and returns it.
fn echo(call: &mut NativeCall<'_>, value: Value) -> Value {
    call.host.emit(&value.to_string());
    value
}

fn binary(name: &str, op: BinaryOperator, call: &mut NativeCall<'_>) -> Result<Value, RuntimeError> {
    call.expect_args(name, 2)?;
    let result = arithmetic(op, &call.args[0], &call.args[1]).map_err(|e| RuntimeError::from_eval(e, call.line))?;
    Ok(echo(call, result))
}

/// `roll sides`: prints a number from 1 to `sides`.
fn roll(call: &mut NativeCall<'_>) -> Result<Value, RuntimeError> {
    call.expect_args("roll", 1)?;
    let sides = call.args[0].as_integer().map_err(|e| RuntimeError::from_eval(e, call.line))?;
    if sides < 1 {
        return Err(call.type_error(format!("cannot roll a die with {sides} sides")));
    }
    let result = Value::Integer(rand::thread_rng().gen_range(1..=sides));
    Ok(echo(call, result))
}

/// `pick a b c ...`: prints one of its arguments.
fn pick(call: &mut NativeCall<'_>) -> Result<Value, RuntimeError> {
    let Some(choice) = call.args.choose(&mut rand::thread_rng()).cloned() else {
        return Err(call.type_error("pick needs at least one argument"));
    };
    Ok(echo(call, choice))
}

fn text(name: &str, call: &mut NativeCall<'_>, convert: fn(&str) -> String) -> Result<Value, RuntimeError> {
    call.expect_args(name, 1)?;
    let converted = convert(&display_value(&*call.host, &call.args[0]));
    Ok(echo(call, Value::from(converted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_modules_are_refused() {
        let mut registry = FunctionRegistry::new();
        assert!(!install_module(&mut registry, "os"));
        assert!(!registry.contains("sub"));
    }

    #[test]
    fn every_listed_module_installs() {
        let mut registry = FunctionRegistry::new();
        for module in MODULES {
            assert!(install_module(&mut registry, module));
        }
        assert!(registry.contains("pow") && registry.contains("pick") && registry.contains("title"));
    }
}
