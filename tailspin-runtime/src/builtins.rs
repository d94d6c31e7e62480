//! Built-in functions for the Tailspin runtime.
//!
//! Provides call-target binding, error construction, output and stack
//! introspection.

use crate::environment::Scope;
use crate::value::{NativeCall, Value};

/// Register all built-in functions in the global scope
pub fn register_builtins(globals: &Scope) {
    // Call targets
    globals.define("bind", Value::native("bind", 2, builtin_bind));

    // Errors and output
    globals.define("Error", Value::native("Error", 1, builtin_error));
    globals.define("print", Value::native("print", 1, builtin_print));

    // Introspection
    globals.define("stackTrace", Value::native("stackTrace", 0, builtin_stack_trace));
    globals.define("callDepth", Value::native("callDepth", 0, builtin_call_depth));
}

/// `bind(fn, receiver, ...prefix)`: a bound call target over `fn`
fn builtin_bind(call: &NativeCall<'_>) -> Result<Value, Value> {
    let target = match call.argument(0) {
        Value::Function(target) => target,
        other => {
            return Err(Value::error(
                "TypeError",
                format!("bind expects a function, got {}", other.type_name()),
            ));
        }
    };
    let prefix = call.arguments.iter().skip(2).cloned().collect();
    Ok(Value::bound(target, call.argument(1), prefix))
}

/// `Error(message)`: an error object
fn builtin_error(call: &NativeCall<'_>) -> Result<Value, Value> {
    let message = match call.argument(0) {
        Value::Undefined => String::new(),
        other => other.to_string_repr(),
    };
    Ok(Value::error("Error", message))
}

/// Print the arguments separated by spaces, with a newline
fn builtin_print(call: &NativeCall<'_>) -> Result<Value, Value> {
    let line = call
        .arguments
        .iter()
        .map(Value::to_string_repr)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    Ok(Value::Undefined)
}

/// Names of the live records, innermost first
fn builtin_stack_trace(call: &NativeCall<'_>) -> Result<Value, Value> {
    let names = call
        .call_stack
        .stack_trace()
        .map(|entry| Value::string(entry.function_name))
        .collect();
    Ok(Value::array(names))
}

fn builtin_call_depth(call: &NativeCall<'_>) -> Result<Value, Value> {
    Ok(Value::Number(call.call_stack.depth() as f64))
}
