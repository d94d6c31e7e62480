//! Interpreter session for exercising the runtime from tests
//!
//! This module provides an interpreter session that:
//! - Loads programs and calls their entry functions
//! - Installs `checkStackTrace` so script code can assert on the live chain
//! - Installs `assertEquals` for strict-equality checks inside script code
//! - Reports failures as [`TestHarnessError`] diagnostics

use crate::ast::Program;
use crate::config::InterpreterConfig;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{NativeCall, Value};
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur during test harness operations
#[derive(Debug, Error, Diagnostic)]
pub enum TestHarnessError {
    #[error("Runtime error: {source}")]
    #[diagnostic(code(tailspin::harness::runtime))]
    Runtime {
        #[from]
        source: RuntimeError,
    },

    #[error("Assertion failed: expected {expected}, but got {actual}")]
    #[diagnostic(code(tailspin::harness::assertion))]
    AssertionFailed { expected: String, actual: String },
}

/// Interpreter session with the assertion natives installed
pub struct InterpreterSession {
    interpreter: Interpreter,
}

impl InterpreterSession {
    /// Create a new interpreter session
    pub fn new() -> Result<Self, TestHarnessError> {
        Self::with_config(InterpreterConfig::new())
    }

    pub fn with_config(config: InterpreterConfig) -> Result<Self, TestHarnessError> {
        let mut interpreter = Interpreter::with_config(config);
        interpreter.define_native("checkStackTrace", 1, check_stack_trace);
        interpreter.define_native("assertEquals", 2, assert_equals);
        Ok(Self { interpreter })
    }

    pub fn load(&mut self, program: &Program) -> Result<(), TestHarnessError> {
        self.interpreter.load(program)?;
        Ok(())
    }

    /// Call a loaded global function
    pub fn call(&mut self, name: &str, arguments: Vec<Value>) -> Result<Value, TestHarnessError> {
        Ok(self.interpreter.call_global(name, arguments)?)
    }

    /// Load `program` and call `entry` without arguments
    pub fn run(&mut self, program: &Program, entry: &str) -> Result<Value, TestHarnessError> {
        Ok(self.interpreter.run(program, entry)?)
    }

    /// Call `entry` and require it to return `expected`
    pub fn assert_returns(&mut self, entry: &str, expected: Value) -> Result<(), TestHarnessError> {
        let actual = self.call(entry, Vec::new())?;
        if actual.strict_equals(&expected) {
            Ok(())
        } else {
            Err(TestHarnessError::AssertionFailed {
                expected: expected.to_display_string(),
                actual: actual.to_display_string(),
            })
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}

/// `checkStackTrace(expected)`: the live chain, innermost first, must start
/// with the names in `expected` (functions or strings)
///
/// The native itself has no record, so the first entry is its caller.
fn check_stack_trace(call: &NativeCall<'_>) -> Result<Value, Value> {
    let expected: Vec<String> = match call.argument(0) {
        Value::Array(items) => items.borrow().iter().map(expected_label).collect(),
        other => {
            return Err(Value::error(
                "TypeError",
                format!("checkStackTrace expects an array, got {}", other.type_name()),
            ));
        }
    };
    let actual = call.call_stack.stack_trace().labels();

    if actual.len() >= expected.len() && actual[..expected.len()] == expected[..] {
        Ok(Value::Undefined)
    } else {
        Err(Value::error(
            "Error",
            format!(
                "stack trace mismatch: expected [{}], got [{}]",
                expected.join(", "),
                actual.join(", ")
            ),
        ))
    }
}

fn expected_label(value: &Value) -> String {
    match value {
        Value::Function(callable) => callable.name(),
        other => other.to_string_repr(),
    }
}

/// `assertEquals(expected, actual)` with strict equality
fn assert_equals(call: &NativeCall<'_>) -> Result<Value, Value> {
    let expected = call.argument(0);
    let actual = call.argument(1);
    if expected.strict_equals(&actual) {
        Ok(Value::Undefined)
    } else {
        Err(Value::error(
            "Error",
            format!(
                "assertion failed: expected {}, got {}",
                expected.to_display_string(),
                actual.to_display_string()
            ),
        ))
    }
}
