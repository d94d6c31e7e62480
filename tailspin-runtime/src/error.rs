//! Runtime error types for the Tailspin runtime.
//!
//! Language-level failures (calling a non-callable, reading an unbound
//! name) are thrown as script exceptions and can be caught. The errors here
//! are what escapes to the embedder: uncaught exceptions, depth-limit
//! faults, rejected programs and internal inconsistencies.

use crate::call_stack::CallStackError;
use crate::tail_position::TailCallError;
use crate::value::Value;
use miette::Diagnostic;
use thiserror::Error;

/// Errors reported by the interpreter
#[derive(Error, Diagnostic, Debug)]
pub enum RuntimeError {
    #[error("Uncaught exception: {message}")]
    #[diagnostic(
        code(tailspin::runtime::uncaught_exception),
        help("Wrap the call in try/catch, or fix the code that throws")
    )]
    UncaughtException { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    TailPosition(#[from] TailCallError),

    #[error("Call stack error: {source}")]
    #[diagnostic(
        code(tailspin::runtime::call_stack),
        help("Non-tail recursion grows the stack; mark calls in tail position with the tail-call marker")
    )]
    CallStack {
        #[from]
        source: CallStackError,
    },

    #[error("Undefined function: {name}")]
    #[diagnostic(
        code(tailspin::runtime::undefined_function),
        help("Make sure the program declaring the function has been loaded")
    )]
    UndefinedFunction { name: String },

    #[error("Value is not callable: {found}")]
    #[diagnostic(code(tailspin::runtime::not_callable))]
    NotCallable { found: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(tailspin::runtime::internal))]
    Internal { message: String },
}

impl RuntimeError {
    /// Create an uncaught exception error from the thrown value
    pub fn uncaught(exception: &Value) -> Self {
        Self::UncaughtException {
            message: exception.to_string_repr(),
        }
    }

    /// Create an undefined function error
    pub fn undefined_function(name: &str) -> Self {
        Self::UndefinedFunction {
            name: name.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_stack_overflow(&self) -> bool {
        matches!(
            self,
            RuntimeError::CallStack {
                source: CallStackError::StackOverflow { .. }
            }
        )
    }
}

/// Type alias for interpreter results
pub type Result<T> = std::result::Result<T, RuntimeError>;
