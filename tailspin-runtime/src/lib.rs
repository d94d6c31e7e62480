//! Tailspin runtime - an interpreter with proper tail calls
//!
//! Calls marked as tail calls replace the caller's activation record
//! instead of growing the call stack:
//! - Arguments are adapted to the callee's declared parameters
//! - Bound call targets are unwrapped before the caller's record goes away
//! - Pending `finally` blocks run before the record is replaced
//! - Stack traces report only live records, so a chain of tail calls shows
//!   up as a single entry

#![allow(clippy::result_large_err)]

pub mod arity;
pub mod ast;
pub mod binding;
pub mod builtins;
pub mod call_stack;
pub mod config;
pub mod control_flow;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod function_executor;
pub mod interpreter;
pub mod stack_trace;
pub mod tail_position;
pub mod test_harness;
pub mod value;

// Include tests directory with all test modules
#[cfg(test)]
#[path = "tests/mod.rs"]
pub mod tests;

// Re-export public API
pub use call_stack::{ActivationRecord, CallStack, CallStackError, RecordId};
pub use config::InterpreterConfig;
pub use control_flow::{Abrupt, Completion, GuardState, PendingCleanup, TailCallRequest};
pub use error::{Result, RuntimeError};
pub use evaluator::Evaluator;
pub use interpreter::Interpreter;
pub use stack_trace::{StackTrace, StackTraceEntry};
pub use tail_position::TailCallError;
pub use test_harness::{InterpreterSession, TestHarnessError};
pub use value::{Callable, Value};
