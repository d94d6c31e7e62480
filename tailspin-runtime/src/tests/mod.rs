//! Acceptance tests for the Tailspin runtime
//!
//! These tests load small programs into an [`crate::InterpreterSession`]
//! and assert, from inside script code, which records are live when a
//! tail-called function runs.


pub mod test_bounded_growth;
