//! Long chains of tail calls under a small depth limit

use super::fixtures::*;
use crate::ast::*;
use crate::config::InterpreterConfig;
use crate::error::RuntimeError;
use crate::test_harness::TestHarnessError;
use crate::value::Value;
use pretty_assertions::assert_eq;
use std::rc::Rc;

/// `function countdown(n) { return n === 0 ? "done" : <call> countdown(n - 1); }`
fn countdown(tail: bool) -> Rc<FunctionDecl> {
    let recurse = if tail { tail_call } else { call };
    function(
        "countdown",
        &["n"],
        vec![ret(conditional(
            strict_eq(ident("n"), num(0)),
            string("done"),
            recurse(ident("countdown"), vec![sub(ident("n"), num(1))]),
        ))],
    )
}

/// `function down(n) { return n === 0 ? 0 : 1 + down(n - 1); }`
fn down() -> Rc<FunctionDecl> {
    function(
        "down",
        &["n"],
        vec![ret(conditional(
            strict_eq(ident("n"), num(0)),
            num(0),
            add(num(1), call(ident("down"), vec![sub(ident("n"), num(1))])),
        ))],
    )
}

fn is_overflow(error: &TestHarnessError) -> bool {
    matches!(error, TestHarnessError::Runtime { source } if source.is_stack_overflow())
}

#[test]
fn test_hundred_thousand_tail_calls_fit_in_eight_records() {
    let mut session = session_with(InterpreterConfig::with_max_depth(8), vec![countdown(true)]);

    let value = session
        .call("countdown", vec![Value::from(100_000)])
        .unwrap();
    assert_eq!(value, Value::from("done"));

    let stack = session.interpreter().call_stack();
    assert!(stack.is_empty());
    assert_eq!(stack.capacity(), 1);
    assert_eq!(stack.total_tail_calls(), 100_000);
}

#[test]
fn test_same_chain_without_marker_overflows() {
    let mut session = session_with(InterpreterConfig::with_max_depth(8), vec![countdown(false)]);

    let error = session
        .call("countdown", vec![Value::from(100_000)])
        .unwrap_err();
    assert!(is_overflow(&error), "unexpected error: {error}");
    assert!(session.interpreter().call_stack().is_empty());

    // Short chains still work after the aborted run
    let value = session.call("countdown", vec![Value::from(3)]).unwrap();
    assert_eq!(value, Value::from("done"));
}

#[test]
fn test_disabled_elimination_turns_tail_calls_into_calls() {
    let config = InterpreterConfig::with_max_depth(8).tail_call_elimination(false);
    let mut session = session_with(config, vec![countdown(true)]);

    let error = session
        .call("countdown", vec![Value::from(100_000)])
        .unwrap_err();
    assert!(is_overflow(&error), "unexpected error: {error}");

    let value = session.call("countdown", vec![Value::from(5)]).unwrap();
    assert_eq!(value, Value::from("done"));
    assert_eq!(session.interpreter().call_stack().total_tail_calls(), 0);
}

#[test]
fn test_disabled_elimination_keeps_every_frame_visible() {
    let config = InterpreterConfig::new().tail_call_elimination(false);
    let mut session = session_with(
        config,
        vec![
            function(
                "g",
                &[],
                vec![ret(tail_f_153(&["f_153", "g", "test"]))],
            ),
            function("test", &[], vec![ret(call(ident("g"), vec![]))]),
        ],
    );
    assert_eq!(session.call("test", Vec::new()).unwrap(), Value::from(153));
}

#[test]
fn test_mutual_recursion_in_constant_records() {
    // ping(n) { return n === 0 ? "ping" : continue pong(n - 1); } and vice versa
    let player = |name: &str, other: &str| {
        function(
            name,
            &["n"],
            vec![ret(conditional(
                strict_eq(ident("n"), num(0)),
                string(name),
                tail_call(ident(other), vec![sub(ident("n"), num(1))]),
            ))],
        )
    };
    let mut session = session_with(
        InterpreterConfig::with_max_depth(4),
        vec![player("ping", "pong"), player("pong", "ping")],
    );

    let value = session.call("ping", vec![Value::from(10_001)]).unwrap();
    assert_eq!(value, Value::from("pong"));
    assert_eq!(session.interpreter().call_stack().capacity(), 1);
}

#[test]
fn test_chain_of_tail_calls_shows_one_entry() {
    // hop(n) { return n === 0 ? stackTrace() : continue hop(n - 1); }
    let mut session = session_with(
        InterpreterConfig::new(),
        vec![
            function(
                "hop",
                &["n"],
                vec![ret(conditional(
                    strict_eq(ident("n"), num(0)),
                    call(ident("stackTrace"), vec![]),
                    tail_call(ident("hop"), vec![sub(ident("n"), num(1))]),
                ))],
            ),
            function(
                "test",
                &[],
                vec![ret(call(ident("hop"), vec![num(5)]))],
            ),
        ],
    );

    let trace = session.call("test", Vec::new()).unwrap();
    assert_eq!(trace.to_display_string(), "[\"hop\", \"test\"]");
    assert_eq!(session.interpreter().call_stack().total_tail_calls(), 5);
}

#[test]
fn test_depth_limit_counts_only_live_records() {
    // Ordinary nesting still hits the limit
    let mut session = session_with(
        InterpreterConfig::with_max_depth(3),
        vec![
            function("leaf", &[], vec![ret(num(1))]),
            function("mid", &[], vec![ret(call(ident("leaf"), vec![]))]),
            function("top", &[], vec![ret(call(ident("mid"), vec![]))]),
            function("over", &[], vec![ret(call(ident("top"), vec![]))]),
        ],
    );
    assert_eq!(session.call("top", Vec::new()).unwrap(), Value::from(1));

    let error = session.call("over", Vec::new()).unwrap_err();
    assert!(matches!(
        error,
        TestHarnessError::Runtime {
            source: RuntimeError::CallStack { .. }
        }
    ));
}

#[test]
fn test_ordinary_recursion_reaches_the_default_depth_limit() {
    let mut session = session_with(
        InterpreterConfig::new(),
        vec![
            down(),
            function("test", &[], vec![ret(call(ident("down"), vec![num(990)]))]),
        ],
    );
    session.assert_returns("test", Value::from(990)).unwrap();

    let error = session
        .call("down", vec![Value::from(5_000)])
        .unwrap_err();
    assert!(is_overflow(&error), "unexpected error: {error}");
    assert!(session.interpreter().call_stack().is_empty());
}
