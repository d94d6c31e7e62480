//! Function execution for the Tailspin runtime
//!
//! This module performs calls on behalf of the [`Evaluator`]:
//! - Target resolution through bound call targets
//! - Activation record management and parameter binding
//! - Frame replacement for marked tail calls
//!
//! A script call runs in a trampoline: the body of a tail-called function
//! executes in the same host frame as the body of the function that called
//! it, after that function's record has been replaced. An unbounded chain
//! of tail calls therefore needs neither more records nor more host stack.

use crate::arity::{self, ArityMismatch};
use crate::ast::FunctionBody;
use crate::binding::{self, ResolvedCall, ResolvedTarget};
use crate::call_stack::{ActivationRecord, RecordId};
use crate::control_flow::{Abrupt, Completion, TailCallRequest};
use crate::environment::Scope;
use crate::evaluator::Evaluator;
use crate::value::{Callable, Closure, NativeCall, NativeFunction, Value};
use std::rc::Rc;

/// Host stack that must remain before an ordinary call runs a body
const STACK_RED_ZONE: usize = 256 * 1024;

/// Size of each host stack segment allocated once the red zone is reached
const STACK_SEGMENT_SIZE: usize = 4 * 1024 * 1024;

impl Evaluator<'_> {
    /// Call `target` with an ordinary (frame-growing) call
    ///
    /// Returns the callee's value, or the `Throw`/`Fault` it ended with.
    /// Nested ordinary calls grow the host stack on demand, so the depth
    /// limit is what ends runaway recursion.
    pub fn call_value(
        &mut self,
        target: &Callable,
        receiver: Value,
        arguments: Vec<Value>,
    ) -> Result<Value, Abrupt> {
        let ResolvedCall {
            target,
            receiver,
            arguments,
            ..
        } = binding::resolve(target, receiver, arguments);

        match target {
            ResolvedTarget::Native(native) => self.call_native(&native, &receiver, &arguments),
            ResolvedTarget::Script(closure) => {
                let record = new_record(closure, receiver, arguments);
                let id = self.call_stack.push_record(record)?;
                stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || self.invoke(id))
            }
        }
    }

    /// Run the record `id` and every record that replaces it
    fn invoke(&mut self, mut id: RecordId) -> Result<Value, Abrupt> {
        // Scope of a body that tail-called a closure it binds; it can only be
        // released once the callee's record is gone
        let mut held: Option<Scope> = None;

        loop {
            let (closure, scope) = self.bind_parameters(id)?;
            let outcome = run_body(self, &closure, &scope);
            drop(closure);

            let result = match outcome {
                Ok(value) => Ok(value),
                Err(Abrupt::Return(value)) => Ok(value),
                Err(Abrupt::Throw(exception)) => Err(Abrupt::Throw(exception)),
                // Records of an aborted run are dropped by the interpreter
                Err(fault @ Abrupt::Fault(_)) => return Err(fault),
                Err(Abrupt::TailCall(TailCallRequest {
                    target,
                    receiver,
                    arguments,
                })) => {
                    // Unwrap bindings before the caller's record is destroyed
                    let ResolvedCall {
                        target: resolved,
                        receiver,
                        arguments,
                        ..
                    } = binding::resolve(&target, receiver, arguments);
                    drop(target);

                    match resolved {
                        ResolvedTarget::Script(callee) => {
                            let record = new_record(callee, receiver, arguments);
                            id = self.call_stack.replace_record(id, record)?;
                            held = release_scopes(scope, held);
                            continue;
                        }
                        ResolvedTarget::Native(native) => {
                            self.call_stack.pop_record(id)?;
                            release_scopes(scope, held);
                            return self.call_native(&native, &receiver, &arguments);
                        }
                    }
                }
            };

            self.call_stack.pop_record(id)?;
            release_scopes(scope, held);
            return result;
        }
    }

    /// Adapt the arguments of record `id` and bind them in a fresh scope
    fn bind_parameters(&mut self, id: RecordId) -> Result<(Rc<Closure>, Scope), Abrupt> {
        let record = self.call_stack.record(id)?;
        let closure = Rc::clone(&record.function);
        let adapted = arity::adapt(closure.declared_arity(), record.arguments.clone());

        if adapted.mismatch != ArityMismatch::Exact {
            tracing::trace!(
                target: "tailspin::frames",
                function = %closure.name,
                mismatch = ?adapted.mismatch,
                "adapted arguments"
            );
        }

        let scope = closure.environment.child();
        for (param, value) in closure.declaration.params.iter().zip(adapted.parameters) {
            scope.define(param.clone(), value);
        }
        if !closure.is_arrow() {
            scope.define("arguments", Value::array(adapted.arguments));
        }
        Ok((closure, scope))
    }

    /// Natives run on the caller's record; `Err` from a native is a throw
    fn call_native(
        &mut self,
        native: &NativeFunction,
        receiver: &Value,
        arguments: &[Value],
    ) -> Result<Value, Abrupt> {
        let call = NativeCall {
            call_stack: &*self.call_stack,
            receiver,
            arguments,
        };
        (native.function)(&call).map_err(Abrupt::Throw)
    }
}

/// Evaluate the function body; a block body completing normally yields
/// `undefined`, a concise arrow body yields its value
fn run_body(evaluator: &mut Evaluator<'_>, closure: &Closure, scope: &Scope) -> Completion {
    match &closure.declaration.body {
        FunctionBody::Block(statements) => evaluator
            .exec_statements(statements, scope)
            .map(|_| Value::Undefined),
        FunctionBody::Expression(body) => evaluator.eval(body, scope),
    }
}

/// Release the scope of the body that just finished, then retry one held
/// back by an earlier body. Returns `current` if it is still pinned.
fn release_scopes(current: Scope, held: Option<Scope>) -> Option<Scope> {
    let pinned = (!current.release()).then_some(current);
    if let Some(previous) = held {
        previous.release();
    }
    pinned
}

/// Arrow functions ignore the supplied receiver in favour of the one they
/// captured
fn new_record(closure: Rc<Closure>, receiver: Value, arguments: Vec<Value>) -> ActivationRecord {
    let receiver = match &closure.lexical_this {
        Some(lexical) => lexical.clone(),
        None => receiver,
    };
    ActivationRecord::new(closure, receiver, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::call_stack::CallStack;
    use crate::config::InterpreterConfig;
    use crate::environment::Scope;
    use pretty_assertions::assert_eq;

    fn closure_value(decl: Rc<crate::ast::FunctionDecl>, scope: &Scope) -> Callable {
        Callable::Script(Rc::new(Closure {
            name: decl.display_name().to_string(),
            declaration: decl,
            environment: scope.clone(),
            lexical_this: None,
        }))
    }

    fn depth_of(call: &NativeCall<'_>) -> Result<Value, Value> {
        Ok(Value::from(call.call_stack.depth() as f64))
    }

    #[test]
    fn test_call_binds_parameters_and_pops_record() {
        let scope = Scope::new();
        let sum = closure_value(
            function("sum", &["a", "b"], vec![ret(add(ident("a"), ident("b")))]),
            &scope,
        );
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let result = evaluator
            .call_value(&sum, Value::Undefined, vec![Value::from(1), Value::from(2)])
            .unwrap();
        assert_eq!(result, Value::from(3));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_missing_parameters_are_undefined_and_arguments_keeps_all() {
        let scope = Scope::new();
        let pair = closure_value(
            function(
                "pair",
                &["a", "b"],
                vec![ret(array(vec![
                    ident("b"),
                    member(ident("arguments"), "length"),
                ]))],
            ),
            &scope,
        );
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let result = evaluator
            .call_value(&pair, Value::Undefined, vec![Value::from(1)])
            .unwrap();
        assert_eq!(result.to_display_string(), "[undefined, 1]");

        let result = evaluator
            .call_value(
                &pair,
                Value::Undefined,
                vec![Value::from(1), Value::from(2), Value::from(3)],
            )
            .unwrap();
        assert_eq!(result.to_display_string(), "[2, 3]");
    }

    #[test]
    fn test_tail_call_chain_runs_in_constant_records() {
        let scope = Scope::new();
        scope.define("depth", Value::native("depth", 0, depth_of));
        let count = function(
            "count",
            &["n"],
            vec![ret(conditional(
                strict_eq(ident("n"), num(0)),
                call(ident("depth"), vec![]),
                tail_call(ident("count"), vec![sub(ident("n"), num(1))]),
            ))],
        );
        let count = closure_value(count, &scope);
        scope.define("count", Value::Function(count.clone()));

        let mut stack = CallStack::with_max_depth(2);
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let result = evaluator
            .call_value(&count, Value::Undefined, vec![Value::from(50_000)])
            .unwrap();
        assert_eq!(result, Value::from(1));
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), 1);
        assert_eq!(stack.total_tail_calls(), 50_000);
    }

    #[test]
    fn test_tail_call_to_native_pops_caller_first() {
        let scope = Scope::new();
        scope.define("depth", Value::native("depth", 0, depth_of));
        let outer = closure_value(
            function("outer", &[], vec![ret(tail_call(ident("depth"), vec![]))]),
            &scope,
        );
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let result = evaluator.call_value(&outer, Value::Undefined, vec![]).unwrap();
        assert_eq!(result, Value::from(0));
    }

    #[test]
    fn test_disabled_elimination_grows_the_stack() {
        let scope = Scope::new();
        scope.define("depth", Value::native("depth", 0, depth_of));
        let outer = closure_value(
            function("outer", &[], vec![ret(tail_call(ident("depth"), vec![]))]),
            &scope,
        );
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new().tail_call_elimination(false);
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let result = evaluator.call_value(&outer, Value::Undefined, vec![]).unwrap();
        assert_eq!(result, Value::from(1));
    }

    #[test]
    fn test_thrown_exception_pops_record() {
        let scope = Scope::new();
        let fail = closure_value(function("fail", &[], vec![throw(string("boom"))]), &scope);
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        match evaluator.call_value(&fail, Value::Undefined, vec![]) {
            Err(Abrupt::Throw(exception)) => assert_eq!(exception, Value::from("boom")),
            other => panic!("expected throw, got {other:?}"),
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_arrow_ignores_supplied_receiver() {
        let scope = Scope::new();
        let captured = Value::object([("x", Value::from(1))]);
        let arrow = Callable::Script(Rc::new(Closure {
            name: "arrow".to_string(),
            declaration: match arrow_expr(&[], this()) {
                Expr::Function(decl) => decl,
                _ => unreachable!(),
            },
            environment: scope,
            lexical_this: Some(captured.clone()),
        }));
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let result = evaluator
            .call_value(&arrow, Value::from("other"), vec![])
            .unwrap();
        assert_eq!(result, captured);
    }
}
