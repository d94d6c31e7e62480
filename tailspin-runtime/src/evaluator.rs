//! Statement and expression evaluation.
//!
//! Evaluation is a recursive walk over the program tree that produces a
//! [`Completion`]. Anything other than a plain value (`return`, `throw`, a
//! marked tail call or an internal fault) travels outwards as an
//! [`Abrupt`] completion. Tail calls are never performed here: the
//! evaluator packages them as a [`TailCallRequest`] and leaves the frame
//! replacement to the function executor.

use crate::ast::{BinaryOp, Call, Expr, FunctionDecl, Literal, LogicalOp, Stmt, TryStmt, UnaryOp};
use crate::call_stack::CallStack;
use crate::config::InterpreterConfig;
use crate::control_flow::{Abrupt, Completion, PendingCleanup, TailCallRequest};
use crate::environment::Scope;
use crate::value::{Callable, Closure, Value};
use std::rc::Rc;

/// Evaluates statements and expressions against a call stack
pub struct Evaluator<'a> {
    pub(crate) call_stack: &'a mut CallStack,
    pub(crate) config: &'a InterpreterConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(call_stack: &'a mut CallStack, config: &'a InterpreterConfig) -> Self {
        Self { call_stack, config }
    }

    /// Execute a statement list in `scope`
    ///
    /// Function declarations are hoisted to the top of the list. The value
    /// of a normally completing list is that of its last expression
    /// statement (or `if`, block or `try` containing one), which is what a
    /// `do` expression evaluates to.
    pub fn exec_statements(&mut self, statements: &[Stmt], scope: &Scope) -> Completion {
        for statement in statements {
            if let Stmt::Function(decl) = statement {
                let closure = self.make_closure(decl, None, scope);
                scope.define(closure.name.clone(), Value::Function(Callable::Script(closure)));
            }
        }

        let mut last = Value::Undefined;
        for statement in statements {
            match statement {
                Stmt::Expr(_) | Stmt::If { .. } | Stmt::Block(_) | Stmt::Try(_) => {
                    last = self.exec_statement(statement, scope)?;
                }
                _ => {
                    self.exec_statement(statement, scope)?;
                }
            }
        }
        Ok(last)
    }

    fn exec_statement(&mut self, statement: &Stmt, scope: &Scope) -> Completion {
        match statement {
            Stmt::Expr(expr) => self.eval(expr, scope),

            Stmt::Var { name, init } => {
                let value = match init {
                    Some(Expr::Function(decl)) if decl.name.is_none() => {
                        Value::Function(Callable::Script(self.make_closure(decl, Some(name.as_str()), scope)))
                    }
                    Some(init) => self.eval(init, scope)?,
                    None => Value::Undefined,
                };
                scope.define(name.clone(), value);
                Ok(Value::Undefined)
            }

            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Err(Abrupt::Return(value))
            }

            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.is_truthy() {
                    self.exec_statements(consequent, scope)
                } else {
                    self.exec_statements(alternate, scope)
                }
            }

            Stmt::Block(statements) => self.exec_statements(statements, scope),

            Stmt::Try(try_stmt) => self.exec_try(try_stmt, scope),

            Stmt::Throw(expr) => {
                let exception = self.eval(expr, scope)?;
                Err(Abrupt::Throw(exception))
            }

            // Hoisted by exec_statements
            Stmt::Function(_) => Ok(Value::Undefined),
        }
    }

    /// Run a `try` statement under its [`PendingCleanup`] guard
    fn exec_try(&mut self, try_stmt: &TryStmt, scope: &Scope) -> Completion {
        let outcome = self.exec_statements(&try_stmt.block, scope);
        let mut guard = PendingCleanup::new(outcome)?;

        if let Some(handler) = &try_stmt.handler {
            if let Some(exception) = guard.take_exception() {
                let catch_scope = scope.child();
                if let Some(param) = &handler.param {
                    catch_scope.define(param.clone(), exception);
                }
                let outcome = self.exec_statements(&handler.body, &catch_scope);
                catch_scope.release();
                guard.record(outcome)?;
            }
        }

        match &try_stmt.finalizer {
            Some(finalizer) => {
                guard.enter_cleanup();
                let cleanup = self.exec_statements(finalizer, scope);
                guard.complete(cleanup)
            }
            None => guard.resume(),
        }
    }

    /// Evaluate an expression
    pub fn eval(&mut self, expr: &Expr, scope: &Scope) -> Result<Value, Abrupt> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Identifier(name) => scope
                .get(name)
                .ok_or_else(|| Abrupt::Throw(reference_error(name))),

            Expr::This => Ok(self.current_receiver()),

            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(values))
            }

            Expr::Object(properties) => {
                let mut entries = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    entries.push((key.clone(), self.eval(value, scope)?));
                }
                Ok(Value::object(entries))
            }

            Expr::Member { object, property } => {
                let target = self.eval(object, scope)?;
                target
                    .get_property(property)
                    .ok_or_else(|| Abrupt::Throw(property_error(&target, property)))
            }

            Expr::Index { object, index } => {
                let target = self.eval(object, scope)?;
                let key = self.eval(index, scope)?;
                target
                    .get_index(&key)
                    .ok_or_else(|| Abrupt::Throw(property_error(&target, &key.to_string_repr())))
            }

            Expr::Call(call) => {
                let (target, receiver, arguments) = self.eval_call_parts(call, scope)?;
                self.call_value(&target, receiver, arguments)
            }

            Expr::TailCall(call) => {
                let (target, receiver, arguments) = self.eval_call_parts(call, scope)?;
                if !self.config.tail_call_elimination {
                    return self.call_value(&target, receiver, arguments);
                }
                Err(Abrupt::TailCall(TailCallRequest {
                    target,
                    receiver,
                    arguments,
                }))
            }

            Expr::Function(decl) => Ok(Value::Function(Callable::Script(
                self.make_closure(decl, None, scope),
            ))),

            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                Ok(apply_binary(*op, &left, &right))
            }

            Expr::Logical { op, left, right } => {
                let left = self.eval(left, scope)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right, scope),
                }
            }

            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                Ok(match op {
                    UnaryOp::Not => Value::Boolean(!value.is_truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                })
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.is_truthy() {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }

            Expr::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item, scope)?;
                }
                Ok(last)
            }

            Expr::Do(statements) => {
                let block_scope = scope.child();
                let outcome = self.exec_statements(statements, &block_scope);
                block_scope.release();
                outcome
            }

            Expr::Assign { name, value } => {
                let value = self.eval(value, scope)?;
                if scope.assign(name, value.clone()) {
                    Ok(value)
                } else {
                    Err(Abrupt::Throw(reference_error(name)))
                }
            }
        }
    }

    /// Evaluate callee, receiver and arguments of a call site
    ///
    /// A member callee supplies its object as the receiver. A non-callable
    /// callee throws here, in the caller, before any frame is touched.
    fn eval_call_parts(
        &mut self,
        call: &Call,
        scope: &Scope,
    ) -> Result<(Callable, Value, Vec<Value>), Abrupt> {
        let (callee, receiver) = match call.callee.as_ref() {
            Expr::Member { object, property } => {
                let object = self.eval(object, scope)?;
                let callee = object
                    .get_property(property)
                    .ok_or_else(|| Abrupt::Throw(property_error(&object, property)))?;
                (callee, object)
            }
            other => (self.eval(other, scope)?, Value::Undefined),
        };

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.eval(argument, scope)?);
        }

        match callee {
            Value::Function(target) => Ok((target, receiver, arguments)),
            other => Err(Abrupt::Throw(Value::error(
                "TypeError",
                format!("{} is not a function", describe_callee(&call.callee, &other)),
            ))),
        }
    }

    /// Create a closure over `scope`; arrows capture the current receiver
    fn make_closure(&self, decl: &Rc<FunctionDecl>, inferred: Option<&str>, scope: &Scope) -> Rc<Closure> {
        let name = decl
            .name
            .as_deref()
            .or(inferred)
            .unwrap_or_else(|| decl.display_name())
            .to_string();
        let lexical_this = decl.is_arrow().then(|| self.current_receiver());

        Rc::new(Closure {
            name,
            declaration: Rc::clone(decl),
            environment: scope.clone(),
            lexical_this,
        })
    }

    /// Receiver of the innermost live record
    fn current_receiver(&self) -> Value {
        self.call_stack
            .current_record()
            .map(|record| record.receiver.clone())
            .unwrap_or(Value::Undefined)
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Undefined => Value::Undefined,
        Literal::Null => Value::Null,
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::string(s),
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Lt => Value::Boolean(left.to_number() < right.to_number()),
        BinaryOp::Gt => Value::Boolean(left.to_number() > right.to_number()),
        BinaryOp::StrictEq => Value::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Boolean(!left.strict_equals(right)),
    }
}

fn reference_error(name: &str) -> Value {
    Value::error("ReferenceError", format!("{name} is not defined"))
}

fn property_error(target: &Value, property: &str) -> Value {
    Value::error(
        "TypeError",
        format!(
            "Cannot read properties of {} (reading '{property}')",
            target.type_name()
        ),
    )
}

fn describe_callee(callee: &Expr, value: &Value) -> String {
    match callee {
        Expr::Identifier(name) => name.clone(),
        Expr::Member { object, property } => match object.as_ref() {
            Expr::Identifier(name) => format!("{name}.{property}"),
            Expr::This => format!("this.{property}"),
            _ => property.clone(),
        },
        _ => value.to_string_repr(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    fn eval_in(expr: Expr, scope: &Scope) -> Result<Value, Abrupt> {
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        Evaluator::new(&mut stack, &config).eval(&expr, scope)
    }

    fn thrown_message(result: Result<Value, Abrupt>) -> String {
        match result {
            Err(Abrupt::Throw(exception)) => exception.to_string_repr(),
            other => panic!("expected a thrown exception, got {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let scope = Scope::new();
        assert_eq!(eval_in(add(num(1), num(2)), &scope).unwrap(), Value::from(3));
        assert_eq!(eval_in(sub(num(5), num(2)), &scope).unwrap(), Value::from(3));
        assert_eq!(
            eval_in(binary(BinaryOp::Lt, num(1), num(2)), &scope).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            eval_in(add(string("a"), num(1)), &scope).unwrap(),
            Value::from("a1")
        );
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        let scope = Scope::new();
        // The right operand would throw if it were evaluated
        assert_eq!(
            eval_in(or(num(153), ident("missing")), &scope).unwrap(),
            Value::from(153)
        );
        assert_eq!(
            eval_in(and(boolean(false), ident("missing")), &scope).unwrap(),
            Value::from(false)
        );
        assert_eq!(
            eval_in(and(boolean(true), num(7)), &scope).unwrap(),
            Value::from(7)
        );
    }

    #[test]
    fn test_sequence_and_conditional() {
        let scope = Scope::new();
        assert_eq!(
            eval_in(sequence(vec![num(1), num(2), num(3)]), &scope).unwrap(),
            Value::from(3)
        );
        assert_eq!(
            eval_in(conditional(boolean(false), num(1), num(2)), &scope).unwrap(),
            Value::from(2)
        );
    }

    #[test]
    fn test_do_expression_value_is_last_expression_statement() {
        let scope = Scope::new();
        let expr = do_expr(vec![var("x", num(40)), expr_stmt(add(ident("x"), num(2)))]);
        assert_eq!(eval_in(expr, &scope).unwrap(), Value::from(42));
        assert!(scope.get("x").is_none());
    }

    #[test]
    fn test_do_expression_value_comes_from_final_try() {
        let scope = Scope::new();
        let caught = do_expr(vec![try_catch(
            vec![throw(string("boom")), expr_stmt(num(1))],
            "e",
            vec![expr_stmt(num(7))],
        )]);
        assert_eq!(eval_in(caught, &scope).unwrap(), Value::from(7));

        let cleaned = do_expr(vec![try_finally(
            vec![expr_stmt(num(42))],
            vec![expr_stmt(num(0))],
        )]);
        assert_eq!(eval_in(cleaned, &scope).unwrap(), Value::from(42));
    }

    #[test]
    fn test_unbound_identifier_throws_reference_error() {
        let scope = Scope::new();
        assert_eq!(
            thrown_message(eval_in(ident("nope"), &scope)),
            "ReferenceError: nope is not defined"
        );
        assert_eq!(
            thrown_message(eval_in(assign("nope", num(1)), &scope)),
            "ReferenceError: nope is not defined"
        );
    }

    #[test]
    fn test_calling_a_non_function_throws_type_error() {
        let scope = Scope::new();
        scope.define("x", Value::from(1));
        assert_eq!(
            thrown_message(eval_in(call(ident("x"), vec![]), &scope)),
            "TypeError: x is not a function"
        );
        assert_eq!(
            thrown_message(eval_in(tail_call(ident("x"), vec![]), &scope)),
            "TypeError: x is not a function"
        );
    }

    #[test]
    fn test_property_read_on_undefined_throws() {
        let scope = Scope::new();
        assert_eq!(
            thrown_message(eval_in(member(undefined(), "a"), &scope)),
            "TypeError: Cannot read properties of undefined (reading 'a')"
        );
    }

    #[test]
    fn test_tail_call_is_packaged_not_performed() {
        let scope = Scope::new();
        scope.define("print", Value::native("print", 1, |_| Ok(Value::Undefined)));
        match eval_in(tail_call(ident("print"), vec![num(1), num(2)]), &scope) {
            Err(Abrupt::TailCall(request)) => {
                assert_eq!(request.target.name(), "print");
                assert_eq!(request.arguments, vec![Value::from(1), Value::from(2)]);
                assert_eq!(request.receiver, Value::Undefined);
            }
            other => panic!("expected a tail-call request, got {other:?}"),
        }
    }

    #[test]
    fn test_member_callee_supplies_receiver() {
        let scope = Scope::new();
        let holder = Value::object([("f", Value::native("f", 0, |_| Ok(Value::Undefined)))]);
        scope.define("o", holder.clone());
        match eval_in(tail_call(member(ident("o"), "f"), vec![]), &scope) {
            Err(Abrupt::TailCall(request)) => assert_eq!(request.receiver, holder),
            other => panic!("expected a tail-call request, got {other:?}"),
        }
    }

    #[test]
    fn test_finally_runs_and_overrides_return() {
        let scope = Scope::new();
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let statements = vec![
            var("log", array(vec![])),
            try_finally(
                vec![ret(num(1))],
                vec![expr_stmt(assign("log", string("cleaned"))), ret(num(2))],
            ),
        ];
        match evaluator.exec_statements(&statements, &scope) {
            Err(Abrupt::Return(value)) => assert_eq!(value, Value::from(2)),
            other => panic!("expected return, got {other:?}"),
        }
        assert_eq!(scope.get("log"), Some(Value::from("cleaned")));
    }

    #[test]
    fn test_catch_binds_exception_in_its_own_scope() {
        let scope = Scope::new();
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let statements = vec![try_catch(
            vec![throw(string("boom"))],
            "e",
            vec![ret(ident("e"))],
        )];
        match evaluator.exec_statements(&statements, &scope) {
            Err(Abrupt::Return(value)) => assert_eq!(value, Value::from("boom")),
            other => panic!("expected return, got {other:?}"),
        }
        assert!(scope.get("e").is_none());
    }

    #[test]
    fn test_anonymous_function_takes_variable_name() {
        let scope = Scope::new();
        let mut stack = CallStack::new();
        let config = InterpreterConfig::new();
        let mut evaluator = Evaluator::new(&mut stack, &config);

        let statements = vec![var("closure", arrow_expr(&[], num(1)))];
        evaluator.exec_statements(&statements, &scope).unwrap();
        let name = scope
            .get("closure")
            .and_then(|value| value.as_callable().map(Callable::name));
        assert_eq!(name.as_deref(), Some("closure"));
    }
}
