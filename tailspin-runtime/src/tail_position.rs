//! Static check that tail-call markers only appear in tail position.
//!
//! Tail positions are: the argument of `return`; a concise arrow body; both
//! branches of a conditional, the right operand of `&&`/`||` and the last
//! operand of a comma sequence whenever the enclosing expression is itself
//! in tail position. A `do` expression in tail position passes that on to
//! its final statement: an expression statement, or the last statement of
//! either branch of an `if` or of a block. A `return` inside a `do`
//! expression returns from the enclosing function, so its argument is a
//! tail position as well. Nested functions are checked on their own.

use crate::ast::{Call, Expr, FunctionBody, FunctionDecl, Stmt};
use miette::Diagnostic;
use thiserror::Error;

/// Rejected tail-call markers
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum TailCallError {
    #[error("Tail call in `{function}` is not in tail position ({position})")]
    #[diagnostic(
        code(tailspin::tail_call::not_in_tail_position),
        help(
            "A marked tail call must be the value returned by its function: \
             the argument of `return`, an arrow body, or the last step of a \
             `&&`, `||`, comma, conditional or `do` expression in such a position"
        )
    )]
    NotInTailPosition { function: String, position: String },
}

/// Validate `decl` and every function nested inside it
pub fn validate_function(decl: &FunctionDecl) -> Result<(), TailCallError> {
    let validator = Validator {
        function: decl.display_name(),
    };
    match &decl.body {
        FunctionBody::Block(statements) => validator.statements(statements),
        FunctionBody::Expression(body) => validator.tail(body),
    }
}

struct Validator<'a> {
    function: &'a str,
}

impl Validator<'_> {
    fn statements(&self, statements: &[Stmt]) -> Result<(), TailCallError> {
        statements.iter().try_for_each(|statement| self.statement(statement))
    }

    /// A statement list whose completion value is in tail position
    fn tail_statements(&self, statements: &[Stmt]) -> Result<(), TailCallError> {
        let Some((last, rest)) = statements.split_last() else {
            return Ok(());
        };
        self.statements(rest)?;

        match last {
            Stmt::Expr(expr) => self.tail(expr),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                self.non_tail(test, "if condition")?;
                self.tail_statements(consequent)?;
                self.tail_statements(alternate)
            }
            Stmt::Block(statements) => self.tail_statements(statements),
            other => self.statement(other),
        }
    }

    fn statement(&self, statement: &Stmt) -> Result<(), TailCallError> {
        match statement {
            Stmt::Expr(expr) => self.non_tail(expr, "expression statement"),
            Stmt::Var { init, .. } => match init {
                Some(init) => self.non_tail(init, "variable initializer"),
                None => Ok(()),
            },
            Stmt::Return(Some(value)) => self.tail(value),
            Stmt::Return(None) => Ok(()),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                self.non_tail(test, "if condition")?;
                self.statements(consequent)?;
                self.statements(alternate)
            }
            Stmt::Block(statements) => self.statements(statements),
            Stmt::Try(try_stmt) => {
                self.statements(&try_stmt.block)?;
                if let Some(handler) = &try_stmt.handler {
                    self.statements(&handler.body)?;
                }
                match &try_stmt.finalizer {
                    Some(finalizer) => self.statements(finalizer),
                    None => Ok(()),
                }
            }
            Stmt::Throw(value) => self.non_tail(value, "thrown value"),
            Stmt::Function(decl) => validate_function(decl),
        }
    }

    fn tail(&self, expr: &Expr) -> Result<(), TailCallError> {
        match expr {
            Expr::TailCall(call) => self.call_parts(call),
            Expr::Logical { left, right, .. } => {
                self.non_tail(left, "left operand of a logical operator")?;
                self.tail(right)
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.non_tail(test, "conditional test")?;
                self.tail(consequent)?;
                self.tail(alternate)
            }
            Expr::Sequence(items) => match items.split_last() {
                Some((last, rest)) => {
                    for item in rest {
                        self.non_tail(item, "non-final operand of a comma expression")?;
                    }
                    self.tail(last)
                }
                None => Ok(()),
            },
            Expr::Do(statements) => self.tail_statements(statements),
            other => self.non_tail(other, "returned expression"),
        }
    }

    fn non_tail(&self, expr: &Expr, position: &str) -> Result<(), TailCallError> {
        match expr {
            Expr::TailCall(_) => Err(TailCallError::NotInTailPosition {
                function: self.function.to_string(),
                position: position.to_string(),
            }),
            Expr::Literal(_) | Expr::Identifier(_) | Expr::This => Ok(()),
            Expr::Array(items) => items
                .iter()
                .try_for_each(|item| self.non_tail(item, "array element")),
            Expr::Object(properties) => properties
                .iter()
                .try_for_each(|(_, value)| self.non_tail(value, "object property")),
            Expr::Member { object, .. } => self.non_tail(object, "member access"),
            Expr::Index { object, index } => {
                self.non_tail(object, "indexed access")?;
                self.non_tail(index, "index")
            }
            Expr::Call(call) => self.call_parts(call),
            Expr::Function(decl) => validate_function(decl),
            Expr::Binary { left, right, .. } => {
                self.non_tail(left, "operand of a binary operator")?;
                self.non_tail(right, "operand of a binary operator")
            }
            Expr::Logical { left, right, .. } => {
                self.non_tail(left, "left operand of a logical operator")?;
                self.non_tail(right, position)
            }
            Expr::Unary { operand, .. } => self.non_tail(operand, "operand of a unary operator"),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.non_tail(test, "conditional test")?;
                self.non_tail(consequent, position)?;
                self.non_tail(alternate, position)
            }
            Expr::Sequence(items) => items.iter().try_for_each(|item| self.non_tail(item, position)),
            Expr::Do(statements) => self.statements(statements),
            Expr::Assign { value, .. } => self.non_tail(value, "assigned value"),
        }
    }

    fn call_parts(&self, call: &Call) -> Result<(), TailCallError> {
        self.non_tail(&call.callee, "callee expression")?;
        call.arguments
            .iter()
            .try_for_each(|argument| self.non_tail(argument, "call argument"))
    }
}
