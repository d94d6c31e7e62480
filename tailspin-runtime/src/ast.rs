//! Program representation consumed by the runtime.
//!
//! Source text is turned into this tree by a front end that lives outside
//! this crate; the builder functions at the bottom of the module are what
//! tests, demos and embedders use to assemble programs directly.

use std::rc::Rc;

/// A program: a list of top-level function declarations
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub functions: Vec<Rc<FunctionDecl>>,
}

impl Program {
    pub fn new(functions: Vec<Rc<FunctionDecl>>) -> Self {
        Self { functions }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `function name(params) { ... }`, with its own receiver and `arguments`
    Ordinary,
    /// `(params) => ...`, receiver and `arguments` are lexical
    Arrow,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    /// Concise arrow body; the expression is in tail position
    Expression(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: FunctionBody,
    pub kind: FunctionKind,
}

impl FunctionDecl {
    pub fn is_arrow(&self) -> bool {
        self.kind == FunctionKind::Arrow
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Var { name: String, init: Option<Expr> },
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Vec<Stmt>,
        alternate: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Try(TryStmt),
    Throw(Expr),
    /// Hoisted to the top of the enclosing statement list
    Function(Rc<FunctionDecl>),
}

#[derive(Debug, Clone)]
pub struct TryStmt {
    pub block: Vec<Stmt>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Lt,
    Gt,
    StrictEq,
    StrictNe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call(Call),
    /// A call marked for frame replacement (`continue f(...)`)
    TailCall(Call),
    Function(Rc<FunctionDecl>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// Comma operator
    Sequence(Vec<Expr>),
    /// `do { ... }` expression; its value is the last expression statement
    Do(Vec<Stmt>),
    Assign {
        name: String,
        value: Box<Expr>,
    },
}

// Builders

pub fn function(name: &str, params: &[&str], body: Vec<Stmt>) -> Rc<FunctionDecl> {
    Rc::new(FunctionDecl {
        name: Some(name.to_string()),
        params: params.iter().map(|p| p.to_string()).collect(),
        body: FunctionBody::Block(body),
        kind: FunctionKind::Ordinary,
    })
}

/// Arrow function with a block body
pub fn arrow(params: &[&str], body: Vec<Stmt>) -> Expr {
    Expr::Function(Rc::new(FunctionDecl {
        name: None,
        params: params.iter().map(|p| p.to_string()).collect(),
        body: FunctionBody::Block(body),
        kind: FunctionKind::Arrow,
    }))
}

/// Arrow function with a concise expression body
pub fn arrow_expr(params: &[&str], body: Expr) -> Expr {
    Expr::Function(Rc::new(FunctionDecl {
        name: None,
        params: params.iter().map(|p| p.to_string()).collect(),
        body: FunctionBody::Expression(Box::new(body)),
        kind: FunctionKind::Arrow,
    }))
}

pub fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
}

pub fn num(n: impl Into<f64>) -> Expr {
    Expr::Literal(Literal::Number(n.into()))
}

pub fn boolean(b: bool) -> Expr {
    Expr::Literal(Literal::Boolean(b))
}

pub fn string(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.to_string()))
}

pub fn undefined() -> Expr {
    Expr::Literal(Literal::Undefined)
}

pub fn this() -> Expr {
    Expr::This
}

pub fn array(items: Vec<Expr>) -> Expr {
    Expr::Array(items)
}

pub fn object(properties: Vec<(&str, Expr)>) -> Expr {
    Expr::Object(
        properties
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

pub fn member(object: Expr, property: &str) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: property.to_string(),
    }
}

pub fn index(object: Expr, index: Expr) -> Expr {
    Expr::Index {
        object: Box::new(object),
        index: Box::new(index),
    }
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    Expr::Call(Call {
        callee: Box::new(callee),
        arguments,
    })
}

pub fn tail_call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    Expr::TailCall(Call {
        callee: Box::new(callee),
        arguments,
    })
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn add(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Add, left, right)
}

pub fn sub(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Sub, left, right)
}

pub fn strict_eq(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::StrictEq, left, right)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op: LogicalOp::And,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn or(left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op: LogicalOp::Or,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn not(operand: Expr) -> Expr {
    Expr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(operand),
    }
}

pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
    Expr::Conditional {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    }
}

pub fn sequence(items: Vec<Expr>) -> Expr {
    Expr::Sequence(items)
}

pub fn do_expr(body: Vec<Stmt>) -> Expr {
    Expr::Do(body)
}

pub fn assign(name: &str, value: Expr) -> Expr {
    Expr::Assign {
        name: name.to_string(),
        value: Box::new(value),
    }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(expr)
}

pub fn var(name: &str, init: Expr) -> Stmt {
    Stmt::Var {
        name: name.to_string(),
        init: Some(init),
    }
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return(Some(value))
}

pub fn throw(value: Expr) -> Stmt {
    Stmt::Throw(value)
}

pub fn if_else(test: Expr, consequent: Vec<Stmt>, alternate: Vec<Stmt>) -> Stmt {
    Stmt::If {
        test,
        consequent,
        alternate,
    }
}

pub fn try_catch(block: Vec<Stmt>, param: &str, handler: Vec<Stmt>) -> Stmt {
    Stmt::Try(TryStmt {
        block,
        handler: Some(CatchClause {
            param: Some(param.to_string()),
            body: handler,
        }),
        finalizer: None,
    })
}

pub fn try_finally(block: Vec<Stmt>, finalizer: Vec<Stmt>) -> Stmt {
    Stmt::Try(TryStmt {
        block,
        handler: None,
        finalizer: Some(finalizer),
    })
}

pub fn try_catch_finally(
    block: Vec<Stmt>,
    param: &str,
    handler: Vec<Stmt>,
    finalizer: Vec<Stmt>,
) -> Stmt {
    Stmt::Try(TryStmt {
        block,
        handler: Some(CatchClause {
            param: Some(param.to_string()),
            body: handler,
        }),
        finalizer: Some(finalizer),
    })
}

pub fn function_stmt(decl: Rc<FunctionDecl>) -> Stmt {
    Stmt::Function(decl)
}
