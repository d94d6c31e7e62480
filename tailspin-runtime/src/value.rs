//! Runtime value representation for the Tailspin runtime.
//!
//! This module defines the Value enum that represents all possible
//! runtime values, the callable variants (script closures, native
//! functions and bound call targets), and the small set of operations
//! the evaluator needs: truthiness, strict equality, arithmetic and
//! property access.

use crate::ast::FunctionDecl;
use crate::call_stack::CallStack;
use crate::environment::Scope;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Runtime values
#[derive(Clone)]
pub enum Value {
    /// The `undefined` value, also used to pad missing parameters
    Undefined,
    /// The `null` value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit floating point number
    Number(f64),
    /// Immutable UTF-8 string
    String(Rc<str>),
    /// Mutable, shared array
    Array(Rc<RefCell<Vec<Value>>>),
    /// Mutable, shared object with ordered properties
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    /// Anything that can be called
    Function(Callable),
}

/// A callable value
///
/// Resolution of a call target is a loop over these variants (see
/// [`crate::binding::resolve`]); only `Script` targets get activation records.
#[derive(Clone)]
pub enum Callable {
    Script(Rc<Closure>),
    Native(Rc<NativeFunction>),
    Bound(Rc<BoundCallTarget>),
}

/// A script function together with the scope it closes over
pub struct Closure {
    /// Label reported in stack traces
    pub name: String,

    /// The function's declaration
    pub declaration: Rc<FunctionDecl>,

    /// Scope captured when the function value was created
    pub environment: Scope,

    /// Receiver captured by arrow functions at creation time
    pub lexical_this: Option<Value>,
}

/// Signature of native functions. `Err` carries a thrown value.
pub type NativeFn = fn(&NativeCall<'_>) -> Result<Value, Value>;

/// A function implemented in Rust
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub function: NativeFn,
}

/// Everything a native function can see about its invocation
pub struct NativeCall<'a> {
    /// The live call stack; natives do not push records of their own
    pub call_stack: &'a CallStack,
    pub receiver: &'a Value,
    pub arguments: &'a [Value],
}

impl NativeCall<'_> {
    /// Positional argument, `undefined` when absent
    pub fn argument(&self, index: usize) -> Value {
        self.arguments.get(index).cloned().unwrap_or(Value::Undefined)
    }
}

/// A callable created by partially applying a receiver and a prefix of
/// arguments to an underlying target
pub struct BoundCallTarget {
    /// Underlying target, possibly itself bound
    pub target: Callable,

    /// Receiver that replaces whatever the call site supplies
    pub receiver: Value,

    /// Arguments prepended to the call-site arguments
    pub prefix: Vec<Value>,
}

impl Callable {
    /// Name used for display and stack-trace comparison
    pub fn name(&self) -> String {
        match self {
            Callable::Script(closure) => closure.name.clone(),
            Callable::Native(native) => native.name.clone(),
            Callable::Bound(bound) => format!("bound {}", bound.target.name()),
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Script(a), Callable::Script(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Bound(a), Callable::Bound(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Closure {
    /// Number of declared parameters
    pub fn declared_arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn is_arrow(&self) -> bool {
        self.declaration.is_arrow()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("arity", &self.declared_arity())
            .field("arrow", &self.is_arrow())
            .finish()
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = properties
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect::<IndexMap<_, _>>();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    /// An error object with `name` and `message` properties
    pub fn error(kind: &str, message: impl AsRef<str>) -> Self {
        Value::object([
            ("name", Value::string(kind)),
            ("message", Value::string(message)),
        ])
    }

    pub fn native(name: &str, arity: usize, function: NativeFn) -> Self {
        Value::Function(Callable::Native(Rc::new(NativeFunction {
            name: name.to_string(),
            arity,
            function,
        })))
    }

    /// Wrap `target` with a fixed receiver and prefix arguments
    pub fn bound(target: Callable, receiver: Value, prefix: Vec<Value>) -> Self {
        Value::Function(Callable::Bound(Rc::new(BoundCallTarget {
            target,
            receiver,
            prefix,
        })))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }

    /// Check if this value is truthy (for conditionals and logical operators)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Strict equality: primitives by value, everything else by identity
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Read a named property. `None` means the read itself is invalid
    /// (property access on `undefined` or `null`).
    pub fn get_property(&self, name: &str) -> Option<Value> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Object(map) => Some(map.borrow().get(name).cloned().unwrap_or(Value::Undefined)),
            Value::Array(items) if name == "length" => Some(Value::Number(items.borrow().len() as f64)),
            Value::String(s) if name == "length" => Some(Value::Number(s.chars().count() as f64)),
            Value::Function(callable) if name == "name" => Some(Value::string(callable.name())),
            _ => Some(Value::Undefined),
        }
    }

    /// Read an indexed element; non-integral or out-of-range indices give `undefined`
    pub fn get_index(&self, index: &Value) -> Option<Value> {
        match (self, index) {
            (Value::Array(items), Value::Number(n)) => {
                if n.fract() != 0.0 || *n < 0.0 {
                    return Some(Value::Undefined);
                }
                Some(items.borrow().get(*n as usize).cloned().unwrap_or(Value::Undefined))
            }
            (_, Value::String(key)) => self.get_property(key),
            (Value::Undefined | Value::Null, _) => None,
            _ => Some(Value::Undefined),
        }
    }

    /// Convert to string representation (for concatenation and printing)
    pub fn to_string_repr(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(Value::to_string_repr)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(map) => {
                let map = map.borrow();
                match (map.get("name"), map.get("message")) {
                    (Some(name), Some(message)) => {
                        format!("{}: {}", name.to_string_repr(), message.to_string_repr())
                    }
                    _ => "[object Object]".to_string(),
                }
            }
            Value::Function(callable) => format!("function {}", callable.name()),
        }
    }

    /// Convert to display string (for CLI output and diagnostics, more detailed)
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            Value::Array(items) => {
                let items: Vec<String> = items.borrow().iter().map(Value::to_display_string).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Object(map) => {
                let entries: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.to_display_string()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            _ => self.to_string_repr(),
        }
    }

    // Arithmetic operations

    /// Addition: numeric when both operands are numbers, concatenation otherwise
    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::Boolean(_) | Value::Undefined | Value::Null, Value::Number(_))
            | (Value::Number(_), Value::Boolean(_) | Value::Undefined | Value::Null) => {
                Value::Number(self.to_number() + other.to_number())
            }
            _ => Value::string(format!("{}{}", self.to_string_repr(), other.to_string_repr())),
        }
    }

    /// Numeric conversion used by arithmetic and comparison operators
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_repr())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
