//! Public entry point for running programs.

use crate::ast::{FunctionDecl, Program};
use crate::builtins::register_builtins;
use crate::call_stack::CallStack;
use crate::config::InterpreterConfig;
use crate::control_flow::Abrupt;
use crate::environment::Scope;
use crate::error::{Result, RuntimeError};
use crate::evaluator::Evaluator;
use crate::stack_trace::StackTrace;
use crate::tail_position::validate_function;
use crate::value::{Callable, Closure, NativeFn, Value};
use std::rc::Rc;

/// The main interpreter: global scope, call stack and configuration
#[derive(Debug)]
pub struct Interpreter {
    config: InterpreterConfig,

    /// Activation records of the run in progress
    call_stack: CallStack,

    /// Builtins and loaded top-level functions
    globals: Scope,
}

impl Interpreter {
    /// Create a new interpreter with the default configuration
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::new())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        tracing::debug!(
            target: "tailspin::config",
            max_call_depth = config.max_call_depth,
            tail_call_elimination = config.tail_call_elimination,
            "creating interpreter"
        );

        let globals = Scope::new();
        register_builtins(&globals);

        Self {
            call_stack: CallStack::with_max_depth(config.max_call_depth),
            config,
            globals,
        }
    }

    /// Validate every function in `program` and install them as globals
    ///
    /// Nothing is installed if any function fails validation.
    pub fn load(&mut self, program: &Program) -> Result<()> {
        for decl in &program.functions {
            validate_function(decl)?;
        }

        for decl in &program.functions {
            let closure = self.global_closure(decl);
            self.globals
                .define(closure.name.clone(), Value::Function(Callable::Script(closure)));
        }
        Ok(())
    }

    /// Install a native function as a global
    pub fn define_native(&mut self, name: &str, arity: usize, function: NativeFn) {
        self.globals.define(name, Value::native(name, arity, function));
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.define(name, value);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Call the global function `name` with `arguments`
    pub fn call_global(&mut self, name: &str, arguments: Vec<Value>) -> Result<Value> {
        match self.global(name) {
            Some(Value::Function(target)) => self.call_value(&target, Value::Undefined, arguments),
            Some(other) => Err(RuntimeError::NotCallable {
                found: other.type_name().to_string(),
            }),
            None => Err(RuntimeError::undefined_function(name)),
        }
    }

    /// Call `target` from outside any script function
    pub fn call_value(
        &mut self,
        target: &Callable,
        receiver: Value,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let outcome =
            Evaluator::new(&mut self.call_stack, &self.config).call_value(target, receiver, arguments);

        match outcome {
            Ok(value) => Ok(value),
            Err(Abrupt::Throw(exception)) => Err(RuntimeError::uncaught(&exception)),
            Err(Abrupt::Fault(error)) => {
                tracing::debug!(
                    target: "tailspin::frames",
                    depth = self.call_stack.depth(),
                    %error,
                    "run aborted"
                );
                self.call_stack.clear();
                Err(error)
            }
            Err(other) => {
                self.call_stack.clear();
                Err(RuntimeError::internal(format!(
                    "completion escaped its function: {other:?}"
                )))
            }
        }
    }

    /// Load `program` and call its `entry` function without arguments
    pub fn run(&mut self, program: &Program, entry: &str) -> Result<Value> {
        self.load(program)?;
        self.call_global(entry, Vec::new())
    }

    /// Live records, innermost first
    pub fn stack_trace(&self) -> StackTrace<'_> {
        self.call_stack.stack_trace()
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    fn global_closure(&self, decl: &Rc<FunctionDecl>) -> Rc<Closure> {
        Rc::new(Closure {
            name: decl.display_name().to_string(),
            declaration: Rc::clone(decl),
            environment: self.globals.clone(),
            lexical_this: decl.is_arrow().then_some(Value::Undefined),
        })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
