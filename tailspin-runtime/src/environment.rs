//! Lexical scopes for the Tailspin runtime.
//!
//! Scopes are reference counted so closures can keep the scope they were
//! created in alive after the activation that created it is gone.
//!
//! A closure bound in the scope it captures forms a reference cycle with
//! that scope. [`Scope::release`] breaks the cycle once the scope is
//! abandoned and nothing else can reach it.

use crate::value::{Callable, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A handle to one lexical scope and, through it, its parent chain
#[derive(Clone)]
pub struct Scope(Rc<ScopeInner>);

struct ScopeInner {
    /// Variable name to value mapping
    variables: RefCell<HashMap<String, Value>>,
    parent: Option<Scope>,
}

impl Scope {
    /// Create a root scope
    pub fn new() -> Self {
        Scope(Rc::new(ScopeInner {
            variables: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// Create a scope nested inside this one
    pub fn child(&self) -> Self {
        Scope(Rc::new(ScopeInner {
            variables: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Define (or redefine) a variable in this scope
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.variables.borrow_mut().insert(name.into(), value);
    }

    /// Look a variable up, searching outwards through parent scopes
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.0.variables.borrow().get(name) {
                return Some(value.clone());
            }
            scope = current.0.parent.as_ref();
        }
        None
    }

    /// Update the nearest existing binding. Returns false if none exists.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let mut variables = current.0.variables.borrow_mut();
            if let Some(slot) = variables.get_mut(name) {
                *slot = value;
                return true;
            }
            drop(variables);
            scope = current.0.parent.as_ref();
        }
        false
    }

    /// Check whether this scope itself binds `name`
    pub fn binds_locally(&self, name: &str) -> bool {
        self.0.variables.borrow().contains_key(name)
    }

    /// Whether both handles refer to the same scope
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this scope, including closures that
    /// captured it and child scopes
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Drop this scope's bindings if the only things keeping it alive are
    /// this handle and closures it binds that nothing else holds
    ///
    /// Returns false when such a closure or the scope itself is still
    /// reachable from elsewhere, in which case nothing is dropped.
    pub fn release(&self) -> bool {
        let mut captured = 0;
        for value in self.0.variables.borrow().values() {
            if let Value::Function(Callable::Script(closure)) = value {
                if closure.environment.ptr_eq(self) {
                    if Rc::strong_count(closure) > 1 {
                        return false;
                    }
                    captured += 1;
                }
            }
        }

        if captured == 0 {
            return true;
        }
        if Rc::strong_count(&self.0) != captured + 1 {
            return false;
        }

        let bindings = self.0.variables.take();
        drop(bindings);
        true
    }

    /// Number of scopes from here to the root, inclusive
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.0.parent.as_ref();
        while let Some(current) = scope {
            depth += 1;
            scope = current.0.parent.as_ref();
        }
        depth
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.0.variables.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("variables", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parent_chain() {
        let root = Scope::new();
        root.define("x", Value::from(42));

        let inner = root.child();
        inner.define("y", Value::from(1));

        assert_eq!(inner.get("x"), Some(Value::from(42)));
        assert_eq!(inner.get("y"), Some(Value::from(1)));
        assert_eq!(root.get("y"), None);
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn test_shadowing() {
        let root = Scope::new();
        root.define("x", Value::from(1));
        let inner = root.child();
        inner.define("x", Value::from("local"));

        assert_eq!(inner.get("x"), Some(Value::from("local")));
        assert_eq!(root.get("x"), Some(Value::from(1)));
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let root = Scope::new();
        root.define("counter", Value::from(0));
        let inner = root.child();

        assert!(inner.assign("counter", Value::from(5)));
        assert_eq!(root.get("counter"), Some(Value::from(5)));
        assert!(!inner.assign("missing", Value::Undefined));
        assert!(!inner.binds_locally("counter"));
    }

    fn closure_in(scope: &Scope, name: &str) -> Value {
        Value::Function(Callable::Script(Rc::new(crate::value::Closure {
            name: name.to_string(),
            declaration: crate::ast::function(name, &[], vec![]),
            environment: scope.clone(),
            lexical_this: None,
        })))
    }

    #[test]
    fn test_release_breaks_closure_cycle() {
        let root = Scope::new();
        let local = root.child();
        local.define("helper", closure_in(&local, "helper"));
        assert_eq!(root.handle_count(), 2);

        assert!(local.release());
        drop(local);
        assert_eq!(root.handle_count(), 1);
    }

    #[test]
    fn test_release_keeps_escaping_closures_intact() {
        let root = Scope::new();
        let local = root.child();
        local.define("x", Value::from(1));
        let helper = closure_in(&local, "helper");
        local.define("helper", helper.clone());

        assert!(!local.release());
        assert_eq!(local.get("x"), Some(Value::from(1)));

        // The escaped closure alone keeps the scope alive
        drop(helper);
        assert!(local.release());
        assert!(!local.binds_locally("x"));
    }

    #[test]
    fn test_release_keeps_scopes_shared_with_children() {
        let root = Scope::new();
        root.define("helper", closure_in(&root, "helper"));
        let child = root.child();

        assert!(!root.release());
        assert!(root.binds_locally("helper"));
        drop(child);
        assert!(root.release());
    }
}
