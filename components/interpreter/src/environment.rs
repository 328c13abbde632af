//! Lexical scopes.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
struct ScopeData {
    bindings: HashMap<String, Binding>,
    parent: Option<Scope>,
    /// `this` for function (and global) scopes; arrow and block scopes have none
    this_value: Option<Value>,
}

/// Outcome of assigning to a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignResult {
    /// Binding found and updated
    Assigned,
    /// Binding found but declared `const`
    Constant,
    /// No binding in any scope
    Unresolved,
}

/// A lexical scope; cloning shares the same bindings.
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<ScopeData>>);

impl Scope {
    /// Creates a root scope with the given `this`.
    pub fn root(this_value: Value) -> Self {
        Scope(Rc::new(RefCell::new(ScopeData {
            this_value: Some(this_value),
            ..ScopeData::default()
        })))
    }

    /// Creates a nested block scope.
    pub fn child(&self) -> Self {
        Scope(Rc::new(RefCell::new(ScopeData {
            parent: Some(self.clone()),
            ..ScopeData::default()
        })))
    }

    /// Creates a function scope. `None` for arrows, which see the outer `this`.
    pub fn function(&self, this_value: Option<Value>) -> Self {
        Scope(Rc::new(RefCell::new(ScopeData {
            parent: Some(self.clone()),
            this_value,
            ..ScopeData::default()
        })))
    }

    /// Declares (or redeclares) a binding in this scope.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// Returns true if this scope itself declares `name`.
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Resolves `name` along the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let data = scope.0.borrow();
            if let Some(binding) = data.bindings.get(name) {
                return Some(binding.value.clone());
            }
            current = data.parent.clone();
        }
        None
    }

    /// Assigns to the nearest binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> AssignResult {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let mut data = scope.0.borrow_mut();
            if let Some(binding) = data.bindings.get_mut(name) {
                if !binding.mutable {
                    return AssignResult::Constant;
                }
                binding.value = value;
                return AssignResult::Assigned;
            }
            current = data.parent.clone();
        }
        AssignResult::Unresolved
    }

    /// The `this` value of the nearest function scope.
    pub fn this_value(&self) -> Value {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let data = scope.0.borrow();
            if let Some(this) = &data.this_value {
                return this.clone();
            }
            current = data.parent.clone();
        }
        Value::Undefined
    }

    /// Copies this scope's bindings into a fresh sibling scope (per-iteration
    /// `let` bindings in `for` loops).
    pub fn copy_for_iteration(&self) -> Self {
        let data = self.0.borrow();
        Scope(Rc::new(RefCell::new(ScopeData {
            bindings: data.bindings.clone(),
            parent: data.parent.clone(),
            this_value: data.this_value.clone(),
        })))
    }

    /// Drops every binding.
    pub fn clear(&self) {
        let bindings = std::mem::take(&mut self.0.borrow_mut().bindings);
        drop(bindings);
    }
}
