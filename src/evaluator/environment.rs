use crate::EvalError;
use crate::ast::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Environment for variable bindings.
///
/// An `Environment` is a cheap handle: cloning it aliases the same frame, which is
/// how closures share the environment they carry. The parent link is a weak
/// back-reference used only for lookup; it never keeps the parent alive.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Frame>>);

#[derive(Default)]
struct Frame {
    bindings: BTreeMap<String, Value>,
    parent: Option<Weak<RefCell<Frame>>>,
}

impl Environment {
    /// Create a root environment with no bindings
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create an empty environment chained to `parent` for lookup
    pub fn with_parent(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            bindings: BTreeMap::new(),
            parent: Some(Rc::downgrade(&parent.0)),
        })))
    }

    fn parent(&self) -> Option<Environment> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Environment)
    }

    /// Look `name` up through the parent chain, returning a copy of the bound value
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.0.borrow().bindings.get(name) {
            return Ok(value.clone());
        }
        match self.parent() {
            Some(parent) => parent.lookup(name),
            None => Err(EvalError::Unbound(name.to_owned())),
        }
    }

    /// Insert or overwrite a binding in this environment only
    pub fn define_local(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Insert or overwrite a binding in the root of the parent chain
    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.root().define_local(name, value);
    }

    /// The outermost environment reachable from this one
    pub fn root(&self) -> Environment {
        let mut env = self.clone();
        while let Some(parent) = env.parent() {
            env = parent;
        }
        env
    }

    /// Bindings held directly by this environment, sorted by name
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Get all bindings in this environment and its parents.
    /// Local bindings shadow parent bindings; the result is sorted by name.
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: BTreeMap<String, Value> = match self.parent() {
            Some(parent) => parent.get_all_bindings().into_iter().collect(),
            None => BTreeMap::new(),
        };
        for (name, value) in self.local_bindings() {
            bindings.insert(name, value);
        }
        bindings.into_iter().collect()
    }

    /// Names visible from this environment, sorted and without duplicates
    pub fn bound_names(&self) -> Vec<String> {
        self.get_all_bindings()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    #[cfg(test)]
    fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        f.debug_struct("Environment")
            .field("bindings", &frame.bindings.keys().collect::<Vec<_>>())
            .field("has_parent", &frame.parent.is_some())
            .finish()
    }
}
