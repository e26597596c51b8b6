use crate::types::Object;
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// One lexical scope. Scopes are shared through `Rc`: a closure keeps the scope
/// it was created in alive, and each call scope keeps its enclosing scope alive.
#[derive(Default)]
pub struct Environment {
    data: RefCell<HashMap<String, Object>>,
    constants: RefCell<HashSet<String>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn spawn_from(outer: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            outer: Some(outer.clone()),
            ..Self::default()
        })
    }

    /// Looks `name` up here and then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.data.borrow().get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.data.borrow().contains_key(name)
    }

    pub fn set(&self, name: impl Into<String>, value: Object) -> Object {
        self.data.borrow_mut().insert(name.into(), value.clone());
        value
    }

    pub fn set_const(&self, name: impl Into<String>, value: Object) -> Object {
        let name = name.into();
        self.constants.borrow_mut().insert(name.clone());
        self.set(name, value)
    }

    pub fn is_const(&self, name: &str) -> bool {
        self.constants.borrow().contains(name)
    }

    pub(crate) fn outer(&self) -> Option<&Rc<Environment>> {
        self.outer.as_ref()
    }

    pub(crate) fn values(&self) -> Vec<Object> {
        self.data.borrow().values().cloned().collect()
    }

    /// Drops every binding. Only for scopes nothing can reach any more.
    pub(crate) fn clear(&self) {
        let data = std::mem::take(&mut *self.data.borrow_mut());
        self.constants.borrow_mut().clear();
        drop(data);
    }

    /// The nearest scope, starting with this one, in which `name` is bound.
    pub fn owner(self: &Rc<Self>, name: &str) -> Option<Rc<Environment>> {
        let mut env = self;
        loop {
            if env.contains_local(name) {
                return Some(env.clone());
            }
            env = env.outer.as_ref()?;
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.data.borrow().keys().sorted().join(", "))?;
        if let Some(outer) = &self.outer {
            write!(f, " -> {}", outer)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Environment {
    // Not derived: the values may include closures over this very environment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment{}", self)
    }
}
