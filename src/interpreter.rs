//! Top-level interpreter state: the global environment, the class registry,
//! and the dynamic-extent handler stack the condition system walks.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::classes::ClassRegistry;
use crate::env::Environment;
use crate::symbol::Symbol;
use crate::value::Value;

pub struct Interpreter {
    pub global: Rc<Environment>,
    pub classes: ClassRegistry,
    /// Installed `with-handler` functions, innermost last.
    pub handlers: RefCell<Vec<Value>>,
    /// How many entries of `handlers`, from the bottom, are currently
    /// visible to `signal-condition` — shrunk while a handler itself runs,
    /// so a condition signaled from inside a handler skips that handler.
    pub active_limit: Cell<usize>,
    /// Dynamic-variable bindings, one stack per symbol — genuinely dynamic
    /// in extent, visible to any callee regardless of lexical nesting.
    dynamics: RefCell<HashMap<Symbol, Vec<Value>>>,
}

impl Interpreter {
    pub fn new() -> Rc<Interpreter> {
        let interp = Rc::new(Interpreter {
            global: Environment::new(),
            classes: ClassRegistry::new(),
            handlers: RefCell::new(Vec::new()),
            active_limit: Cell::new(usize::MAX),
            dynamics: RefCell::new(HashMap::new()),
        });
        crate::builtins::register_builtins(&interp);
        interp
    }

    pub fn visible_handler_count(&self) -> usize {
        self.active_limit.get().min(self.handlers.borrow().len())
    }

    pub fn push_handler(&self, handler: Value) {
        self.handlers.borrow_mut().push(handler);
    }

    pub fn pop_handler(&self) {
        self.handlers.borrow_mut().pop();
    }

    pub fn push_dynamic(&self, name: Symbol, value: Value) {
        self.dynamics.borrow_mut().entry(name).or_default().push(value);
    }

    pub fn pop_dynamic(&self, name: &Symbol) {
        if let Some(stack) = self.dynamics.borrow_mut().get_mut(name) {
            stack.pop();
        }
    }

    pub fn get_dynamic(&self, name: &Symbol) -> Option<Value> {
        self.dynamics.borrow().get(name).and_then(|s| s.last().cloned())
    }

    pub fn set_dynamic(&self, name: &Symbol, value: Value) -> bool {
        match self.dynamics.borrow_mut().get_mut(name).and_then(|s| s.last_mut()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
