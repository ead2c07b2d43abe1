// ABOUTME: Lexical environment: the frame chain backing every namespace
// ABOUTME: the evaluator resolves names in (variable, function, macro, class,
// ABOUTME: dynamic-variable, block-tag, tagbody-tag).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::symbol::Symbol;
use crate::transfer::{BlockId, TagbodyId};
use crate::value::Value;

#[derive(Default)]
struct Frame {
    variables: HashMap<Symbol, Value>,
    functions: HashMap<Symbol, Value>,
    macros: HashMap<Symbol, Value>,
    classes: HashMap<Symbol, Value>,
    blocks: HashMap<Symbol, BlockId>,
    tags: HashMap<Symbol, (TagbodyId, usize)>,
}

/// A lexical frame, parent-linked so closures can capture it by reference.
/// Variable, function, macro and class bindings are genuinely lexical;
/// block/tagbody-tag bindings piggyback on the same chain (closure capture
/// gives them correct behavior under shadowing). Dynamic variables are
/// *not* kept here — they live on a separate dynamic-extent stack on
/// `Interpreter`, since their visibility must cross lexical boundaries.
pub struct Environment {
    frame: RefCell<Frame>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            frame: RefCell::new(Frame::default()),
            parent: None,
        })
    }

    pub fn with_parent(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            frame: RefCell::new(Frame::default()),
            parent: Some(parent.clone()),
        })
    }

    pub fn define_variable(&self, name: Symbol, value: Value) {
        self.frame.borrow_mut().variables.insert(name, value);
    }

    pub fn get_variable(&self, name: &Symbol) -> Option<Value> {
        if let Some(v) = self.frame.borrow().variables.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_variable(name))
    }

    /// Mutates the nearest binding of `name`, walking outward. Returns
    /// `false` if no binding exists anywhere in the chain.
    pub fn set_variable(&self, name: &Symbol, value: Value) -> bool {
        if self.frame.borrow().variables.contains_key(name) {
            self.frame.borrow_mut().variables.insert(name.clone(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.set_variable(name, value),
            None => false,
        }
    }

    pub fn define_function(&self, name: Symbol, value: Value) {
        self.frame.borrow_mut().functions.insert(name, value);
    }

    pub fn get_function(&self, name: &Symbol) -> Option<Value> {
        if let Some(v) = self.frame.borrow().functions.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_function(name))
    }

    pub fn define_macro(&self, name: Symbol, value: Value) {
        self.frame.borrow_mut().macros.insert(name, value);
    }

    pub fn get_macro(&self, name: &Symbol) -> Option<Value> {
        if let Some(v) = self.frame.borrow().macros.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_macro(name))
    }

    pub fn define_class(&self, name: Symbol, value: Value) {
        self.frame.borrow_mut().classes.insert(name, value);
    }

    pub fn get_class(&self, name: &Symbol) -> Option<Value> {
        if let Some(v) = self.frame.borrow().classes.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_class(name))
    }

    pub fn bind_block(&self, name: Symbol, id: BlockId) {
        self.frame.borrow_mut().blocks.insert(name, id);
    }

    pub fn get_block(&self, name: &Symbol) -> Option<BlockId> {
        if let Some(v) = self.frame.borrow().blocks.get(name) {
            return Some(*v);
        }
        self.parent.as_ref().and_then(|p| p.get_block(name))
    }

    pub fn bind_tag(&self, name: Symbol, id: TagbodyId, index: usize) {
        self.frame.borrow_mut().tags.insert(name, (id, index));
    }

    pub fn get_tag(&self, name: &Symbol) -> Option<(TagbodyId, usize)> {
        if let Some(v) = self.frame.borrow().tags.get(name) {
            return Some(*v);
        }
        self.parent.as_ref().and_then(|p| p.get_tag(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::intern;

    #[test]
    fn define_and_get_variable() {
        let env = Environment::new();
        env.define_variable(intern("x"), Value::Integer(42));
        match env.get_variable(&intern("x")) {
            Some(Value::Integer(n)) => assert_eq!(n, 42),
            _ => panic!("expected Integer(42)"),
        }
    }

    #[test]
    fn undefined_variable_is_none() {
        let env = Environment::new();
        assert!(env.get_variable(&intern("undefined")).is_none());
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::new();
        parent.define_variable(intern("x"), Value::Integer(1));
        let child = Environment::with_parent(&parent);
        child.define_variable(intern("x"), Value::Integer(2));
        match child.get_variable(&intern("x")) {
            Some(Value::Integer(n)) => assert_eq!(n, 2),
            _ => panic!("expected Integer(2)"),
        }
        match parent.get_variable(&intern("x")) {
            Some(Value::Integer(n)) => assert_eq!(n, 1),
            _ => panic!("parent unaffected"),
        }
    }

    #[test]
    fn child_sees_parent_binding() {
        let parent = Environment::new();
        parent.define_variable(intern("x"), Value::Integer(7));
        let child = Environment::with_parent(&parent);
        match child.get_variable(&intern("x")) {
            Some(Value::Integer(n)) => assert_eq!(n, 7),
            _ => panic!("expected Integer(7)"),
        }
    }

    #[test]
    fn set_variable_mutates_outer_binding() {
        let parent = Environment::new();
        parent.define_variable(intern("x"), Value::Integer(1));
        let child = Environment::with_parent(&parent);
        assert!(child.set_variable(&intern("x"), Value::Integer(9)));
        match parent.get_variable(&intern("x")) {
            Some(Value::Integer(n)) => assert_eq!(n, 9),
            _ => panic!("expected Integer(9)"),
        }
    }

    #[test]
    fn namespaces_are_independent() {
        let env = Environment::new();
        let name = intern("foo");
        env.define_variable(name.clone(), Value::Integer(1));
        env.define_function(name.clone(), Value::Integer(2));
        assert!(env.get_variable(&name).is_some());
        assert!(env.get_function(&name).is_some());
        assert!(env.get_macro(&name).is_none());
    }

    #[test]
    fn block_ids_resolve_through_lexical_chain() {
        use crate::transfer::new_block_id;
        let outer = Environment::new();
        let id = new_block_id();
        outer.bind_block(intern("foo"), id);
        let inner = Environment::with_parent(&outer);
        assert_eq!(inner.get_block(&intern("foo")), Some(id));
    }

    #[test]
    fn tag_ids_resolve_through_lexical_chain() {
        use crate::transfer::new_tagbody_id;
        let outer = Environment::new();
        let id = new_tagbody_id();
        outer.bind_tag(intern("loop"), id, 3);
        let inner = Environment::with_parent(&outer);
        assert_eq!(inner.get_tag(&intern("loop")), Some((id, 3)));
    }
}
