//! Symbol interning.
//!
//! ISLISP requires `eq` on symbols with the same name to be true, so every
//! symbol is looked up in a process-wide table and shared as an `Rc<str>`.
//! Comparing symbols is then a pointer comparison, not a string compare.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Eq)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

thread_local! {
    static TABLE: RefCell<HashMap<Rc<str>, Symbol>> = RefCell::new(HashMap::new());
}

/// Interns `name`, returning the canonical `Symbol` for it.
pub fn intern(name: &str) -> Symbol {
    TABLE.with(|table| {
        let mut table = table.borrow_mut();
        if let Some(sym) = table.get(name) {
            return sym.clone();
        }
        let rc: Rc<str> = Rc::from(name);
        let sym = Symbol(rc.clone());
        table.insert(rc, sym.clone());
        sym
    })
}

thread_local! {
    static GENSYM_COUNTER: std::cell::Cell<u64> = const { std::cell::Cell::new(0) };
}

/// Produces a fresh, uninterned symbol printed as `prefix` followed by a
/// counter. Not entered into the interning table, so it is `eq` to nothing
/// but itself even if another symbol shares its printed name.
pub fn gensym(prefix: &str) -> Symbol {
    let n = GENSYM_COUNTER.with(|c| {
        let next = c.get() + 1;
        c.set(next);
        next
    });
    Symbol(Rc::from(format!("{prefix}{n}")))
}

/// Well-known symbols used throughout the evaluator, interned once.
pub mod well_known {
    use super::{intern, Symbol};
    use std::cell::RefCell;

    thread_local! {
        static T: RefCell<Option<Symbol>> = RefCell::new(None);
        static QUOTE: RefCell<Option<Symbol>> = RefCell::new(None);
    }

    pub fn t() -> Symbol {
        T.with(|cell| cell.borrow_mut().get_or_insert_with(|| intern("t")).clone())
    }

    pub fn quote() -> Symbol {
        QUOTE.with(|cell| {
            cell.borrow_mut()
                .get_or_insert_with(|| intern("quote"))
                .clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_name_gives_identical_symbol() {
        let a = intern("foo");
        let b = intern("foo");
        assert_eq!(a, b);
        assert!(Rc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn distinct_names_are_distinct() {
        assert_ne!(intern("foo"), intern("bar"));
    }

    #[test]
    fn well_known_t_is_interned() {
        assert_eq!(well_known::t(), intern("t"));
    }
}
