//! Symbol-namespace operations: `symbol-name`, `gensym`, `intern`.

use std::rc::Rc;

use crate::condition;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "symbol-name", 1, Some(1), |args, interp| match &args[0] {
        Value::Symbol(s) => Ok(Value::string(s.name())),
        other => Err(crate::transfer::Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<symbol>",
        ))),
    });

    super::define(interp, "gensym", 0, Some(1), |args, interp| {
        let prefix = match args.first() {
            Some(Value::String(s)) => s.borrow().clone(),
            Some(other) => {
                return Err(crate::transfer::Transfer::Condition(condition::make_domain_error(
                    interp,
                    other.clone(),
                    "<string>",
                )))
            }
            None => "G".to_string(),
        };
        Ok(Value::Symbol(crate::symbol::gensym(&prefix)))
    });

    super::define(interp, "intern", 1, Some(1), |args, interp| match &args[0] {
        Value::String(s) => Ok(Value::Symbol(crate::symbol::intern(&s.borrow()))),
        other => Err(crate::transfer::Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<string>",
        ))),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gensym_produces_distinct_symbols_each_call() {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern("gensym")).unwrap();
        let a = crate::eval::apply(&f, vec![], &interp).unwrap();
        let b = crate::eval::apply(&f, vec![], &interp).unwrap();
        assert!(!a.eq(&b));
    }

    #[test]
    fn symbol_name_returns_the_printed_name() {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern("symbol-name")).unwrap();
        let result = crate::eval::apply(&f, vec![Value::symbol("foo")], &interp).unwrap();
        match result {
            Value::String(s) => assert_eq!(*s.borrow(), "foo"),
            other => panic!("expected a string, got {other}"),
        }
    }
}
