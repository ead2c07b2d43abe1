// ABOUTME: Quasiquote expansion. User-defined macros are plain functions
// ABOUTME: stored in the environment's macro namespace (see special_forms'
// ABOUTME: defmacro handler); only the quasiquote reader-macro's expansion
// ABOUTME: logic lives here.

use std::rc::Rc;

use crate::env::Environment;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::transfer::EvalOutcome;
use crate::value::Value;

/// Expands a quasiquoted form at `depth` nesting levels, evaluating
/// `unquote`/`unquote-splicing` forms once depth reaches zero.
pub fn quasiquote(form: &Value, depth: u32, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> EvalOutcome {
    match form {
        Value::Cons(cell) => {
            let head = cell.car.borrow().clone();
            let tail = cell.cdr.borrow().clone();

            if let Value::Symbol(s) = &head {
                if s.name() == "unquote" {
                    let inner = tail.car().unwrap_or(Value::Null);
                    return if depth == 1 {
                        eval::eval(&inner, env, interp)
                    } else {
                        Ok(Value::cons(
                            Value::symbol("unquote"),
                            Value::cons(quasiquote(&inner, depth - 1, env, interp)?, Value::Null),
                        ))
                    };
                }
                if s.name() == "quasiquote" {
                    let inner = tail.car().unwrap_or(Value::Null);
                    return Ok(Value::cons(
                        Value::symbol("quasiquote"),
                        Value::cons(quasiquote(&inner, depth + 1, env, interp)?, Value::Null),
                    ));
                }
            }

            // unquote-splicing in head position
            if let Value::Cons(head_cell) = &head {
                let inner_head = head_cell.car.borrow().clone();
                if let Value::Symbol(s) = &inner_head {
                    if s.name() == "unquote-splicing" && depth == 1 {
                        let splice_form = head_cell.cdr.borrow().car().unwrap_or(Value::Null);
                        let spliced = eval::eval(&splice_form, env, interp)?;
                        let rest = quasiquote(&tail, depth, env, interp)?;
                        return Ok(append(spliced, rest));
                    }
                }
            }

            let new_head = quasiquote(&head, depth, env, interp)?;
            let new_tail = quasiquote(&tail, depth, env, interp)?;
            Ok(Value::cons(new_head, new_tail))
        }
        Value::Vector(v) => {
            let items: Result<Vec<Value>, _> =
                v.borrow().iter().map(|item| quasiquote(item, depth, env, interp)).collect();
            Ok(Value::vector(items?))
        }
        other => Ok(other.clone()),
    }
}

fn append(list: Value, tail: Value) -> Value {
    match list.to_vec() {
        Some(items) => {
            let mut result = tail;
            for item in items.into_iter().rev() {
                result = Value::cons(item, result);
            }
            result
        }
        None => list,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::reader::read_one;
    use crate::symbol::intern;

    #[test]
    fn quasiquote_without_unquote_is_like_quote() {
        let interp = Interpreter::new();
        let form = read_one("(quasiquote (a b c))").unwrap();
        let result = eval::eval(&form, &interp.global, &interp).unwrap();
        assert_eq!(result.to_vec().unwrap().len(), 3);
    }

    #[test]
    fn unquote_evaluates_inner_form() {
        let interp = Interpreter::new();
        interp.global.define_variable(intern("x"), Value::Integer(5));
        let form = read_one("(quasiquote (a (unquote x) c))").unwrap();
        let result = eval::eval(&form, &interp.global, &interp).unwrap();
        let items = result.to_vec().unwrap();
        match &items[1] {
            Value::Integer(n) => assert_eq!(*n, 5),
            other => panic!("expected 5, got {other}"),
        }
    }
}
