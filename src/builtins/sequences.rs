//! Sequence operations spanning both lists and general vectors: `length`,
//! `elt`, `aref`, `set-elt`/`set-aref`, `subseq`, `map-into`.

use std::rc::Rc;

use crate::condition;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::transfer::Transfer;
use crate::value::Value;

fn as_index(v: &Value, interp: &Rc<Interpreter>) -> Result<usize, Transfer> {
    match v {
        Value::Integer(n) if *n >= 0 => Ok(*n as usize),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<integer>"))),
    }
}

fn seq_len(v: &Value, interp: &Rc<Interpreter>) -> Result<usize, Transfer> {
    match v {
        Value::Vector(items) => Ok(items.borrow().len()),
        Value::String(s) => Ok(s.borrow().chars().count()),
        Value::Null => Ok(0),
        Value::Cons(_) => v
            .to_vec()
            .map(|items| items.len())
            .ok_or_else(|| Transfer::Condition(condition::make_domain_error(interp, v.clone(), "<list>"))),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<sequence>"))),
    }
}

fn elt_of(target: &Value, index: usize, interp: &Rc<Interpreter>) -> Result<Value, Transfer> {
    match target {
        Value::Vector(items) => items
            .borrow()
            .get(index)
            .cloned()
            .ok_or_else(|| Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), Value::Integer(index as i64)))),
        Value::String(s) => s
            .borrow()
            .chars()
            .nth(index)
            .map(Value::Character)
            .ok_or_else(|| Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), Value::Integer(index as i64)))),
        Value::Null | Value::Cons(_) => target.iter_list().nth(index).ok_or_else(|| {
            Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), Value::Integer(index as i64)))
        }),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<sequence>"))),
    }
}

/// Mutates `target` in place at `index`, used by `setf`'s `elt`/`aref` places.
pub fn set_elt(target: &Value, index: &Value, value: Value, interp: &Rc<Interpreter>) -> Result<(), Transfer> {
    let i = as_index(index, interp)?;
    match target {
        Value::Vector(items) => {
            let mut items = items.borrow_mut();
            if i >= items.len() {
                return Err(Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), index.clone())));
            }
            items[i] = value;
            Ok(())
        }
        Value::String(s) => {
            let ch = match value {
                Value::Character(c) => c,
                other => return Err(Transfer::Condition(condition::make_domain_error(interp, other, "<character>"))),
            };
            let mut chars: Vec<char> = s.borrow().chars().collect();
            if i >= chars.len() {
                return Err(Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), index.clone())));
            }
            chars[i] = ch;
            *s.borrow_mut() = chars.into_iter().collect();
            Ok(())
        }
        Value::Cons(_) => {
            let mut cur = target.clone();
            for _ in 0..i {
                cur = cur.cdr().ok_or_else(|| {
                    Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), index.clone()))
                })?;
            }
            if !cur.is_cons() {
                return Err(Transfer::Condition(condition::make_index_out_of_range(interp, target.clone(), index.clone())));
            }
            cur.set_car(value);
            Ok(())
        }
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<sequence>"))),
    }
}

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "length", 1, Some(1), |args, interp| {
        Ok(Value::Integer(seq_len(&args[0], interp)? as i64))
    });

    super::define(interp, "elt", 2, Some(2), |args, interp| {
        let i = as_index(&args[1], interp)?;
        elt_of(&args[0], i, interp)
    });

    super::define(interp, "aref", 2, Some(2), |args, interp| {
        let i = as_index(&args[1], interp)?;
        elt_of(&args[0], i, interp)
    });

    super::define(interp, "set-elt", 3, Some(3), |args, interp| {
        set_elt(&args[0], &args[1], args[2].clone(), interp)?;
        Ok(args[2].clone())
    });

    super::define(interp, "subseq", 3, Some(3), |args, interp| {
        let z1 = as_index(&args[1], interp)?;
        let z2 = as_index(&args[2], interp)?;
        if z1 > z2 || z2 > seq_len(&args[0], interp)? {
            return Err(Transfer::Condition(condition::make_index_out_of_range(interp, args[0].clone(), args[2].clone())));
        }
        match &args[0] {
            Value::Vector(items) => Ok(Value::vector(items.borrow()[z1..z2].to_vec())),
            Value::String(s) => {
                let chars: Vec<char> = s.borrow().chars().collect();
                Ok(Value::string(chars[z1..z2].iter().collect::<String>()))
            }
            Value::Null | Value::Cons(_) => {
                let items = args[0].to_vec().unwrap();
                Ok(Value::list(items[z1..z2].to_vec()))
            }
            other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<sequence>"))),
        }
    });

    super::define(interp, "map-into", 2, None, |args, interp| {
        let target = &args[0];
        let func = &args[1];
        let sources: Vec<Vec<Value>> = args[2..]
            .iter()
            .map(|s| {
                s.to_vec()
                    .or_else(|| match s {
                        Value::Vector(v) => Some(v.borrow().clone()),
                        _ => None,
                    })
                    .ok_or_else(|| Transfer::Condition(condition::make_domain_error(interp, s.clone(), "<sequence>")))
            })
            .collect::<Result<_, _>>()?;
        let n = seq_len(target, interp)?.min(sources.iter().map(|s| s.len()).min().unwrap_or(0));
        for i in 0..n {
            let call_args: Vec<Value> = sources.iter().map(|s| s[i].clone()).collect();
            let result = eval::apply(func, call_args, interp)?;
            set_elt(target, &Value::Integer(i as i64), result, interp)?;
        }
        Ok(target.clone())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Value {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern(name)).unwrap();
        crate::eval::apply(&f, args, &interp).unwrap()
    }

    #[test]
    fn length_of_vector_and_list() {
        assert!(matches!(call("length", vec![Value::vector(vec![Value::Integer(1), Value::Integer(2)])]), Value::Integer(2)));
        assert!(matches!(
            call("length", vec![Value::list(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])]),
            Value::Integer(3)
        ));
    }

    #[test]
    fn subseq_bounds_are_inclusive_exclusive() {
        let v = Value::vector(vec![Value::Integer(0), Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let result = call("subseq", vec![v, Value::Integer(1), Value::Integer(3)]);
        match result {
            Value::Vector(items) => assert_eq!(items.borrow().len(), 2),
            other => panic!("expected a vector, got {other}"),
        }
    }

    #[test]
    fn subseq_out_of_range_signals_condition() {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern("subseq")).unwrap();
        let v = Value::vector(vec![Value::Integer(0)]);
        let result = crate::eval::apply(&f, vec![v, Value::Integer(0), Value::Integer(5)], &interp);
        assert!(result.is_err());
    }

    #[test]
    fn set_elt_mutates_vector_in_place() {
        let interp = Interpreter::new();
        let v = Value::vector(vec![Value::Integer(1), Value::Integer(2)]);
        set_elt(&v, &Value::Integer(0), Value::Integer(99), &interp).unwrap();
        match &v {
            Value::Vector(items) => assert!(matches!(items.borrow()[0], Value::Integer(99))),
            _ => unreachable!(),
        }
    }
}
