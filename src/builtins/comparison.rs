//! Numeric relations `=`, `<`, `>`, `<=`, `>=` (each variadic, chained
//! pairwise) and the three identity predicates `eq`, `eql`, `equal`.

use std::rc::Rc;

use crate::condition;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn as_f64(v: &Value, interp: &Rc<Interpreter>) -> Result<f64, crate::transfer::Transfer> {
    match v {
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(crate::transfer::Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<number>",
        ))),
    }
}

fn chained(
    args: &[Value],
    interp: &Rc<Interpreter>,
    cmp: impl Fn(f64, f64) -> bool,
) -> Result<Value, crate::transfer::Transfer> {
    for pair in args.windows(2) {
        let a = as_f64(&pair[0], interp)?;
        let b = as_f64(&pair[1], interp)?;
        if !cmp(a, b) {
            return Ok(Value::Null);
        }
    }
    Ok(Value::t())
}

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "=", 1, None, |args, interp| chained(args, interp, |a, b| a == b));
    super::define(interp, "<", 1, None, |args, interp| chained(args, interp, |a, b| a < b));
    super::define(interp, ">", 1, None, |args, interp| chained(args, interp, |a, b| a > b));
    super::define(interp, "<=", 1, None, |args, interp| chained(args, interp, |a, b| a <= b));
    super::define(interp, ">=", 1, None, |args, interp| chained(args, interp, |a, b| a >= b));

    super::define(interp, "eq", 2, Some(2), |args, _interp| {
        Ok(Value::from_bool(args[0].eq(&args[1])))
    });
    super::define(interp, "eql", 2, Some(2), |args, _interp| {
        Ok(Value::from_bool(args[0].eql(&args[1])))
    });
    super::define(interp, "equal", 2, Some(2), |args, _interp| {
        Ok(Value::from_bool(args[0].equal(&args[1])))
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
    fn chained_less_than_requires_strictly_ascending() {
        assert!(call("<", vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]).is_true());
        assert!(!call("<", vec![Value::Integer(1), Value::Integer(1)]).is_true());
    }

    #[test]
    fn eq_is_not_equal_for_distinct_conses_with_same_contents() {
        let a = Value::cons(Value::Integer(1), Value::Null);
        let b = Value::cons(Value::Integer(1), Value::Null);
        assert!(!call("eq", vec![a.clone(), b.clone()]).is_true());
        assert!(call("equal", vec![a, b]).is_true());
    }
}
