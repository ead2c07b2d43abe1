//! Arithmetic operations: `+`, `-`, `*`, `/`, `mod`, `quotient`. Each is
//! variadic over a mix of `<integer>` and `<float>` arguments, promoting to
//! float if any argument is a float.

use std::rc::Rc;

use crate::condition;
use crate::interpreter::Interpreter;
use crate::transfer::Transfer;
use crate::value::Value;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Value, interp: &Rc<Interpreter>) -> Result<Num, Transfer> {
    match v {
        Value::Integer(n) => Ok(Num::Int(*n)),
        Value::Float(x) => Ok(Num::Float(*x)),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<number>"))),
    }
}

fn to_value(n: Num) -> Value {
    match n {
        Num::Int(i) => Value::Integer(i),
        Num::Float(x) => Value::Float(x),
    }
}

fn add(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Num::Int(x + y),
        (Num::Float(x), Num::Float(y)) => Num::Float(x + y),
        (Num::Int(x), Num::Float(y)) | (Num::Float(y), Num::Int(x)) => Num::Float(x as f64 + y),
    }
}

fn sub(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Num::Int(x - y),
        (Num::Float(x), Num::Float(y)) => Num::Float(x - y),
        (Num::Int(x), Num::Float(y)) => Num::Float(x as f64 - y),
        (Num::Float(x), Num::Int(y)) => Num::Float(x - y as f64),
    }
}

fn mul(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Num::Int(x * y),
        (Num::Float(x), Num::Float(y)) => Num::Float(x * y),
        (Num::Int(x), Num::Float(y)) | (Num::Float(y), Num::Int(x)) => Num::Float(x as f64 * y),
    }
}

fn div(interp: &Rc<Interpreter>, a: Num, b: Num) -> Result<Num, Transfer> {
    let is_zero = matches!(b, Num::Int(0)) || matches!(b, Num::Float(x) if x == 0.0);
    if is_zero {
        return Err(Transfer::Condition(condition::make_division_by_zero(
            interp,
            "/",
            vec![to_value(a), to_value(b)],
        )));
    }
    Ok(match (a, b) {
        (Num::Int(x), Num::Int(y)) if x % y == 0 => Num::Int(x / y),
        (Num::Int(x), Num::Int(y)) => Num::Float(x as f64 / y as f64),
        (Num::Float(x), Num::Float(y)) => Num::Float(x / y),
        (Num::Int(x), Num::Float(y)) => Num::Float(x as f64 / y),
        (Num::Float(x), Num::Int(y)) => Num::Float(x / y as f64),
    })
}

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "+", 0, None, |args, interp| {
        let mut acc = Num::Int(0);
        for a in args {
            acc = add(acc, as_num(a, interp)?);
        }
        Ok(to_value(acc))
    });

    super::define(interp, "-", 1, None, |args, interp| {
        let first = as_num(&args[0], interp)?;
        if args.len() == 1 {
            return Ok(to_value(sub(Num::Int(0), first)));
        }
        let mut acc = first;
        for a in &args[1..] {
            acc = sub(acc, as_num(a, interp)?);
        }
        Ok(to_value(acc))
    });

    super::define(interp, "*", 0, None, |args, interp| {
        let mut acc = Num::Int(1);
        for a in args {
            acc = mul(acc, as_num(a, interp)?);
        }
        Ok(to_value(acc))
    });

    super::define(interp, "/", 1, None, |args, interp| {
        let first = as_num(&args[0], interp)?;
        if args.len() == 1 {
            return Ok(to_value(div(interp, Num::Int(1), first)?));
        }
        let mut acc = first;
        for a in &args[1..] {
            acc = div(interp, acc, as_num(a, interp)?)?;
        }
        Ok(to_value(acc))
    });

    super::define(interp, "mod", 2, Some(2), |args, interp| {
        let (x, y) = (int_arg(&args[0], interp)?, int_arg(&args[1], interp)?);
        if y == 0 {
            return Err(Transfer::Condition(condition::make_division_by_zero(interp, "mod", args.to_vec())));
        }
        Ok(Value::Integer(x.rem_euclid(y)))
    });

    super::define(interp, "quotient", 2, Some(2), |args, interp| {
        let (x, y) = (int_arg(&args[0], interp)?, int_arg(&args[1], interp)?);
        if y == 0 {
            return Err(Transfer::Condition(condition::make_division_by_zero(interp, "quotient", args.to_vec())));
        }
        Ok(Value::Integer(x / y))
    });
}

fn int_arg(v: &Value, interp: &Rc<Interpreter>) -> Result<i64, Transfer> {
    match v {
        Value::Integer(n) => Ok(*n),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<integer>"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>, interp: &Rc<Interpreter>) -> Value {
        let f = interp.global.get_function(&crate::symbol::intern(name)).unwrap();
        crate::eval::apply(&f, args, interp).unwrap()
    }

    #[test]
    fn addition_sums_all_args() {
        let interp = Interpreter::new();
        match call("+", vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)], &interp) {
            Value::Integer(n) => assert_eq!(n, 6),
            other => panic!("expected 6, got {other}"),
        }
    }

    #[test]
    fn division_by_zero_signals_condition() {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern("/")).unwrap();
        let result = crate::eval::apply(&f, vec![Value::Integer(1), Value::Integer(0)], &interp);
        assert!(result.is_err());
    }

    #[test]
    fn mixed_int_and_float_promotes_to_float() {
        let interp = Interpreter::new();
        match call("+", vec![Value::Integer(1), Value::Float(0.5)], &interp) {
            Value::Float(x) => assert_eq!(x, 1.5),
            other => panic!("expected 1.5, got {other}"),
        }
    }
}
