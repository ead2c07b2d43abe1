//! List operations: `cons`, `car`, `cdr`, `set-car`, `set-cdr`, `list`,
//! `append`, `reverse`, `nth`, `nthcdr`, `member`, `mapcar`, `mapc`.

use std::rc::Rc;

use crate::condition;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::transfer::Transfer;
use crate::value::Value;

fn require_cons<'a>(v: &'a Value, interp: &Rc<Interpreter>) -> Result<&'a Value, Transfer> {
    if v.is_cons() {
        Ok(v)
    } else {
        Err(Transfer::Condition(condition::make_domain_error(interp, v.clone(), "<cons>")))
    }
}

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "cons", 2, Some(2), |args, _| {
        Ok(Value::cons(args[0].clone(), args[1].clone()))
    });

    super::define(interp, "car", 1, Some(1), |args, interp| {
        Ok(require_cons(&args[0], interp)?.car().unwrap())
    });

    super::define(interp, "cdr", 1, Some(1), |args, interp| {
        Ok(require_cons(&args[0], interp)?.cdr().unwrap())
    });

    super::define(interp, "set-car", 2, Some(2), |args, interp| {
        require_cons(&args[0], interp)?;
        args[0].set_car(args[1].clone());
        Ok(args[1].clone())
    });

    super::define(interp, "set-cdr", 2, Some(2), |args, interp| {
        require_cons(&args[0], interp)?;
        args[0].set_cdr(args[1].clone());
        Ok(args[1].clone())
    });

    super::define(interp, "list", 0, None, |args, _| Ok(Value::list(args.to_vec())));

    super::define(interp, "append", 0, None, |args, interp| {
        if args.is_empty() {
            return Ok(Value::Null);
        }
        let mut result = args[args.len() - 1].clone();
        for list in args[..args.len() - 1].iter().rev() {
            let items = list
                .to_vec()
                .ok_or_else(|| Transfer::Condition(condition::make_domain_error(interp, list.clone(), "<list>")))?;
            for item in items.into_iter().rev() {
                result = Value::cons(item, result);
            }
        }
        Ok(result)
    });

    super::define(interp, "reverse", 1, Some(1), |args, interp| {
        let items = args[0]
            .to_vec()
            .ok_or_else(|| Transfer::Condition(condition::make_domain_error(interp, args[0].clone(), "<list>")))?;
        Ok(Value::list(items.into_iter().rev().collect::<Vec<_>>()))
    });

    super::define(interp, "nth", 2, Some(2), |args, interp| {
        let n = as_index(&args[0], interp)?;
        Ok(args[1].iter_list().nth(n).unwrap_or(Value::Null))
    });

    super::define(interp, "nthcdr", 2, Some(2), |args, interp| {
        let n = as_index(&args[0], interp)?;
        let mut cur = args[1].clone();
        for _ in 0..n {
            cur = cur.cdr().unwrap_or(Value::Null);
        }
        Ok(cur)
    });

    super::define(interp, "member", 2, Some(2), |args, _| {
        let mut cur = args[1].clone();
        loop {
            match cur.car() {
                Some(head) if head.equal(&args[0]) => return Ok(cur),
                Some(_) => cur = cur.cdr().unwrap_or(Value::Null),
                None => return Ok(Value::Null),
            }
        }
    });

    super::define(interp, "mapcar", 2, None, |args, interp| {
        let func = &args[0];
        let lists: Vec<Vec<Value>> = args[1..]
            .iter()
            .map(|l| {
                l.to_vec()
                    .ok_or_else(|| Transfer::Condition(condition::make_domain_error(interp, l.clone(), "<list>")))
            })
            .collect::<Result<_, _>>()?;
        let len = lists.iter().map(|l| l.len()).min().unwrap_or(0);
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let call_args: Vec<Value> = lists.iter().map(|l| l[i].clone()).collect();
            out.push(eval::apply(func, call_args, interp)?);
        }
        Ok(Value::list(out))
    });

    super::define(interp, "mapc", 2, None, |args, interp| {
        let func = &args[0];
        let lists: Vec<Vec<Value>> = args[1..]
            .iter()
            .map(|l| {
                l.to_vec()
                    .ok_or_else(|| Transfer::Condition(condition::make_domain_error(interp, l.clone(), "<list>")))
            })
            .collect::<Result<_, _>>()?;
        let len = lists.iter().map(|l| l.len()).min().unwrap_or(0);
        for i in 0..len {
            let call_args: Vec<Value> = lists.iter().map(|l| l[i].clone()).collect();
            eval::apply(func, call_args, interp)?;
        }
        Ok(args[1].clone())
    });
}

fn as_index(v: &Value, interp: &Rc<Interpreter>) -> Result<usize, Transfer> {
    match v {
        Value::Integer(n) if *n >= 0 => Ok(*n as usize),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<integer>"))),
    }
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
    fn cons_car_cdr_roundtrip() {
        let pair = call("cons", vec![Value::Integer(1), Value::Integer(2)]);
        assert!(matches!(call("car", vec![pair.clone()]), Value::Integer(1)));
        assert!(matches!(call("cdr", vec![pair]), Value::Integer(2)));
    }

    #[test]
    fn car_of_non_cons_signals_domain_error() {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern("car")).unwrap();
        let result = crate::eval::apply(&f, vec![Value::Integer(5)], &interp);
        assert!(result.is_err());
    }

    #[test]
    fn append_preserves_order_and_shares_last_argument() {
        let a = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::list(vec![Value::Integer(3)]);
        let result = call("append", vec![a, b]);
        assert_eq!(result.to_vec().unwrap().len(), 3);
    }

    #[test]
    fn mapcar_applies_function_across_parallel_lists() {
        let interp = Interpreter::new();
        let plus = interp.global.get_function(&crate::symbol::intern("+")).unwrap();
        let a = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::list(vec![Value::Integer(10), Value::Integer(20)]);
        let mapcar = interp.global.get_function(&crate::symbol::intern("mapcar")).unwrap();
        let result = crate::eval::apply(&mapcar, vec![plus, a, b], &interp).unwrap();
        let items = result.to_vec().unwrap();
        assert!(matches!(items[0], Value::Integer(11)));
        assert!(matches!(items[1], Value::Integer(22)));
    }
}
