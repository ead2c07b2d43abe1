//! Condition-system entry points exposed as callable functions: `error`,
//! `cerror`, `signal-condition`, `continue-condition`, `report-condition`,
//! plus the method-combination helpers `call-next-method`/`next-method-p`.

use std::rc::Rc;

use crate::condition;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn string_arg(v: &Value, interp: &Rc<Interpreter>) -> Result<String, crate::transfer::Transfer> {
    match v {
        Value::String(s) => Ok(s.borrow().clone()),
        other => Err(crate::transfer::Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<string>",
        ))),
    }
}

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "error", 1, None, |args, interp| {
        let fmt = string_arg(&args[0], interp)?;
        condition::error(interp, &fmt, args[1..].to_vec())
    });

    super::define(interp, "cerror", 2, None, |args, interp| {
        let continue_fmt = string_arg(&args[0], interp)?;
        let fmt = string_arg(&args[1], interp)?;
        condition::cerror(interp, &continue_fmt, &fmt, args[2..].to_vec())
    });

    super::define(interp, "signal-condition", 2, Some(2), |args, interp| {
        condition::signal_condition(interp, args[0].clone(), args[1].clone())
    });

    super::define(interp, "continue-condition", 1, Some(2), |args, _interp| {
        let value = args.get(1).cloned().unwrap_or(Value::Null);
        condition::continue_condition(&args[0], value)
    });

    super::define(interp, "report-condition", 1, Some(1), |args, _interp| {
        Ok(Value::string(condition::report_condition(&args[0])))
    });

    super::define(interp, "call-next-method", 0, None, |args, interp| {
        eval::call_next_method(args, interp)
    });

    super::define(interp, "next-method-p", 0, Some(0), |_args, _interp| {
        Ok(Value::from_bool(eval::next_method_p()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_builtin_signals_an_unhandled_condition() {
        let interp = Interpreter::new();
        let f = interp.global.get_function(&crate::symbol::intern("error")).unwrap();
        let result = crate::eval::apply(&f, vec![Value::string("bad thing")], &interp);
        assert!(result.is_err());
    }

    #[test]
    fn report_condition_mentions_the_format_string() {
        let interp = Interpreter::new();
        let condition = condition::make_simple_error(&interp, "oops", vec![]);
        let f = interp.global.get_function(&crate::symbol::intern("report-condition")).unwrap();
        let result = crate::eval::apply(&f, vec![condition], &interp).unwrap();
        match result {
            Value::String(s) => assert!(s.borrow().contains("oops")),
            other => panic!("expected a string, got {other}"),
        }
    }
}
