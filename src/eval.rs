// ABOUTME: The evaluator: dispatch rules, special operators, function and
// ABOUTME: generic-function application, and non-local exit handling. Every
// ABOUTME: entry point returns an EvalOutcome rather than raising a host
// ABOUTME: exception, so non-local transfer (block/catch/tagbody/condition)
// ABOUTME: threads through ordinary `?` propagation.

use std::rc::Rc;

use crate::condition;
use crate::env::Environment;
use crate::generic::{self, Method, NextMethodCursor};
use crate::interpreter::Interpreter;
use crate::special_forms;
use crate::symbol::Symbol;
use crate::transfer::{new_block_id, new_tagbody_id, EvalOutcome, Transfer};
use crate::value::{Function, Value};

/// Evaluates `expr` in `env`. Tail positions (the branch of `if`, the last
/// form of `progn`/a lambda body, and a direct function-call tail call) are
/// handled by reassigning the loop variables instead of recursing, so
/// self-recursive tail calls run in constant stack space.
pub fn eval(expr: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> EvalOutcome {
    let mut expr = expr.clone();
    let mut env = env.clone();
    loop {
        match expr {
            Value::Null => return Ok(Value::Null),
            Value::Symbol(ref sym) => {
                if is_keyword(sym) || *sym == crate::symbol::well_known::t() {
                    return Ok(expr);
                }
                return match env.get_variable(sym) {
                    Some(v) => Ok(v),
                    None => match interp.get_dynamic(sym) {
                        Some(v) => Ok(v),
                        None => Err(Transfer::Condition(condition::make_undefined_variable(interp, sym))),
                    },
                };
            }
            Value::Cons(ref cell) => {
                let head = cell.car.borrow().clone();
                let rest = cell.cdr.borrow().clone();

                if let Value::Symbol(ref op) = head {
                    let op_name = op.name();
                    if let Some(tail) = special_forms::dispatch(op_name, &rest, &env, interp)? {
                        match tail {
                            special_forms::Outcome::Value(v) => return Ok(v),
                            special_forms::Outcome::Tail(next_expr, next_env) => {
                                expr = next_expr;
                                env = next_env;
                                continue;
                            }
                        }
                    }

                    if let Some(macro_fn) = env.get_macro(op) {
                        let args = rest.to_vec().ok_or_else(|| improper_list_error(interp, &rest))?;
                        let expanded = apply(&macro_fn, args, interp)?;
                        expr = expanded;
                        continue;
                    }

                    let func = match env.get_function(op) {
                        Some(f) => f,
                        None => return Err(Transfer::Condition(condition::make_undefined_function(interp, op))),
                    };
                    let args = eval_list(&rest, &env, interp)?;
                    match tail_call(&func, args, interp)? {
                        TailOutcome::Value(v) => return Ok(v),
                        TailOutcome::Tail(next_expr, next_env) => {
                            expr = next_expr;
                            env = next_env;
                            continue;
                        }
                    }
                }

                // ((lambda (...) ...) args...) literal application.
                let func = eval(&head, &env, interp)?;
                let args = eval_list(&rest, &env, interp)?;
                match tail_call(&func, args, interp)? {
                    TailOutcome::Value(v) => return Ok(v),
                    TailOutcome::Tail(next_expr, next_env) => {
                        expr = next_expr;
                        env = next_env;
                        continue;
                    }
                }
            }
            // Self-evaluating atoms.
            other => return Ok(other),
        }
    }
}

fn is_keyword(sym: &Symbol) -> bool {
    sym.name().starts_with(':')
}

pub fn improper_list_error(interp: &Rc<Interpreter>, value: &Value) -> Transfer {
    Transfer::Condition(condition::make_domain_error(interp, value.clone(), "<list>"))
}

pub fn eval_list(list: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Vec<Value>, Transfer> {
    let items = list.to_vec().ok_or_else(|| improper_list_error(interp, list))?;
    items.iter().map(|v| eval(v, env, interp)).collect()
}

/// Evaluates every form but the last, then returns the last form's
/// evaluated value — used for `progn`-shaped bodies.
pub fn eval_body(forms: &[Value], env: &Rc<Environment>, interp: &Rc<Interpreter>) -> EvalOutcome {
    if forms.is_empty() {
        return Ok(Value::Null);
    }
    for form in &forms[..forms.len() - 1] {
        eval(form, env, interp)?;
    }
    eval(&forms[forms.len() - 1], env, interp)
}

pub(crate) enum TailOutcome {
    Value(Value),
    Tail(Value, Rc<Environment>),
}

/// Applies `func`, but if it is a user-defined lambda, returns its body's
/// last form and the call's new environment as a tail position for `eval`'s
/// trampoline instead of recursing.
pub(crate) fn tail_call(func: &Value, args: Vec<Value>, interp: &Rc<Interpreter>) -> Result<TailOutcome, Transfer> {
    match func {
        Value::Function(f) => match f.as_ref() {
            Function::Lambda {
                params,
                rest,
                body,
                env: closure_env,
                ..
            } => {
                let call_env = bind_params(params, rest.as_ref(), &args, closure_env, interp)?;
                if body.is_empty() {
                    return Ok(TailOutcome::Value(Value::Null));
                }
                for form in &body[..body.len() - 1] {
                    eval(form, &call_env, interp)?;
                }
                Ok(TailOutcome::Tail(body[body.len() - 1].clone(), call_env))
            }
            Function::Builtin { .. } => Ok(TailOutcome::Value(apply(func, args, interp)?)),
        },
        Value::GenericFunction(gf) => Ok(TailOutcome::Value(generic::invoke(&gf.borrow(), args, interp)?)),
        other => Err(Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<function>",
        ))),
    }
}

/// Calls `func` and always returns a final value, never a tail position —
/// used anywhere the caller isn't itself in `eval`'s trampoline loop
/// (builtins, `apply`, macro expansion, method dispatch).
pub fn apply(func: &Value, args: Vec<Value>, interp: &Rc<Interpreter>) -> EvalOutcome {
    match func {
        Value::Function(f) => match f.as_ref() {
            Function::Lambda {
                params,
                rest,
                body,
                env: closure_env,
                ..
            } => {
                let call_env = bind_params(params, rest.as_ref(), &args, closure_env, interp)?;
                eval_body(body, &call_env, interp)
            }
            Function::Builtin {
                name,
                min_args,
                max_args,
                func,
            } => {
                check_arity(name, *min_args, *max_args, args.len(), interp)?;
                func(&args, interp)
            }
        },
        Value::GenericFunction(gf) => generic::invoke(&gf.borrow(), args, interp),
        other => Err(Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<function>",
        ))),
    }
}

pub fn call_method(
    method: &Rc<Method>,
    args: &[Value],
    interp: &Rc<Interpreter>,
    cursor: Option<Rc<NextMethodCursor>>,
) -> EvalOutcome {
    let call_env = bind_params(&method.params, method.rest.as_ref(), args, &method.env, interp)?;
    if let Some(cursor) = cursor {
        CURSORS.with(|stack| stack.borrow_mut().push(cursor));
        let result = eval_body(&method.body, &call_env, interp);
        CURSORS.with(|stack| stack.borrow_mut().pop());
        result
    } else {
        eval_body(&method.body, &call_env, interp)
    }
}

thread_local! {
    static CURSORS: std::cell::RefCell<Vec<Rc<NextMethodCursor>>> = const { std::cell::RefCell::new(Vec::new()) };
}

pub fn call_next_method(args: &[Value], interp: &Rc<Interpreter>) -> EvalOutcome {
    let cursor = CURSORS.with(|stack| stack.borrow().last().cloned());
    match cursor {
        Some(c) => c.call_next(args, interp),
        None => Err(Transfer::Condition(condition::make_control_error(
            interp,
            "call-next-method used outside a method",
        ))),
    }
}

pub fn next_method_p() -> bool {
    CURSORS.with(|stack| stack.borrow().last().map(|c| c.has_next()).unwrap_or(false))
}

pub fn bind_params(
    params: &[Symbol],
    rest: Option<&Symbol>,
    args: &[Value],
    parent: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Rc<Environment>, Transfer> {
    if (rest.is_none() && args.len() != params.len()) || args.len() < params.len() {
        return Err(Transfer::Condition(condition::make_control_error(
            interp,
            &format!("expected {} argument(s), got {}", params.len(), args.len()),
        )));
    }
    let call_env = Environment::with_parent(parent);
    for (param, value) in params.iter().zip(args.iter()) {
        call_env.define_variable(param.clone(), value.clone());
    }
    if let Some(rest_name) = rest {
        call_env.define_variable(rest_name.clone(), Value::list(args[params.len()..].to_vec()));
    }
    Ok(call_env)
}

fn check_arity(
    name: &str,
    min_args: usize,
    max_args: Option<usize>,
    actual: usize,
    interp: &Rc<Interpreter>,
) -> Result<(), Transfer> {
    let ok = actual >= min_args && max_args.map(|m| actual <= m).unwrap_or(true);
    if ok {
        Ok(())
    } else {
        let expected = match max_args {
            Some(max) if max == min_args => min_args.to_string(),
            Some(max) => format!("{min_args}-{max}"),
            None => format!("at least {min_args}"),
        };
        let internal = crate::error::EvalError::arity_error(name, expected, actual);
        Err(Transfer::Condition(condition::make_control_error(interp, &internal.to_string())))
    }
}

pub fn new_block() -> crate::transfer::BlockId {
    new_block_id()
}

pub fn new_tagbody() -> crate::transfer::TagbodyId {
    new_tagbody_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_one;

    fn eval_str(src: &str) -> Value {
        let interp = Interpreter::new();
        let form = read_one(src).unwrap();
        eval(&form, &interp.global, &interp).unwrap()
    }

    #[test]
    fn self_evaluating_integer() {
        match eval_str("42") {
            Value::Integer(n) => assert_eq!(n, 42),
            _ => panic!("expected Integer(42)"),
        }
    }

    #[test]
    fn quote_returns_form_unevaluated() {
        match eval_str("(quote (a b c))") {
            Value::Cons(_) => {}
            other => panic!("expected a cons, got {other}"),
        }
    }

    #[test]
    fn if_picks_the_true_branch() {
        match eval_str("(if t 1 2)") {
            Value::Integer(n) => assert_eq!(n, 1),
            _ => panic!("expected 1"),
        }
    }

    #[test]
    fn if_picks_the_false_branch_on_nil() {
        match eval_str("(if nil 1 2)") {
            Value::Integer(n) => assert_eq!(n, 2),
            _ => panic!("expected 2"),
        }
    }

    #[test]
    fn block_return_from_short_circuits() {
        match eval_str("(block foo (+ 1 (return-from foo 42) 99))") {
            Value::Integer(n) => assert_eq!(n, 42),
            other => panic!("expected 42, got {other}"),
        }
    }

    #[test]
    fn catch_throw_short_circuits() {
        match eval_str("(catch (quote k) (+ 1 (throw (quote k) 7)))") {
            Value::Integer(n) => assert_eq!(n, 7),
            other => panic!("expected 7, got {other}"),
        }
    }

    #[test]
    fn let_bindings_shadow_lexically() {
        match eval_str("(let ((x 1)) (let ((x 2)) x))") {
            Value::Integer(n) => assert_eq!(n, 2),
            other => panic!("expected 2, got {other}"),
        }
    }

    #[test]
    fn tail_recursive_function_does_not_overflow() {
        let interp = Interpreter::new();
        let countdown =
            read_one("(defun countdown (n) (if (= n 0) (quote done) (countdown (- n 1))))").unwrap();
        eval(&countdown, &interp.global, &interp).unwrap();
        let call = read_one("(countdown 100000)").unwrap();
        match eval(&call, &interp.global, &interp).unwrap() {
            Value::Symbol(s) => assert_eq!(s.name(), "done"),
            other => panic!("expected done, got {other}"),
        }
    }
}
