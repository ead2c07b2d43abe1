// ABOUTME: The special-operator table — binding, control, quotation,
// ABOUTME: non-local-exit, condition, definition, assignment, and type
// ABOUTME: forms. Each handler either produces a final Value or a tail
// ABOUTME: position handed back to `eval`'s trampoline loop.

use std::rc::Rc;

use crate::condition;
use crate::env::Environment;
use crate::eval::{self, improper_list_error};
use crate::generic::{GenericFunction, Method, Qualifier};
use crate::interpreter::Interpreter;
use crate::macros;
use crate::symbol::{intern, Symbol};
use crate::transfer::{EvalOutcome, Transfer};
use crate::value::{Function, Value};

pub enum Outcome {
    Value(Value),
    Tail(Value, Rc<Environment>),
}

fn val(v: Value) -> Result<Option<Outcome>, Transfer> {
    Ok(Some(Outcome::Value(v)))
}

fn tail(v: Value, env: Rc<Environment>) -> Result<Option<Outcome>, Transfer> {
    Ok(Some(Outcome::Tail(v, env)))
}

fn as_symbol(v: &Value) -> Option<Symbol> {
    match v {
        Value::Symbol(s) => Some(s.clone()),
        _ => None,
    }
}

fn args_of(rest: &Value, interp: &Rc<Interpreter>) -> Result<Vec<Value>, Transfer> {
    rest.to_vec().ok_or_else(|| improper_list_error(interp, rest))
}

pub fn dispatch(
    op: &str,
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    match op {
        "quote" => {
            let a = args_of(rest, interp)?;
            val(a.into_iter().next().unwrap_or(Value::Null))
        }
        "if" => if_form(rest, env, interp),
        "progn" => progn_form(rest, env, interp),
        "and" => and_form(rest, env, interp),
        "or" => or_form(rest, env, interp),
        "let" => let_form(rest, env, interp, false),
        "let*" => let_form(rest, env, interp, true),
        "flet" => flet_form(rest, env, interp, false),
        "labels" => flet_form(rest, env, interp, true),
        "dynamic-let" => dynamic_let_form(rest, env, interp),
        "cond" => cond_form(rest, env, interp),
        "case" => case_form(rest, env, interp),
        "case-using" => case_using_form(rest, env, interp),
        "while" => while_form(rest, env, interp),
        "for" => for_form(rest, env, interp),
        "lambda" => lambda_form(rest, env, interp, None),
        "function" => function_form(rest, env, interp),
        "block" => block_form(rest, env, interp),
        "return-from" => return_from_form(rest, env, interp),
        "tagbody" => tagbody_form(rest, env, interp),
        "go" => go_form(rest, env, interp),
        "catch" => catch_form(rest, env, interp),
        "throw" => throw_form(rest, env, interp),
        "unwind-protect" => unwind_protect_form(rest, env, interp),
        "with-handler" => with_handler_form(rest, env, interp),
        "defun" => defun_form(rest, env, interp),
        "defmacro" => defmacro_form(rest, env, interp),
        "defgeneric" => defgeneric_form(rest, env, interp),
        "defmethod" => defmethod_form(rest, env, interp),
        "defclass" => defclass_form(rest, env, interp),
        "defglobal" => defglobal_form(rest, env, interp),
        "defconstant" => defglobal_form(rest, env, interp),
        "defdynamic" => defdynamic_form(rest, env, interp),
        "dynamic" => dynamic_form(rest, interp),
        "setq" => setq_form(rest, env, interp),
        "setf" => setf_form(rest, env, interp),
        "the" | "assure" => the_form(rest, env, interp),
        "convert" => convert_form(rest, env, interp),
        "class" => class_form(rest, interp),
        "quasiquote" => val(macros::quasiquote(&args_of(rest, interp)?[0], 1, env, interp)?),
        _ => Ok(None),
    }
}

fn if_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    if forms.is_empty() {
        return Err(Transfer::Condition(condition::make_control_error(interp, "if: missing test")));
    }
    let test = eval::eval(&forms[0], env, interp)?;
    if test.is_true() {
        tail(forms.get(1).cloned().unwrap_or(Value::Null), env.clone())
    } else {
        match forms.get(2) {
            Some(else_form) => tail(else_form.clone(), env.clone()),
            None => val(Value::Null),
        }
    }
}

fn progn_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    body_tail(&forms, env, interp)
}

fn body_tail(forms: &[Value], env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    if forms.is_empty() {
        return val(Value::Null);
    }
    for form in &forms[..forms.len() - 1] {
        eval::eval(form, env, interp)?;
    }
    tail(forms[forms.len() - 1].clone(), env.clone())
}

fn and_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    if forms.is_empty() {
        return val(Value::t());
    }
    for form in &forms[..forms.len() - 1] {
        if !eval::eval(form, env, interp)?.is_true() {
            return val(Value::Null);
        }
    }
    tail(forms[forms.len() - 1].clone(), env.clone())
}

fn or_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    if forms.is_empty() {
        return val(Value::Null);
    }
    for form in &forms[..forms.len() - 1] {
        let v = eval::eval(form, env, interp)?;
        if v.is_true() {
            return val(v);
        }
    }
    tail(forms[forms.len() - 1].clone(), env.clone())
}

fn binding_pairs(bindings: &Value, interp: &Rc<Interpreter>) -> Result<Vec<(Symbol, Value)>, Transfer> {
    let items = args_of(bindings, interp)?;
    items
        .into_iter()
        .map(|pair| {
            let parts = args_of(&pair, interp)?;
            let name = as_symbol(&parts[0])
                .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "expected a symbol")))?;
            let init = parts.get(1).cloned().unwrap_or(Value::Null);
            Ok((name, init))
        })
        .collect()
}

fn let_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
    sequential: bool,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let pairs = binding_pairs(&forms[0], interp)?;
    let new_env = Environment::with_parent(env);
    if sequential {
        for (name, init) in pairs {
            let v = eval::eval(&init, &new_env, interp)?;
            new_env.define_variable(name, v);
        }
    } else {
        let evaluated: Vec<(Symbol, Value)> = pairs
            .into_iter()
            .map(|(name, init)| Ok((name, eval::eval(&init, env, interp)?)))
            .collect::<Result<_, Transfer>>()?;
        for (name, v) in evaluated {
            new_env.define_variable(name, v);
        }
    }
    body_tail(&forms[1..], &new_env, interp)
}

fn parse_lambda_list(list: &Value, interp: &Rc<Interpreter>) -> Result<(Vec<Symbol>, Option<Symbol>), Transfer> {
    let items = args_of(list, interp)?;
    let mut params = Vec::new();
    let mut rest = None;
    let mut i = 0;
    while i < items.len() {
        if let Value::Symbol(s) = &items[i] {
            if s.name() == ":rest" || s.name() == "&rest" {
                if let Some(r) = items.get(i + 1).and_then(as_symbol) {
                    rest = Some(r);
                }
                break;
            }
        }
        if let Some(name) = as_symbol(&items[i]) {
            params.push(name);
        }
        i += 1;
    }
    Ok((params, rest))
}

fn flet_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
    recursive: bool,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let defs = args_of(&forms[0], interp)?;
    let new_env = Environment::with_parent(env);
    let closure_env = if recursive { new_env.clone() } else { env.clone() };
    for def in defs {
        let parts = args_of(&def, interp)?;
        let name = as_symbol(&parts[0])
            .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "flet: expected a symbol")))?;
        let (params, vararg) = parse_lambda_list(&parts[1], interp)?;
        let body = parts[2..].to_vec();
        let func = Value::Function(Rc::new(Function::Lambda {
            name: Some(name.clone()),
            params,
            rest: vararg,
            body,
            env: closure_env.clone(),
        }));
        new_env.define_function(name, func);
    }
    body_tail(&forms[1..], &new_env, interp)
}

fn dynamic_let_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let pairs = binding_pairs(&forms[0], interp)?;
    let mut bound = Vec::new();
    for (name, init) in &pairs {
        let v = eval::eval(init, env, interp)?;
        interp.push_dynamic(name.clone(), v);
        bound.push(name.clone());
    }
    let result = eval::eval_body(&forms[1..], env, interp);
    for name in bound.iter().rev() {
        interp.pop_dynamic(name);
    }
    val(result?)
}

fn cond_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let clauses = args_of(rest, interp)?;
    for clause in clauses {
        let parts = args_of(&clause, interp)?;
        if parts.is_empty() {
            continue;
        }
        let test = eval::eval(&parts[0], env, interp)?;
        if test.is_true() {
            if parts.len() == 1 {
                return val(test);
            }
            return body_tail(&parts[1..], env, interp);
        }
    }
    val(Value::Null)
}

fn case_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let key = eval::eval(&forms[0], env, interp)?;
    for clause in &forms[1..] {
        let parts = args_of(clause, interp)?;
        let is_else = matches!(as_symbol(&parts[0]), Some(s) if s.name() == "t");
        let matched = is_else
            || parts[0]
                .to_vec()
                .unwrap_or_else(|| vec![parts[0].clone()])
                .iter()
                .any(|candidate| candidate.eql(&key));
        if matched {
            return body_tail(&parts[1..], env, interp);
        }
    }
    val(Value::Null)
}

fn case_using_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let predicate = eval::eval(&forms[0], env, interp)?;
    let key = eval::eval(&forms[1], env, interp)?;
    for clause in &forms[2..] {
        let parts = args_of(clause, interp)?;
        let is_else = matches!(as_symbol(&parts[0]), Some(s) if s.name() == "t");
        let candidates = parts[0].to_vec().unwrap_or_else(|| vec![parts[0].clone()]);
        let mut matched = is_else;
        for candidate in &candidates {
            let result = eval::apply(&predicate, vec![candidate.clone(), key.clone()], interp)?;
            if result.is_true() {
                matched = true;
                break;
            }
        }
        if matched {
            return body_tail(&parts[1..], env, interp);
        }
    }
    val(Value::Null)
}

fn while_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    while eval::eval(&forms[0], env, interp)?.is_true() {
        for body_form in &forms[1..] {
            eval::eval(body_form, env, interp)?;
        }
    }
    val(Value::Null)
}

fn for_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let specs = args_of(&forms[0], interp)?;
    let end_test_clause = args_of(&forms[1], interp)?;
    let body = &forms[2..];

    let new_env = Environment::with_parent(env);
    let mut steps = Vec::new();
    for spec in &specs {
        let parts = args_of(spec, interp)?;
        let name = as_symbol(&parts[0])
            .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "for: expected a symbol")))?;
        let init = eval::eval(&parts[1], env, interp)?;
        new_env.define_variable(name.clone(), init);
        if let Some(step) = parts.get(2) {
            steps.push((name, step.clone()));
        }
    }

    loop {
        if eval::eval(&end_test_clause[0], &new_env, interp)?.is_true() {
            return body_tail(&end_test_clause[1..], &new_env, interp);
        }
        for form in body {
            eval::eval(form, &new_env, interp)?;
        }
        let next: Vec<(Symbol, Value)> = steps
            .iter()
            .map(|(name, step)| Ok((name.clone(), eval::eval(step, &new_env, interp)?)))
            .collect::<Result<_, Transfer>>()?;
        for (name, v) in next {
            new_env.define_variable(name, v);
        }
    }
}

fn lambda_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
    name: Option<Symbol>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let (params, vararg) = parse_lambda_list(&forms[0], interp)?;
    val(Value::Function(Rc::new(Function::Lambda {
        name,
        params,
        rest: vararg,
        body: forms[1..].to_vec(),
        env: env.clone(),
    })))
}

fn function_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    match &forms[0] {
        Value::Symbol(name) => match env.get_function(name) {
            Some(f) => val(f),
            None => match env.get_variable(name) {
                Some(v @ Value::GenericFunction(_)) => val(v),
                _ => Err(Transfer::Condition(condition::make_undefined_function(interp, name))),
            },
        },
        Value::Cons(_) => {
            let inner = args_of(&forms[0], interp)?;
            if matches!(as_symbol(&inner[0]), Some(s) if s.name() == "lambda") {
                lambda_form(&Value::list(inner[1..].to_vec()), env, interp, None)
            } else {
                Err(Transfer::Condition(condition::make_control_error(interp, "function: not a function designator")))
            }
        }
        _ => Err(Transfer::Condition(condition::make_control_error(interp, "function: not a function designator"))),
    }
}

fn block_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "block: expected a symbol")))?;
    let id = eval::new_block();
    let new_env = Environment::with_parent(env);
    new_env.bind_block(name, id);
    match eval::eval_body(&forms[1..], &new_env, interp) {
        Ok(v) => val(v),
        Err(Transfer::Return(rid, v)) if rid == id => val(v),
        Err(other) => Err(other),
    }
}

fn return_from_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "return-from: expected a symbol")))?;
    let id = env
        .get_block(&name)
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, &format!("no enclosing block {name}"))))?;
    let value = match forms.get(1) {
        Some(f) => eval::eval(f, env, interp)?,
        None => Value::Null,
    };
    Err(Transfer::Return(id, value))
}

fn tagbody_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let id = eval::new_tagbody();
    let new_env = Environment::with_parent(env);
    for (i, form) in forms.iter().enumerate() {
        if let Some(tag) = as_symbol(form) {
            new_env.bind_tag(tag, id, i);
        }
    }
    let mut pc = 0;
    loop {
        if pc >= forms.len() {
            return val(Value::Null);
        }
        if as_symbol(&forms[pc]).is_some() {
            pc += 1;
            continue;
        }
        match eval::eval(&forms[pc], &new_env, interp) {
            Ok(_) => pc += 1,
            Err(Transfer::Go(gid, target)) if gid == id => pc = target,
            Err(other) => return Err(other),
        }
    }
}

fn go_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let tag = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "go: expected a tag")))?;
    let (id, index) = env
        .get_tag(&tag)
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, &format!("no enclosing tagbody tag {tag}"))))?;
    Err(Transfer::Go(id, index))
}

fn catch_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let tag = eval::eval(&forms[0], env, interp)?;
    match eval::eval_body(&forms[1..], env, interp) {
        Ok(v) => val(v),
        Err(Transfer::Throw(thrown_tag, v)) if thrown_tag.eql(&tag) => val(v),
        Err(other) => Err(other),
    }
}

fn throw_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let tag = eval::eval(&forms[0], env, interp)?;
    let value = match forms.get(1) {
        Some(f) => eval::eval(f, env, interp)?,
        None => Value::Null,
    };
    Err(Transfer::Throw(tag, value))
}

fn unwind_protect_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let result = eval::eval(&forms[0], env, interp);
    for cleanup in &forms[1..] {
        eval::eval(cleanup, env, interp)?;
    }
    val(result?)
}

fn with_handler_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let handler = eval::eval(&forms[0], env, interp)?;
    interp.push_handler(handler);
    let result = eval::eval_body(&forms[1..], env, interp);
    interp.pop_handler();
    val(result?)
}

fn defun_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defun: expected a symbol")))?;
    let (params, vararg) = parse_lambda_list(&forms[1], interp)?;
    let func = Value::Function(Rc::new(Function::Lambda {
        name: Some(name.clone()),
        params,
        rest: vararg,
        body: forms[2..].to_vec(),
        env: env.clone(),
    }));
    env.define_function(name.clone(), func);
    val(Value::Symbol(name))
}

fn defmacro_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defmacro: expected a symbol")))?;
    let (params, vararg) = parse_lambda_list(&forms[1], interp)?;
    let func = Value::Function(Rc::new(Function::Lambda {
        name: Some(name.clone()),
        params,
        rest: vararg,
        body: forms[2..].to_vec(),
        env: env.clone(),
    }));
    env.define_macro(name.clone(), func);
    val(Value::Symbol(name))
}

fn defgeneric_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defgeneric: expected a symbol")))?;
    let (params, _) = parse_lambda_list(&forms[1], interp)?;
    let gf = GenericFunction::new(name.to_string(), params.len());
    let value = Value::GenericFunction(Rc::new(std::cell::RefCell::new(gf)));
    env.define_variable(name.clone(), value.clone());
    env.define_function(name, value.clone());
    val(value)
}

fn defmethod_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defmethod: expected a symbol")))?;

    let mut idx = 1;
    let qualifier = match &forms[1] {
        Value::Symbol(s) if s.name() == ":around" => {
            idx += 1;
            Qualifier::Around
        }
        Value::Symbol(s) if s.name() == ":before" => {
            idx += 1;
            Qualifier::Before
        }
        Value::Symbol(s) if s.name() == ":after" => {
            idx += 1;
            Qualifier::After
        }
        _ => Qualifier::Primary,
    };

    let spec_list = args_of(&forms[idx], interp)?;
    let mut params = Vec::new();
    let mut specializers = Vec::new();
    for item in &spec_list {
        match item.to_vec() {
            Some(pair) if pair.len() == 2 => {
                params.push(as_symbol(&pair[0]).expect("parameter name"));
                let class_name = as_symbol(&pair[1]).expect("specializer class name");
                let class = interp
                    .classes
                    .lookup(class_name.name())
                    .unwrap_or_else(|| interp.classes.lookup("<object>").unwrap());
                specializers.push(class);
            }
            _ => {
                params.push(as_symbol(item).expect("parameter name"));
                specializers.push(interp.classes.lookup("<object>").unwrap());
            }
        }
    }

    let body = forms[idx + 1..].to_vec();
    let method = Rc::new(Method {
        qualifier,
        specializers,
        params,
        rest: None,
        body,
        env: env.clone(),
    });

    let gf_value = env
        .get_variable(&name)
        .filter(|v| matches!(v, Value::GenericFunction(_)))
        .unwrap_or_else(|| {
            let gf = GenericFunction::new(name.to_string(), method.specializers.len());
            let value = Value::GenericFunction(Rc::new(std::cell::RefCell::new(gf)));
            env.define_variable(name.clone(), value.clone());
            env.define_function(name.clone(), value.clone());
            value
        });
    if let Value::GenericFunction(gf) = &gf_value {
        gf.borrow_mut().add_method(method);
    }
    val(Value::Symbol(name))
}

fn defclass_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defclass: expected a symbol")))?;
    let super_names = args_of(&forms[1], interp)?;
    let slot_specs = args_of(&forms[2], interp)?;

    let mut direct_supers = Vec::new();
    for s in &super_names {
        if let Some(sym) = as_symbol(s) {
            if let Some(c) = interp.classes.lookup(sym.name()) {
                direct_supers.push(c);
            }
        }
    }
    if direct_supers.is_empty() {
        direct_supers.push(interp.classes.lookup("<standard-object>").unwrap());
    }

    let mut slots = Vec::new();
    for spec in &slot_specs {
        let slot_name = match spec.to_vec() {
            Some(parts) if !parts.is_empty() => as_symbol(&parts[0]),
            _ => as_symbol(spec),
        };
        if let Some(s) = slot_name {
            slots.push(s);
        }
    }

    let mut precedence_list = crate::classes::c3_linearize(&direct_supers)
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defclass: inconsistent precedence list")))?;
    let class = Rc::new(crate::classes::Class {
        name: name.clone(),
        direct_supers,
        precedence_list: Vec::new(),
        slots,
        abstractp: false,
    });
    precedence_list.insert(0, class.clone());
    let class = Rc::new(crate::classes::Class {
        name: class.name.clone(),
        direct_supers: class.direct_supers.clone(),
        precedence_list,
        slots: class.slots.clone(),
        abstractp: false,
    });
    interp.classes.register(class.clone());
    env.define_class(name.clone(), Value::Class(class));
    val(Value::Symbol(name))
}

fn defglobal_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defglobal: expected a symbol")))?;
    let value = eval::eval(&forms[1], env, interp)?;
    env.define_variable(name.clone(), value);
    val(Value::Symbol(name))
}

fn defdynamic_form(
    rest: &Value,
    env: &Rc<Environment>,
    interp: &Rc<Interpreter>,
) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "defdynamic: expected a symbol")))?;
    let value = eval::eval(&forms[1], env, interp)?;
    interp.push_dynamic(name.clone(), value);
    val(Value::Symbol(name))
}

fn dynamic_form(rest: &Value, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "dynamic: expected a symbol")))?;
    match interp.get_dynamic(&name) {
        Some(v) => val(v),
        None => Err(Transfer::Condition(condition::make_undefined_variable(interp, &name))),
    }
}

fn setq_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "setq: expected a symbol")))?;
    let value = eval::eval(&forms[1], env, interp)?;
    if !env.set_variable(&name, value.clone()) {
        if interp.set_dynamic(&name, value.clone()) {
            return val(value);
        }
        return Err(Transfer::Condition(condition::make_undefined_variable(interp, &name)));
    }
    val(value)
}

fn setf_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let place = &forms[0];
    let value = eval::eval(&forms[1], env, interp)?;

    if let Value::Symbol(_) = place {
        return setq_form(&Value::list(vec![place.clone(), forms[1].clone()]), env, interp);
    }

    let parts = args_of(place, interp)?;
    let accessor = as_symbol(&parts[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "setf: malformed place")))?;
    match accessor.name() {
        "car" => {
            let target = eval::eval(&parts[1], env, interp)?;
            if !target.set_car(value.clone()) {
                return Err(Transfer::Condition(condition::make_domain_error(interp, target, "<cons>")));
            }
        }
        "cdr" => {
            let target = eval::eval(&parts[1], env, interp)?;
            if !target.set_cdr(value.clone()) {
                return Err(Transfer::Condition(condition::make_domain_error(interp, target, "<cons>")));
            }
        }
        "elt" => {
            let target = eval::eval(&parts[1], env, interp)?;
            let index = eval::eval(&parts[2], env, interp)?;
            crate::builtins::sequences::set_elt(&target, &index, value.clone(), interp)?;
        }
        "aref" => {
            let target = eval::eval(&parts[1], env, interp)?;
            let index = eval::eval(&parts[2], env, interp)?;
            crate::builtins::sequences::set_elt(&target, &index, value.clone(), interp)?;
        }
        "dynamic" => {
            let name = as_symbol(&parts[1])
                .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "setf dynamic: expected a symbol")))?;
            interp.set_dynamic(&name, value.clone());
        }
        "slot-value" => {
            let target = eval::eval(&parts[1], env, interp)?;
            let slot_name_value = eval::eval(&parts[2], env, interp)?;
            let slot_name = match &slot_name_value {
                Value::Symbol(s) => s.clone(),
                other => return Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<symbol>"))),
            };
            match &target {
                Value::StandardInstance(inst) => inst.set_slot(slot_name.name(), value.clone()),
                other => return Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<standard-object>"))),
            }
        }
        other => {
            return Err(Transfer::Condition(condition::make_control_error(
                interp,
                &format!("setf: unsupported place {other}"),
            )));
        }
    }
    val(value)
}

fn the_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let class_name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "the: expected a class name")))?;
    let value = eval::eval(&forms[1], env, interp)?;
    if let Some(class) = interp.classes.lookup(class_name.name()) {
        let actual = crate::generic::class_of(&value, interp);
        if !actual.is_subclass_of(&class) {
            return Err(Transfer::Condition(condition::make_domain_error(interp, value, class_name.name())));
        }
    }
    val(value)
}

fn convert_form(rest: &Value, env: &Rc<Environment>, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let value = eval::eval(&forms[0], env, interp)?;
    let class_name = as_symbol(&forms[1])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "convert: expected a class name")))?;
    let converted = match class_name.name() {
        "<string>" => Value::string(value.to_string()),
        "<float>" => match value {
            Value::Integer(n) => Value::Float(n as f64),
            Value::Float(_) => value,
            _ => return Err(Transfer::Condition(condition::make_domain_error(interp, value, "<number>"))),
        },
        "<integer>" => match value {
            Value::Float(x) => Value::Integer(x as i64),
            Value::Integer(_) => value,
            _ => return Err(Transfer::Condition(condition::make_domain_error(interp, value, "<number>"))),
        },
        "<symbol>" => match value {
            Value::String(s) => Value::symbol(&s.borrow()),
            Value::Symbol(_) => value,
            _ => return Err(Transfer::Condition(condition::make_domain_error(interp, value, "<symbol>"))),
        },
        _ => return Err(Transfer::Condition(condition::make_domain_error(interp, value, class_name.name()))),
    };
    val(converted)
}

fn class_form(rest: &Value, interp: &Rc<Interpreter>) -> Result<Option<Outcome>, Transfer> {
    let forms = args_of(rest, interp)?;
    let name = as_symbol(&forms[0])
        .ok_or_else(|| Transfer::Condition(condition::make_control_error(interp, "class: expected a symbol")))?;
    match interp.classes.lookup(name.name()) {
        Some(c) => val(Value::Class(c)),
        None => Err(Transfer::Condition(condition::make_undefined_function(interp, &name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::reader::read_one;

    fn eval_str(src: &str) -> EvalOutcome {
        let interp = Interpreter::new();
        let form = read_one(src).unwrap();
        eval::eval(&form, &interp.global, &interp)
    }

    #[test]
    fn and_short_circuits_on_nil() {
        match eval_str("(and 1 nil 2)").unwrap() {
            Value::Null => {}
            other => panic!("expected nil, got {other}"),
        }
    }

    #[test]
    fn or_returns_first_true_value() {
        match eval_str("(or nil 3 4)").unwrap() {
            Value::Integer(n) => assert_eq!(n, 3),
            other => panic!("expected 3, got {other}"),
        }
    }

    #[test]
    fn cond_falls_through_to_matching_clause() {
        match eval_str("(cond (nil 1) (t 2))").unwrap() {
            Value::Integer(n) => assert_eq!(n, 2),
            other => panic!("expected 2, got {other}"),
        }
    }
}
