//! Standard instances and the condition system: `signal-condition`,
//! `with-handler`, `continue-condition`, `error`, `cerror`, `report-condition`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::classes::Class;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::symbol::{intern, Symbol};
use crate::transfer::{new_block_id, BlockId, EvalOutcome, Transfer};
use crate::value::Value;

/// A `<standard-object>` or any of its subclasses, including every
/// condition class. Conditions are not a separate `Value` variant — they
/// are instances whose class precedence list reaches `<serious-condition>`.
pub struct Instance {
    pub class: Rc<Class>,
    pub slots: RefCell<HashMap<Symbol, Value>>,
    /// Set by `signal-condition` for the duration of one handler invocation,
    /// so `continue-condition` can resume exactly that call.
    resume_id: RefCell<Option<BlockId>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<Instance> {
        Rc::new(Instance {
            class,
            slots: RefCell::new(HashMap::new()),
            resume_id: RefCell::new(None),
        })
    }

    pub fn with_slots(class: Rc<Class>, slots: Vec<(&str, Value)>) -> Rc<Instance> {
        let inst = Instance::new(class);
        for (name, value) in slots {
            inst.slots.borrow_mut().insert(intern(name), value);
        }
        inst
    }

    pub fn slot(&self, name: &str) -> Option<Value> {
        self.slots.borrow().get(&intern(name)).cloned()
    }

    pub fn set_slot(&self, name: &str, value: Value) {
        self.slots.borrow_mut().insert(intern(name), value);
    }

    pub fn is_condition(&self) -> bool {
        self.class.name == intern("<serious-condition>")
            || self
                .class
                .precedence_list
                .iter()
                .any(|c| c.name == intern("<serious-condition>"))
    }
}

pub fn make_simple_error(interp: &Rc<Interpreter>, format_string: &str, args: Vec<Value>) -> Value {
    let class = interp.classes.lookup("<simple-error>").expect("built in");
    let inst = Instance::with_slots(
        class,
        vec![
            ("FORMAT-STRING", Value::string(format_string)),
            ("FORMAT-ARGUMENTS", Value::list(args)),
        ],
    );
    Value::StandardInstance(inst)
}

pub fn make_control_error(interp: &Rc<Interpreter>, message: &str) -> Value {
    let class = interp.classes.lookup("<control-error>").expect("built in");
    Value::StandardInstance(Instance::with_slots(
        class,
        vec![("FORMAT-STRING", Value::string(message))],
    ))
}

pub fn make_division_by_zero(interp: &Rc<Interpreter>, operation: &str, operands: Vec<Value>) -> Value {
    let class = interp.classes.lookup("<division-by-zero>").expect("built in");
    Value::StandardInstance(Instance::with_slots(
        class,
        vec![
            ("OPERATION", Value::symbol(operation)),
            ("OPERANDS", Value::list(operands)),
        ],
    ))
}

pub fn make_undefined_variable(interp: &Rc<Interpreter>, name: &Symbol) -> Value {
    let class = interp.classes.lookup("<undefined-variable>").expect("built in");
    Value::StandardInstance(Instance::with_slots(
        class,
        vec![
            ("NAME", Value::Symbol(name.clone())),
            ("NAMESPACE", Value::symbol("VARIABLE")),
        ],
    ))
}

pub fn make_undefined_function(interp: &Rc<Interpreter>, name: &Symbol) -> Value {
    let class = interp.classes.lookup("<undefined-function>").expect("built in");
    Value::StandardInstance(Instance::with_slots(
        class,
        vec![
            ("NAME", Value::Symbol(name.clone())),
            ("NAMESPACE", Value::symbol("FUNCTION")),
        ],
    ))
}

pub fn make_domain_error(interp: &Rc<Interpreter>, object: Value, expected_class: &str) -> Value {
    let class = interp.classes.lookup("<domain-error>").expect("built in");
    Value::StandardInstance(Instance::with_slots(
        class,
        vec![("OBJECT", object), ("EXPECTED-CLASS", Value::symbol(expected_class))],
    ))
}

pub fn make_index_out_of_range(interp: &Rc<Interpreter>, object: Value, index: Value) -> Value {
    let class = interp.classes.lookup("<index-out-of-range>").expect("built in");
    Value::StandardInstance(Instance::with_slots(
        class,
        vec![("OBJECT", object), ("INDEX", index)],
    ))
}

/// Walks the installed handler stack from innermost outward. `continuable`
/// follows `cerror`'s convention: `Null` means not continuable, any other
/// value means a handler's normal return resumes the signal site with that
/// value. `continue-condition` always resumes, independent of `continuable`.
pub fn signal_condition(interp: &Rc<Interpreter>, condition: Value, continuable: Value) -> EvalOutcome {
    let upto = interp.visible_handler_count();
    if upto == 0 {
        return Err(Transfer::Condition(condition));
    }
    let idx = upto - 1;
    let handler = interp.handlers.borrow()[idx].clone();

    let rid = new_block_id();
    if let Value::StandardInstance(inst) = &condition {
        *inst.resume_id.borrow_mut() = Some(rid);
    }

    let saved_limit = interp.active_limit.get();
    interp.active_limit.set(idx);
    let result = eval::apply(&handler, vec![condition.clone()], interp);
    interp.active_limit.set(saved_limit);

    match result {
        Ok(v) => {
            if continuable.is_true() {
                Ok(v)
            } else {
                let control_error =
                    make_control_error(interp, "handler returned normally from a non-continuable condition");
                signal_condition(interp, control_error, Value::Null)
            }
        }
        Err(Transfer::Return(id, v)) if id == rid => Ok(v),
        Err(other) => Err(other),
    }
}

/// `continue-condition`: resumes the signal-condition call currently
/// dispatching to the handler this is called from, with `value`.
pub fn continue_condition(condition: &Value, value: Value) -> EvalOutcome {
    match condition {
        Value::StandardInstance(inst) => match *inst.resume_id.borrow() {
            Some(id) => Err(Transfer::Return(id, value)),
            None => Ok(value),
        },
        _ => Ok(value),
    }
}

pub fn error(interp: &Rc<Interpreter>, format_string: &str, args: Vec<Value>) -> EvalOutcome {
    let condition = make_simple_error(interp, format_string, args);
    signal_condition(interp, condition, Value::Null)
}

pub fn cerror(
    interp: &Rc<Interpreter>,
    continue_string: &str,
    format_string: &str,
    args: Vec<Value>,
) -> EvalOutcome {
    let condition = make_simple_error(interp, format_string, args);
    signal_condition(interp, condition, Value::string(continue_string))
}

pub fn report_condition(condition: &Value) -> String {
    match condition {
        Value::StandardInstance(inst) => {
            if let Some(Value::String(fmt)) = inst.slot("FORMAT-STRING") {
                let args = inst
                    .slot("FORMAT-ARGUMENTS")
                    .and_then(|v| v.to_vec())
                    .unwrap_or_default();
                if args.is_empty() {
                    format!("{}: {}", inst.class.name, fmt.borrow())
                } else {
                    let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    format!("{}: {} {}", inst.class.name, fmt.borrow(), rendered.join(" "))
                }
            } else {
                let slots = inst.slots.borrow();
                let mut parts: Vec<String> = slots.iter().map(|(k, v)| format!("{k}={v}")).collect();
                parts.sort();
                format!("{}: {}", inst.class.name, parts.join(", "))
            }
        }
        other => other.to_string(),
    }
}
