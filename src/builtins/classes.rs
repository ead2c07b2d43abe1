//! Class-related builtins: `subclassp`, `class-of`, and the object
//! construction path `create`/`slot-value`, which dispatches the
//! user-extensible `initialize-object` generic over a freshly allocated
//! instance.

use std::rc::Rc;

use crate::classes::Class;
use crate::condition::{self, Instance};
use crate::eval;
use crate::generic;
use crate::interpreter::Interpreter;
use crate::symbol::{intern, Symbol};
use crate::transfer::Transfer;
use crate::value::Value;

fn require_class(v: &Value, interp: &Rc<Interpreter>) -> Result<Rc<Class>, Transfer> {
    match v {
        Value::Class(c) => Ok(c.clone()),
        other => Err(Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<standard-class>",
        ))),
    }
}

fn require_instance(v: &Value, interp: &Rc<Interpreter>) -> Result<Rc<Instance>, Transfer> {
    match v {
        Value::StandardInstance(inst) => Ok(inst.clone()),
        other => Err(Transfer::Condition(condition::make_domain_error(
            interp,
            other.clone(),
            "<standard-object>",
        ))),
    }
}

fn require_symbol(v: &Value, interp: &Rc<Interpreter>) -> Result<Symbol, Transfer> {
    match v {
        Value::Symbol(s) => Ok(s.clone()),
        other => Err(Transfer::Condition(condition::make_domain_error(interp, other.clone(), "<symbol>"))),
    }
}

/// Every slot name declared anywhere in `class`'s precedence list, most
/// general first, so a more specific class's redeclaration wins.
fn all_slots(class: &Rc<Class>) -> Vec<Symbol> {
    let mut slots = Vec::new();
    for c in class.precedence_list.iter().rev() {
        for s in &c.slots {
            if !slots.contains(s) {
                slots.push(s.clone());
            }
        }
    }
    slots
}

/// Parses a trailing `:keyword value :keyword value ...` tail into pairs.
fn collect_initargs(args: &[Value], interp: &Rc<Interpreter>) -> Result<Vec<(Symbol, Value)>, Transfer> {
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let key = require_symbol(&args[i], interp)?;
        if !key.name().starts_with(':') {
            return Err(Transfer::Condition(condition::make_control_error(
                interp,
                "create: expected a keyword initarg",
            )));
        }
        let value = args.get(i + 1).cloned().unwrap_or(Value::Null);
        pairs.push((key, value));
        i += 2;
    }
    Ok(pairs)
}

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "subclassp", 2, Some(2), |args, interp| {
        let c = require_class(&args[0], interp)?;
        let d = require_class(&args[1], interp)?;
        Ok(Value::from_bool(c.is_subclass_of(&d)))
    });

    super::define(interp, "class-of", 1, Some(1), |args, interp| {
        Ok(Value::Class(generic::class_of(&args[0], interp)))
    });

    super::define(interp, "slot-value", 2, Some(2), |args, interp| {
        let inst = require_instance(&args[0], interp)?;
        let name = require_symbol(&args[1], interp)?;
        Ok(inst.slot(name.name()).unwrap_or(Value::Null))
    });

    super::define(interp, "set-slot-value", 3, Some(3), |args, interp| {
        let inst = require_instance(&args[0], interp)?;
        let name = require_symbol(&args[1], interp)?;
        inst.set_slot(name.name(), args[2].clone());
        Ok(args[2].clone())
    });

    // `(create class :slot-name init-value ...)`: allocates a
    // `<standard-object>` instance with every slot in the class's
    // precedence list defaulted to `nil`, applies the initargs, then
    // dispatches `initialize-object` if the user has defined it.
    super::define(interp, "create", 1, None, |args, interp| {
        let class = require_class(&args[0], interp)?;
        let initargs = collect_initargs(&args[1..], interp)?;

        let instance = Instance::new(class.clone());
        for slot in all_slots(&class) {
            instance.set_slot(slot.name(), Value::Null);
        }
        for (key, value) in &initargs {
            instance.set_slot(&key.name()[1..], value.clone());
        }

        // `defmethod` has no `&rest` parameter support, so the generic is
        // dispatched on the object alone; a user method reaches the raw
        // initargs, if it needs them, via the object's own slots.
        let object = Value::StandardInstance(instance);
        if let Some(init_fn @ Value::GenericFunction(_)) = interp.global.get_variable(&intern("initialize-object")) {
            eval::apply(&init_fn, vec![object.clone()], interp)?;
        }
        Ok(object)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>, interp: &Rc<Interpreter>) -> Value {
        let f = interp.global.get_function(&intern(name)).unwrap();
        eval::apply(&f, args, interp).unwrap()
    }

    #[test]
    fn subclassp_holds_for_every_class_in_the_cpl() {
        let interp = Interpreter::new();
        let integer = Value::Class(interp.classes.lookup("<integer>").unwrap());
        let number = Value::Class(interp.classes.lookup("<number>").unwrap());
        let string = Value::Class(interp.classes.lookup("<string>").unwrap());

        assert!(call("subclassp", vec![integer.clone(), number], &interp).is_true());
        assert!(!call("subclassp", vec![integer, string], &interp).is_true());
    }

    #[test]
    fn class_of_an_integer_is_the_integer_class() {
        let interp = Interpreter::new();
        match call("class-of", vec![Value::Integer(1)], &interp) {
            Value::Class(c) => assert_eq!(c.name.to_string(), "<integer>"),
            other => panic!("expected a class, got {other}"),
        }
    }

    #[test]
    fn create_allocates_an_instance_with_initargs_applied() {
        let interp = Interpreter::new();
        let object_class = interp.classes.lookup("<object>").unwrap();
        let circle = Rc::new(Class {
            name: intern("<circle>"),
            direct_supers: vec![object_class.clone()],
            precedence_list: vec![],
            slots: vec![intern("radius")],
            abstractp: false,
        });
        let mut precedence_list = crate::classes::c3_linearize(&[object_class]).unwrap();
        precedence_list.insert(0, circle.clone());
        let circle = Rc::new(Class {
            name: circle.name.clone(),
            direct_supers: circle.direct_supers.clone(),
            precedence_list,
            slots: circle.slots.clone(),
            abstractp: false,
        });
        interp.classes.register(circle.clone());

        let instance = call("create", vec![Value::Class(circle), Value::symbol(":radius"), Value::Integer(5)], &interp);
        match call("slot-value", vec![instance, Value::symbol("radius")], &interp) {
            Value::Integer(n) => assert_eq!(n, 5),
            other => panic!("expected 5, got {other}"),
        }
    }
}
