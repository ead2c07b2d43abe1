//! Built-in functions, organized into one module per category and collected
//! by [`register_builtins`].
//!
//! - **[arithmetic]**: `+`, `-`, `*`, `/`, `mod`, `quotient`
//! - **[comparison]**: `=`, `<`, `>`, `<=`, `>=`, `eq`, `eql`, `equal`
//! - **[predicates]**: `consp`, `null`, `symbolp`, `stringp`, `integerp`, …
//! - **[lists]**: `cons`, `car`, `cdr`, `list`, `append`, `reverse`, `mapcar`
//! - **[sequences]**: `length`, `elt`, `set-elt`, `subseq`, `map-into`
//! - **[symbols]**: `symbol-name`, `gensym`
//! - **[conditions]**: `error`, `cerror`, `signal-condition`, `continue-condition`, `report-condition`
//! - **[classes]**: `subclassp`, `class-of`, `create`, `slot-value`, `set-slot-value`

use std::rc::Rc;

use crate::interpreter::Interpreter;

pub mod arithmetic;
pub mod classes;
pub mod comparison;
pub mod conditions;
pub mod lists;
pub mod predicates;
pub mod sequences;
pub mod symbols;

pub fn register_builtins(interp: &Rc<Interpreter>) {
    arithmetic::register(interp);
    comparison::register(interp);
    predicates::register(interp);
    lists::register(interp);
    sequences::register(interp);
    symbols::register(interp);
    conditions::register(interp);
    classes::register(interp);
}

/// Defines a builtin function in the interpreter's global function namespace.
pub(crate) fn define(
    interp: &Rc<Interpreter>,
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    func: impl Fn(&[crate::value::Value], &Rc<Interpreter>) -> crate::transfer::EvalOutcome + 'static,
) {
    let value = crate::value::Value::Function(Rc::new(crate::value::Function::Builtin {
        name,
        min_args,
        max_args,
        func: Box::new(func),
    }));
    interp.global.define_function(crate::symbol::intern(name), value);
}
