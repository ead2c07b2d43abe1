//! Generic functions: method storage, applicability, effective-method
//! ordering, and standard method combination.

use std::cell::Cell;
use std::rc::Rc;

use crate::classes::Class;
use crate::interpreter::Interpreter;
use crate::transfer::EvalOutcome;
use crate::value::{Function, Value};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Qualifier {
    Primary,
    Before,
    After,
    Around,
}

pub struct Method {
    pub qualifier: Qualifier,
    /// One class per required parameter; `<object>` if unspecialized.
    pub specializers: Vec<Rc<Class>>,
    pub params: Vec<crate::symbol::Symbol>,
    pub rest: Option<crate::symbol::Symbol>,
    pub body: Vec<Value>,
    pub env: Rc<crate::env::Environment>,
}

pub struct GenericFunction {
    pub name: String,
    pub required_count: usize,
    pub methods: Vec<Rc<Method>>,
}

impl GenericFunction {
    pub fn new(name: String, required_count: usize) -> GenericFunction {
        GenericFunction {
            name,
            required_count,
            methods: Vec::new(),
        }
    }

    pub fn add_method(&mut self, method: Rc<Method>) {
        self.methods.retain(|m| {
            !(m.qualifier == method.qualifier
                && m.specializers.len() == method.specializers.len()
                && m.specializers
                    .iter()
                    .zip(method.specializers.iter())
                    .all(|(a, b)| a.name == b.name))
        });
        self.methods.push(method);
    }

    fn applicable(&self, args: &[Value], qualifier: Qualifier, interp: &Interpreter) -> Vec<Rc<Method>> {
        let mut matches: Vec<Rc<Method>> = self
            .methods
            .iter()
            .filter(|m| m.qualifier == qualifier)
            .filter(|m| {
                m.specializers
                    .iter()
                    .zip(args.iter())
                    .all(|(spec, arg)| class_of(arg, interp).is_subclass_of(spec))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| specificity_cmp(a, b, args, interp));
        matches
    }
}

fn specificity_cmp(
    a: &Rc<Method>,
    b: &Rc<Method>,
    args: &[Value],
    interp: &Interpreter,
) -> std::cmp::Ordering {
    for (i, arg) in args.iter().enumerate() {
        let arg_cpl = class_of(arg, interp).precedence_list.clone();
        let rank = |m: &Rc<Method>| -> usize {
            let spec = &m.specializers[i];
            arg_cpl.iter().position(|c| c.name == spec.name).unwrap_or(usize::MAX)
        };
        let (ra, rb) = (rank(a), rank(b));
        if ra != rb {
            return ra.cmp(&rb);
        }
    }
    std::cmp::Ordering::Equal
}

pub fn class_of(value: &Value, interp: &Interpreter) -> Rc<Class> {
    let lookup = |name: &str| interp.classes.lookup(name).expect("built-in class registered");
    match value {
        Value::Null => lookup("<null>"),
        Value::Symbol(_) => lookup("<symbol>"),
        Value::Character(_) => lookup("<character>"),
        Value::Integer(_) => lookup("<integer>"),
        Value::Float(_) => lookup("<float>"),
        Value::String(_) => lookup("<string>"),
        Value::Cons(_) => lookup("<cons>"),
        Value::Vector(_) => lookup("<general-vector>"),
        Value::Function(f) => match f.as_ref() {
            Function::Lambda { .. } | Function::Builtin { .. } => lookup("<function>"),
        },
        Value::GenericFunction(_) => lookup("<standard-generic-function>"),
        Value::Stream(_) => lookup("<stream>"),
        Value::Class(_) => lookup("<standard-class>"),
        Value::StandardInstance(inst) => inst.class.clone(),
    }
}

/// Runs standard method combination: all `:around` methods (outermost
/// first) wrap a core step of `:before` methods (most specific first), the
/// most specific primary method (with `call-next-method` access to the
/// rest), then `:after` methods (least specific first).
pub fn invoke(
    gf: &GenericFunction,
    args: Vec<Value>,
    interp: &Rc<Interpreter>,
) -> EvalOutcome {
    let around = gf.applicable(&args, Qualifier::Around, interp);
    let before = gf.applicable(&args, Qualifier::Before, interp);
    let primaries = gf.applicable(&args, Qualifier::Primary, interp);
    let after = gf.applicable(&args, Qualifier::After, interp);
    if primaries.is_empty() && around.is_empty() {
        return Err(crate::transfer::Transfer::Condition(crate::condition::make_undefined_function(
            interp,
            &crate::symbol::intern(&gf.name),
        )));
    }
    run_around(&around, 0, &before, &primaries, &after, &args, interp)
}

#[allow(clippy::too_many_arguments)]
fn run_around(
    around: &[Rc<Method>],
    index: usize,
    before: &[Rc<Method>],
    primaries: &[Rc<Method>],
    after: &[Rc<Method>],
    args: &[Value],
    interp: &Rc<Interpreter>,
) -> EvalOutcome {
    if index < around.len() {
        let cursor = Rc::new(NextMethodCursor {
            methods: around.to_vec(),
            index: Cell::new(index + 1),
            fallback_before: before.to_vec(),
            fallback_primaries: primaries.to_vec(),
            fallback_after: after.to_vec(),
        });
        crate::eval::call_method(&around[index], args, interp, Some(cursor))
    } else {
        run_core(before, primaries, after, args, interp)
    }
}

fn run_core(
    before: &[Rc<Method>],
    primaries: &[Rc<Method>],
    after: &[Rc<Method>],
    args: &[Value],
    interp: &Rc<Interpreter>,
) -> EvalOutcome {
    for method in before {
        crate::eval::call_method(method, args, interp, None)?;
    }
    let result = if primaries.is_empty() {
        Value::Null
    } else {
        let cursor = Rc::new(NextMethodCursor {
            methods: primaries.to_vec(),
            index: Cell::new(1),
            fallback_before: Vec::new(),
            fallback_primaries: Vec::new(),
            fallback_after: Vec::new(),
        });
        crate::eval::call_method(&primaries[0], args, interp, Some(cursor))?
    };
    for method in after.iter().rev() {
        crate::eval::call_method(method, args, interp, None)?;
    }
    Ok(result)
}

/// Threaded through a method invocation so `call-next-method` /
/// `next-method-p` can see the rest of the applicable-method list. The
/// `fallback_*` fields are only populated on an `:around` cursor, letting
/// its last `call-next-method` fall through to the before/primary/after
/// core instead of signaling "no next method".
pub struct NextMethodCursor {
    pub methods: Vec<Rc<Method>>,
    pub index: Cell<usize>,
    pub fallback_before: Vec<Rc<Method>>,
    pub fallback_primaries: Vec<Rc<Method>>,
    pub fallback_after: Vec<Rc<Method>>,
}

impl NextMethodCursor {
    pub fn has_next(&self) -> bool {
        self.index.get() < self.methods.len() || !self.fallback_primaries.is_empty() || !self.fallback_before.is_empty()
    }

    pub fn call_next(&self, args: &[Value], interp: &Rc<Interpreter>) -> EvalOutcome {
        let i = self.index.get();
        if i < self.methods.len() {
            self.index.set(i + 1);
            let cursor = Rc::new(NextMethodCursor {
                methods: self.methods.clone(),
                index: Cell::new(i + 1),
                fallback_before: self.fallback_before.clone(),
                fallback_primaries: self.fallback_primaries.clone(),
                fallback_after: self.fallback_after.clone(),
            });
            crate::eval::call_method(&self.methods[i], args, interp, Some(cursor))
        } else if !self.fallback_primaries.is_empty() || !self.fallback_before.is_empty() {
            run_core(&self.fallback_before, &self.fallback_primaries, &self.fallback_after, args, interp)
        } else {
            Err(crate::transfer::Transfer::Condition(crate::condition::make_control_error(
                interp,
                "call-next-method: no next method",
            )))
        }
    }
}
