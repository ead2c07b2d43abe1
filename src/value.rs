// ABOUTME: Value types representing ISLISP data structures and expressions

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::classes::Class;
use crate::condition::Instance;
use crate::env::Environment;
use crate::generic::GenericFunction;
use crate::interpreter::Interpreter;
use crate::symbol::{intern, Symbol};
use crate::transfer::EvalOutcome;

#[derive(Clone)]
pub enum Value {
    Null,
    Symbol(Symbol),
    Character(char),
    Integer(i64),
    Float(f64),
    String(Rc<RefCell<String>>),
    Cons(Rc<ConsCell>),
    Vector(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    GenericFunction(Rc<RefCell<GenericFunction>>),
    Stream(Rc<StreamObj>),
    Class(Rc<Class>),
    StandardInstance(Rc<Instance>),
}

pub struct ConsCell {
    pub car: RefCell<Value>,
    pub cdr: RefCell<Value>,
}

pub struct StreamObj {
    pub name: String,
    pub direction: StreamDirection,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StreamDirection {
    Input,
    Output,
    InputOutput,
}

pub enum Function {
    Lambda {
        name: Option<Symbol>,
        params: Vec<Symbol>,
        rest: Option<Symbol>,
        body: Vec<Value>,
        env: Rc<Environment>,
    },
    Builtin {
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        func: Box<dyn Fn(&[Value], &Rc<Interpreter>) -> EvalOutcome>,
    },
}

impl Value {
    pub fn symbol(name: &str) -> Value {
        Value::Symbol(intern(name))
    }

    pub fn t() -> Value {
        Value::Symbol(crate::symbol::well_known::t())
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Rc::new(RefCell::new(s.into())))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cons(Rc::new(ConsCell {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Rc::new(RefCell::new(items)))
    }

    /// ISLISP has no boolean type: anything but `nil` (the empty list / Null) is true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Null)
    }

    pub fn from_bool(b: bool) -> Value {
        if b {
            Value::t()
        } else {
            Value::Null
        }
    }

    pub fn list(items: impl IntoIterator<IntoIter: DoubleEndedIterator<Item = Value>>) -> Value {
        let mut result = Value::Null;
        for item in items.into_iter().rev() {
            result = Value::cons(item, result);
        }
        result
    }

    pub fn is_cons(&self) -> bool {
        matches!(self, Value::Cons(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn car(&self) -> Option<Value> {
        match self {
            Value::Cons(cell) => Some(cell.car.borrow().clone()),
            _ => None,
        }
    }

    pub fn cdr(&self) -> Option<Value> {
        match self {
            Value::Cons(cell) => Some(cell.cdr.borrow().clone()),
            _ => None,
        }
    }

    pub fn set_car(&self, value: Value) -> bool {
        match self {
            Value::Cons(cell) => {
                *cell.car.borrow_mut() = value;
                true
            }
            _ => false,
        }
    }

    pub fn set_cdr(&self, value: Value) -> bool {
        match self {
            Value::Cons(cell) => {
                *cell.cdr.borrow_mut() = value;
                true
            }
            _ => false,
        }
    }

    /// Iterates a proper or improper list, yielding each element; the final
    /// cdr (which may be non-`Null` for a dotted list) is ignored.
    pub fn iter_list(&self) -> ListIter {
        ListIter {
            current: self.clone(),
        }
    }

    /// Collects a proper list into a `Vec`. Returns `None` if the list is
    /// improper (a non-`Null` final cdr).
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut out = Vec::new();
        let mut cur = self.clone();
        loop {
            match cur {
                Value::Null => return Some(out),
                Value::Cons(cell) => {
                    out.push(cell.car.borrow().clone());
                    cur = cell.cdr.borrow().clone();
                }
                _ => return None,
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Symbol(_) => "symbol",
            Value::Character(_) => "character",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Cons(_) => "cons",
            Value::Vector(_) => "general-vector",
            Value::Function(_) => "function",
            Value::GenericFunction(_) => "generic-function",
            Value::Stream(_) => "stream",
            Value::Class(_) => "class",
            Value::StandardInstance(_) => "standard-instance",
        }
    }

    /// `eq`: identity for everything except characters and integers, which
    /// compare by value since ISLISP allows either representation for them.
    pub fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Cons(a), Value::Cons(b)) => Rc::ptr_eq(a, b),
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::GenericFunction(a), Value::GenericFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Stream(a), Value::Stream(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::StandardInstance(a), Value::StandardInstance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `eql`: `eq`, plus numeric equality within the same numeric type.
    pub fn eql(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a == b,
            _ => self.eq(other),
        }
    }

    /// `equal`: structural equality over conses, vectors, and strings; `eql`
    /// everywhere else.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Cons(a), Value::Cons(b)) => {
                a.car.borrow().equal(&b.car.borrow()) && a.cdr.borrow().equal(&b.cdr.borrow())
            }
            (Value::Vector(a), Value::Vector(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y))
            }
            (Value::String(a), Value::String(b)) => *a.borrow() == *b.borrow(),
            _ => self.eql(other),
        }
    }
}

pub struct ListIter {
    current: Value,
}

impl Iterator for ListIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self.current.clone() {
            Value::Cons(cell) => {
                let car = cell.car.borrow().clone();
                self.current = cell.cdr.borrow().clone();
                Some(car)
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "nil"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Character(c) => write!(f, "#\\{c}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{:?}", s.borrow()),
            Value::Cons(_) => {
                write!(f, "(")?;
                let mut cur = self.clone();
                let mut first = true;
                loop {
                    match cur {
                        Value::Cons(cell) => {
                            if !first {
                                write!(f, " ")?;
                            }
                            first = false;
                            write!(f, "{}", cell.car.borrow())?;
                            cur = cell.cdr.borrow().clone();
                        }
                        Value::Null => break,
                        other => {
                            write!(f, " . {other}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Vector(v) => {
                write!(f, "#(")?;
                for (i, item) in v.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Function(func) => match func.as_ref() {
                Function::Lambda { name, .. } => match name {
                    Some(n) => write!(f, "#<function {n}>"),
                    None => write!(f, "#<function anonymous>"),
                },
                Function::Builtin { name, .. } => write!(f, "#<function {name}>"),
            },
            Value::GenericFunction(gf) => write!(f, "#<generic-function {}>", gf.borrow().name),
            Value::Stream(s) => write!(f, "#<stream {}>", s.name),
            Value::Class(c) => write!(f, "#<class {}>", c.name),
            Value::StandardInstance(inst) => write!(f, "#<{}>", inst.class.name),
        }
    }
}
