//! The built-in class lattice and C3 linearization for class precedence
//! lists (CPLs).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::symbol::{intern, Symbol};

pub struct Class {
    pub name: Symbol,
    pub direct_supers: Vec<Rc<Class>>,
    pub precedence_list: Vec<Rc<Class>>,
    pub slots: Vec<Symbol>,
    pub abstractp: bool,
}

impl Class {
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.precedence_list.iter().any(|c| c.name == other.name)
    }
}

/// Computes a C3 linearization of `direct_supers`, prepending `name` itself.
/// Returns `None` if the supers have no consistent linearization.
pub fn c3_linearize(direct_supers: &[Rc<Class>]) -> Option<Vec<Rc<Class>>> {
    let mut sequences: Vec<Vec<Rc<Class>>> = direct_supers
        .iter()
        .map(|c| c.precedence_list.clone())
        .collect();
    sequences.push(direct_supers.to_vec());

    let mut result = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }
        let candidate = sequences.iter().find_map(|seq| {
            let head = &seq[0];
            let appears_in_tail = sequences
                .iter()
                .any(|other| other[1..].iter().any(|c| c.name == head.name));
            if appears_in_tail {
                None
            } else {
                Some(head.clone())
            }
        })?;
        result.push(candidate.clone());
        for seq in sequences.iter_mut() {
            seq.retain(|c| c.name != candidate.name);
        }
    }
}

fn build(
    registry: &mut HashMap<Symbol, Rc<Class>>,
    name: &str,
    supers: &[&str],
    slots: &[&str],
    abstractp: bool,
) -> Rc<Class> {
    let direct_supers: Vec<Rc<Class>> = supers
        .iter()
        .map(|s| registry.get(&intern(s)).expect("super registered first").clone())
        .collect();
    let mut ancestors = if direct_supers.is_empty() {
        Vec::new()
    } else {
        c3_linearize(&direct_supers).expect("consistent class lattice")
    };
    let class_name = intern(name);
    let placeholder = Rc::new(Class {
        name: class_name.clone(),
        direct_supers,
        precedence_list: Vec::new(),
        slots: slots.iter().map(|s| intern(s)).collect(),
        abstractp,
    });
    ancestors.insert(0, placeholder.clone());
    let class = Rc::new(Class {
        name: placeholder.name.clone(),
        direct_supers: placeholder.direct_supers.clone(),
        precedence_list: ancestors,
        slots: placeholder.slots.clone(),
        abstractp: placeholder.abstractp,
    });
    registry.insert(class.name.clone(), class.clone());
    class
}

/// Builds the registry of built-in classes rooted at `<object>`.
pub struct ClassRegistry {
    pub classes: RefCell<HashMap<Symbol, Rc<Class>>>,
}

impl ClassRegistry {
    pub fn new() -> ClassRegistry {
        let mut reg = HashMap::new();

        build(&mut reg, "<object>", &[], &[], true);
        build(&mut reg, "<built-in-class>", &["<object>"], &[], true);
        build(&mut reg, "<standard-class>", &["<object>"], &[], true);

        build(&mut reg, "<basic-array>", &["<object>"], &[], true);
        build(&mut reg, "<basic-array*>", &["<basic-array>"], &[], true);
        build(&mut reg, "<general-array*>", &["<basic-array*>"], &[], false);
        build(&mut reg, "<basic-vector>", &["<basic-array>"], &[], true);
        build(&mut reg, "<general-vector>", &["<basic-vector>"], &[], false);
        build(&mut reg, "<string>", &["<basic-vector>"], &[], false);

        build(&mut reg, "<character>", &["<object>"], &[], false);
        build(&mut reg, "<function>", &["<object>"], &[], false);
        build(&mut reg, "<generic-function>", &["<function>"], &[], false);
        build(&mut reg, "<standard-generic-function>", &["<generic-function>"], &[], false);

        build(&mut reg, "<list>", &["<object>"], &[], true);
        build(&mut reg, "<cons>", &["<list>"], &[], false);

        build(&mut reg, "<symbol>", &["<object>"], &[], false);

        build(&mut reg, "<null>", &["<symbol>", "<list>"], &[], false);

        build(&mut reg, "<number>", &["<object>"], &[], true);
        build(&mut reg, "<integer>", &["<number>"], &[], false);
        build(&mut reg, "<float>", &["<number>"], &[], false);

        build(&mut reg, "<stream>", &["<object>"], &[], false);

        build(&mut reg, "<serious-condition>", &["<object>"], &[], true);
        build(&mut reg, "<error>", &["<serious-condition>"], &[], true);
        build(&mut reg, "<arithmetic-error>", &["<error>"], &["OPERATION", "OPERANDS"], false);
        build(&mut reg, "<division-by-zero>", &["<arithmetic-error>"], &[], false);
        build(&mut reg, "<floating-point-overflow>", &["<arithmetic-error>"], &[], false);
        build(&mut reg, "<floating-point-underflow>", &["<arithmetic-error>"], &[], false);
        build(&mut reg, "<control-error>", &["<error>"], &[], false);
        build(&mut reg, "<parse-error>", &["<error>"], &["STRING", "EXPECTED-CLASS"], false);
        build(&mut reg, "<domain-error>", &["<error>"], &["OBJECT", "EXPECTED-CLASS"], false);
        build(&mut reg, "<undefined-entity>", &["<error>"], &["NAME", "NAMESPACE"], true);
        build(&mut reg, "<undefined-variable>", &["<undefined-entity>"], &[], false);
        build(&mut reg, "<undefined-function>", &["<undefined-entity>"], &[], false);
        build(&mut reg, "<undefined-class>", &["<undefined-entity>"], &[], false);
        build(&mut reg, "<simple-error>", &["<error>"], &["FORMAT-STRING", "FORMAT-ARGUMENTS"], false);
        build(&mut reg, "<stream-error>", &["<error>"], &["STREAM"], false);
        build(&mut reg, "<end-of-stream>", &["<stream-error>"], &[], false);
        build(&mut reg, "<index-out-of-range>", &["<error>"], &["OBJECT", "INDEX"], false);
        build(&mut reg, "<immutable-binding>", &["<error>"], &["NAME"], false);
        build(&mut reg, "<program-error>", &["<error>"], &[], true);
        build(&mut reg, "<wrong-number-of-arguments>", &["<program-error>"], &[], false);
        build(&mut reg, "<storage-exhausted>", &["<serious-condition>"], &[], false);

        build(&mut reg, "<standard-object>", &["<object>"], &[], false);

        ClassRegistry {
            classes: RefCell::new(reg),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Class>> {
        self.classes.borrow().get(&intern(name)).cloned()
    }

    pub fn register(&self, class: Rc<Class>) {
        self.classes.borrow_mut().insert(class.name.clone(), class);
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_subclass_of_error() {
        let reg = ClassRegistry::new();
        let dbz = reg.lookup("<division-by-zero>").unwrap();
        let err = reg.lookup("<error>").unwrap();
        assert!(dbz.is_subclass_of(&err));
    }

    #[test]
    fn null_precedes_symbol_and_list() {
        let reg = ClassRegistry::new();
        let null = reg.lookup("<null>").unwrap();
        let names: Vec<String> = null.precedence_list.iter().map(|c| c.name.to_string()).collect();
        assert_eq!(names[0], "<null>");
        assert!(names.contains(&"<symbol>".to_string()));
        assert!(names.contains(&"<list>".to_string()));
        assert_eq!(names.last().unwrap(), "<object>");
    }

    #[test]
    fn object_is_root() {
        let reg = ClassRegistry::new();
        let object = reg.lookup("<object>").unwrap();
        assert_eq!(object.precedence_list.len(), 1);
    }
}
