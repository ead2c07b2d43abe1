//! Type predicates: `consp`, `null`, `symbolp`, `stringp`, `integerp`,
//! `floatp`, `characterp`, `functionp`, `vectorp`, `atom`, `numberp`,
//! `listp`, `streamp`, `classp`.

use std::rc::Rc;

use crate::interpreter::Interpreter;
use crate::value::Value;

pub fn register(interp: &Rc<Interpreter>) {
    super::define(interp, "consp", 1, Some(1), |args, _| Ok(Value::from_bool(args[0].is_cons())));
    super::define(interp, "null", 1, Some(1), |args, _| Ok(Value::from_bool(args[0].is_null())));
    super::define(interp, "atom", 1, Some(1), |args, _| Ok(Value::from_bool(!args[0].is_cons())));
    super::define(interp, "listp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(args[0].is_cons() || args[0].is_null()))
    });
    super::define(interp, "symbolp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Symbol(_) | Value::Null)))
    });
    super::define(interp, "stringp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::String(_))))
    });
    super::define(interp, "integerp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Integer(_))))
    });
    super::define(interp, "floatp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Float(_))))
    });
    super::define(interp, "numberp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Integer(_) | Value::Float(_))))
    });
    super::define(interp, "characterp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Character(_))))
    });
    super::define(interp, "functionp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Function(_) | Value::GenericFunction(_))))
    });
    super::define(interp, "vectorp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Vector(_))))
    });
    super::define(interp, "streamp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Stream(_))))
    });
    super::define(interp, "classp", 1, Some(1), |args, _| {
        Ok(Value::from_bool(matches!(args[0], Value::Class(_))))
    });
    super::define(interp, "not", 1, Some(1), |args, _| Ok(Value::from_bool(!args[0].is_true())));
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
    fn null_is_true_only_for_nil() {
        assert!(call("null", vec![Value::Null]).is_true());
        assert!(!call("null", vec![Value::Integer(0)]).is_true());
    }

    #[test]
    fn atom_is_true_for_everything_but_conses() {
        assert!(call("atom", vec![Value::Null]).is_true());
        assert!(!call("atom", vec![Value::cons(Value::Integer(1), Value::Null)]).is_true());
    }

    #[test]
    fn not_negates_truthiness() {
        assert!(call("not", vec![Value::Null]).is_true());
        assert!(!call("not", vec![Value::t()]).is_true());
    }
}
