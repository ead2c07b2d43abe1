// ABOUTME: Cross-module integration tests driving complete programs through
// ABOUTME: reader -> eval rather than exercising one module in isolation.

use std::rc::Rc;

use islisp_core::condition;
use islisp_core::eval;
use islisp_core::interpreter::Interpreter;
use islisp_core::reader::read_all;
use islisp_core::transfer::Transfer;
use islisp_core::value::Value;

fn eval_code(src: &str, interp: &Rc<Interpreter>) -> Result<Value, String> {
    let forms = read_all(src).map_err(|e| e.to_string())?;
    let mut result = Value::Null;
    for form in &forms {
        result = eval::eval(form, &interp.global, interp).map_err(|t| match t {
            Transfer::Condition(c) => condition::report_condition(&c),
            _ => "non-local transfer escaped top level".to_string(),
        })?;
    }
    Ok(result)
}

fn int(src: &str, interp: &Rc<Interpreter>) -> i64 {
    match eval_code(src, interp).unwrap() {
        Value::Integer(n) => n,
        other => panic!("expected an integer from {src:?}, got {other}"),
    }
}

#[test]
fn factorial_via_named_recursion() {
    let interp = Interpreter::new();
    eval_code(
        "(defun factorial (n) (if (<= n 1) 1 (* n (factorial (- n 1)))))",
        &interp,
    )
    .unwrap();
    assert_eq!(int("(factorial 5)", &interp), 120);
    assert_eq!(int("(factorial 0)", &interp), 1);
}

#[test]
fn tail_recursive_accumulator_does_not_overflow_the_stack() {
    let interp = Interpreter::new();
    eval_code(
        "(defun sum (n acc) (if (<= n 0) acc (sum (- n 1) (+ acc n))))",
        &interp,
    )
    .unwrap();
    assert_eq!(int("(sum 100000 0)", &interp), 5000050000);
}

#[test]
fn closures_capture_their_defining_environment() {
    let interp = Interpreter::new();
    eval_code("(defun make-adder (n) (lambda (x) (+ n x)))", &interp).unwrap();
    eval_code("(defglobal add5 (make-adder 5))", &interp).unwrap();
    eval_code("(defglobal add100 (make-adder 100))", &interp).unwrap();
    assert_eq!(int("(add5 10)", &interp), 15);
    assert_eq!(int("(add100 23)", &interp), 123);
}

#[test]
fn higher_order_list_functions_compose() {
    let interp = Interpreter::new();
    let result = eval_code(
        "(mapcar (lambda (x) (* x 2)) (quote (1 2 3)))",
        &interp,
    )
    .unwrap();
    let items = result.to_vec().unwrap();
    let doubled: Vec<i64> = items
        .into_iter()
        .map(|v| match v {
            Value::Integer(n) => n,
            other => panic!("expected an integer, got {other}"),
        })
        .collect();
    assert_eq!(doubled, vec![2, 4, 6]);
}

#[test]
fn user_defined_macro_expands_before_evaluation() {
    let interp = Interpreter::new();
    eval_code("(defmacro my-when (test expr) (list (quote if) test expr nil))", &interp).unwrap();
    assert_eq!(int("(my-when t 42)", &interp), 42);
    match eval_code("(my-when nil 42)", &interp).unwrap() {
        Value::Null => {}
        other => panic!("expected nil, got {other}"),
    }
}

#[test]
fn quasiquote_splices_and_unquotes() {
    let interp = Interpreter::new();
    let result = eval_code("(quasiquote (1 (unquote (+ 2 3)) 4))", &interp).unwrap();
    let items = result.to_vec().unwrap();
    assert_eq!(items.len(), 3);
    match &items[1] {
        Value::Integer(n) => assert_eq!(*n, 5),
        other => panic!("expected 5, got {other}"),
    }

    let spliced = eval_code(
        "(quasiquote (1 (unquote-splicing (list 2 3)) 4))",
        &interp,
    )
    .unwrap();
    assert_eq!(spliced.to_vec().unwrap().len(), 4);
}

#[test]
fn block_return_from_and_catch_throw_short_circuit_control_flow() {
    let interp = Interpreter::new();
    assert_eq!(int("(block outer (+ 1 (return-from outer 42) 99))", &interp), 42);
    assert_eq!(
        int("(catch (quote tag) (+ 1 (throw (quote tag) 7)))", &interp),
        7
    );
}

#[test]
fn tagbody_go_implements_a_loop() {
    let interp = Interpreter::new();
    eval_code("(defglobal counter 0)", &interp).unwrap();
    eval_code(
        r#"
        (tagbody
          top
          (setq counter (+ counter 1))
          (if (< counter 5) (go top)))
        "#,
        &interp,
    )
    .unwrap();
    assert_eq!(int("counter", &interp), 5);
}

#[test]
fn unwind_protect_runs_cleanup_even_when_the_body_throws() {
    let interp = Interpreter::new();
    eval_code("(defglobal cleaned-up nil)", &interp).unwrap();
    let result = eval_code(
        r#"
        (catch (quote tag)
          (unwind-protect
            (throw (quote tag) 1)
            (setq cleaned-up t)))
        "#,
        &interp,
    );
    assert!(result.is_ok());
    match eval_code("cleaned-up", &interp).unwrap() {
        Value::Symbol(s) => assert_eq!(s.name(), "t"),
        other => panic!("expected t, got {other}"),
    }
}

#[test]
fn with_handler_continue_condition_resumes_the_signal_site() {
    let interp = Interpreter::new();
    let result = eval_code(
        r#"
        (with-handler
          (lambda (c) (continue-condition c 999))
          (+ 1 (cerror "use a default" "something went wrong")))
        "#,
        &interp,
    )
    .unwrap();
    match result {
        Value::Integer(n) => assert_eq!(n, 1000),
        other => panic!("expected 1000, got {other}"),
    }
}

#[test]
fn unhandled_error_reports_a_readable_message() {
    let interp = Interpreter::new();
    let err = eval_code("(car 5)", &interp).unwrap_err();
    assert!(err.contains("<domain-error>"));
}

#[test]
fn defclass_establishes_a_subclass_relationship() {
    let interp = Interpreter::new();
    eval_code("(defclass <shape> () ())", &interp).unwrap();
    eval_code("(defclass <circle> (<shape>) ((radius)))", &interp).unwrap();
    let circle = interp.classes.lookup("<circle>").unwrap();
    let shape = interp.classes.lookup("<shape>").unwrap();
    let standard_object = interp.classes.lookup("<standard-object>").unwrap();
    assert!(circle.is_subclass_of(&shape));
    assert!(circle.is_subclass_of(&standard_object));
}

#[test]
fn create_instantiates_a_user_defined_class_and_slot_value_reads_and_writes_it() {
    let interp = Interpreter::new();
    eval_code("(defclass <shape> () ())", &interp).unwrap();
    eval_code("(defclass <circle> (<shape>) ((radius)))", &interp).unwrap();
    eval_code("(defglobal c (create <circle> (quote :radius) 5))", &interp).unwrap();

    assert_eq!(int("(slot-value c (quote radius))", &interp), 5);

    eval_code("(setf (slot-value c (quote radius)) 10)", &interp).unwrap();
    assert_eq!(int("(slot-value c (quote radius))", &interp), 10);
}

#[test]
fn create_dispatches_initialize_object_when_the_user_defines_one() {
    let interp = Interpreter::new();
    eval_code("(defclass <point> () ((x) (y)))", &interp).unwrap();
    eval_code("(defgeneric initialize-object (obj))", &interp).unwrap();
    eval_code(
        r#"(defmethod initialize-object ((obj <point>))
             (setf (slot-value obj (quote y)) 99))"#,
        &interp,
    )
    .unwrap();
    eval_code("(defglobal p (create <point> (quote :x) 1))", &interp).unwrap();

    assert_eq!(int("(slot-value p (quote x))", &interp), 1);
    assert_eq!(int("(slot-value p (quote y))", &interp), 99);
}

#[test]
fn generic_function_dispatches_on_argument_class_specificity() {
    let interp = Interpreter::new();
    eval_code("(defgeneric describe (x))", &interp).unwrap();
    eval_code(r#"(defmethod describe ((x <object>)) "an object")"#, &interp).unwrap();
    eval_code(r#"(defmethod describe ((x <integer>)) "an integer")"#, &interp).unwrap();

    match eval_code("(describe 5)", &interp).unwrap() {
        Value::String(s) => assert_eq!(*s.borrow(), "an integer"),
        other => panic!("expected an integer, got {other}"),
    }
    match eval_code("(describe (quote sym))", &interp).unwrap() {
        Value::String(s) => assert_eq!(*s.borrow(), "an object"),
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn method_combination_runs_around_before_primary_after_in_order() {
    let interp = Interpreter::new();
    eval_code("(defglobal trace ())", &interp).unwrap();
    eval_code("(defgeneric greet (x))", &interp).unwrap();
    eval_code(
        r#"(defmethod greet :around ((x <object>)) (setq trace (append trace (list (quote around-enter)))) (call-next-method) (setq trace (append trace (list (quote around-exit)))))"#,
        &interp,
    )
    .unwrap();
    eval_code(
        r#"(defmethod greet :before ((x <object>)) (setq trace (append trace (list (quote before)))))"#,
        &interp,
    )
    .unwrap();
    eval_code(
        r#"(defmethod greet ((x <object>)) (setq trace (append trace (list (quote primary)))))"#,
        &interp,
    )
    .unwrap();
    eval_code(
        r#"(defmethod greet :after ((x <object>)) (setq trace (append trace (list (quote after)))))"#,
        &interp,
    )
    .unwrap();

    eval_code("(greet 1)", &interp).unwrap();
    let trace = eval_code("trace", &interp).unwrap();
    let order: Vec<String> = trace
        .to_vec()
        .unwrap()
        .into_iter()
        .map(|v| match v {
            Value::Symbol(s) => s.name().to_string(),
            other => panic!("expected a symbol, got {other}"),
        })
        .collect();
    assert_eq!(order, vec!["around-enter", "before", "primary", "after", "around-exit"]);
}

#[test]
fn eq_and_eql_distinguish_identity_from_numeric_equality() {
    let interp = Interpreter::new();
    match eval_code("(eq (quote a) (quote a))", &interp).unwrap() {
        Value::Symbol(s) => assert_eq!(s.name(), "t"),
        other => panic!("expected t, got {other}"),
    }
    match eval_code("(eq (cons 1 nil) (cons 1 nil))", &interp).unwrap() {
        Value::Null => {}
        other => panic!("expected nil for distinct conses, got {other}"),
    }
    match eval_code("(equal (cons 1 nil) (cons 1 nil))", &interp).unwrap() {
        Value::Symbol(s) => assert_eq!(s.name(), "t"),
        other => panic!("expected t, got {other}"),
    }
}

#[test]
fn gensym_produces_symbols_unique_from_any_interned_symbol() {
    let interp = Interpreter::new();
    eval_code("(defglobal g (gensym))", &interp).unwrap();
    match eval_code("(eq g (intern (symbol-name g)))", &interp).unwrap() {
        Value::Null => {}
        other => panic!("a gensym must not be eq to an interned symbol with the same name, got {other}"),
    }
}
