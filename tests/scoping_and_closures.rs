//! Lexical scoping (`let`), closures over outer bindings, and the
//! post-`let` visibility guarantee (§8 P2).

use seqlisp::{Engine, Value};

fn eval_number(engine: &mut Engine, src: &str) -> f64 {
    match engine.eval(src).unwrap_or_else(|e| panic!("eval({src:?}) failed: {e}")) {
        Value::Number(n) => n,
        other => panic!("eval({src:?}) returned a non-Number: {other:?}"),
    }
}

#[test]
fn let_binds_within_its_body() {
    let mut engine = Engine::new();
    assert_eq!(eval_number(&mut engine, "(let ((x 2) (y 3)) (+ x y))"), 5.0);
}

#[test]
fn let_bindings_do_not_leak_into_the_enclosing_scope() {
    let mut engine = Engine::new();
    eval_number(&mut engine, "(let ((x 2) (y 3)) (+ x y))");
    assert!(
        matches!(engine.eval("x"), Err(_)),
        "x should not be visible after the let that introduced it has exited"
    );
}

#[test]
fn nested_let_shadows_without_corrupting_the_outer_binding() {
    let mut engine = Engine::new();
    engine.eval("(set x 1)").unwrap();
    assert_eq!(eval_number(&mut engine, "(let ((x 2)) x)"), 2.0);
    assert_eq!(eval_number(&mut engine, "x"), 1.0);
}

#[test]
fn lambda_closes_over_its_defining_environment() {
    let mut engine = Engine::new();
    engine.eval("(set adder (let ((n 10)) (lambda (x) (+ x n))))").unwrap();
    assert_eq!(eval_number(&mut engine, "(adder 5)"), 15.0);
    // `n` itself is not reachable from the top level; only the closure saw it.
    assert!(engine.eval("n").is_err());
}

#[test]
fn two_closures_from_the_same_let_do_not_share_mutable_state_across_separate_lets() {
    let mut engine = Engine::new();
    engine.eval("(set a (let ((n 1)) (lambda () n)))").unwrap();
    engine.eval("(set b (let ((n 2)) (lambda () n)))").unwrap();
    assert_eq!(eval_number(&mut engine, "(a)"), 1.0);
    assert_eq!(eval_number(&mut engine, "(b)"), 2.0);
}

#[test]
fn a_balanced_stack_leaves_exactly_one_residual_value() {
    // Stack-balance (§8 P1): a deeply nested but well-formed expression still
    // resolves to a single operand, never an underflow or leftover value.
    let mut engine = Engine::new();
    assert_eq!(
        eval_number(&mut engine, "(+ (let ((x 1)) x) (let ((y 2) (z 3)) (+ y z)))"),
        6.0
    );
}
