//! Cons chains, strings, vectors, and `quote`d data (§3, §4.2 `Quote` rule).

use seqlisp::{Engine, Value};

fn eval_number(engine: &mut Engine, src: &str) -> f64 {
    match engine.eval(src).unwrap_or_else(|e| panic!("eval({src:?}) failed: {e}")) {
        Value::Number(n) => n,
        other => panic!("eval({src:?}) returned a non-Number: {other:?}"),
    }
}

#[test]
fn list_cons_car_cdr_roundtrip() {
    let mut engine = Engine::new();
    engine.eval("(set xs (list 1 2 3))").unwrap();
    assert_eq!(eval_number(&mut engine, "(car xs)"), 1.0);
    assert_eq!(eval_number(&mut engine, "(car (cdr xs))"), 2.0);
    assert_eq!(eval_number(&mut engine, "(len xs)"), 3.0);
}

#[test]
fn nil_p_distinguishes_nil_from_everything_else() {
    let mut engine = Engine::new();
    assert_eq!(eval_number(&mut engine, "(nil? nil)"), 1.0);
    assert_eq!(eval_number(&mut engine, "(nil? 0)"), 0.0);
    assert_eq!(eval_number(&mut engine, "(nil? (list 1))"), 0.0);
}

#[test]
fn concat_strings_byte_wise() {
    let mut engine = Engine::new();
    match engine.eval(r#"(concat "foo" "bar")"#).unwrap() {
        Value::Ref(_) => {}
        other => panic!("expected a heap string, got {other:?}"),
    }
    // Equality is structural, so two separately-concatenated strings with
    // the same bytes compare equal despite distinct HeapIds.
    assert_eq!(eval_number(&mut engine, r#"(== (concat "foo" "bar") (concat "foo" "bar"))"#), 1.0);
}

#[test]
fn concat_cons_chains_element_wise() {
    let mut engine = Engine::new();
    engine.eval("(set xs (concat (list 1 2) (list 3 4)))").unwrap();
    assert_eq!(eval_number(&mut engine, "(len xs)"), 4.0);
    assert_eq!(eval_number(&mut engine, "(car (cdr (cdr xs)))"), 3.0);
}

#[test]
fn equality_is_structural_not_by_identity() {
    let mut engine = Engine::new();
    assert_eq!(eval_number(&mut engine, "(== (cons 1 2) (cons 1 2))"), 1.0);
    assert_eq!(eval_number(&mut engine, "(== (cons 1 2) (cons 1 3))"), 0.0);
}

#[test]
fn less_than_is_numeric() {
    let mut engine = Engine::new();
    assert_eq!(eval_number(&mut engine, "(< 1 2)"), 1.0);
    assert_eq!(eval_number(&mut engine, "(< 2 1)"), 0.0);
}

#[test]
fn quoted_list_is_data_not_a_call() {
    let mut engine = Engine::new();
    // Without quote this would try to call `+` with arguments 1 and 2 and
    // evaluate to 3; quoted, it stays an inert two-element cons chain.
    engine.eval("(set q (quote (+ 1 2)))").unwrap();
    assert_eq!(eval_number(&mut engine, "(len q)"), 3.0);
    match engine.eval("(car q)").unwrap() {
        Value::Symbol(_) => {}
        other => panic!("expected the quoted head to remain a Symbol, got {other:?}"),
    }
}

#[test]
fn vector_construction_and_indexed_get_via_stride() {
    let mut engine = Engine::new();
    engine.eval("(set v (# 10 20 30 40))").unwrap();
    assert_eq!(eval_number(&mut engine, "(@reduce + (@stride v 1 2))"), 70.0);
}
