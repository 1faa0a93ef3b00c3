//! §8 P6: a value produced by evaluating a program, when fed back in as
//! data and compared with `==`, evaluates equal to the original. There is
//! no `print`/reader-syntax round-trip in this language (`Nil` and `Symbol`
//! have no literal source form outside evaluation), so this is checked at
//! the value level — construct the same shape twice, independently, and
//! assert structural equality — rather than by re-parsing printed text.

use seqlisp::{Engine, Value};

fn eval_number(engine: &mut Engine, src: &str) -> f64 {
    match engine.eval(src).unwrap_or_else(|e| panic!("eval({src:?}) failed: {e}")) {
        Value::Number(n) => n,
        other => panic!("eval({src:?}) returned a non-Number: {other:?}"),
    }
}

#[test]
fn a_number_round_trips_through_reevaluation() {
    let mut engine = Engine::new();
    engine.eval("(set v (+ 2 3))").unwrap();
    assert_eq!(eval_number(&mut engine, "(== v (+ 2 3))"), 1.0);
}

#[test]
fn a_string_round_trips_through_reevaluation() {
    let mut engine = Engine::new();
    engine.eval(r#"(set v (concat "a" "b"))"#).unwrap();
    assert_eq!(eval_number(&mut engine, r#"(== v "ab")"#), 1.0);
}

#[test]
fn a_list_round_trips_through_reevaluation() {
    let mut engine = Engine::new();
    engine.eval("(set v (list 1 2 3))").unwrap();
    assert_eq!(eval_number(&mut engine, "(== v (list 1 2 3))"), 1.0);
}

#[test]
fn an_object_literal_round_trips_through_reevaluation() {
    let mut engine = Engine::new();
    engine.eval(r#"(set v { a 1 b 2 })"#).unwrap();
    assert_eq!(eval_number(&mut engine, r#"(== v { a 1 b 2 })"#), 1.0);
    // Key order in the literal doesn't matter; the comparison is by content.
    assert_eq!(eval_number(&mut engine, r#"(== v { b 2 a 1 })"#), 1.0);
}

#[test]
fn nil_round_trips_through_the_nil_global_since_it_has_no_literal_syntax() {
    let mut engine = Engine::new();
    match engine.eval("nil").unwrap() {
        Value::Nil => {}
        other => panic!("expected Nil, got {other:?}"),
    }
    assert_eq!(eval_number(&mut engine, "(== nil nil)"), 1.0);
}

#[test]
fn a_symbol_round_trips_only_through_quoting_since_a_bare_one_evaluates_as_a_variable_reference() {
    let mut engine = Engine::new();
    assert_eq!(eval_number(&mut engine, "(== (quote foo) (quote foo))"), 1.0);
    assert_eq!(eval_number(&mut engine, "(== (quote foo) (quote bar))"), 0.0);
}
