//! Parse- and compile-time rejection of malformed programs, and runtime
//! errors that must surface rather than being silently swallowed (§7).

use seqlisp::{EngineError, Engine};

#[test]
fn unterminated_list_is_a_parse_error() {
    let mut engine = Engine::new();
    assert!(matches!(engine.eval("(+ 1 2"), Err(EngineError::Parse(_))));
}

#[test]
fn arithmetic_needs_at_least_two_operands() {
    let mut engine = Engine::new();
    assert!(matches!(engine.eval("(+ 1)"), Err(EngineError::Compile(_))));
    assert!(matches!(engine.eval("(+)"), Err(EngineError::Compile(_))));
}

#[test]
fn set_requires_a_symbol_name_and_an_expression() {
    let mut engine = Engine::new();
    assert!(matches!(engine.eval("(set 1 2)"), Err(EngineError::Compile(_))));
    assert!(matches!(engine.eval("(set x)"), Err(EngineError::Compile(_))));
}

#[test]
fn lambda_parameters_must_be_a_list_of_symbols() {
    let mut engine = Engine::new();
    assert!(matches!(engine.eval("(lambda (1) x)"), Err(EngineError::Compile(_))));
    assert!(matches!(engine.eval("(lambda x x)"), Err(EngineError::Compile(_))));
}

#[test]
fn defun_requires_a_name_a_pattern_list_and_a_body() {
    let mut engine = Engine::new();
    assert!(matches!(engine.eval("(defun f)"), Err(EngineError::Compile(_))));
    assert!(matches!(engine.eval("(defun f n 1)"), Err(EngineError::Compile(_))));
}

#[test]
fn calling_a_non_function_is_a_runtime_error() {
    let mut engine = Engine::new();
    engine.eval("(set x 5)").unwrap();
    assert!(matches!(engine.eval("(x 1 2)"), Err(EngineError::Vm(_))));
}

#[test]
fn referencing_an_unbound_variable_is_a_runtime_error() {
    let mut engine = Engine::new();
    assert!(matches!(engine.eval("never-bound"), Err(EngineError::Vm(_))));
}

#[test]
fn calling_a_lambda_with_the_wrong_argument_count_is_a_runtime_error() {
    let mut engine = Engine::new();
    engine.eval("(set f (lambda (a b) (+ a b)))").unwrap();
    assert!(matches!(engine.eval("(f 1)"), Err(EngineError::Vm(_))));
    assert!(matches!(engine.eval("(f 1 2 3)"), Err(EngineError::Vm(_))));
}
