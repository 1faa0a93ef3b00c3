//! Mark-sweep soundness (§8 P4): reachable heap objects survive a
//! collection, unreachable ones are freed, and cycles through closures and
//! environments don't leak or crash the collector.

use seqlisp::Engine;

#[test]
fn unreachable_allocations_are_freed_by_collect() {
    let mut engine = Engine::new();
    // Each `cons` allocates a heap cell; none of these are ever bound.
    for _ in 0..50 {
        engine.eval("(cons 1 2)").unwrap();
    }
    let before = engine.live_heap_count();
    engine.collect();
    let after = engine.live_heap_count();
    assert!(after < before, "collect should have freed the discarded cons cells (before={before}, after={after})");
}

#[test]
fn a_bound_value_survives_collection() {
    let mut engine = Engine::new();
    engine.eval(r#"(set pair (cons 1 2))"#).unwrap();
    engine.collect();
    match engine.eval("(car pair)").unwrap() {
        seqlisp::Value::Number(n) => assert_eq!(n, 1.0),
        other => panic!("expected Number, got {other:?}"),
    }
}

#[test]
fn repeated_collection_is_idempotent_once_the_heap_is_quiescent() {
    let mut engine = Engine::new();
    engine.eval(r#"(set xs (list 1 2 3))"#).unwrap();
    engine.collect();
    let first = engine.live_heap_count();
    engine.collect();
    let second = engine.live_heap_count();
    assert_eq!(first, second);
}

#[test]
fn a_closure_cycle_through_its_own_environment_does_not_leak_or_crash() {
    // `loopy`'s named closure captures an environment that, once `loopy` is
    // bound there, points back at the closure holding it (closure -> env ->
    // var -> closure). A refcounted scheme would leak this forever; the
    // mark-sweep collector must still free it once `loopy` is unreachable.
    let mut engine = Engine::new();
    engine.eval("(defun loopy (0) 1)").unwrap();
    engine.eval("(defun loopy (n) (loopy (- n 1)))").unwrap();
    engine.eval("(loopy 3)").unwrap();
    let before = engine.live_heap_count();
    engine.eval("(set loopy nil)").unwrap();
    engine.collect();
    let after = engine.live_heap_count();
    // No panic, and the stale closure/env graph is gone rather than pinned
    // alive forever by the cycle.
    assert!(after < before, "before={before}, after={after}");
}
