//! Shared helpers for walking and building `Cons` chains.
//!
//! Not itself a builtin — factored out because `list`, `concat`, `len`, and
//! `get` all need to walk or build the same chained-pair representation
//! (§3's canonical list encoding).

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::value::Value;

/// Collects a `Cons` chain's `car`s into a `Vec`, stopping at the first
/// non-`Cons` tail (normally `Nil`, but improper lists are tolerated rather
/// than rejected).
pub(super) fn cons_to_vec(start: &Value, heap: &Heap) -> Vec<Value> {
    let mut out = Vec::new();
    let mut cur = start.clone();
    loop {
        match &cur {
            Value::Ref(id) => match heap.get(*id) {
                HeapData::Cons(car, cdr) => {
                    out.push(car.clone());
                    cur = cdr.clone();
                }
                _ => break,
            },
            _ => break,
        }
    }
    out
}

/// Builds a `Nil`-terminated `Cons` chain from `items`, right to left.
pub(super) fn vec_to_cons(items: &[Value], heap: &mut Heap) -> Value {
    let mut acc = Value::Nil;
    for item in items.iter().rev() {
        let id = heap.allocate(HeapData::Cons(item.clone(), acc));
        acc = Value::Ref(id);
    }
    acc
}

/// Walks `index` cells into a `Cons` chain and returns that cell's `car`
/// (Open Question (b): 0-indexed is canonical).
pub(super) fn cons_nth(start: &Value, mut index: usize, heap: &Heap) -> Result<Value, VmError> {
    let mut cur = start.clone();
    loop {
        match &cur {
            Value::Ref(id) => match heap.get(*id) {
                HeapData::Cons(car, cdr) => {
                    if index == 0 {
                        return Ok(car.clone());
                    }
                    index -= 1;
                    cur = cdr.clone();
                }
                _ => return Err(VmError::InvalidKey),
            },
            _ => return Err(VmError::InvalidKey),
        }
    }
}
