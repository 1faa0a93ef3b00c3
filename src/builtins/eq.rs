//! Implementation of the `==` builtin.

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

/// Structural equality over every runtime `Value` shape, recursing through
/// `Cons` and `Object` payloads. Two distinct `HeapId`s can still compare
/// equal (e.g. two separately-`cons`ed pairs holding the same numbers).
fn values_equal(a: &Value, b: &Value, heap: &Heap) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Nil, Value::Nil) => true,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Native(fx, nx), Value::Native(fy, ny)) => fx == fy && nx == ny,
        (Value::Ref(x), Value::Ref(y)) => {
            if x == y {
                return true;
            }
            match (heap.get(*x), heap.get(*y)) {
                (HeapData::Str(a), HeapData::Str(b)) => a == b,
                (HeapData::Vector(a), HeapData::Vector(b)) => a == b,
                (HeapData::Cons(ac, ad), HeapData::Cons(bc, bd)) => values_equal(ac, bc, heap) && values_equal(ad, bd, heap),
                (HeapData::Object(ma), HeapData::Object(mb)) => {
                    ma.len() == mb.len() && ma.iter().all(|(k, v)| mb.get(k).is_some_and(|v2| values_equal(v, v2, heap)))
                }
                _ => false,
            }
        }
        _ => false,
    }
}

pub fn builtin_eq(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [a, b] = args else { return Err(VmError::ArgumentCountMismatch) };
    Ok(Value::Number(if values_equal(a, b, heap) { 1.0 } else { 0.0 }))
}
