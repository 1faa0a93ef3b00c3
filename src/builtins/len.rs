//! Implementation of the `len` builtin.

use super::util::cons_to_vec;
use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

/// Length of a String (bytes), Vector (elements), Object (entries), or
/// Cons-chain (cells); `nil` has length 0.
pub fn builtin_len(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [v] = args else { return Err(VmError::ArgumentCountMismatch) };
    match v {
        Value::Nil => Ok(Value::Number(0.0)),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(bytes) => Ok(Value::Number(bytes.len() as f64)),
            HeapData::Vector(vec) => Ok(Value::Number(vec.len() as f64)),
            HeapData::Object(map) => Ok(Value::Number(map.len() as f64)),
            HeapData::Cons(..) => Ok(Value::Number(cons_to_vec(v, heap).len() as f64)),
            _ => Err(VmError::TypeMismatch),
        },
        _ => Err(VmError::TypeMismatch),
    }
}
