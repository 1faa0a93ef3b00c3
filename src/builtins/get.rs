//! Implementation of the `get` builtin.
//!
//! Polymorphic over Object (string key) and Cons-chain (numeric index).
//! Open Question (b): a chain index is 0-indexed.

use super::util::cons_nth;
use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

pub fn builtin_get(args: &[Value], heap: &mut Heap, interner: &Interner) -> Result<Value, VmError> {
    let [container, key] = args else { return Err(VmError::ArgumentCountMismatch) };
    let id = match container {
        Value::Ref(id) => *id,
        _ => return Err(VmError::TypeMismatch),
    };
    match heap.get(id) {
        HeapData::Object(map) => {
            let key_bytes = match key {
                Value::Symbol(s) => interner.resolve(*s).as_bytes().to_vec(),
                Value::Ref(kid) => match heap.get(*kid) {
                    HeapData::Str(bytes) => bytes.clone(),
                    _ => return Err(VmError::InvalidKey),
                },
                _ => return Err(VmError::InvalidKey),
            };
            map.get(&key_bytes).cloned().ok_or(VmError::InvalidKey)
        }
        HeapData::Cons(..) => {
            let index = key.as_number().ok_or(VmError::NotANumber)?;
            if index < 0.0 {
                return Err(VmError::InvalidKey);
            }
            cons_nth(container, index as usize, heap)
        }
        _ => Err(VmError::TypeMismatch),
    }
}
