//! Implementation of the `cdr` builtin.

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

pub fn builtin_cdr(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [v] = args else { return Err(VmError::ArgumentCountMismatch) };
    match v {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Cons(_, cdr) => Ok(cdr.clone()),
            _ => Err(VmError::NotACons),
        },
        _ => Err(VmError::NotACons),
    }
}
