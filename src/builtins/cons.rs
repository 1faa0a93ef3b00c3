//! Implementation of the `cons` builtin.

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

/// Allocates a fresh pair cell.
pub fn builtin_cons(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [car, cdr] = args else { return Err(VmError::ArgumentCountMismatch) };
    let id = heap.allocate(HeapData::Cons(car.clone(), cdr.clone()));
    Ok(Value::Ref(id))
}
