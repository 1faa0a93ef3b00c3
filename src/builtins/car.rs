//! Implementation of the `car` builtin.

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

pub fn builtin_car(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [v] = args else { return Err(VmError::ArgumentCountMismatch) };
    match v {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Cons(car, _) => Ok(car.clone()),
            _ => Err(VmError::NotACons),
        },
        _ => Err(VmError::NotACons),
    }
}
