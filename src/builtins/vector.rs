//! Implementation of the `#` builtin (Vector construction).

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

pub fn builtin_vector(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let mut lanes = Vec::with_capacity(args.len());
    for a in args {
        lanes.push(a.as_number().ok_or(VmError::NotANumber)? as f32);
    }
    let id = heap.allocate(HeapData::Vector(lanes));
    Ok(Value::Ref(id))
}
