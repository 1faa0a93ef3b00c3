//! Implementation of the `@stride` builtin.

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

/// `(@stride VEC STRIDE OFFSET)` returns a new Vector of every `STRIDE`-th
/// lane starting at `OFFSET`.
pub fn builtin_stride(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [vec_val, stride_val, offset_val] = args else { return Err(VmError::ArgumentCountMismatch) };
    let id = vec_val.ref_id().ok_or(VmError::TypeMismatch)?;
    let lanes = match heap.get(id) {
        HeapData::Vector(v) => v.clone(),
        _ => return Err(VmError::TypeMismatch),
    };
    let stride = stride_val.as_number().ok_or(VmError::NotANumber)?;
    let offset = offset_val.as_number().ok_or(VmError::NotANumber)?;
    if stride <= 0.0 || offset < 0.0 {
        return Err(VmError::InvalidType);
    }
    let result: Vec<f32> = lanes.iter().skip(offset as usize).step_by(stride as usize).copied().collect();
    let id = heap.allocate(HeapData::Vector(result));
    Ok(Value::Ref(id))
}
