//! Implementation of the `nil?` builtin.

use crate::error::VmError;
use crate::heap::Heap;
use crate::intern::Interner;
use crate::value::Value;

pub fn builtin_nil_p(args: &[Value], _heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [v] = args else { return Err(VmError::ArgumentCountMismatch) };
    Ok(Value::Number(if v.is_nil() { 1.0 } else { 0.0 }))
}
