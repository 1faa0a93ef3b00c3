//! Implementation of the `<` builtin.

use crate::error::VmError;
use crate::heap::Heap;
use crate::intern::Interner;
use crate::value::Value;

/// Numeric less-than. Booleans are encoded as `Number` 0/1 (§3).
pub fn builtin_lt(args: &[Value], _heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let [a, b] = args else { return Err(VmError::ArgumentCountMismatch) };
    let a = a.as_number().ok_or(VmError::NotANumber)?;
    let b = b.as_number().ok_or(VmError::NotANumber)?;
    Ok(Value::Number(if a < b { 1.0 } else { 0.0 }))
}
