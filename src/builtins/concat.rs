//! Implementation of the `concat` builtin.

use super::util::{cons_to_vec, vec_to_cons};
use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

/// Concatenates Strings byte-wise, or Cons-chains element-wise, based on
/// the shape of the first argument. Mixing the two shapes is a type error.
pub fn builtin_concat(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    let first = args.first().ok_or(VmError::ArgumentCountMismatch)?;
    let is_string = matches!(first, Value::Ref(id) if matches!(heap.get(*id), HeapData::Str(_)));

    if is_string {
        let mut bytes = Vec::new();
        for a in args {
            match a {
                Value::Ref(id) => match heap.get(*id) {
                    HeapData::Str(b) => bytes.extend_from_slice(b),
                    _ => return Err(VmError::TypeMismatch),
                },
                _ => return Err(VmError::TypeMismatch),
            }
        }
        let id = heap.allocate(HeapData::Str(bytes));
        Ok(Value::Ref(id))
    } else {
        let mut items = Vec::new();
        for a in args {
            items.extend(cons_to_vec(a, heap));
        }
        Ok(vec_to_cons(&items, heap))
    }
}
