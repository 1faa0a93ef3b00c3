//! Implementation of the `list` builtin.

use super::util::vec_to_cons;
use crate::error::VmError;
use crate::heap::Heap;
use crate::intern::Interner;
use crate::value::Value;

/// Builds a `Cons` chain from its arguments, in order.
pub fn builtin_list(args: &[Value], heap: &mut Heap, _interner: &Interner) -> Result<Value, VmError> {
    Ok(vec_to_cons(args, heap))
}
