//! Implementation of the `@reduce` builtin.

use crate::error::VmError;
use crate::heap::{Heap, HeapData};
use crate::intern::Interner;
use crate::value::Value;

/// `(@reduce OP VEC)` folds `VEC`'s lanes left to right through `OP`
/// (`+`, `-`, `*`, `/`, `min`, `max`), yielding a scalar `Number`.
///
/// `OP` arrives as a `Symbol` — the VM's `LoadVar` fallback produces one for
/// reserved operator names that were never bound as variables (§4.4) — so
/// its text must be resolved through the interner rather than matched on
/// the `Symbol` handle directly.
pub fn builtin_reduce(args: &[Value], heap: &mut Heap, interner: &Interner) -> Result<Value, VmError> {
    let [op_val, vec_val] = args else { return Err(VmError::ArgumentCountMismatch) };
    let Value::Symbol(op_sym) = op_val else {
        return Err(VmError::TypeMismatch);
    };
    let op_name = interner.resolve(*op_sym);

    let id = vec_val.ref_id().ok_or(VmError::TypeMismatch)?;
    let lanes = match heap.get(id) {
        HeapData::Vector(v) => v.clone(),
        _ => return Err(VmError::TypeMismatch),
    };
    let mut iter = lanes.iter();
    let mut acc = *iter.next().ok_or(VmError::ArgumentCountMismatch)? as f64;
    for &lane in iter {
        let x = lane as f64;
        acc = match op_name {
            "+" => acc + x,
            "-" => acc - x,
            "*" => acc * x,
            "/" => {
                if x == 0.0 {
                    return Err(VmError::DivisionByZero);
                }
                acc / x
            }
            "min" => acc.min(x),
            "max" => acc.max(x),
            _ => return Err(VmError::TypeMismatch),
        };
    }
    Ok(Value::Number(acc))
}
