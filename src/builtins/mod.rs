//! The built-in function table (§6), registered into the global
//! environment before a program's first `Engine::eval`.
//!
//! One submodule per builtin, mirroring the teacher's `builtins/len.rs`
//! layout — except these are plain `fn` items registered directly as
//! `Value::Native`, not a dispatch enum, since the interface here is a
//! flat name table rather than Python's builtin/type/exception hierarchy.

mod car;
mod cdr;
mod concat;
mod cons;
mod eq;
mod get;
mod len;
mod list;
mod lt;
mod nil_p;
mod reduce;
mod stride;
mod util;
mod vector;

use crate::heap::{Heap, HeapData, HeapId};
use crate::intern::{Interner, SymbolId};
use crate::value::{NativeFn, Value};

/// Interns every built-in's name and binds it in `global_env` (§6).
/// `nil` is bound directly to `Value::Nil` rather than registered as a
/// Native — it is a constant, not a callable.
pub fn register_all(heap: &mut Heap, interner: &mut Interner, global_env: HeapId) {
    define_native(heap, interner, global_env, "<", lt::builtin_lt);
    define_native(heap, interner, global_env, "==", eq::builtin_eq);
    define_native(heap, interner, global_env, "cons", cons::builtin_cons);
    define_native(heap, interner, global_env, "car", car::builtin_car);
    define_native(heap, interner, global_env, "cdr", cdr::builtin_cdr);
    define_native(heap, interner, global_env, "list", list::builtin_list);
    define_native(heap, interner, global_env, "nil?", nil_p::builtin_nil_p);
    define_native(heap, interner, global_env, "len", len::builtin_len);
    define_native(heap, interner, global_env, "concat", concat::builtin_concat);
    define_native(heap, interner, global_env, "get", get::builtin_get);
    define_native(heap, interner, global_env, "#", vector::builtin_vector);
    define_native(heap, interner, global_env, "@reduce", reduce::builtin_reduce);
    define_native(heap, interner, global_env, "@stride", stride::builtin_stride);

    let nil_id = interner.intern("nil");
    bind_global(heap, global_env, nil_id, Value::Nil);
}

fn define_native(heap: &mut Heap, interner: &mut Interner, global_env: HeapId, name: &'static str, f: NativeFn) {
    let id = interner.intern(name);
    bind_global(heap, global_env, id, Value::Native(f, name));
}

fn bind_global(heap: &mut Heap, global_env: HeapId, name: SymbolId, value: Value) {
    match heap.get_mut(global_env) {
        HeapData::Env(e) => {
            e.vars.insert(name, value);
        }
        _ => unreachable!("global_env must be an Env node"),
    }
}
