//! Mark-sweep garbage collector and heap arena.
//!
//! Every heap-allocated [`Value`] payload (`String`, `List`, `Vector`,
//! `Cons`, `Object`, `Closure`, `FunctionDef`, `Environment`) lives in a
//! slot here, addressed by [`HeapId`]. Collection walks the roots the VM
//! hands it (global env, operand stack, every active frame's env — §3
//! Invariant I2) and frees everything unreachable.
//!
//! This generalizes the teacher's refcounted `Heap<T: ResourceTracker>`
//! arena (`heap.rs` in the pack) to a tracing mark-sweep collector, per the
//! spec's explicit "mark-sweep" requirement (§2) and Design Notes §9 on
//! cyclic closure/environment graphs: each slot carries a mark bit instead
//! of a refcount, and marking short-circuits on an already-marked object so
//! cycles terminate.

use ahash::AHashMap;
use std::rc::Rc;

use crate::bytecode::Code;
use crate::intern::SymbolId;
use crate::value::Value;

/// Index into the heap arena. Stable for the lifetime of the object; never
/// reused while the object is alive, but may be recycled after a sweep.
pub type HeapId = usize;

struct Slot {
    marked: bool,
    data: HeapData,
}

/// Payload of a single heap-allocated value (§3's heap-typed `Value` variants).
#[derive(Debug)]
pub enum HeapData {
    Str(Vec<u8>),
    /// Flat sequence produced by the parser for every `(...)` form. Purely
    /// an AST/compile-time shape — by the time compilation finishes, no
    /// runtime `Value` should reference a `List` (quoting materializes it
    /// into a `Cons` chain instead; see `PushQuote` in `vm.rs`).
    List(Vec<Value>),
    Vector(Vec<f32>),
    Cons(Value, Value),
    Object(AHashMap<Vec<u8>, Value>),
    Closure(Closure),
    FunctionDef(FunctionDef),
    Env(EnvData),
}

impl HeapData {
    fn type_str(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Vector(_) => "vector",
            Self::Cons(..) => "cons",
            Self::Object(_) => "object",
            Self::Closure(_) => "closure",
            Self::FunctionDef(_) => "function-def",
            Self::Env(_) => "environment",
        }
    }
}

/// A lexical scope: a mapping from interned name to value, with an
/// optional parent. Per Design Notes §9, environments are GC-tracked heap
/// objects (not leaked host-stack frames), so closures pin them alive
/// exactly like any other reachable heap value.
#[derive(Debug)]
pub struct EnvData {
    pub parent: Option<HeapId>,
    pub vars: AHashMap<SymbolId, Value>,
}

impl EnvData {
    #[must_use]
    pub fn root() -> Self {
        Self {
            parent: None,
            vars: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn child(parent: HeapId) -> Self {
        Self {
            parent: Some(parent),
            vars: AHashMap::new(),
        }
    }
}

/// Either a single-arity lambda body, or an ordered list of pattern-matched
/// arms (§4.1 closure payload, §4.3 pattern dispatch).
#[derive(Debug)]
pub enum ClosureKind {
    Lambda { params: Vec<SymbolId>, code: Rc<Code> },
    Named { defs: Vec<HeapId> },
}

/// A callable value: a parameter/body pair (lambda) or a set of
/// pattern-dispatched arms (named), plus the environment it closed over.
#[derive(Debug)]
pub struct Closure {
    pub kind: ClosureKind,
    pub env: HeapId,
}

/// One arm of a named (`defun`) function: its argument patterns and the
/// compiled body for that arm.
#[derive(Debug)]
pub struct FunctionDef {
    pub patterns: Vec<Pattern>,
    pub code: Rc<Code>,
}

/// One parameter-position pattern within a `FunctionDef` (§4.3).
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches any argument at this position, binding `name` to it.
    Var(SymbolId),
    /// Matches only a `Number` argument numerically equal to this literal.
    NumberLit(f64),
    /// A literal shape the compiler accepted but the matcher does not
    /// (yet) understand how to match. Per §4.3, an arm containing an
    /// `Other` pattern is always skipped during dispatch rather than
    /// rejected at compile time — this keeps the pattern vocabulary
    /// forward-extensible without a compiler round-trip.
    Other,
}

impl Pattern {
    #[must_use]
    pub fn matches(&self, arg: &Value) -> bool {
        match self {
            Self::Var(_) => true,
            Self::NumberLit(n) => matches!(arg, Value::Number(m) if m == n),
            Self::Other => false,
        }
    }

    /// Structural equality used by `DefineFuncDef` to decide whether a new
    /// arm replaces an existing one in place (Design Notes §9).
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Var(a), Self::Var(b)) => a == b,
            (Self::NumberLit(a), Self::NumberLit(b)) => a == b,
            (Self::Other, Self::Other) => true,
            _ => false,
        }
    }
}

#[must_use]
pub fn patterns_eq(a: &[Pattern], b: &[Pattern]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
}

/// The heap arena and mark-sweep collector.
#[derive(Default)]
pub struct Heap {
    slots: Vec<Option<Slot>>,
    free: Vec<HeapId>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new heap object, reusing a freed slot if one is available.
    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let slot = Slot { marked: false, data };
        if let Some(id) = self.free.pop() {
            self.slots[id] = Some(slot);
            id
        } else {
            let id = self.slots.len();
            self.slots.push(Some(slot));
            id
        }
    }

    /// # Panics
    /// Panics if `id` is out of range or already freed — this indicates a
    /// dangling `HeapId`, which should never happen for correctly rooted
    /// bytecode (see the module-level note on `PushQuote`/`PushConst*`).
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id].as_ref().expect("Heap::get: dangling or freed HeapId").data
    }

    /// # Panics
    /// See [`Heap::get`].
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id].as_mut().expect("Heap::get_mut: dangling or freed HeapId").data
    }

    #[must_use]
    pub fn type_str(&self, id: HeapId) -> &'static str {
        self.get(id).type_str()
    }

    /// Runs a full mark-sweep collection.
    ///
    /// `roots` should include every value directly reachable from the
    /// global environment, the operand stack, and every active frame's
    /// environment (§3 Invariant I2). Anything not transitively reachable
    /// from `roots` is freed.
    pub fn collect<'a>(&mut self, roots: impl Iterator<Item = &'a Value>) {
        let mut pending: Vec<HeapId> = roots.filter_map(Value::ref_id).collect();
        while let Some(id) = pending.pop() {
            let Some(slot) = self.slots.get_mut(id).and_then(Option::as_mut) else {
                continue;
            };
            if slot.marked {
                continue;
            }
            slot.marked = true;
            enqueue_children(&slot.data, &mut pending);
        }
        for (id, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                Some(entry) if entry.marked => entry.marked = false,
                Some(_) => {
                    *slot = None;
                    self.free.push(id);
                }
                None => {}
            }
        }
    }

    /// Number of live (allocated and unfreed) slots. Exposed for tests that
    /// assert on GC behavior (§8 P4).
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

fn enqueue_children(data: &HeapData, stack: &mut Vec<HeapId>) {
    let mut push_if_ref = |v: &Value| {
        if let Some(id) = v.ref_id() {
            stack.push(id);
        }
    };
    match data {
        HeapData::Str(_) | HeapData::Vector(_) => {}
        HeapData::List(items) => items.iter().for_each(|v| push_if_ref(v)),
        HeapData::Cons(car, cdr) => {
            push_if_ref(car);
            push_if_ref(cdr);
        }
        HeapData::Object(map) => map.values().for_each(|v| push_if_ref(v)),
        HeapData::Closure(c) => {
            stack.push(c.env);
            if let ClosureKind::Named { defs } = &c.kind {
                stack.extend(defs.iter().copied());
            }
        }
        HeapData::FunctionDef(_) => {}
        HeapData::Env(env) => {
            if let Some(parent) = env.parent {
                stack.push(parent);
            }
            env.vars.values().for_each(|v| push_if_ref(v));
        }
    }
}
