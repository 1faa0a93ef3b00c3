//! The stack-based virtual machine (§4.4).
//!
//! `run` drives a single operand stack and call-frame stack to completion.
//! Every heap allocation a `Closure`/`FunctionDef`/`Env`/`Vector`/etc. needs
//! goes through the shared [`Heap`], so results stay traceable by the
//! collector (§9 "native calling convention").

use std::rc::Rc;

use ahash::AHashMap;

use crate::bytecode::{Code, Instruction, QuotedValue};
use crate::error::VmError;
use crate::heap::{Closure, ClosureKind, EnvData, Heap, HeapData, HeapId, Pattern, patterns_eq};
use crate::intern::{Interner, SymbolId};
use crate::value::Value;

/// One VM call frame: the code it is executing, its program counter, and
/// the environment local variable lookups resolve against (§4.4).
struct Frame {
    code: Rc<Code>,
    pc: usize,
    env: HeapId,
}

/// Runs `code` to completion starting in `global_env`, returning the sole
/// residual operand (§4.4, I3) or the first error encountered.
pub fn run(code: Rc<Code>, heap: &mut Heap, interner: &Interner, global_env: HeapId) -> Result<Value, VmError> {
    let mut stack: Vec<Value> = Vec::new();
    let mut frames: Vec<Frame> = vec![Frame { code, pc: 0, env: global_env }];

    loop {
        let top = frames.len() - 1;
        let pc = frames[top].pc;
        let env = frames[top].env;
        let code = Rc::clone(&frames[top].code);

        let Some(instr) = code.get(pc) else {
            frames.pop();
            if frames.is_empty() {
                return finish(stack);
            }
            continue;
        };
        frames[top].pc += 1;

        match instr {
            Instruction::PushConst(n) => stack.push(Value::Number(*n)),
            Instruction::PushConstString(bytes) => {
                let id = heap.allocate(HeapData::Str(bytes.clone()));
                stack.push(Value::Ref(id));
            }
            Instruction::PushConstSymbol(s) => stack.push(Value::Symbol(*s)),
            Instruction::PushQuote(qv) => {
                let v = materialize_quoted(qv, heap);
                stack.push(v);
            }
            Instruction::PushFunc(tmpl) => {
                let closure = Closure {
                    kind: ClosureKind::Lambda {
                        params: tmpl.params.clone(),
                        code: Rc::clone(&tmpl.code),
                    },
                    env,
                };
                let id = heap.allocate(HeapData::Closure(closure));
                stack.push(Value::Ref(id));
            }
            Instruction::PushFuncDef(tmpl) => {
                let fd = crate::heap::FunctionDef {
                    patterns: tmpl.patterns.clone(),
                    code: Rc::clone(&tmpl.code),
                };
                let id = heap.allocate(HeapData::FunctionDef(fd));
                stack.push(Value::Ref(id));
            }
            Instruction::PushEmptyObject => {
                let id = heap.allocate(HeapData::Object(AHashMap::new()));
                stack.push(Value::Ref(id));
            }
            Instruction::Dup => {
                let top_val = stack.last().ok_or(VmError::StackUnderflow)?.clone();
                stack.push(top_val);
            }
            Instruction::Add(n) => apply_arith(&mut stack, *n as usize, heap, Arith::Add)?,
            Instruction::Sub(n) => apply_arith(&mut stack, *n as usize, heap, Arith::Sub)?,
            Instruction::Mul(n) => apply_arith(&mut stack, *n as usize, heap, Arith::Mul)?,
            Instruction::Div(n) => apply_arith(&mut stack, *n as usize, heap, Arith::Div)?,
            Instruction::LoadVar(name) => {
                let v = load_var(heap, env, *name, interner)?;
                stack.push(v);
            }
            Instruction::StoreVar(name) => {
                let v = stack.pop().ok_or(VmError::StackUnderflow)?;
                env_define(heap, env, *name, v);
            }
            Instruction::EnterScope => {
                let child = heap.allocate(HeapData::Env(EnvData::child(env)));
                frames[top].env = child;
            }
            Instruction::ExitScope => {
                let parent = match heap.get(env) {
                    HeapData::Env(e) => e.parent,
                    _ => unreachable!("frame env must be an Env node"),
                };
                frames[top].env = parent.ok_or(VmError::NoParentScope)?;
            }
            Instruction::DefineFunc(name) => {
                let top_val = stack.last().ok_or(VmError::StackUnderflow)?.clone();
                env_define(heap, env, *name, top_val);
            }
            Instruction::DefineFuncDef(name) => {
                let fd_val = stack.pop().ok_or(VmError::StackUnderflow)?;
                let fd_id = fd_val.ref_id().ok_or(VmError::TypeMismatch)?;
                let closure_id = define_func_def(heap, env, *name, fd_id)?;
                stack.push(Value::Ref(closure_id));
            }
            Instruction::Call(argc) => {
                let argc = *argc as usize;
                if stack.len() < argc + 1 {
                    return Err(VmError::StackUnderflow);
                }
                let args = stack.split_off(stack.len() - argc);
                let callee = stack.pop().expect("checked above");
                match callee {
                    Value::Native(f, _) => {
                        let result = f(&args, heap, interner)?;
                        stack.push(result);
                    }
                    Value::Ref(id) if matches!(heap.get(id), HeapData::Closure(_)) => {
                        let (call_env, call_code) = prepare_call(heap, id, &args)?;
                        frames.push(Frame { code: call_code, pc: 0, env: call_env });
                    }
                    _ => return Err(VmError::NotAFunction),
                }
            }
            Instruction::Jump(offset) => {
                frames[top].pc = (pc as i64 + *offset as i64) as usize;
            }
            Instruction::JumpIfFalse(offset) => {
                let cond = stack.pop().ok_or(VmError::StackUnderflow)?;
                if !cond.is_truthy() {
                    frames[top].pc = (pc as i64 + *offset as i64) as usize;
                }
            }
            Instruction::Return => {
                frames.pop();
                if frames.is_empty() {
                    return finish(stack);
                }
            }
            Instruction::CallObjSet => {
                let value = stack.pop().ok_or(VmError::StackUnderflow)?;
                let key = stack.pop().ok_or(VmError::StackUnderflow)?;
                let obj_id = stack.last().and_then(Value::ref_id).ok_or(VmError::NotAnObject)?;
                let key_bytes = key_bytes(&key, heap, interner)?;
                match heap.get_mut(obj_id) {
                    HeapData::Object(map) => {
                        map.insert(key_bytes, value);
                    }
                    _ => return Err(VmError::NotAnObject),
                }
            }
            Instruction::CallObjMerge => {
                let source = stack.pop().ok_or(VmError::StackUnderflow)?;
                let dst_id = stack.last().and_then(Value::ref_id).ok_or(VmError::NotAnObject)?;
                let src_id = source.ref_id().ok_or(VmError::NotAnObject)?;
                let entries: Vec<(Vec<u8>, Value)> = match heap.get(src_id) {
                    HeapData::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    _ => return Err(VmError::NotAnObject),
                };
                match heap.get_mut(dst_id) {
                    HeapData::Object(map) => {
                        for (k, v) in entries {
                            map.insert(k, v);
                        }
                    }
                    _ => return Err(VmError::NotAnObject),
                }
            }
        }
    }
}

fn finish(mut stack: Vec<Value>) -> Result<Value, VmError> {
    if stack.len() != 1 {
        return Err(VmError::InvalidResult);
    }
    Ok(stack.pop().expect("checked len == 1"))
}

#[derive(Clone, Copy)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    fn scalar(self, a: f64, b: f64) -> Result<f64, VmError> {
        match self {
            Self::Add => Ok(a + b),
            Self::Sub => Ok(a - b),
            Self::Mul => Ok(a * b),
            Self::Div => {
                if b == 0.0 {
                    Err(VmError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
        }
    }
}

fn apply_arith(stack: &mut Vec<Value>, n: usize, heap: &mut Heap, op: Arith) -> Result<(), VmError> {
    if stack.len() < n {
        return Err(VmError::StackUnderflow);
    }
    let operands = stack.split_off(stack.len() - n);
    let result = eval_arith(op, operands, heap)?;
    stack.push(result);
    Ok(())
}

/// §4.4 arithmetic: operands must be homogeneous (all `Number` or all
/// `Vector` of equal length); mixing the two shapes fails `NotANumber`.
fn eval_arith(op: Arith, operands: Vec<Value>, heap: &mut Heap) -> Result<Value, VmError> {
    if operands.iter().all(|v| matches!(v, Value::Number(_))) {
        let mut values = operands.into_iter().map(|v| v.as_number().expect("checked all Number above"));
        let mut acc = values.next().ok_or(VmError::ArgumentCountMismatch)?;
        for n in values {
            acc = op.scalar(acc, n)?;
        }
        return Ok(Value::Number(acc));
    }

    let mut lanes: Vec<Vec<f32>> = Vec::with_capacity(operands.len());
    let mut len = None;
    for v in &operands {
        let id = v.ref_id().ok_or(VmError::NotANumber)?;
        match heap.get(id) {
            HeapData::Vector(vec) => {
                match len {
                    None => len = Some(vec.len()),
                    Some(l) if l == vec.len() => {}
                    Some(_) => return Err(VmError::VectorLengthMismatch),
                }
                lanes.push(vec.clone());
            }
            _ => return Err(VmError::NotANumber),
        }
    }
    let len = len.ok_or(VmError::ArgumentCountMismatch)?;
    let mut result = lanes[0].clone();
    for lane in &lanes[1..] {
        for (out, inp) in result.iter_mut().zip(lane.iter()).take(len) {
            *out = op.scalar(*out as f64, *inp as f64)? as f32;
        }
    }
    let id = heap.allocate(HeapData::Vector(result));
    Ok(Value::Ref(id))
}

fn materialize_quoted(qv: &QuotedValue, heap: &mut Heap) -> Value {
    match qv {
        QuotedValue::Number(n) => Value::Number(*n),
        QuotedValue::Nil => Value::Nil,
        QuotedValue::Symbol(s) => Value::Symbol(*s),
        QuotedValue::Str(bytes) => Value::Ref(heap.allocate(HeapData::Str(bytes.clone()))),
        QuotedValue::List(items) => {
            let mut acc = Value::Nil;
            for item in items.iter().rev() {
                let v = materialize_quoted(item, heap);
                acc = Value::Ref(heap.allocate(HeapData::Cons(v, acc)));
            }
            acc
        }
    }
}

fn lookup_chain(heap: &Heap, env: HeapId, name: SymbolId) -> Option<Value> {
    let mut cur = Some(env);
    while let Some(id) = cur {
        match heap.get(id) {
            HeapData::Env(e) => {
                if let Some(v) = e.vars.get(&name) {
                    return Some(v.clone());
                }
                cur = e.parent;
            }
            _ => unreachable!("env chain must only contain Env nodes"),
        }
    }
    None
}

fn env_define(heap: &mut Heap, env: HeapId, name: SymbolId, value: Value) {
    match heap.get_mut(env) {
        HeapData::Env(e) => {
            e.vars.insert(name, value);
        }
        _ => unreachable!("env chain must only contain Env nodes"),
    }
}

/// §4.4 "LoadVar fallback": a miss for a reserved operator-prefix name
/// yields that name as a first-class `Symbol` instead of `VariableNotFound`,
/// so `(@reduce + ...)` can pass `+` around as a value.
fn load_var(heap: &Heap, env: HeapId, name: SymbolId, interner: &Interner) -> Result<Value, VmError> {
    if let Some(v) = lookup_chain(heap, env, name) {
        return Ok(v);
    }
    let text = interner.resolve(name);
    if matches!(text, "+" | "-" | "*" | "/") || text.starts_with("min") || text.starts_with("max") {
        Ok(Value::Symbol(name))
    } else {
        Err(VmError::VariableNotFound(text.to_owned()))
    }
}

fn key_bytes(value: &Value, heap: &Heap, interner: &Interner) -> Result<Vec<u8>, VmError> {
    match value {
        Value::Symbol(s) => Ok(interner.resolve(*s).as_bytes().to_vec()),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(bytes) => Ok(bytes.clone()),
            _ => Err(VmError::InvalidKey),
        },
        _ => Err(VmError::InvalidKey),
    }
}

/// §4.1 `DefineFuncDef`: mutate the existing named closure in place
/// (replacing an arm with an equal pattern vector, or appending a new one),
/// or create a fresh one-arm named closure bound in the current env.
///
/// Per §9, the closure's capture environment is refreshed to a new child of
/// the defining environment every time an arm is added or replaced — not
/// just on first creation — so later `defun`s for the same name see
/// whatever the current scope looks like when they're defined.
///
/// Returns the named closure's `HeapId` so the caller can leave it as the
/// instruction's residual value (I3/P1: a `defun` form must yield exactly
/// one value, like `DefineFunc`'s non-consuming `lambda` binding does).
fn define_func_def(heap: &mut Heap, env: HeapId, name: SymbolId, fd_id: HeapId) -> Result<HeapId, VmError> {
    let new_patterns = match heap.get(fd_id) {
        HeapData::FunctionDef(fd) => fd.patterns.clone(),
        _ => return Err(VmError::TypeMismatch),
    };

    let existing_named = lookup_chain(heap, env, name).and_then(|v| v.ref_id()).filter(|&id| {
        matches!(heap.get(id), HeapData::Closure(c) if matches!(c.kind, ClosureKind::Named { .. }))
    });

    let new_env = heap.allocate(HeapData::Env(EnvData::child(env)));

    if let Some(closure_id) = existing_named {
        let defs = match heap.get(closure_id) {
            HeapData::Closure(c) => match &c.kind {
                ClosureKind::Named { defs } => defs.clone(),
                ClosureKind::Lambda { .. } => unreachable!("filtered to Named above"),
            },
            _ => unreachable!("existing_named only holds Closure ids"),
        };
        let replace_idx = defs.iter().position(|&def_id| match heap.get(def_id) {
            HeapData::FunctionDef(fd) => patterns_eq(&fd.patterns, &new_patterns),
            _ => false,
        });
        match heap.get_mut(closure_id) {
            HeapData::Closure(c) => {
                c.env = new_env;
                if let ClosureKind::Named { defs } = &mut c.kind {
                    match replace_idx {
                        Some(i) => defs[i] = fd_id,
                        None => defs.push(fd_id),
                    }
                }
            }
            _ => unreachable!("existing_named only holds Closure ids"),
        }
        Ok(closure_id)
    } else {
        let closure = Closure {
            kind: ClosureKind::Named { defs: vec![fd_id] },
            env: new_env,
        };
        let new_id = heap.allocate(HeapData::Closure(closure));
        env_define(heap, env, name, Value::Ref(new_id));
        Ok(new_id)
    }
}

/// Builds the callee-side `(env, code)` pair for `Call` against a
/// `Closure`: binds parameters/patterns into a fresh child of the closure's
/// *captured* environment (never the caller's), per §4.4 and P2.
fn prepare_call(heap: &mut Heap, closure_id: HeapId, args: &[Value]) -> Result<(HeapId, Rc<Code>), VmError> {
    let captured_env = match heap.get(closure_id) {
        HeapData::Closure(c) => c.env,
        _ => return Err(VmError::NotAFunction),
    };

    match heap.get(closure_id) {
        HeapData::Closure(Closure { kind: ClosureKind::Lambda { params, code }, .. }) => {
            if params.len() != args.len() {
                return Err(VmError::ArgumentCountMismatch);
            }
            let params = params.clone();
            let code = Rc::clone(code);
            let child = heap.allocate(HeapData::Env(EnvData::child(captured_env)));
            for (p, a) in params.iter().zip(args) {
                env_define(heap, child, *p, a.clone());
            }
            Ok((child, code))
        }
        HeapData::Closure(Closure { kind: ClosureKind::Named { defs }, .. }) => {
            let defs = defs.clone();
            let arm = find_matching_arm(heap, &defs, args)?;
            let (patterns, code) = match heap.get(arm) {
                HeapData::FunctionDef(fd) => (fd.patterns.clone(), Rc::clone(&fd.code)),
                _ => unreachable!("defs only ever holds FunctionDef ids"),
            };
            let child = heap.allocate(HeapData::Env(EnvData::child(captured_env)));
            for (p, a) in patterns.iter().zip(args) {
                if let Pattern::Var(sym) = p {
                    env_define(heap, child, *sym, a.clone());
                }
            }
            Ok((child, code))
        }
        _ => Err(VmError::NotAFunction),
    }
}

/// §4.3 dispatch: first arm (in definition order) whose pattern count
/// matches `args.len()` and whose every pattern matches.
fn find_matching_arm(heap: &Heap, defs: &[HeapId], args: &[Value]) -> Result<HeapId, VmError> {
    for &def_id in defs {
        if let HeapData::FunctionDef(fd) = heap.get(def_id) {
            if fd.patterns.len() == args.len() && fd.patterns.iter().zip(args).all(|(p, a)| p.matches(a)) {
                return Ok(def_id);
            }
        }
    }
    Err(VmError::InvalidKey)
}
