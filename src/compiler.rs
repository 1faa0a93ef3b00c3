//! Compiles a parsed `Value` tree into bytecode (§4.2).
//!
//! The compiler is, as the spec notes, "mostly flat special-form cases":
//! one dispatch on the head symbol's text, falling through to a plain
//! function-call shape. All control-flow back-patching goes through
//! [`crate::bytecode::builder::CodeBuilder`].

use std::rc::Rc;

use crate::bytecode::builder::CodeBuilder;
use crate::bytecode::{Code, FuncDefTemplate, Instruction, LambdaTemplate, QuotedValue};
use crate::error::CompileError;
use crate::heap::{Heap, HeapData, Pattern};
use crate::intern::Interner;
use crate::value::{ObjectEntry, Value};

/// Compiles a single top-level expression into a `Return`-terminated `Code`.
pub fn compile(expr: &Value, heap: &Heap, interner: &mut Interner) -> Result<Rc<Code>, CompileError> {
    let mut builder = CodeBuilder::new();
    compile_expr(expr, heap, interner, &mut builder)?;
    builder.emit(Instruction::Return);
    Ok(Rc::new(builder.build()))
}

/// Compiles `expr`, appending instructions to `builder`. Leaves exactly one
/// value on the operand stack when the emitted instructions run.
fn compile_expr(expr: &Value, heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    match expr {
        Value::Number(n) => {
            b.emit(Instruction::PushConst(*n));
            Ok(())
        }
        Value::Nil => {
            b.emit(Instruction::PushQuote(QuotedValue::Nil));
            Ok(())
        }
        Value::Symbol(s) => {
            b.emit(Instruction::LoadVar(*s));
            Ok(())
        }
        Value::Native(..) => Err(CompileError::UnsupportedExpression(
            "a native function value has no source-level representation".into(),
        )),
        Value::Quote(inner) => {
            let qv = to_quoted(inner, heap)?;
            b.emit(Instruction::PushQuote(qv));
            Ok(())
        }
        Value::ObjectLiteral(entries) => compile_object_literal(entries, heap, interner, b),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(bytes) => {
                b.emit(Instruction::PushConstString(bytes.clone()));
                Ok(())
            }
            HeapData::List(items) => compile_list(items, heap, interner, b),
            _ => Err(CompileError::UnsupportedExpression(format!(
                "a runtime {} value has no source-level representation",
                heap.type_str(*id)
            ))),
        },
    }
}

fn compile_object_literal(
    entries: &[ObjectEntry],
    heap: &Heap,
    interner: &mut Interner,
    b: &mut CodeBuilder,
) -> Result<(), CompileError> {
    b.emit(Instruction::PushEmptyObject);
    for entry in entries {
        match entry {
            ObjectEntry::Pair(key, value) => {
                let key_id = interner.intern(key);
                b.emit(Instruction::PushConstSymbol(key_id));
                compile_expr(value, heap, interner, b)?;
                b.emit(Instruction::CallObjSet);
            }
            ObjectEntry::Spread(expr) => {
                compile_expr(expr, heap, interner, b)?;
                b.emit(Instruction::CallObjMerge);
            }
        }
    }
    Ok(())
}

fn compile_list(items: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let Some(head) = items.first() else {
        return Err(CompileError::InvalidExpression);
    };
    let rest = &items[1..];

    if let Value::Symbol(s) = head {
        let name = interner.resolve(*s).to_owned();
        return match name.as_str() {
            "set" => compile_set(rest, heap, interner, b),
            "defun" => compile_defun(rest, heap, interner, b),
            "lambda" => compile_lambda(rest, heap, interner, b),
            "let" => compile_let(rest, heap, interner, b),
            "if" => compile_if(rest, heap, interner, b),
            "quote" => compile_quote_form(rest, heap, b),
            "+" => compile_arith(rest, heap, interner, b, Instruction::Add as fn(u16) -> Instruction),
            "-" => compile_arith(rest, heap, interner, b, Instruction::Sub as fn(u16) -> Instruction),
            "*" => compile_arith(rest, heap, interner, b, Instruction::Mul as fn(u16) -> Instruction),
            "/" => compile_arith(rest, heap, interner, b, Instruction::Div as fn(u16) -> Instruction),
            _ => compile_call(head, rest, heap, interner, b),
        };
    }
    compile_call(head, rest, heap, interner, b)
}

fn compile_call(head: &Value, args: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    compile_expr(head, heap, interner, b)?;
    for arg in args {
        compile_expr(arg, heap, interner, b)?;
    }
    let argc = u16::try_from(args.len()).map_err(|_| CompileError::InvalidExpression)?;
    b.emit(Instruction::Call(argc));
    Ok(())
}

/// Open Question (a): the source pops two operands then conditionally pops
/// more, leaving arity-0/1 behavior unspecified; this implementation treats
/// both as a compile error rather than silent identity.
fn compile_arith(
    args: &[Value],
    heap: &Heap,
    interner: &mut Interner,
    b: &mut CodeBuilder,
    make: fn(u16) -> Instruction,
) -> Result<(), CompileError> {
    if args.len() < 2 {
        return Err(CompileError::InvalidOperator);
    }
    for arg in args {
        compile_expr(arg, heap, interner, b)?;
    }
    let arity = u16::try_from(args.len()).map_err(|_| CompileError::InvalidExpression)?;
    b.emit(make(arity));
    Ok(())
}

/// `(set NAME EXPR)`.
///
/// `StoreVar` binds by *consuming* its operand (§9 decision: see
/// DESIGN.md — this is required for `let`'s per-binding stack balance and
/// is the only reading under which Design Note (c)'s warning about `set`'s
/// `Dup` makes sense). `set` therefore `Dup`s its value before storing, so
/// `(set x EXPR)` itself evaluates to the assigned value, exactly as the
/// spec's compiler rule and "Leaves the assigned value on the stack" both
/// require.
fn compile_set(rest: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let [name, expr] = rest else {
        return Err(CompileError::InvalidExpression);
    };
    let Value::Symbol(name_id) = name else {
        return Err(CompileError::InvalidOperator);
    };
    compile_expr(expr, heap, interner, b)?;
    b.emit(Instruction::Dup);
    b.emit(Instruction::StoreVar(*name_id));
    Ok(())
}

/// `(defun NAME (PATTERNS...) BODY)`.
fn compile_defun(rest: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let [name, pattern_list, body] = rest else {
        return Err(CompileError::InvalidFunctionDefinition(
            "defun requires a name, a pattern list, and a body".into(),
        ));
    };
    let Value::Symbol(name_id) = name else {
        return Err(CompileError::InvalidFunctionDefinition("defun name must be a symbol".into()));
    };
    let pattern_items = list_items(pattern_list, heap)
        .ok_or_else(|| CompileError::InvalidFunctionDefinition("defun parameter list must be a list".into()))?;
    let patterns = pattern_items.iter().map(compile_pattern).collect::<Result<Vec<_>, _>>()?;

    let mut body_builder = CodeBuilder::new();
    compile_expr(body, heap, interner, &mut body_builder)?;
    body_builder.emit(Instruction::Return);
    let code = Rc::new(body_builder.build());

    b.emit(Instruction::PushFuncDef(Rc::new(FuncDefTemplate { patterns, code })));
    b.emit(Instruction::DefineFuncDef(*name_id));
    Ok(())
}

fn compile_pattern(item: &Value) -> Result<Pattern, CompileError> {
    match item {
        Value::Symbol(s) => Ok(Pattern::Var(*s)),
        Value::Number(n) => Ok(Pattern::NumberLit(*n)),
        _ => Ok(Pattern::Other),
    }
}

/// `(lambda (PARAMS...) BODY)`.
fn compile_lambda(rest: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let [param_list, body] = rest else {
        return Err(CompileError::InvalidLambda("lambda requires a parameter list and a body".into()));
    };
    let param_items =
        list_items(param_list, heap).ok_or_else(|| CompileError::InvalidLambda("lambda parameter list must be a list".into()))?;
    let params = param_items
        .iter()
        .map(|item| match item {
            Value::Symbol(s) => Ok(*s),
            _ => Err(CompileError::InvalidLambda("lambda parameters must be symbols".into())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut body_builder = CodeBuilder::new();
    compile_expr(body, heap, interner, &mut body_builder)?;
    body_builder.emit(Instruction::Return);
    let code = Rc::new(body_builder.build());

    b.emit(Instruction::PushFunc(Rc::new(LambdaTemplate { params, code })));
    Ok(())
}

/// `(let ((N1 E1) (N2 E2) ...) BODY)`.
fn compile_let(rest: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let [bindings_list, body] = rest else {
        return Err(CompileError::InvalidExpression);
    };
    let binding_items = list_items(bindings_list, heap).ok_or(CompileError::InvalidExpression)?;

    b.emit(Instruction::EnterScope);
    for binding in binding_items {
        let pair = list_items(binding, heap).ok_or(CompileError::InvalidExpression)?;
        let [name, value_expr] = pair else {
            return Err(CompileError::InvalidExpression);
        };
        let Value::Symbol(name_id) = name else {
            return Err(CompileError::InvalidOperator);
        };
        compile_expr(value_expr, heap, interner, b)?;
        b.emit(Instruction::StoreVar(*name_id));
    }
    compile_expr(body, heap, interner, b)?;
    b.emit(Instruction::ExitScope);
    Ok(())
}

/// `(if COND THEN [ELSE])`.
fn compile_if(rest: &[Value], heap: &Heap, interner: &mut Interner, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let (cond, then_expr, else_expr) = match rest {
        [cond, then_expr] => (cond, then_expr, None),
        [cond, then_expr, else_expr] => (cond, then_expr, Some(else_expr)),
        _ => return Err(CompileError::InvalidExpression),
    };
    compile_expr(cond, heap, interner, b)?;
    let to_else = b.emit_jump_if_false();
    compile_expr(then_expr, heap, interner, b)?;
    let to_end = b.emit_jump();
    b.patch_jump(to_else);
    match else_expr {
        Some(e) => compile_expr(e, heap, interner, b)?,
        None => {
            b.emit(Instruction::PushQuote(QuotedValue::Nil));
        }
    }
    b.patch_jump(to_end);
    Ok(())
}

/// `(quote EXPR)` — not itself a special form in spec.md's compiler-rule
/// list, but the only way source text reaches the `Quote(v) -> PushQuote(v)`
/// rule that *is* listed there, since §6's syntax contract defines no quote
/// reader-syntax. See DESIGN.md Open Questions.
fn compile_quote_form(rest: &[Value], heap: &Heap, b: &mut CodeBuilder) -> Result<(), CompileError> {
    let [expr] = rest else {
        return Err(CompileError::InvalidExpression);
    };
    let qv = to_quoted(expr, heap)?;
    b.emit(Instruction::PushQuote(qv));
    Ok(())
}

/// Converts a parsed (heap-backed) `Value` into a self-contained
/// `QuotedValue` constant, with no embedded `HeapId` (see the doc comment
/// on [`QuotedValue`] for why).
fn to_quoted(value: &Value, heap: &Heap) -> Result<QuotedValue, CompileError> {
    match value {
        Value::Number(n) => Ok(QuotedValue::Number(*n)),
        Value::Nil => Ok(QuotedValue::Nil),
        Value::Symbol(s) => Ok(QuotedValue::Symbol(*s)),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(bytes) => Ok(QuotedValue::Str(bytes.clone())),
            HeapData::List(items) => Ok(QuotedValue::List(
                items.iter().map(|v| to_quoted(v, heap)).collect::<Result<Vec<_>, _>>()?,
            )),
            _ => Err(CompileError::UnsupportedExpression("value is not quotable".into())),
        },
        Value::Quote(inner) => to_quoted(inner, heap),
        Value::ObjectLiteral(_) | Value::Native(..) => Err(CompileError::UnsupportedExpression("value is not quotable".into())),
    }
}

/// Reads the items of a parsed `(...)` list, or `None` if `value` is not
/// one (used for parameter lists, `let` bindings, and `defun` patterns).
fn list_items<'h>(value: &Value, heap: &'h Heap) -> Option<&'h [Value]> {
    match value {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::List(items) => Some(items),
            _ => None,
        },
        _ => None,
    }
}
