//! Builder for emitting instructions during compilation.
//!
//! Handles forward jumps with patching, in the same shape as the teacher's
//! `CodeBuilder` (`bytecode/builder.rs` in the pack) — emit a placeholder,
//! get back a `JumpLabel`, patch it once the target is known — but over a
//! typed `Instruction` vector instead of a byte stream, since this
//! instruction set has no wire-format requirement to preserve (§4.1 is
//! specified in terms of typed payloads, not byte widths).

use super::{Code, Instruction};

/// Label for a forward jump awaiting `patch_jump`.
#[derive(Debug, Clone, Copy)]
pub struct JumpLabel(usize);

#[derive(Debug, Default)]
pub struct CodeBuilder {
    instructions: Vec<Instruction>,
}

impl CodeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an instruction, returning its index.
    pub fn emit(&mut self, instr: Instruction) -> usize {
        let idx = self.instructions.len();
        self.instructions.push(instr);
        idx
    }

    /// Emits a placeholder `JumpIfFalse`, to be patched with `patch_jump`.
    pub fn emit_jump_if_false(&mut self) -> JumpLabel {
        let label = JumpLabel(self.instructions.len());
        self.instructions.push(Instruction::JumpIfFalse(0));
        label
    }

    /// Emits a placeholder `Jump`, to be patched with `patch_jump`.
    pub fn emit_jump(&mut self) -> JumpLabel {
        let label = JumpLabel(self.instructions.len());
        self.instructions.push(Instruction::Jump(0));
        label
    }

    /// Patches a previously emitted jump to target the current position.
    ///
    /// Offset is `target_index - jump_index`, per §4.1.
    pub fn patch_jump(&mut self, label: JumpLabel) {
        let target = self.instructions.len() as i32;
        let offset = target - label.0 as i32;
        match &mut self.instructions[label.0] {
            Instruction::Jump(o) | Instruction::JumpIfFalse(o) => *o = offset,
            other => unreachable!("patch_jump called on non-jump instruction: {other:?}"),
        }
    }

    /// Current instruction index — use to record a loop start for a
    /// backward jump emitted later via `emit(Instruction::Jump(...))`.
    #[must_use]
    pub fn current_offset(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn build(self) -> Code {
        // `builder` is a child module of `bytecode`, so it may construct
        // `Code`'s private tuple field directly — `CodeBuilder` is the
        // sole producer of `Code` values.
        Code::from_instructions(self.instructions)
    }
}
