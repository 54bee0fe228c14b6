use std::ops::Range;

use super::{AttrGroupId, BlockId, Instruction, TypeId, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub ty: TypeId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub name: Option<String>,
    pub preds: Vec<BlockId>,
}

/// A function declaration or definition.
///
/// Blocks are implicit in the instruction stream: each terminator closes the
/// current block. `blocks[i]` describes the i-th such span.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// The function type (not a pointer to it).
    pub ty: TypeId,
    pub external: bool,
    pub attrs: Option<AttrGroupId>,
    pub args: Vec<Argument>,
    pub instructions: Vec<Instruction>,
    pub blocks: Vec<Block>,
}

impl Function {
    /// Instruction index ranges of each block, in order.
    ///
    /// Trailing instructions after the last terminator form a final block.
    pub fn block_spans(&self) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut start = 0;
        for (i, inst) in self.instructions.iter().enumerate() {
            if inst.op.is_terminator() {
                spans.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < self.instructions.len() {
            spans.push(start..self.instructions.len());
        }
        spans
    }

    /// Rebuilds every block's `preds` from the branch targets of terminators.
    ///
    /// Predecessors are listed in the order their terminators appear, without
    /// duplicates.
    pub fn compute_predecessors(&mut self) {
        let spans = self.block_spans();
        if self.blocks.len() < spans.len() {
            self.blocks.resize_with(spans.len(), Block::default);
        }
        for block in &mut self.blocks {
            block.preds.clear();
        }
        for (from, span) in spans.iter().enumerate() {
            let Some(last) = span.end.checked_sub(1) else {
                continue;
            };
            for arg in &self.instructions[last].args {
                let Value::Block(target) = *arg else {
                    continue;
                };
                let from = BlockId(from as u32);
                if let Some(block) = self.blocks.get_mut(target.index()) {
                    if !block.preds.contains(&from) {
                        block.preds.push(from);
                    }
                }
            }
        }
    }
}
