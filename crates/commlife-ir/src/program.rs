//! Program structure for organism genomes.

use crate::instruction::{Instruction, Opcode};
use serde::{Deserialize, Serialize};

/// A complete organism program (genome): a linear instruction list whose
/// jumps target labelled anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub version: u32,
}

impl Program {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            version: 1,
        }
    }

    pub fn with_instructions(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            version: 1,
        }
    }

    pub fn add_instruction(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Position of the first anchor carrying `label`
    pub fn find_anchor(&self, label: u8) -> Option<usize> {
        self.instructions
            .iter()
            .position(|inst| inst.opcode == Opcode::Anchor && inst.label == label)
    }

    /// Count instructions with a given opcode
    pub fn count_opcode(&self, opcode: Opcode) -> usize {
        self.instructions
            .iter()
            .filter(|inst| inst.opcode == opcode)
            .count()
    }

    /// Serialize the program to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, commlife_core::Error> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a program from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, commlife_core::Error> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}
