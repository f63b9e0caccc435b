//! Instruction set for organism genomes.

use serde::{Deserialize, Serialize};

/// Number of registers in every organism CPU
pub const NUM_REGISTERS: usize = 8;

/// Number of distinct anchor labels
pub const NUM_LABELS: u8 = 16;

/// Register identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Register(pub u8);

impl Register {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Genome opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Nop,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Increment,
    Decrement,
    Negate,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Nand,
    Shift,
    CountOnes,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,

    // Logical
    LogicalAnd,
    LogicalOr,
    Not,

    // Randomness
    RandomFill,
    RandomBool,

    // Control flow
    Anchor,
    Jump,
    JumpIf,
    JumpIfNot,
    TerminateIf,

    // Domain instructions
    RotateLeft,
    RotateRight,
    GetFacing,
    GetIdentity,
    SendMessage,
    RetrieveMessage,
    Reproduce,
}

impl Opcode {
    pub const ALL: [Opcode; 37] = [
        Opcode::Nop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Increment,
        Opcode::Decrement,
        Opcode::Negate,
        Opcode::BitAnd,
        Opcode::BitOr,
        Opcode::BitXor,
        Opcode::BitNot,
        Opcode::Nand,
        Opcode::Shift,
        Opcode::CountOnes,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::LessThan,
        Opcode::GreaterThan,
        Opcode::LogicalAnd,
        Opcode::LogicalOr,
        Opcode::Not,
        Opcode::RandomFill,
        Opcode::RandomBool,
        Opcode::Anchor,
        Opcode::Jump,
        Opcode::JumpIf,
        Opcode::JumpIfNot,
        Opcode::TerminateIf,
        Opcode::RotateLeft,
        Opcode::RotateRight,
        Opcode::GetFacing,
        Opcode::GetIdentity,
        Opcode::SendMessage,
        Opcode::RetrieveMessage,
        Opcode::Reproduce,
    ];

    /// Returns true if this opcode moves the program counter
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Opcode::Jump | Opcode::JumpIf | Opcode::JumpIfNot | Opcode::TerminateIf
        )
    }

    /// Returns true if this opcode touches the cell or asks the world for a service
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Opcode::RotateLeft
                | Opcode::RotateRight
                | Opcode::GetFacing
                | Opcode::GetIdentity
                | Opcode::SendMessage
                | Opcode::RetrieveMessage
                | Opcode::Reproduce
        )
    }

    /// Relative weight when drawing a random opcode
    pub fn prevalence(&self) -> u32 {
        match self {
            Opcode::Reproduce => 10,
            _ => 1,
        }
    }
}

/// A single genome instruction.
///
/// Every instruction carries three register arguments and an anchor label;
/// the opcode decides which of them it reads. The fixed shape keeps any
/// mutation of any field a valid instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub args: [Register; 3],
    pub label: u8,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            args: [Register(0); 3],
            label: 0,
        }
    }

    pub fn with_args(mut self, a: Register, b: Register, c: Register) -> Self {
        self.args = [a, b, c];
        self
    }

    pub fn with_label(mut self, label: u8) -> Self {
        self.label = label;
        self
    }

    /// Create a binary instruction writing `op(a, b)` into `dest`
    pub fn binary(opcode: Opcode, dest: Register, a: Register, b: Register) -> Self {
        Self::new(opcode).with_args(dest, a, b)
    }

    /// Create an instruction that only uses its first register
    pub fn unary(opcode: Opcode, reg: Register) -> Self {
        Self::new(opcode).with_args(reg, Register(0), Register(0))
    }

    pub fn anchor(label: u8) -> Self {
        Self::new(Opcode::Anchor).with_label(label)
    }

    pub fn jump(label: u8) -> Self {
        Self::new(Opcode::Jump).with_label(label)
    }

    pub fn jump_if(condition: Register, label: u8) -> Self {
        Self::unary(Opcode::JumpIf, condition).with_label(label)
    }

    pub fn jump_if_not(condition: Register, label: u8) -> Self {
        Self::unary(Opcode::JumpIfNot, condition).with_label(label)
    }
}
