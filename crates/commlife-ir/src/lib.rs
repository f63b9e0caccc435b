//! Genome representation for commlife organisms.
//!
//! A genome is a linear list of fixed-shape instructions. Every field of every
//! instruction can be mutated independently without producing an invalid
//! program, so reproduction never needs a repair step.

pub mod instruction;
pub mod program;
pub mod mutation;
pub mod validation;

pub use instruction::{Instruction, Opcode, Register, NUM_LABELS, NUM_REGISTERS};
pub use program::Program;
pub use mutation::{Mutator, MutationConfig};
pub use validation::validate_program;
