//! Validation for genome programs.
//!
//! Register indices are checked here, once, so the interpreter can index its
//! register file without bounds handling at run time.

use crate::instruction::{NUM_LABELS, NUM_REGISTERS};
use crate::program::Program;
use commlife_core::{Error, Result};

/// Validate that a program is well-formed
pub fn validate_program(program: &Program) -> Result<()> {
    if program.is_empty() {
        return Err(Error::Validation("Program has no instructions".to_string()));
    }

    for (idx, inst) in program.instructions.iter().enumerate() {
        if let Some(reg) = inst.args.iter().find(|r| r.index() >= NUM_REGISTERS) {
            return Err(Error::Validation(format!(
                "Instruction {} ({:?}) references register {} (only {} available)",
                idx, inst.opcode, reg.0, NUM_REGISTERS
            )));
        }

        if inst.label >= NUM_LABELS {
            return Err(Error::Validation(format!(
                "Instruction {} ({:?}) uses label {} (max {})",
                idx,
                inst.opcode,
                inst.label,
                NUM_LABELS - 1
            )));
        }
    }

    Ok(())
}
