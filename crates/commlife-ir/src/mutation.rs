//! Mutation operators and random genome generation.

use crate::instruction::{Instruction, Opcode, Register, NUM_LABELS, NUM_REGISTERS};
use crate::program::Program;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability of point mutation per instruction
    pub point_mutation_rate: f64,
    /// Probability of inserting a random instruction before each instruction
    pub insertion_rate: f64,
    /// Probability of deleting each instruction
    pub deletion_rate: f64,
    /// Programs never grow beyond this length
    pub max_length: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            point_mutation_rate: 0.0075,
            insertion_rate: 0.0,
            deletion_rate: 0.0,
            max_length: 256,
        }
    }
}

impl MutationConfig {
    /// Point mutation only, at the given per-instruction rate
    pub fn point_only(rate: f64) -> Self {
        Self {
            point_mutation_rate: rate,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mutator {
    config: MutationConfig,
    total_prevalence: u32,
}

impl Mutator {
    pub fn new(config: MutationConfig) -> Self {
        let total_prevalence = Opcode::ALL.iter().map(|op| op.prevalence()).sum();
        Self {
            config,
            total_prevalence,
        }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    /// Mutate a program in place, returning how many edits were made
    pub fn mutate(&self, program: &mut Program, rng: &mut ChaCha8Rng) -> usize {
        let mut edits = 0;
        let mut i = 0;
        while i < program.instructions.len() {
            if rng.gen::<f64>() < self.config.point_mutation_rate {
                self.point_mutate(&mut program.instructions[i], rng);
                edits += 1;
            }

            // Deletion never empties the program
            if rng.gen::<f64>() < self.config.deletion_rate && program.instructions.len() > 1 {
                program.instructions.remove(i);
                edits += 1;
                continue;
            }

            if rng.gen::<f64>() < self.config.insertion_rate
                && program.instructions.len() < self.config.max_length
            {
                let new_inst = self.random_instruction(rng);
                program.instructions.insert(i, new_inst);
                edits += 1;
                i += 1;
            }

            i += 1;
        }

        edits
    }

    /// Change one field of an instruction: opcode, one register, or the label
    pub fn point_mutate(&self, inst: &mut Instruction, rng: &mut ChaCha8Rng) {
        match rng.gen_range(0..3) {
            0 => inst.opcode = self.random_opcode(rng),
            1 => {
                let slot = rng.gen_range(0..inst.args.len());
                inst.args[slot] = random_register(rng);
            }
            _ => inst.label = rng.gen_range(0..NUM_LABELS),
        }
    }

    /// Draw an opcode weighted by its prevalence
    pub fn random_opcode(&self, rng: &mut ChaCha8Rng) -> Opcode {
        let mut roll = rng.gen_range(0..self.total_prevalence);
        for op in Opcode::ALL {
            if roll < op.prevalence() {
                return op;
            }
            roll -= op.prevalence();
        }
        Opcode::Nop
    }

    pub fn random_instruction(&self, rng: &mut ChaCha8Rng) -> Instruction {
        Instruction::new(self.random_opcode(rng))
            .with_args(random_register(rng), random_register(rng), random_register(rng))
            .with_label(rng.gen_range(0..NUM_LABELS))
    }

    /// Generate an unevolved genome of `len` random instructions
    pub fn random_program(&self, len: usize, rng: &mut ChaCha8Rng) -> Program {
        let len = len.clamp(1, self.config.max_length);
        Program::with_instructions((0..len).map(|_| self.random_instruction(rng)).collect())
    }
}

impl Default for Mutator {
    fn default() -> Self {
        Self::new(MutationConfig::default())
    }
}

fn random_register(rng: &mut ChaCha8Rng) -> Register {
    Register(rng.gen_range(0..NUM_REGISTERS as u8))
}
