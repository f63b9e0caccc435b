//! Register-machine interpreter for organism genomes.

use crate::context::ExecutionState;
use crate::host::{Host, SendOutcome};
use crate::RuntimeConfig;
use commlife_core::Result;
use commlife_ir::{validate_program, Instruction, Mutator, Opcode, Program, NUM_REGISTERS};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// One organism's virtual CPU: its genome, register file, program counter
/// and execution state.
///
/// Arithmetic wraps on overflow. Division and modulo by zero write 0. A shift
/// by 32 or more in either direction writes 0.
#[derive(Debug, Clone)]
pub struct Cpu {
    program: Program,
    registers: [u32; NUM_REGISTERS],
    pc: usize,
    pub state: ExecutionState,
}

impl Cpu {
    /// Build a CPU for a program, rejecting programs that fail validation
    pub fn new(program: Program) -> Result<Self> {
        validate_program(&program)?;
        Ok(Self::from_valid(program))
    }

    fn from_valid(program: Program) -> Self {
        Self {
            program,
            registers: [0; NUM_REGISTERS],
            pc: 0,
            state: ExecutionState::new(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn registers(&self) -> &[u32; NUM_REGISTERS] {
        &self.registers
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Clear registers, program counter and execution state, keeping the genome
    pub fn reset(&mut self) {
        self.registers = [0; NUM_REGISTERS];
        self.pc = 0;
        self.state = ExecutionState::new();
    }

    /// A fresh CPU running a mutated copy of this genome.
    ///
    /// Mutation only draws in-range registers and labels, so the copy stays valid.
    pub fn offspring(&self, mutator: &Mutator, rng: &mut ChaCha8Rng) -> Self {
        let mut program = self.program.clone();
        mutator.mutate(&mut program, rng);
        debug_assert!(validate_program(&program).is_ok());
        Self::from_valid(program)
    }

    /// Execute up to `config.instructions_per_tick` instructions, returning how many ran
    pub fn run<H: Host>(&mut self, config: &RuntimeConfig, host: &mut H) -> usize {
        debug_assert!(self.state.is_bound(), "organism must be bound to a cell before it runs");

        let mut executed = 0;
        while executed < config.instructions_per_tick {
            if self.pc >= self.program.len() {
                self.pc = 0;
            }
            let inst = self.program.instructions[self.pc];
            self.pc += 1;
            self.execute(inst, config, host);
            executed += 1;
        }
        executed
    }

    fn execute<H: Host>(&mut self, inst: Instruction, config: &RuntimeConfig, host: &mut H) {
        let [a, b, c] = inst.args.map(|r| r.index());
        let r = &mut self.registers;

        match inst.opcode {
            Opcode::Nop | Opcode::Anchor => {}

            Opcode::Add => r[a] = r[b].wrapping_add(r[c]),
            Opcode::Sub => r[a] = r[b].wrapping_sub(r[c]),
            Opcode::Mul => r[a] = r[b].wrapping_mul(r[c]),
            Opcode::Div => r[a] = r[b].checked_div(r[c]).unwrap_or(0),
            Opcode::Mod => r[a] = r[b].checked_rem(r[c]).unwrap_or(0),
            Opcode::Increment => r[a] = r[a].wrapping_add(1),
            Opcode::Decrement => r[a] = r[a].wrapping_sub(1),
            Opcode::Negate => r[a] = r[a].wrapping_neg(),

            Opcode::BitAnd => r[a] = r[b] & r[c],
            Opcode::BitOr => r[a] = r[b] | r[c],
            Opcode::BitXor => r[a] = r[b] ^ r[c],
            Opcode::BitNot => r[a] = !r[b],
            Opcode::Nand => r[a] = !(r[b] & r[c]),
            Opcode::Shift => r[a] = shift(r[b], r[c] as i32),
            Opcode::CountOnes => r[a] = r[b].count_ones(),

            Opcode::Equal => r[a] = (r[b] == r[c]) as u32,
            Opcode::NotEqual => r[a] = (r[b] != r[c]) as u32,
            Opcode::LessThan => r[a] = (r[b] < r[c]) as u32,
            Opcode::GreaterThan => r[a] = (r[b] > r[c]) as u32,

            Opcode::LogicalAnd => r[a] = (r[b] != 0 && r[c] != 0) as u32,
            Opcode::LogicalOr => r[a] = (r[b] != 0 || r[c] != 0) as u32,
            Opcode::Not => r[a] = (r[b] == 0) as u32,

            Opcode::RandomFill => r[a] = host.random_u32(),
            Opcode::RandomBool => r[a] = host.random_u32() & 1,

            Opcode::Jump => self.jump_to(inst.label),
            Opcode::JumpIf => {
                if r[a] != 0 {
                    self.jump_to(inst.label);
                }
            }
            Opcode::JumpIfNot => {
                if r[a] == 0 {
                    self.jump_to(inst.label);
                }
            }
            Opcode::TerminateIf => {
                if r[a] != 0 {
                    self.pc = 0;
                }
            }

            Opcode::RotateLeft => {
                if let Some(cell) = self.state.cell {
                    host.rotate_left(cell);
                }
            }
            Opcode::RotateRight => {
                if let Some(cell) = self.state.cell {
                    host.rotate_right(cell);
                }
            }
            Opcode::GetFacing => {
                if let Some(cell) = self.state.cell {
                    r[a] = host.facing(cell);
                }
            }
            Opcode::GetIdentity => {
                if let Some(cell) = self.state.cell {
                    r[a] = host.identity(cell);
                }
            }
            Opcode::SendMessage => {
                let payload = r[a];
                self.state.message = payload;
                let outcome = host.send_message(&self.state, payload);
                if outcome == SendOutcome::Loopback {
                    self.state.inbox = payload;
                }
                if outcome.is_delivered() {
                    // Scramble the register so later code can't tell when the send landed
                    self.registers[a] = host.random_u32();
                    host.check_output(&mut self.state);
                }
            }
            Opcode::RetrieveMessage => {
                self.registers[a] = host.retrieve_message(&mut self.state);
            }
            Opcode::Reproduce => {
                if self.state.points > config.reproduction_threshold {
                    trace!(points = self.state.points, "Reproduction requested");
                    host.request_reproduction(&self.state);
                }
            }
        }
    }

    fn jump_to(&mut self, label: u8) {
        if let Some(anchor) = self.program.find_anchor(label) {
            self.pc = anchor + 1;
        }
    }
}

/// Positive amounts shift left, negative amounts shift right
fn shift(value: u32, amount: i32) -> u32 {
    match amount {
        0..=31 => value << amount,
        -31..=-1 => value >> -amount,
        _ => 0,
    }
}
