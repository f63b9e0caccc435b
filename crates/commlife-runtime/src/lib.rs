//! Virtual CPU for executing organism genomes.
//!
//! This crate provides the execution environment for organisms, including:
//! - The per-organism execution state read and written by instructions
//! - The `Host` trait through which instructions reach world services
//! - A register-machine interpreter with a fixed per-tick instruction budget

pub mod context;
pub mod host;
pub mod cpu;

pub use context::ExecutionState;
pub use host::{Host, SendOutcome};
pub use cpu::Cpu;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Instructions executed per tick
    pub instructions_per_tick: usize,
    /// `Reproduce` only queues a birth when points exceed this value
    pub reproduction_threshold: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            instructions_per_tick: 10,
            reproduction_threshold: 20.0,
        }
    }
}

impl From<&commlife_core::SimulationConfig> for RuntimeConfig {
    fn from(config: &commlife_core::SimulationConfig) -> Self {
        Self {
            instructions_per_tick: config.execution.instructions_per_tick,
            reproduction_threshold: config.reproduction.threshold,
        }
    }
}
