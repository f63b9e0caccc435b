//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: usize,
    /// Height of the world grid
    pub height: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 60,
        }
    }
}

impl WorldConfig {
    /// Number of cells (and population slots) in the grid, or `None` if it
    /// overflows `usize`
    pub fn size(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

/// Organism execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Instructions each organism executes per tick
    pub instructions_per_tick: usize,
    /// Length of randomly generated ancestor genomes
    pub program_length: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            instructions_per_tick: 10,
            program_length: 100,
        }
    }
}

/// Reproduction and mutation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Points an organism must exceed before `Reproduce` queues a birth
    pub threshold: f64,
    /// Per-instruction point mutation probability for offspring
    pub mutation_rate: f64,
    /// Per-instruction probability of inserting a random instruction
    pub insertion_rate: f64,
    /// Per-instruction probability of deleting it from the offspring
    pub deletion_rate: f64,
    /// Points granted every tick while the subsidy applies
    pub point_subsidy: f64,
    /// The subsidy stops once an organism has reproduced this many times
    pub subsidy_reproduction_limit: u32,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            threshold: 20.0,
            mutation_rate: 0.0075,
            insertion_rate: 0.0,
            deletion_rate: 0.0,
            point_subsidy: 1.0,
            subsidy_reproduction_limit: 2,
        }
    }
}

/// Top-level run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Organisms injected before the first tick
    pub start_num: usize,
    /// Number of ticks the host driver runs
    pub num_ticks: u64,
    /// Ticks between counter snapshots taken by the host driver
    pub record_frequency: u64,
    pub world: WorldConfig,
    pub execution: ExecutionConfig,
    pub reproduction: ReproductionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 5,
            start_num: 1,
            num_ticks: 3_000_000,
            record_frequency: 50,
            world: WorldConfig::default(),
            execution: ExecutionConfig::default(),
            reproduction: ReproductionConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Check that the configuration describes a runnable world
    pub fn validate(&self) -> Result<()> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(Error::Validation(format!(
                "World must be at least 1x1, got {}x{}",
                self.world.width, self.world.height
            )));
        }

        if self.execution.instructions_per_tick == 0 {
            return Err(Error::Validation(
                "instructions_per_tick must be positive".to_string(),
            ));
        }

        if self.execution.program_length == 0 {
            return Err(Error::Validation(
                "program_length must be positive".to_string(),
            ));
        }

        let size = self.world.size().ok_or_else(|| {
            Error::Validation(format!(
                "World {}x{} has too many cells",
                self.world.width, self.world.height
            ))
        })?;

        if self.start_num > size {
            return Err(Error::Validation(format!(
                "start_num {} exceeds the {} cells in the world",
                self.start_num, size
            )));
        }

        let repro = &self.reproduction;
        for (name, rate) in [
            ("mutation_rate", repro.mutation_rate),
            ("insertion_rate", repro.insertion_rate),
            ("deletion_rate", repro.deletion_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::Validation(format!(
                    "{} {} is outside [0, 1]",
                    name, rate
                )));
            }
        }

        for (name, value) in [
            ("threshold", repro.threshold),
            ("point_subsidy", repro.point_subsidy),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Validation(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
