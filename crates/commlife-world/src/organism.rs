//! Organism state and lifecycle.

use commlife_core::{OrganismId, Result, SimulationConfig};
use commlife_ir::{Mutator, Program};
use commlife_runtime::{Cpu, ExecutionState, Host, RuntimeConfig};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Per-tick rules applied to every organism
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    pub runtime: RuntimeConfig,
    /// Points granted each tick while the organism is still young
    pub point_subsidy: f64,
    /// Organisms stop receiving the subsidy after this many offspring
    pub subsidy_reproduction_limit: u32,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for LifecyclePolicy {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            runtime: RuntimeConfig::from(config),
            point_subsidy: config.reproduction.point_subsidy,
            subsidy_reproduction_limit: config.reproduction.subsidy_reproduction_limit,
        }
    }
}

/// An organism in the simulation
#[derive(Debug, Clone)]
pub struct Organism {
    pub id: OrganismId,
    pub parent: Option<OrganismId>,
    pub birth_tick: u64,
    cpu: Cpu,
}

impl Organism {
    pub fn new(id: OrganismId, program: Program) -> Result<Self> {
        Ok(Self {
            id,
            parent: None,
            birth_tick: 0,
            cpu: Cpu::new(program)?,
        })
    }

    pub fn program(&self) -> &Program {
        self.cpu.program()
    }

    pub fn state(&self) -> &ExecutionState {
        &self.cpu.state
    }

    pub fn state_mut(&mut self) -> &mut ExecutionState {
        &mut self.cpu.state
    }

    pub fn points(&self) -> f64 {
        self.cpu.state.points
    }

    pub fn set_points(&mut self, points: f64) {
        self.cpu.state.points = points;
    }

    pub fn age(&self) -> u64 {
        self.cpu.state.age
    }

    pub fn best_task(&self) -> usize {
        self.cpu.state.best_task
    }

    pub fn reproduced_count(&self) -> u32 {
        self.cpu.state.reproduced_count
    }

    pub fn location(&self) -> Option<usize> {
        self.cpu.state.location
    }

    pub fn inbox(&self) -> u32 {
        self.cpu.state.inbox
    }

    pub fn set_inbox(&mut self, message: u32) {
        self.cpu.state.inbox = message;
    }

    pub fn bind(&mut self, location: usize, cell: usize) {
        self.cpu.state.bind(location, cell);
    }

    /// Drop the cell back-reference once the organism leaves the grid
    pub fn unbind(&mut self) {
        self.cpu.state.unbind();
    }

    pub fn is_bound(&self) -> bool {
        self.cpu.state.is_bound()
    }

    /// Run one tick: apply the subsidy, refresh the location, execute the
    /// instruction budget and age by one.
    pub fn process<H: Host>(&mut self, location: usize, policy: &LifecyclePolicy, host: &mut H) {
        let state = &mut self.cpu.state;
        if state.reproduced_count < policy.subsidy_reproduction_limit {
            state.points += policy.point_subsidy;
        }
        state.location = Some(location);

        self.cpu.run(&policy.runtime, host);
        self.cpu.state.age += 1;
    }

    /// Build the offspring: a mutated copy of the genome with fresh state
    pub fn check_reproduction(
        &self,
        id: OrganismId,
        birth_tick: u64,
        mutator: &Mutator,
        rng: &mut ChaCha8Rng,
    ) -> Organism {
        Organism {
            id,
            parent: Some(self.id),
            birth_tick,
            cpu: self.cpu.offspring(mutator, rng),
        }
    }

    /// Reset the parent's points after a birth
    pub fn record_offspring(&mut self) {
        self.cpu.state.points = 0.0;
        self.cpu.state.reproduced_count += 1;
    }
}

/// Serializable organism snapshot (without the running CPU)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismData {
    pub id: OrganismId,
    pub parent: Option<OrganismId>,
    pub birth_tick: u64,
    pub location: Option<usize>,
    pub points: f64,
    pub age: u64,
    pub best_task: usize,
    pub reproduced_count: u32,
    pub genome: Program,
}

impl From<&Organism> for OrganismData {
    fn from(org: &Organism) -> Self {
        Self {
            id: org.id,
            parent: org.parent,
            birth_tick: org.birth_tick,
            location: org.location(),
            points: org.points(),
            age: org.age(),
            best_task: org.best_task(),
            reproduced_count: org.reproduced_count(),
            genome: org.program().clone(),
        }
    }
}
