//! World scheduler: owns the grid, the population and the task list, and
//! advances them one tick at a time.

use crate::grid::Grid;
use crate::organism::{LifecyclePolicy, Organism, OrganismData};
use crate::task::{Task, TaskContext};
use commlife_core::{
    Direction, Error, ExchangeCounters, OrganismId, PointStats, Result, SimulationConfig,
    SolveCounters,
};
use commlife_ir::{MutationConfig, Mutator, Program};
use commlife_runtime::{ExecutionState, Host, SendOutcome};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

/// A birth requested during a tick, honored once every organism has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReproductionRequest {
    location: usize,
    parent: OrganismId,
}

/// Births queued during the current tick, at most one per location.
///
/// `queued` mirrors the requests so a duplicate check is a single lookup.
#[derive(Debug, Clone, Default)]
struct ReproductionQueue {
    requests: Vec<ReproductionRequest>,
    queued: Vec<bool>,
}

impl ReproductionQueue {
    fn new(size: usize) -> Self {
        Self {
            requests: Vec::new(),
            queued: vec![false; size],
        }
    }

    /// Returns false when `location` already has a request this tick
    fn push(&mut self, location: usize, parent: OrganismId) -> bool {
        match self.queued.get_mut(location) {
            Some(flag) if !*flag => {
                *flag = true;
                self.requests.push(ReproductionRequest { location, parent });
                true
            }
            _ => false,
        }
    }

    fn len(&self) -> usize {
        self.requests.len()
    }

    /// Hand over every request and clear the location flags
    fn take(&mut self) -> Vec<ReproductionRequest> {
        let requests = std::mem::take(&mut self.requests);
        for request in &requests {
            self.queued[request.location] = false;
        }
        requests
    }
}

/// Population summary emitted by `run` and consumed by reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub population: usize,
    pub total_births: u64,
    pub total_extractions: u64,
    pub points: PointStats,
    pub solve_counts: Vec<u64>,
    pub messages_sent: u64,
    pub messages_received: u64,
}

pub struct World {
    grid: Grid,
    /// One slot per grid cell, same linear index
    population: Vec<Option<Organism>>,
    tasks: Vec<Box<dyn Task>>,
    reproduce_queue: ReproductionQueue,
    solve_counts: SolveCounters,
    exchange: ExchangeCounters,
    mutator: Mutator,
    policy: LifecyclePolicy,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    tick: u64,
    next_id: u64,
    total_births: u64,
    total_extractions: u64,
}

impl World {
    pub fn new(config: SimulationConfig, tasks: Vec<Box<dyn Task>>) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::new(config.world.width, config.world.height, &mut rng)?;
        let size = grid.len();

        let repro = &config.reproduction;
        let mutator = Mutator::new(MutationConfig {
            point_mutation_rate: repro.mutation_rate,
            insertion_rate: repro.insertion_rate,
            deletion_rate: repro.deletion_rate,
            max_length: MutationConfig::default()
                .max_length
                .max(config.execution.program_length),
        });

        debug!(
            event = "world_created",
            width = config.world.width,
            height = config.world.height,
            num_tasks = tasks.len(),
            seed = config.seed,
            "World created"
        );

        Ok(Self {
            grid,
            population: (0..size).map(|_| None).collect(),
            solve_counts: SolveCounters::new(tasks.len()),
            exchange: ExchangeCounters::new(size),
            tasks,
            reproduce_queue: ReproductionQueue::new(size),
            mutator,
            policy: LifecyclePolicy::from(&config),
            config,
            rng,
            tick: 0,
            next_id: 0,
            total_births: 0,
            total_extractions: 0,
        })
    }

    /// Append a task to the ranking. Only allowed before the first tick.
    pub fn add_task(&mut self, task: Box<dyn Task>) -> Result<usize> {
        if self.tick > 0 {
            return Err(Error::InvalidState(format!(
                "Cannot register task '{}' after tick {}",
                task.name(),
                self.tick
            )));
        }
        self.tasks.push(task);
        self.solve_counts = SolveCounters::new(self.tasks.len());
        Ok(self.tasks.len() - 1)
    }

    pub fn tasks(&self) -> &[Box<dyn Task>] {
        &self.tasks
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn size(&self) -> usize {
        self.population.len()
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.grid.width && y < self.grid.height).then(|| y * self.grid.width + x)
    }

    /// Point the cell at `index` in a given direction
    pub fn set_facing(&mut self, index: usize, facing: Direction) -> Result<()> {
        let cell = self
            .grid
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("Cell {} out of range", index)))?;
        cell.set_facing(facing);
        Ok(())
    }

    pub fn is_occupied(&self, location: usize) -> bool {
        matches!(self.population.get(location), Some(Some(_)))
    }

    pub fn organism(&self, location: usize) -> Option<&Organism> {
        self.population.get(location)?.as_ref()
    }

    pub fn organism_mut(&mut self, location: usize) -> Option<&mut Organism> {
        self.population.get_mut(location)?.as_mut()
    }

    /// Live organisms in slot order
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> + '_ {
        self.population.iter().flatten()
    }

    pub fn population_size(&self) -> usize {
        self.organisms().count()
    }

    pub fn pending_reproductions(&self) -> usize {
        self.reproduce_queue.len()
    }

    pub fn solve_counts(&self) -> &SolveCounters {
        &self.solve_counts
    }

    pub fn exchange_counters(&self) -> &ExchangeCounters {
        &self.exchange
    }

    /// Zero the solve and exchange counters; called by the reporting driver
    pub fn reset_counters(&mut self) {
        self.solve_counts.reset();
        self.exchange.reset();
    }

    pub fn point_stats(&self) -> PointStats {
        PointStats::from_points(self.organisms().map(Organism::points))
    }

    pub fn identity_range(&self) -> (u32, u32) {
        self.grid.identity_range()
    }

    pub fn organism_data(&self) -> Vec<OrganismData> {
        self.organisms().map(OrganismData::from).collect()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            population: self.population_size(),
            total_births: self.total_births,
            total_extractions: self.total_extractions,
            points: self.point_stats(),
            solve_counts: self.solve_counts.as_slice().to_vec(),
            messages_sent: self.exchange.total_sent(),
            messages_received: self.exchange.total_received(),
        }
    }

    fn next_organism_id(&mut self) -> OrganismId {
        let id = OrganismId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place a new organism running `program` in a random empty slot
    pub fn inject(&mut self, program: Program) -> Result<usize> {
        let empty: Vec<usize> = (0..self.population.len())
            .filter(|&i| self.population[i].is_none())
            .collect();
        let location = *empty
            .choose(&mut self.rng)
            .ok_or_else(|| Error::InvalidState("No empty slot left for injection".to_string()))?;
        self.inject_at(program, location)?;
        Ok(location)
    }

    /// Place a new organism running `program` at a chosen empty slot
    pub fn inject_at(&mut self, program: Program, location: usize) -> Result<OrganismId> {
        match self.population.get(location) {
            None => {
                return Err(Error::NotFound(format!(
                    "Slot {} out of range for {} cells",
                    location,
                    self.population.len()
                )))
            }
            Some(Some(_)) => {
                return Err(Error::InvalidState(format!("Slot {} is occupied", location)))
            }
            Some(None) => {}
        }

        let id = self.next_organism_id();
        let mut organism = Organism::new(id, program)?;
        organism.birth_tick = self.tick;
        self.place(location, organism);

        debug!(
            event = "organism_injected",
            organism_id = %id,
            location,
            tick = self.tick,
            "Organism injected"
        );
        Ok(id)
    }

    /// Inject an organism with a freshly generated random genome
    pub fn inject_random(&mut self) -> Result<usize> {
        let program = self
            .mutator
            .random_program(self.config.execution.program_length, &mut self.rng);
        self.inject(program)
    }

    fn place(&mut self, location: usize, mut organism: Organism) {
        organism.bind(location, location);
        if let Some(cell) = self.grid.get_mut(location) {
            cell.set_occupied(true);
        }
        self.population[location] = Some(organism);
    }

    /// Remove the organism at `location`, clearing its cell and its back-reference
    pub fn extract_organism(&mut self, location: usize) -> Option<Organism> {
        let mut organism = self.population.get_mut(location)?.take()?;
        self.release(location, &mut organism);
        Some(organism)
    }

    fn release(&mut self, location: usize, organism: &mut Organism) {
        if let Some(cell) = self.grid.get_mut(location) {
            cell.set_occupied(false);
        }
        organism.unbind();
        self.total_extractions += 1;

        debug!(
            event = "organism_extracted",
            organism_id = %organism.id,
            location,
            points = organism.points(),
            age = organism.age(),
            tick = self.tick,
            "Organism extracted"
        );
    }

    /// Advance one tick: bind, process everyone in random order, then drain births
    pub fn update(&mut self) {
        self.bind_all_organisms();
        self.process_all_organisms();
        self.reproduce_queued();
        self.tick += 1;
    }

    /// Refresh every organism's location and every cell's occupancy flag
    pub fn bind_all_organisms(&mut self) {
        for (location, slot) in self.population.iter_mut().enumerate() {
            let occupied = slot.is_some();
            if let Some(organism) = slot {
                organism.bind(location, location);
            }
            if let Some(cell) = self.grid.get_mut(location) {
                cell.set_occupied(occupied);
            }
        }
    }

    /// Run every occupied slot exactly once in a fresh random order.
    ///
    /// Organisms whose points drop below zero leave the grid right after
    /// their own turn.
    pub fn process_all_organisms(&mut self) {
        let mut order: Vec<usize> = (0..self.population.len()).collect();
        order.shuffle(&mut self.rng);
        let policy = self.policy.clone();

        for location in order {
            let Some(mut organism) = self.population[location].take() else {
                continue;
            };

            let mut host = self.host(organism.id);
            organism.process(location, &policy, &mut host);

            if organism.points() < 0.0 {
                self.release(location, &mut organism);
            } else {
                self.population[location] = Some(organism);
            }
        }
    }

    /// Drain the reproduction queue, skipping requests whose parent no longer
    /// holds its slot
    pub fn reproduce_queued(&mut self) {
        let queue = self.reproduce_queue.take();
        let requested = queue.len();
        let mut born = 0;

        for request in queue {
            let id = OrganismId(self.next_id);
            let child = match self.population[request.location].as_ref() {
                Some(parent) if parent.id == request.parent => {
                    parent.check_reproduction(id, self.tick, &self.mutator, &mut self.rng)
                }
                _ => {
                    trace!(
                        event = "reproduction_skipped",
                        location = request.location,
                        parent_id = %request.parent,
                        "Parent no longer holds its slot"
                    );
                    continue;
                }
            };
            self.next_id += 1;

            if let Some(parent) = self.population[request.location].as_mut() {
                parent.record_offspring();
            }

            let target = self.birth_position(request.location);
            if let Some(displaced) = self.population[target].take() {
                trace!(
                    event = "organism_displaced",
                    organism_id = %displaced.id,
                    location = target,
                    "Offspring replaced an occupant"
                );
            }
            self.place(target, child);
            self.total_births += 1;
            born += 1;

            trace!(
                event = "organism_born",
                organism_id = %id,
                parent_id = %request.parent,
                location = target,
                tick = self.tick,
                "Offspring placed"
            );
        }

        if requested > 0 {
            debug!(
                event = "reproduction_drained",
                requested,
                born,
                tick = self.tick,
                "Reproduction queue drained"
            );
        }
    }

    /// Random empty neighbor of `parent`, else a random neighbor other than
    /// the parent, else the parent's own slot
    fn birth_position(&mut self, parent: usize) -> usize {
        let mut neighbors: Vec<usize> = self
            .grid
            .get(parent)
            .map(|cell| cell.neighbors().to_vec())
            .unwrap_or_default();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors.retain(|&n| n != parent);

        let empty: Vec<usize> = neighbors
            .iter()
            .copied()
            .filter(|&n| self.population[n].is_none())
            .collect();

        if let Some(&target) = empty.choose(&mut self.rng) {
            return target;
        }
        neighbors.choose(&mut self.rng).copied().unwrap_or(parent)
    }

    /// Queue a birth for the organism at `location`; false if the slot is empty
    pub fn reproduce_org(&mut self, location: usize) -> bool {
        match self.organism(location).map(|org| org.id) {
            Some(parent) => {
                self.reproduce_queue.push(location, parent);
                true
            }
            None => false,
        }
    }

    /// Score `state` against every task, crediting points and solve counts
    pub fn check_output(&mut self, state: &mut ExecutionState) {
        score_tasks(&self.grid, &self.tasks, &mut self.solve_counts, state);
    }

    /// Send `payload` from the organism at `location` to the cell it faces
    pub fn send_message(&mut self, location: usize, payload: u32) -> bool {
        match self.organism(location).map(|org| org.id) {
            Some(id) => self.host(id).deliver(location, payload).is_delivered(),
            None => false,
        }
    }

    /// Retrieve the inbox of the organism at `location`
    pub fn retrieve_message(&mut self, location: usize) -> Option<u32> {
        let mut organism = self.population.get_mut(location)?.take()?;
        let value = self.host(organism.id).retrieve_message(organism.state_mut());
        self.population[location] = Some(organism);
        Some(value)
    }

    /// Run `ticks` updates, logging a snapshot every `record_frequency` ticks
    #[instrument(skip(self), fields(seed = self.config.seed))]
    pub fn run(&mut self, ticks: u64) {
        let frequency = self.config.record_frequency.max(1);
        debug!(
            event = "run_started",
            ticks,
            start_tick = self.tick,
            population = self.population_size(),
            "Starting run"
        );

        for _ in 0..ticks {
            self.update();

            if self.tick % frequency == 0 {
                let snapshot = self.snapshot();
                info!(
                    event = "population_snapshot",
                    tick = snapshot.tick,
                    population = snapshot.population,
                    births = snapshot.total_births,
                    extractions = snapshot.total_extractions,
                    mean_points = snapshot.points.mean,
                    max_points = snapshot.points.max,
                    solves = self.solve_counts.total(),
                    "Population snapshot"
                );
            }
        }

        debug!(
            event = "run_finished",
            tick = self.tick,
            population = self.population_size(),
            total_births = self.total_births,
            total_extractions = self.total_extractions,
            "Run finished"
        );
    }

    fn host(&mut self, current: OrganismId) -> WorldHost<'_> {
        WorldHost {
            grid: &mut self.grid,
            population: &mut self.population,
            tasks: &self.tasks,
            solve_counts: &mut self.solve_counts,
            exchange: &mut self.exchange,
            reproduce_queue: &mut self.reproduce_queue,
            rng: &mut self.rng,
            current,
        }
    }
}

fn score_tasks(
    grid: &Grid,
    tasks: &[Box<dyn Task>],
    solve_counts: &mut SolveCounters,
    state: &mut ExecutionState,
) {
    let scores: Vec<(usize, f64)> = match TaskContext::new(state, grid) {
        Some(ctx) => tasks
            .iter()
            .enumerate()
            .map(|(index, task)| (index, task.evaluate(&ctx)))
            .filter(|&(_, score)| score != 0.0)
            .collect(),
        None => return,
    };

    for (index, score) in scores {
        state.record_score(index, score);
        solve_counts.record(index);
        trace!(
            event = "task_scored",
            task = tasks[index].name(),
            task_index = index,
            score,
            points = state.points,
            "Task scored"
        );
    }
}

/// The world services one organism may use while it runs.
///
/// Built from disjoint borrows of the world's fields, so the running
/// organism (taken out of its slot) never aliases them.
struct WorldHost<'a> {
    grid: &'a mut Grid,
    population: &'a mut [Option<Organism>],
    tasks: &'a [Box<dyn Task>],
    solve_counts: &'a mut SolveCounters,
    exchange: &'a mut ExchangeCounters,
    reproduce_queue: &'a mut ReproductionQueue,
    rng: &'a mut ChaCha8Rng,
    current: OrganismId,
}

impl WorldHost<'_> {
    /// Deliver to the faced cell when it is occupied and faces back.
    /// Zero payloads are never delivered.
    fn deliver(&mut self, sender_cell: usize, payload: u32) -> SendOutcome {
        if payload == 0 || sender_cell >= self.grid.len() {
            return SendOutcome::Rejected;
        }

        let target = self.grid.facing_neighbor(sender_cell);
        let target_occupied = self.grid.get(target).is_some_and(|c| c.is_occupied());
        if !target_occupied || !self.grid.mutual_facing(sender_cell, target) {
            return SendOutcome::Rejected;
        }

        let outcome = match self.population[target].as_mut() {
            Some(receiver) => {
                receiver.set_inbox(payload);
                SendOutcome::Delivered
            }
            // The running organism is out of its slot
            None if target == sender_cell => SendOutcome::Loopback,
            None => return SendOutcome::Rejected,
        };

        self.exchange
            .record_send(self.grid.cell_for_identity(payload));
        trace!(
            event = "message_delivered",
            from = sender_cell,
            to = target,
            payload,
            "Message delivered"
        );
        outcome
    }
}

impl Host for WorldHost<'_> {
    fn rotate_left(&mut self, cell: usize) {
        if cell < self.grid.len() {
            self.grid.rotate_left(cell);
        }
    }

    fn rotate_right(&mut self, cell: usize) {
        if cell < self.grid.len() {
            self.grid.rotate_right(cell);
        }
    }

    fn facing(&self, cell: usize) -> u32 {
        self.grid.get(cell).map_or(0, |c| c.facing().index() as u32)
    }

    fn identity(&self, cell: usize) -> u32 {
        self.grid.get(cell).map_or(0, |c| c.identity())
    }

    fn send_message(&mut self, sender: &ExecutionState, payload: u32) -> SendOutcome {
        match sender.cell {
            Some(cell) => self.deliver(cell, payload),
            None => SendOutcome::Rejected,
        }
    }

    fn retrieve_message(&mut self, receiver: &mut ExecutionState) -> u32 {
        let own_identity = receiver
            .cell
            .and_then(|c| self.grid.get(c))
            .map_or(0, |c| c.identity());
        let value = receiver.retrieve(own_identity);
        if value != 0 {
            self.exchange
                .record_receive(self.grid.cell_for_identity(value));
        }
        value
    }

    fn check_output(&mut self, state: &mut ExecutionState) {
        score_tasks(&*self.grid, self.tasks, &mut *self.solve_counts, state);
    }

    fn request_reproduction(&mut self, state: &ExecutionState) {
        if let Some(location) = state.location {
            self.reproduce_queue.push(location, self.current);
        }
    }

    fn random_u32(&mut self) -> u32 {
        self.rng.gen()
    }
}
