//! Execution state shared between an organism's CPU and the world.

use std::collections::HashSet;

/// Mutable per-organism state read and written by instructions.
///
/// `location` and `cell` are refreshed by the world every tick before the
/// organism runs and cleared when the organism leaves the grid.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    pub points: f64,
    /// Ticks survived
    pub age: u64,
    /// Highest task index ever scored; never decreases
    pub best_task: usize,
    pub reproduced_count: u32,
    /// Population slot the organism occupies
    pub location: Option<usize>,
    /// Index of the grid cell the organism is bound to
    pub cell: Option<usize>,
    /// Last payload handed to `SendMessage`
    pub message: u32,
    /// Last message delivered to this organism; persists until overwritten
    pub inbox: u32,
    /// Value copied out of the inbox by the last `RetrieveMessage`
    pub retrieved: u32,
    /// Every distinct non-zero value ever retrieved
    pub retrieved_values: HashSet<u32>,
    /// Running max over retrieved values and the organism's own cell identity
    pub max_known: u32,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: f64) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    pub fn bind(&mut self, location: usize, cell: usize) {
        self.location = Some(location);
        self.cell = Some(cell);
    }

    pub fn unbind(&mut self) {
        self.location = None;
        self.cell = None;
    }

    pub fn is_bound(&self) -> bool {
        self.cell.is_some()
    }

    /// Credit a task score and remember the best task index
    pub fn record_score(&mut self, task_index: usize, score: f64) {
        self.points += score;
        self.best_task = self.best_task.max(task_index);
    }

    /// Copy the inbox into `retrieved` and fold it into the known values.
    ///
    /// The first retrieval seeds `max_known` with `own_identity` whether or
    /// not the inbox holds a message. The inbox is left untouched, so repeated retrieval returns the same
    /// value until a new message arrives.
    pub fn retrieve(&mut self, own_identity: u32) -> u32 {
        self.retrieved = self.inbox;

        if self.max_known == 0 {
            self.max_known = own_identity;
        }

        if self.inbox != 0 {
            self.retrieved_values.insert(self.inbox);
            self.max_known = self.max_known.max(self.inbox);
        }

        self.retrieved
    }

    /// Whether `value` is the given own identity or was ever retrieved
    pub fn knows(&self, value: u32, own_identity: u32) -> bool {
        value != 0 && (value == own_identity || self.retrieved_values.contains(&value))
    }
}
