//! Scoring rules evaluated against an organism's execution state.

use crate::grid::Grid;
use commlife_runtime::ExecutionState;

/// Read-only view handed to tasks: the organism's state plus the grid it is
/// bound to.
pub struct TaskContext<'a> {
    pub state: &'a ExecutionState,
    grid: &'a Grid,
    cell: usize,
}

impl<'a> TaskContext<'a> {
    /// `None` when the state is not bound to a cell of `grid`
    pub fn new(state: &'a ExecutionState, grid: &'a Grid) -> Option<Self> {
        let cell = state.cell.filter(|&c| c < grid.len())?;
        Some(Self { state, grid, cell })
    }

    pub fn cell(&self) -> usize {
        self.cell
    }

    pub fn own_identity(&self) -> u32 {
        self.grid.identity(self.cell)
    }

    /// Whether the faced cell currently holds an organism
    pub fn facing_occupied(&self) -> bool {
        let target = self.grid.facing_neighbor(self.cell);
        self.grid.get(target).is_some_and(|c| c.is_occupied())
    }

    /// Faced cell is occupied and faces back
    pub fn mutual_facing(&self) -> bool {
        let target = self.grid.facing_neighbor(self.cell);
        self.facing_occupied() && self.grid.mutual_facing(self.cell, target)
    }

    /// Larger of the own identity and the last retrieved value
    pub fn highest_seen(&self) -> u32 {
        self.own_identity().max(self.state.retrieved)
    }

    pub fn message(&self) -> u32 {
        self.state.message
    }
}

/// A pure scoring rule. Returns 0 when unsatisfied.
///
/// Tasks must not keep state between calls. Their position in the world's
/// task list is their rank for `best_task`.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64;
}

/// Never scores; index 0 marks organisms that have solved nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Initial;

impl Task for Initial {
    fn name(&self) -> &str {
        "Initial"
    }

    fn evaluate(&self, _ctx: &TaskContext<'_>) -> f64 {
        0.0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TargetAnother;

impl Task for TargetAnother {
    fn name(&self) -> &str {
        "Target Another Organism"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.facing_occupied() {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FaceAnother;

impl Task for FaceAnother {
    fn name(&self) -> &str {
        "Face Another Organism"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.mutual_facing() {
            10.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrepMessage;

impl Task for PrepMessage {
    fn name(&self) -> &str {
        "Prepare Message"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.message() != 0 {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SendSelf;

impl Task for SendSelf {
    fn name(&self) -> &str {
        "Send Own Identity"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.message() == ctx.own_identity() {
            10.0
        } else {
            0.0
        }
    }
}

/// Message is any identity the organism knows
#[derive(Debug, Default, Clone, Copy)]
pub struct SendAnyId;

impl Task for SendAnyId {
    fn name(&self) -> &str {
        "Send Any Identity"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.state.knows(ctx.message(), ctx.own_identity()) {
            20.0
        } else {
            0.0
        }
    }
}

/// Penalises non-zero messages that are not a known identity
#[derive(Debug, Default, Clone, Copy)]
pub struct SendNonId;

impl Task for SendNonId {
    fn name(&self) -> &str {
        "Send Non-Identity"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        let message = ctx.message();
        if message != 0 && !ctx.state.knows(message, ctx.own_identity()) {
            -5.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrepHighest;

impl Task for PrepHighest {
    fn name(&self) -> &str {
        "Prepare Highest Value"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.message() == ctx.highest_seen() {
            20.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SendHighest;

impl Task for SendHighest {
    fn name(&self) -> &str {
        "Send Highest"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        if ctx.mutual_facing() && ctx.message() == ctx.highest_seen() {
            30.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SendMaxKnown;

impl Task for SendMaxKnown {
    fn name(&self) -> &str {
        "Send Max Known"
    }

    fn evaluate(&self, ctx: &TaskContext<'_>) -> f64 {
        let max_known = ctx.state.max_known;
        if max_known != 0 && ctx.message() == max_known {
            30.0
        } else {
            0.0
        }
    }
}

/// The standard task ladder, in ranking order
pub fn default_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(Initial),
        Box::new(TargetAnother),
        Box::new(FaceAnother),
        Box::new(PrepMessage),
        Box::new(SendSelf),
        Box::new(SendAnyId),
        Box::new(SendNonId),
        Box::new(PrepHighest),
        Box::new(SendHighest),
        Box::new(SendMaxKnown),
    ]
}
