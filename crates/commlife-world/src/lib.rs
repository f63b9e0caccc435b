//! World simulation engine.
//!
//! This module implements the toroidal grid of directional cells, the task
//! ladder that scores organism behavior, and the scheduler that runs,
//! extracts and reproduces organisms tick by tick.

pub mod cell;
pub mod grid;
pub mod organism;
pub mod task;
pub mod world;

pub use cell::Cell;
pub use grid::Grid;
pub use organism::{LifecyclePolicy, Organism, OrganismData};
pub use task::{default_tasks, Task, TaskContext};
pub use world::{World, WorldSnapshot};
