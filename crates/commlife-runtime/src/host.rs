//! World services available to running organisms.

use crate::context::ExecutionState;

/// Result of asking the world to deliver a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A gating condition failed; nothing changed
    Rejected,
    /// The payload landed in the faced organism's inbox
    Delivered,
    /// The faced cell is the sender's own cell (a grid one cell wide or
    /// tall); the CPU stores the payload in its own inbox
    Loopback,
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, SendOutcome::Rejected)
    }
}

/// Services an organism's instructions request from the world.
///
/// This is the organism's only handle on shared state: cells are named by
/// index and every mutation beyond the organism's own state goes through here.
pub trait Host {
    fn rotate_left(&mut self, cell: usize);

    fn rotate_right(&mut self, cell: usize);

    fn facing(&self, cell: usize) -> u32;

    fn identity(&self, cell: usize) -> u32;

    /// Deliver `payload` to the cell faced by the sender's cell
    fn send_message(&mut self, sender: &ExecutionState, payload: u32) -> SendOutcome;

    /// Copy the receiver's inbox into its retrieved state and record receive statistics
    fn retrieve_message(&mut self, receiver: &mut ExecutionState) -> u32;

    /// Score the state against every registered task
    fn check_output(&mut self, state: &mut ExecutionState);

    /// Queue a birth at the state's current location for the end of the tick
    fn request_reproduction(&mut self, state: &ExecutionState);

    fn random_u32(&mut self) -> u32;
}
