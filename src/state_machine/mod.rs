//! # Operation State Machine
//!
//! Every node in a dependency graph moves pending -> executing -> settled exactly
//! once. The scheduler driver owns one machine per node.

pub mod events;
pub mod operation_state_machine;
pub mod states;

pub use events::OperationEvent;
pub use operation_state_machine::{OperationStateMachine, OperationTransition};
pub use states::{OperationOutcome, OperationState};
