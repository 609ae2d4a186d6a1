//! # Orchestration Engine
//!
//! Dependency-graph execution for a single notification.
//!
//! ## Core Components
//!
//! - **Operation**: unit of async work scheduled as one graph node
//! - **GraphBuilder / DependencyGraph**: validated, immutable, acyclic graph
//! - **TaskScheduler**: runs a graph on a bounded pool, settling every node
//!   exactly once and unblocking dependents on settlement
//! - **CompletionGate**: one-shot delivery of the draft, raced between graph
//!   settlement and the host deadline
//! - **NotificationServiceExtension**: wires payload, operations, scheduler
//!   and gate together per notification

pub mod completion_gate;
pub mod extension;
pub mod graph;
pub mod operation;
pub mod scheduler;

pub use completion_gate::{CompletionGate, ContentHandler, FiredBy, GateState};
pub use extension::{
    Collaborators, NotificationServiceExtension, NotificationSession, ReceiveOutcome,
};
pub use graph::{DependencyGraph, GraphBuilder, OperationNode};
pub use operation::{operation_fn, FnOperation, Operation};
pub use scheduler::{OperationRecord, ScheduleHandle, ScheduleReport, TaskScheduler};
