//! Orchestration Integration Tests
//!
//! Scheduler behavior on hand-built graphs and complete notification runs.

pub mod graph_validation_test;
pub mod notification_scenarios_test;
pub mod scheduler_test;
