//! # Task Scheduler
//!
//! Executes a validated [`DependencyGraph`] on a bounded pool of tokio tasks.
//!
//! ## Execution model
//!
//! A single driver task owns every node's state machine and an unsettled
//! dependency counter per node. Eligible nodes are dispatched into a `JoinSet`
//! while fewer than `max_concurrency` are in flight; the rest wait in a ready
//! queue. When a node settles the driver decrements the counter of each
//! dependent and enqueues those that reach zero. Node bodies await their own
//! I/O, so the pool bounds parallelism, never depth: a chain longer than the
//! pool still completes one link at a time.
//!
//! A node that errors or panics is recorded as failed and still settles.
//! Nothing is retried.
//!
//! ## Usage
//!
//! ```rust
//! use push_extension_core::config::SchedulerConfig;
//! use push_extension_core::orchestration::{operation_fn, GraphBuilder, TaskScheduler};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = GraphBuilder::new();
//! builder
//!     .add_operation("fetch", operation_fn(|| async { Ok(()) }))
//!     .add_operation("merge", operation_fn(|| async { Ok(()) }))
//!     .add_dependency("merge", "fetch");
//!
//! let scheduler = TaskScheduler::new(&SchedulerConfig::default());
//! let report = scheduler.schedule(builder.build()?).settled().await?;
//! assert_eq!(report.settlement_order, vec!["fetch", "merge"]);
//! # Ok(())
//! # }
//! ```

use crate::config::SchedulerConfig;
use crate::constants::events;
use crate::error::SchedulerError;
use crate::events::EventPublisher;
use crate::logging::{log_error, log_operation};
use crate::orchestration::graph::DependencyGraph;
use crate::state_machine::{
    OperationEvent, OperationOutcome, OperationState, OperationStateMachine, OperationTransition,
};
use futures::FutureExt;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Runs dependency graphs on a bounded worker pool
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    max_concurrency: usize,
    event_publisher: Option<EventPublisher>,
}

impl TaskScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            event_publisher: None,
        }
    }

    /// Publish `operation.started`, `operation.settled` and `graph.settled`
    /// lifecycle events while graphs run.
    pub fn with_event_publisher(mut self, publisher: EventPublisher) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Start executing the graph. Must be called from within a tokio runtime.
    #[instrument(skip_all, fields(operations = graph.len()))]
    pub fn schedule(&self, graph: DependencyGraph) -> ScheduleHandle {
        let run_id = Uuid::new_v4();
        let (report_tx, report_rx) = oneshot::channel();

        info!(
            run_id = %run_id,
            operations = graph.len(),
            max_concurrency = self.max_concurrency,
            "Operations were scheduled"
        );

        let driver = Driver::new(run_id, graph, self.max_concurrency, self.event_publisher.clone());
        tokio::spawn(async move {
            let report = driver.run().await;
            // The handle may have been dropped; nobody is waiting then
            let _ = report_tx.send(report);
        });

        ScheduleHandle {
            run_id,
            report: report_rx,
        }
    }
}

/// Handle to a running graph
#[derive(Debug)]
pub struct ScheduleHandle {
    run_id: Uuid,
    report: oneshot::Receiver<ScheduleReport>,
}

impl ScheduleHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Resolves once every operation in the graph has settled.
    pub async fn settled(self) -> Result<ScheduleReport, SchedulerError> {
        self.report.await.map_err(|_| SchedulerError::DriverStopped)
    }
}

/// Final state of one operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub id: String,
    pub state: OperationState,
    pub outcome: Option<OperationOutcome>,
    pub transitions: Vec<OperationTransition>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub run_id: Uuid,
    /// Records in graph registration order
    pub records: Vec<OperationRecord>,
    pub start_order: Vec<String>,
    pub settlement_order: Vec<String>,
    pub elapsed: Duration,
}

impl ScheduleReport {
    pub fn record(&self, id: &str) -> Option<&OperationRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn all_settled(&self) -> bool {
        self.unsettled().next().is_none()
    }

    /// Operations that never settled because their task was aborted or the
    /// runtime shut down, plus every dependent left waiting on them
    pub fn unsettled(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records
            .iter()
            .filter(|record| !record.state.satisfies_dependencies())
    }

    pub fn failed(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter().filter(|record| {
            record
                .outcome
                .as_ref()
                .is_some_and(|outcome| !outcome.is_success())
        })
    }

    /// True when `first` settled no later than `then` started
    pub fn settled_before_start(&self, first: &str, then: &str) -> bool {
        match (
            self.record(first).and_then(|r| r.transitions.last()),
            self.record(then)
                .and_then(|r| r.transitions.iter().find(|t| t.to == OperationState::Executing)),
        ) {
            (Some(settled), Some(started)) => {
                settled.to == OperationState::Settled && settled.at <= started.at
            }
            _ => false,
        }
    }
}

struct Driver {
    run_id: Uuid,
    graph: DependencyGraph,
    max_concurrency: usize,
    publisher: Option<EventPublisher>,
    machines: Vec<OperationStateMachine>,
    unsettled_dependencies: Vec<usize>,
    ready: VecDeque<usize>,
    start_order: Vec<String>,
    settlement_order: Vec<String>,
}

impl Driver {
    fn new(
        run_id: Uuid,
        graph: DependencyGraph,
        max_concurrency: usize,
        publisher: Option<EventPublisher>,
    ) -> Self {
        let machines = graph
            .nodes
            .iter()
            .map(|node| OperationStateMachine::new(node.id.clone()))
            .collect();
        let unsettled_dependencies: Vec<usize> = graph
            .nodes
            .iter()
            .map(|node| node.dependencies.len())
            .collect();
        let ready = unsettled_dependencies
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(idx, _)| idx)
            .collect();

        Self {
            run_id,
            graph,
            max_concurrency,
            publisher,
            machines,
            unsettled_dependencies,
            ready,
            start_order: Vec::new(),
            settlement_order: Vec::new(),
        }
    }

    async fn run(mut self) -> ScheduleReport {
        let started = Instant::now();
        let mut in_flight: JoinSet<(usize, OperationOutcome)> = JoinSet::new();

        loop {
            while in_flight.len() < self.max_concurrency {
                let Some(idx) = self.ready.pop_front() else {
                    break;
                };
                self.dispatch(idx, &mut in_flight);
            }

            match in_flight.join_next().await {
                Some(Ok((idx, outcome))) => self.settle(idx, outcome),
                Some(Err(join_error)) => {
                    // Panics are caught inside the task, so this is runtime
                    // shutdown or an abort. The affected node never settles.
                    log_error(
                        "scheduler",
                        "join_operation",
                        &join_error.to_string(),
                        Some(&self.run_id.to_string()),
                    );
                }
                None => break,
            }
        }

        let elapsed = started.elapsed();
        let report = self.into_report(elapsed);
        let unsettled: Vec<&str> = report.unsettled().map(|record| record.id.as_str()).collect();

        info!(
            run_id = %report.run_id,
            settled = report.settlement_order.len(),
            failed = report.failed().count(),
            unsettled = unsettled.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Operations were completed"
        );
        if !unsettled.is_empty() {
            warn!(
                run_id = %report.run_id,
                unsettled = ?unsettled,
                "Run ended with operations that never settled"
            );
        }
        if let Some(publisher) = &self.publisher {
            publisher.publish(
                events::GRAPH_SETTLED,
                json!({
                    "run_id": report.run_id,
                    "settled": report.settlement_order,
                    "elapsed_ms": elapsed.as_millis() as u64,
                }),
            );
        }

        report
    }

    fn dispatch(&mut self, idx: usize, in_flight: &mut JoinSet<(usize, OperationOutcome)>) {
        let node = &self.graph.nodes[idx];
        if let Err(e) = self.machines[idx].transition(OperationEvent::Start) {
            warn!(operation = %node.id, error = %e, "Refusing to start operation twice");
            return;
        }

        debug!(run_id = %self.run_id, operation = %node.id, "Operation started");
        self.start_order.push(node.id.clone());
        self.publish(events::OPERATION_STARTED, &node.id, None);

        let operation = node.operation.clone();
        in_flight.spawn(async move {
            let outcome = match AssertUnwindSafe(operation.execute()).catch_unwind().await {
                Ok(Ok(())) => OperationOutcome::Succeeded,
                Ok(Err(error)) => OperationOutcome::Failed(format!("{error:#}")),
                Err(panic) => OperationOutcome::Failed(panic_message(panic.as_ref())),
            };
            (idx, outcome)
        });
    }

    fn settle(&mut self, idx: usize, outcome: OperationOutcome) {
        let event = match &outcome {
            OperationOutcome::Succeeded => OperationEvent::Succeed,
            OperationOutcome::Failed(reason) => OperationEvent::Fail(reason.clone()),
        };
        let id = self.graph.nodes[idx].id.clone();

        if let Err(e) = self.machines[idx].transition(event) {
            warn!(operation = %id, error = %e, "Ignoring duplicate settlement");
            return;
        }

        log_operation(
            "settle",
            &id,
            &outcome.to_string(),
            outcome.failure_reason(),
        );
        self.settlement_order.push(id.clone());
        self.publish(events::OPERATION_SETTLED, &id, Some(&outcome));

        for &dependent in &self.graph.dependents[idx] {
            self.unsettled_dependencies[dependent] -= 1;
            if self.unsettled_dependencies[dependent] == 0 {
                debug!(
                    operation = %self.graph.nodes[dependent].id,
                    unblocked_by = %id,
                    "Operation became eligible"
                );
                self.ready.push_back(dependent);
            }
        }
    }

    fn publish(&self, event_name: &str, operation: &str, outcome: Option<&OperationOutcome>) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(
                event_name,
                json!({
                    "run_id": self.run_id,
                    "operation": operation,
                    "outcome": outcome,
                }),
            );
        }
    }

    fn into_report(&mut self, elapsed: Duration) -> ScheduleReport {
        let records = self
            .graph
            .nodes
            .iter()
            .zip(&self.machines)
            .map(|(node, machine)| OperationRecord {
                id: node.id.clone(),
                state: machine.current_state(),
                outcome: machine.outcome().cloned(),
                transitions: machine.history().to_vec(),
            })
            .collect();

        ScheduleReport {
            run_id: self.run_id,
            records,
            start_order: std::mem::take(&mut self.start_order),
            settlement_order: std::mem::take(&mut self.settlement_order),
            elapsed,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("operation panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("operation panicked: {message}")
    } else {
        "operation panicked".to_string()
    }
}
