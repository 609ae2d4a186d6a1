use super::{
    events::OperationEvent,
    states::{OperationOutcome, OperationState},
};
use crate::error::SchedulerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationTransition {
    pub from: Option<OperationState>,
    pub to: OperationState,
    pub event: String,
    pub at: DateTime<Utc>,
}

/// Per-node state machine owned by the scheduler driver.
///
/// Only `pending -> executing -> settled` is legal, so a node that is started
/// or settled twice is rejected rather than silently re-run.
#[derive(Debug, Clone)]
pub struct OperationStateMachine {
    operation_id: String,
    state: OperationState,
    outcome: Option<OperationOutcome>,
    history: Vec<OperationTransition>,
}

impl OperationStateMachine {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            state: OperationState::Pending,
            outcome: None,
            history: vec![OperationTransition {
                from: None,
                to: OperationState::Pending,
                event: "create".to_string(),
                at: Utc::now(),
            }],
        }
    }

    pub fn current_state(&self) -> OperationState {
        self.state
    }

    pub fn outcome(&self) -> Option<&OperationOutcome> {
        self.outcome.as_ref()
    }

    pub fn history(&self) -> &[OperationTransition] {
        &self.history
    }

    /// Attempt to transition the node
    pub fn transition(&mut self, event: OperationEvent) -> Result<OperationState, SchedulerError> {
        let target = self.determine_target_state(&event)?;

        match &event {
            OperationEvent::Succeed => self.outcome = Some(OperationOutcome::Succeeded),
            OperationEvent::Fail(reason) => {
                self.outcome = Some(OperationOutcome::Failed(reason.clone()))
            }
            OperationEvent::Start => {}
        }

        self.history.push(OperationTransition {
            from: Some(self.state),
            to: target,
            event: event.event_type().to_string(),
            at: Utc::now(),
        });
        self.state = target;

        Ok(target)
    }

    fn determine_target_state(
        &self,
        event: &OperationEvent,
    ) -> Result<OperationState, SchedulerError> {
        let target = match (self.state, event) {
            (OperationState::Pending, OperationEvent::Start) => OperationState::Executing,
            (OperationState::Executing, OperationEvent::Succeed | OperationEvent::Fail(_)) => {
                OperationState::Settled
            }
            (from_state, event) => {
                return Err(SchedulerError::InvalidTransition {
                    id: self.operation_id.clone(),
                    from: from_state.to_string(),
                    to: event.event_type().to_string(),
                });
            }
        };

        Ok(target)
    }
}
