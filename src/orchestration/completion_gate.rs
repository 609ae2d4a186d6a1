//! # Completion Gate
//!
//! One-shot delivery of the draft content to the host's content handler.
//!
//! Two sources race to fire the gate: the completion task, once every
//! operation in the graph has settled, and the host's deadline signal.
//! Whichever arrives first snapshots the draft and invokes the handler. The
//! loser is a no-op. The gate never un-fires.

use crate::models::{DraftContent, DraftResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Callback that receives the final content exactly once
pub type ContentHandler = Box<dyn FnOnce(DraftResult) + Send + 'static>;

/// What caused the gate to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiredBy {
    Completion,
    Deadline,
}

impl fmt::Display for FiredBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completion => write!(f, "completion"),
            Self::Deadline => write!(f, "deadline"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    Armed = 0,
    FiredByCompletion = 1,
    FiredByDeadline = 2,
}

impl GateState {
    pub fn fired_by(&self) -> Option<FiredBy> {
        match self {
            Self::Armed => None,
            Self::FiredByCompletion => Some(FiredBy::Completion),
            Self::FiredByDeadline => Some(FiredBy::Deadline),
        }
    }
}

impl From<u8> for GateState {
    fn from(value: u8) -> Self {
        match value {
            0 => GateState::Armed,
            1 => GateState::FiredByCompletion,
            _ => GateState::FiredByDeadline,
        }
    }
}

impl From<FiredBy> for GateState {
    fn from(by: FiredBy) -> Self {
        match by {
            FiredBy::Completion => GateState::FiredByCompletion,
            FiredBy::Deadline => GateState::FiredByDeadline,
        }
    }
}

pub struct CompletionGate {
    state: AtomicU8,
    content: Arc<DraftContent>,
    handler: Mutex<Option<ContentHandler>>,
    fired: watch::Sender<Option<FiredBy>>,
}

impl fmt::Debug for CompletionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionGate")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CompletionGate {
    pub fn new(content: Arc<DraftContent>, handler: ContentHandler) -> Self {
        let (fired, _) = watch::channel(None);
        Self {
            state: AtomicU8::new(GateState::Armed as u8),
            content,
            handler: Mutex::new(Some(handler)),
            fired,
        }
    }

    pub fn state(&self) -> GateState {
        GateState::from(self.state.load(Ordering::Acquire))
    }

    pub fn fired_by(&self) -> Option<FiredBy> {
        self.state().fired_by()
    }

    /// Fire the gate. Returns `true` only for the caller that won the race.
    pub fn fire(&self, by: FiredBy) -> bool {
        let target = GateState::from(by);
        if self
            .state
            .compare_exchange(
                GateState::Armed as u8,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!(fired_by = %by, state = ?self.state(), "Completion gate already fired");
            return false;
        }

        let snapshot = self.content.snapshot();
        // Taken before the call so the handler never runs under the lock
        let handler = self.handler.lock().take();
        if let Some(handler) = handler {
            handler(snapshot);
        }

        info!(fired_by = %by, "Content handler invoked");
        self.fired.send_replace(Some(by));
        true
    }

    /// Wait until the gate fires and report what fired it.
    pub async fn wait(&self) -> FiredBy {
        let mut receiver = self.fired.subscribe();
        loop {
            if let Some(by) = *receiver.borrow_and_update() {
                return by;
            }
            if receiver.changed().await.is_err() {
                return self.fired_by().unwrap_or(FiredBy::Deadline);
            }
        }
    }
}
