use serde::{Deserialize, Serialize};

/// Events that drive an operation node through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationEvent {
    /// All dependencies settled and a worker picked the node up
    Start,
    /// Work returned successfully
    Succeed,
    /// Work returned an error or panicked
    Fail(String),
}

impl OperationEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Fail(_) => "fail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeed | Self::Fail(_))
    }
}
