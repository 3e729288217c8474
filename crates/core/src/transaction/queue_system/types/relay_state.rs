use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum RelayState {
    Idle,
    Draining,
}

impl Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayState::Idle => write!(f, "idle"),
            RelayState::Draining => write!(f, "draining"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    pub state: RelayState,
    /// Batches leased and processed since the worker started, empty leases included.
    pub completed_drain_cycles: u64,
}

impl RelayStatus {
    pub fn is_idle(&self) -> bool {
        self.state == RelayState::Idle
    }
}

impl Default for RelayStatus {
    fn default() -> Self {
        RelayStatus { state: RelayState::Idle, completed_drain_cycles: 0 }
    }
}
