//! Engine run state

use crate::error::HookupError;

/// Where the engine is in its lifecycle.
///
/// `Failed` means the engine was asked to run but the capture hookup could
/// not be armed; the request stands until `stop` is called.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Starting,
    Running,
    Failed(HookupError),
}

impl RunState {
    /// Whether running was requested (the persisted "enabled" flag)
    pub fn is_requested(&self) -> bool {
        !matches!(self, RunState::Stopped)
    }

    /// Whether the capture hookup is armed and feeding the filter
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    pub fn failure(&self) -> Option<&HookupError> {
        match self {
            RunState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
