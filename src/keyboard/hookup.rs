//! The seam between the debounce engine and the OS capture mechanism
//!
//! A [`CaptureHookup`] intercepts key events system-wide and asks a
//! registered [`EventHandler`] for a verdict before forwarding or dropping
//! each one. The engine owns the hookup and arms it with a closure holding
//! a handle to its filter.

use super::{KeyEvent, Verdict};
use crate::error::HookupError;
use parking_lot::Mutex;
use std::sync::Arc;

/// Called synchronously by the capture mechanism for every key event
pub type EventHandler = Arc<dyn Fn(&KeyEvent) -> Verdict + Send + Sync>;

/// An interception point for keyboard events
pub trait CaptureHookup: Send {
    /// Short backend name for logs and status display
    fn name(&self) -> &'static str;

    /// Start delivering events to `handler`.
    ///
    /// Arming an already armed hookup replaces the handler.
    fn arm(&mut self, handler: EventHandler) -> Result<(), HookupError>;

    /// Stop delivering events. Idempotent.
    fn disarm(&mut self);

    /// Re-establish the hookup with the last installed handler, e.g. after
    /// the system disabled it out-of-band.
    fn rearm(&mut self) -> Result<(), HookupError>;

    /// Whether events are currently being delivered
    fn is_armed(&self) -> bool;
}

#[derive(Default)]
struct SimulatedState {
    handler: Option<EventHandler>,
    armed: bool,
    denied: bool,
    unsupported: Option<String>,
    arm_count: u32,
    disarm_count: u32,
}

impl SimulatedState {
    fn check_access(&self) -> Result<(), HookupError> {
        if let Some(reason) = &self.unsupported {
            return Err(HookupError::Unsupported(reason.clone()));
        }
        if self.denied {
            return Err(HookupError::PermissionDenied(
                "simulated access denial".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-process capture mechanism driven by [`SimulatedHandle::inject`].
///
/// Used by tests and as the fallback on platforms without a real backend.
pub struct SimulatedHookup {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedHookup {
    /// Create a hookup and a handle for driving it
    pub fn new() -> (Self, SimulatedHandle) {
        let state = Arc::new(Mutex::new(SimulatedState::default()));
        let handle = SimulatedHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }

    /// A hookup that always fails to arm with [`HookupError::Unsupported`]
    pub fn unsupported(reason: impl Into<String>) -> Self {
        let (hookup, handle) = Self::new();
        handle.state.lock().unsupported = Some(reason.into());
        hookup
    }
}

impl CaptureHookup for SimulatedHookup {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn arm(&mut self, handler: EventHandler) -> Result<(), HookupError> {
        let mut state = self.state.lock();
        state.check_access()?;
        state.handler = Some(handler);
        state.armed = true;
        state.arm_count += 1;
        Ok(())
    }

    fn disarm(&mut self) {
        let mut state = self.state.lock();
        if state.armed {
            state.disarm_count += 1;
        }
        state.armed = false;
    }

    fn rearm(&mut self) -> Result<(), HookupError> {
        let mut state = self.state.lock();
        if state.handler.is_none() {
            return Err(HookupError::NotArmed);
        }
        state.check_access()?;
        state.armed = true;
        state.arm_count += 1;
        Ok(())
    }

    fn is_armed(&self) -> bool {
        self.state.lock().armed
    }
}

/// Cloneable control handle for a [`SimulatedHookup`]
#[derive(Clone)]
pub struct SimulatedHandle {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedHandle {
    /// Deliver an event like the OS would.
    ///
    /// Returns `None` when the hookup is not armed (the event would reach
    /// applications unfiltered).
    pub fn inject(&self, event: &KeyEvent) -> Option<Verdict> {
        let handler = {
            let state = self.state.lock();
            if !state.armed {
                return None;
            }
            state.handler.clone()?
        };
        Some(handler(event))
    }

    /// Make subsequent arm/rearm attempts fail with a permission error
    pub fn deny_access(&self, denied: bool) {
        self.state.lock().denied = denied;
    }

    /// Simulate the system disabling the hookup behind the engine's back
    pub fn disable(&self) {
        self.state.lock().armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().armed
    }

    pub fn arm_count(&self) -> u32 {
        self.state.lock().arm_count
    }

    pub fn disarm_count(&self) -> u32 {
        self.state.lock().disarm_count
    }
}
