//! Debounce engine: the filter plus the lifecycle of its capture hookup

use super::{DebounceFilter, FilterSnapshot, RunState};
use crate::error::HookupError;
use crate::keyboard::{CaptureHookup, EventHandler, KeyCode, KeyEvent, KeyEventType, Verdict};
use parking_lot::Mutex;
use std::sync::Arc;

/// Owns the capture hookup and the filter it feeds.
///
/// `start`/`stop`/`rearm` are serialised by the lock around the hookup.
/// The filter lock is never held across hookup calls, and the capture
/// callback only ever touches the filter.
pub struct DebounceEngine {
    filter: Arc<DebounceFilter>,
    hookup: Mutex<Box<dyn CaptureHookup>>,
    state: Mutex<RunState>,
}

impl DebounceEngine {
    pub fn new(hookup: Box<dyn CaptureHookup>, threshold_ms: u64) -> Self {
        Self {
            filter: Arc::new(DebounceFilter::new(threshold_ms)),
            hookup: Mutex::new(hookup),
            state: Mutex::new(RunState::Stopped),
        }
    }

    fn handler(&self) -> EventHandler {
        let filter = Arc::clone(&self.filter);
        Arc::new(move |event: &KeyEvent| filter.evaluate_event(event))
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock() = state;
    }

    /// Arm the capture hookup with empty history.
    ///
    /// No-op when already running. On failure the engine is left in
    /// [`RunState::Failed`] and the error is returned for the caller to
    /// act on.
    pub fn start(&self) -> Result<(), HookupError> {
        let mut hookup = self.hookup.lock();
        if self.state.lock().is_running() {
            return Ok(());
        }

        self.filter.clear_history();
        self.set_state(RunState::Starting);

        match hookup.arm(self.handler()) {
            Ok(()) => {
                log::info!(
                    "Debouncing started via {} (threshold {} ms)",
                    hookup.name(),
                    self.filter.threshold_ms()
                );
                self.set_state(RunState::Running);
                Ok(())
            }
            Err(e) => {
                log::warn!("Could not arm {} capture: {}", hookup.name(), e);
                self.set_state(RunState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Disarm the hookup and forget history. Idempotent; the suppressed
    /// counter is kept.
    pub fn stop(&self) {
        let mut hookup = self.hookup.lock();
        let was_requested = self.state.lock().is_requested();

        hookup.disarm();
        self.filter.clear_history();
        self.set_state(RunState::Stopped);

        if was_requested {
            log::info!("Debouncing stopped");
        }
    }

    /// Re-arm after the system disabled the hookup out-of-band.
    ///
    /// History is kept: the same run continues.
    pub fn rearm(&self) -> Result<(), HookupError> {
        let mut hookup = self.hookup.lock();
        if !self.state.lock().is_running() {
            return Err(HookupError::NotRunning);
        }

        match hookup.rearm() {
            Ok(()) => {
                log::info!("Re-armed {} capture", hookup.name());
                Ok(())
            }
            Err(e) => {
                log::warn!("Re-arming {} capture failed: {}", hookup.name(), e);
                self.set_state(RunState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Whether the hookup still delivers events
    pub fn hookup_armed(&self) -> bool {
        self.hookup.lock().is_armed()
    }

    pub fn hookup_name(&self) -> &'static str {
        self.hookup.lock().name()
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), HookupError> {
        if enabled {
            self.start()
        } else {
            self.stop();
            Ok(())
        }
    }

    /// Requested state; true while starting, running or failing to start
    pub fn is_enabled(&self) -> bool {
        self.state.lock().is_requested()
    }

    pub fn is_actually_running(&self) -> bool {
        self.state.lock().is_running()
    }

    pub fn run_state(&self) -> RunState {
        self.state.lock().clone()
    }

    pub fn evaluate(&self, key: KeyCode, direction: KeyEventType, timestamp_ms: u64) -> Verdict {
        self.filter.evaluate(key, direction, timestamp_ms)
    }

    pub fn threshold_ms(&self) -> u64 {
        self.filter.threshold_ms()
    }

    pub fn set_threshold_ms(&self, threshold_ms: u64) {
        self.filter.set_threshold_ms(threshold_ms);
    }

    pub fn suppressed_count(&self) -> u64 {
        self.filter.suppressed_count()
    }

    pub fn reset_suppressed_count(&self) {
        self.filter.reset_suppressed_count();
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        self.filter.snapshot()
    }
}

impl Drop for DebounceEngine {
    fn drop(&mut self) {
        self.hookup.get_mut().disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{SimulatedHandle, SimulatedHookup};

    const A: KeyCode = KeyCode(30);

    fn engine(threshold_ms: u64) -> (DebounceEngine, SimulatedHandle) {
        let (hookup, handle) = SimulatedHookup::new();
        (DebounceEngine::new(Box::new(hookup), threshold_ms), handle)
    }

    #[test]
    fn new_engine_is_stopped() {
        let (engine, handle) = engine(100);
        assert_eq!(engine.run_state(), RunState::Stopped);
        assert!(!engine.is_enabled());
        assert!(!engine.is_actually_running());
        assert!(!handle.is_armed());
    }

    #[test]
    fn start_arms_hookup_and_routes_events() {
        let (engine, handle) = engine(100);
        engine.start().unwrap();
        assert!(engine.is_actually_running());
        assert_eq!(handle.inject(&KeyEvent::press(A, 0)), Some(Verdict::PassThrough));
        assert_eq!(handle.inject(&KeyEvent::press(A, 50)), Some(Verdict::Suppress));
        assert_eq!(engine.suppressed_count(), 1);
    }

    #[test]
    fn start_twice_is_noop() {
        let (engine, handle) = engine(100);
        engine.start().unwrap();
        engine.evaluate(A, KeyEventType::Press, 0);
        engine.start().unwrap();
        assert_eq!(handle.arm_count(), 1);
        // History survived the no-op start
        assert_eq!(engine.evaluate(A, KeyEventType::Press, 10), Verdict::Suppress);
    }

    #[test]
    fn failed_start_leaves_engine_requested_but_not_running() {
        let (engine, handle) = engine(100);
        handle.deny_access(true);
        let err = engine.start().unwrap_err();
        assert!(err.is_permission_problem());
        assert!(engine.is_enabled());
        assert!(!engine.is_actually_running());
        assert_eq!(engine.run_state().failure(), Some(&err));
    }

    #[test]
    fn start_after_failure_recovers() {
        let (engine, handle) = engine(100);
        handle.deny_access(true);
        assert!(engine.start().is_err());
        handle.deny_access(false);
        engine.start().unwrap();
        assert_eq!(engine.run_state(), RunState::Running);
    }

    #[test]
    fn stop_clears_history_but_not_counter() {
        let (engine, handle) = engine(100);
        engine.start().unwrap();
        handle.inject(&KeyEvent::press(A, 0));
        handle.inject(&KeyEvent::press(A, 10));
        engine.stop();
        assert!(!handle.is_armed());
        assert_eq!(engine.suppressed_count(), 1);

        engine.start().unwrap();
        assert_eq!(handle.inject(&KeyEvent::press(A, 20)), Some(Verdict::PassThrough));
    }

    #[test]
    fn stop_is_idempotent_and_cancels_failure() {
        let (engine, handle) = engine(100);
        handle.deny_access(true);
        let _ = engine.start();
        engine.stop();
        engine.stop();
        assert_eq!(engine.run_state(), RunState::Stopped);
        assert!(!engine.is_enabled());
    }

    #[test]
    fn rearm_requires_running_engine() {
        let (engine, _handle) = engine(100);
        assert_eq!(engine.rearm(), Err(HookupError::NotRunning));
    }

    #[test]
    fn rearm_after_out_of_band_disable_keeps_history() {
        let (engine, handle) = engine(100);
        engine.start().unwrap();
        handle.inject(&KeyEvent::press(A, 0));
        handle.disable();
        assert!(!engine.hookup_armed());
        assert!(engine.is_actually_running());

        engine.rearm().unwrap();
        assert!(engine.hookup_armed());
        assert_eq!(handle.inject(&KeyEvent::press(A, 10)), Some(Verdict::Suppress));
    }

    #[test]
    fn failed_rearm_moves_to_failed() {
        let (engine, handle) = engine(100);
        engine.start().unwrap();
        handle.disable();
        handle.deny_access(true);
        assert!(engine.rearm().is_err());
        assert!(engine.is_enabled());
        assert!(!engine.is_actually_running());
    }

    #[test]
    fn set_enabled_maps_to_start_and_stop() {
        let (engine, handle) = engine(100);
        engine.set_enabled(true).unwrap();
        assert!(handle.is_armed());
        engine.set_enabled(false).unwrap();
        assert!(!handle.is_armed());
        assert!(!engine.is_enabled());
    }

    #[test]
    fn drop_disarms_hookup() {
        let (engine, handle) = engine(100);
        engine.start().unwrap();
        drop(engine);
        assert!(!handle.is_armed());
    }

    #[test]
    fn threshold_accessors_pass_any_value() {
        let (engine, _handle) = engine(100);
        engine.set_threshold_ms(5_000);
        assert_eq!(engine.threshold_ms(), 5_000);
    }
}
