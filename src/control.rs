//! Control surface for the debounce engine
//!
//! Validates and persists the user-facing settings, retries a capture
//! start that failed (typically while input-device permission is
//! missing) and turns the engine's run state into a status for display.

use crate::config::Config;
use crate::debounce::{DebounceEngine, FilterSnapshot, RunState};
use crate::error::HookupError;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Smallest threshold the control surface accepts
pub const MIN_THRESHOLD_MS: u64 = 1;
/// Largest threshold the control surface accepts
pub const MAX_THRESHOLD_MS: u64 = 200;
/// Threshold used on first run
pub const DEFAULT_THRESHOLD_MS: u64 = 100;
/// Delay before re-trying a failed start
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Engine status as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Capture armed, events are being filtered
    Active,
    /// Enabled and arming
    Starting,
    /// Enabled, but the capture hookup could not be armed
    Failed(HookupError),
    /// Not enabled
    Disabled,
}

impl EngineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Starting => "Starting...",
            Self::Failed(_) => "Waiting for permission",
            Self::Disabled => "Disabled",
        }
    }

    /// Enabled but not filtering: show the grant-permission and retry hints
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Starting | Self::Failed(_))
    }
}

impl From<&RunState> for EngineStatus {
    fn from(state: &RunState) -> Self {
        match state {
            RunState::Stopped => Self::Disabled,
            RunState::Starting => Self::Starting,
            RunState::Running => Self::Active,
            RunState::Failed(reason) => Self::Failed(reason.clone()),
        }
    }
}

/// Something that happened during [`Controller::tick`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// A scheduled retry armed the capture hookup
    Started,
    /// A scheduled retry failed again; another one is scheduled
    RetryFailed(HookupError),
    /// The hookup was disabled out-of-band and has been re-armed
    Rearmed,
    /// Re-arming after an out-of-band disable failed
    RearmFailed(HookupError),
}

/// Owns the engine and the persisted settings
pub struct Controller {
    engine: DebounceEngine,
    config: Config,
    config_path: Option<PathBuf>,
    retry_at: Option<Instant>,
    retry_attempts: u32,
}

impl Controller {
    /// Wrap an engine, applying the configured (clamped) threshold
    pub fn new(engine: DebounceEngine, mut config: Config) -> Self {
        config.debounce.threshold_ms = config.debounce.clamped_threshold();
        engine.set_threshold_ms(config.debounce.threshold_ms);
        Self {
            engine,
            config,
            config_path: None,
            retry_at: None,
            retry_attempts: 0,
        }
    }

    /// Save settings to `path` on every change
    pub fn with_persistence(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    fn persist(&self) {
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                log::warn!("Could not save settings to {}: {}", path.display(), e);
            }
        }
    }

    fn retry_delay(&self) -> Duration {
        self.config.retry_delay()
    }

    fn schedule_retry(&mut self, now: Instant, reason: &HookupError) {
        let at = now + self.retry_delay();
        log::info!(
            "Capture unavailable ({}); retrying in {} ms",
            reason,
            self.retry_delay().as_millis()
        );
        self.retry_at = Some(at);
    }

    fn try_start(&mut self, now: Instant) -> Result<(), HookupError> {
        match self.engine.start() {
            Ok(()) => {
                self.retry_at = None;
                self.retry_attempts = 0;
                Ok(())
            }
            Err(e) => {
                self.schedule_retry(now, &e);
                Err(e)
            }
        }
    }

    /// Apply the persisted enabled flag at process start
    pub fn startup(&mut self, now: Instant) -> Result<(), HookupError> {
        if self.config.debounce.enabled {
            self.try_start(now)
        } else {
            Ok(())
        }
    }

    pub fn set_enabled(&mut self, enabled: bool, now: Instant) -> Result<(), HookupError> {
        self.config.debounce.enabled = enabled;
        self.persist();

        if enabled {
            self.try_start(now)
        } else {
            self.retry_at = None;
            self.retry_attempts = 0;
            self.engine.stop();
            Ok(())
        }
    }

    pub fn toggle_enabled(&mut self, now: Instant) -> Result<(), HookupError> {
        let enabled = !self.engine.is_enabled();
        self.set_enabled(enabled, now)
    }

    /// Stop and start again; the manual "retry" action
    pub fn retry_now(&mut self, now: Instant) -> Result<(), HookupError> {
        self.engine.stop();
        if !self.config.debounce.enabled {
            return Ok(());
        }
        self.retry_attempts += 1;
        self.try_start(now)
    }

    /// Clamp, apply and persist a new threshold; returns the applied value
    pub fn set_threshold(&mut self, threshold_ms: u64) -> u64 {
        let applied = threshold_ms.clamp(MIN_THRESHOLD_MS, MAX_THRESHOLD_MS);
        self.engine.set_threshold_ms(applied);
        if self.config.debounce.threshold_ms != applied {
            self.config.debounce.threshold_ms = applied;
            self.persist();
        }
        applied
    }

    pub fn adjust_threshold(&mut self, delta_ms: i64) -> u64 {
        let current = self.engine.threshold_ms() as i64;
        let target = current.saturating_add(delta_ms).max(0) as u64;
        self.set_threshold(target)
    }

    pub fn threshold_ms(&self) -> u64 {
        self.engine.threshold_ms()
    }

    pub fn suppressed_count(&self) -> u64 {
        self.engine.suppressed_count()
    }

    pub fn reset_suppressed_count(&self) {
        self.engine.reset_suppressed_count();
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        self.engine.snapshot()
    }

    /// Periodic housekeeping, called from the UI loop.
    ///
    /// Runs a due retry (only while still enabled and not running) and
    /// re-arms a hookup the system disabled behind our back.
    pub fn tick(&mut self, now: Instant) -> Option<ControlEvent> {
        if let Some(at) = self.retry_at {
            if now < at {
                return None;
            }
            self.retry_at = None;
            if !self.engine.is_enabled() || self.engine.is_actually_running() {
                return None;
            }
            self.retry_attempts += 1;
            return Some(match self.try_start(now) {
                Ok(()) => ControlEvent::Started,
                Err(e) => ControlEvent::RetryFailed(e),
            });
        }

        if self.engine.is_actually_running() && !self.engine.hookup_armed() {
            log::warn!("Capture hookup was disabled; re-arming");
            return Some(match self.engine.rearm() {
                Ok(()) => ControlEvent::Rearmed,
                Err(e) => {
                    self.schedule_retry(now, &e);
                    ControlEvent::RearmFailed(e)
                }
            });
        }

        None
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::from(&self.engine.run_state())
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    pub fn is_actually_running(&self) -> bool {
        self.engine.is_actually_running()
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_at.is_some()
    }

    /// Start attempts since the last successful start; zero once running
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn hookup_name(&self) -> &'static str {
        self.engine.hookup_name()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &DebounceEngine {
        &self.engine
    }

    /// Stop filtering before exit without touching the persisted flag
    pub fn shutdown(&mut self) {
        self.retry_at = None;
        self.engine.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{KeyCode, KeyEvent, SimulatedHandle, SimulatedHookup, Verdict};

    fn controller(config: Config) -> (Controller, SimulatedHandle) {
        let (hookup, handle) = SimulatedHookup::new();
        let engine = DebounceEngine::new(Box::new(hookup), DEFAULT_THRESHOLD_MS);
        (Controller::new(engine, config), handle)
    }

    #[test]
    fn new_applies_clamped_threshold() {
        let mut config = Config::default();
        config.debounce.threshold_ms = 900;
        let (controller, _) = controller(config);
        assert_eq!(controller.threshold_ms(), 200);
        assert_eq!(controller.config().debounce.threshold_ms, 200);
    }

    #[test]
    fn startup_respects_enabled_flag() {
        let mut config = Config::default();
        config.debounce.enabled = false;
        let (mut controller, handle) = controller(config);
        controller.startup(Instant::now()).unwrap();
        assert!(!handle.is_armed());
        assert_eq!(controller.status(), EngineStatus::Disabled);

        let (mut controller, handle) = self::controller(Config::default());
        controller.startup(Instant::now()).unwrap();
        assert!(handle.is_armed());
        assert_eq!(controller.status(), EngineStatus::Active);
    }

    #[test]
    fn failed_startup_schedules_retry() {
        let (mut controller, handle) = controller(Config::default());
        handle.deny_access(true);
        let now = Instant::now();
        assert!(controller.startup(now).is_err());
        assert!(controller.retry_pending());
        assert!(controller.status().needs_attention());
        assert_eq!(controller.status().label(), "Waiting for permission");

        // Not due yet
        assert_eq!(controller.tick(now + Duration::from_millis(500)), None);

        // Still denied: rescheduled
        let later = now + Duration::from_millis(1000);
        assert!(matches!(controller.tick(later), Some(ControlEvent::RetryFailed(_))));
        assert!(controller.retry_pending());

        handle.deny_access(false);
        let event = controller.tick(later + Duration::from_millis(1000));
        assert_eq!(event, Some(ControlEvent::Started));
        assert_eq!(controller.status(), EngineStatus::Active);
        assert!(!controller.retry_pending());
    }

    #[test]
    fn disabling_cancels_pending_retry() {
        let (mut controller, handle) = controller(Config::default());
        handle.deny_access(true);
        let now = Instant::now();
        let _ = controller.startup(now);
        controller.set_enabled(false, now).unwrap();
        assert!(!controller.retry_pending());

        handle.deny_access(false);
        assert_eq!(controller.tick(now + Duration::from_secs(5)), None);
        assert!(!handle.is_armed());
        assert_eq!(controller.status(), EngineStatus::Disabled);
    }

    #[test]
    fn threshold_is_validated() {
        let (mut controller, _) = controller(Config::default());
        assert_eq!(controller.set_threshold(0), MIN_THRESHOLD_MS);
        assert_eq!(controller.set_threshold(1_000), MAX_THRESHOLD_MS);
        assert_eq!(controller.set_threshold(75), 75);
        assert_eq!(controller.adjust_threshold(-100), MIN_THRESHOLD_MS);
        assert_eq!(controller.adjust_threshold(9), 10);
        assert_eq!(controller.config().debounce.threshold_ms, 10);
    }

    #[test]
    fn toggle_flips_enabled_and_clears_history() {
        let (mut controller, handle) = controller(Config::default());
        let now = Instant::now();
        controller.startup(now).unwrap();
        handle.inject(&KeyEvent::press(KeyCode(30), 0));

        controller.toggle_enabled(now).unwrap();
        assert!(!controller.is_enabled());
        assert!(!controller.config().debounce.enabled);

        controller.toggle_enabled(now).unwrap();
        assert!(controller.is_actually_running());
        assert_eq!(
            handle.inject(&KeyEvent::press(KeyCode(30), 10)),
            Some(Verdict::PassThrough)
        );
    }

    #[test]
    fn tick_rearms_disabled_hookup() {
        let (mut controller, handle) = controller(Config::default());
        let now = Instant::now();
        controller.startup(now).unwrap();
        handle.disable();

        assert_eq!(controller.tick(now), Some(ControlEvent::Rearmed));
        assert!(handle.is_armed());
        assert_eq!(controller.tick(now), None);
    }

    #[test]
    fn failed_rearm_falls_back_to_retry() {
        let (mut controller, handle) = controller(Config::default());
        let now = Instant::now();
        controller.startup(now).unwrap();
        handle.disable();
        handle.deny_access(true);

        assert!(matches!(controller.tick(now), Some(ControlEvent::RearmFailed(_))));
        assert!(controller.retry_pending());
        assert!(controller.is_enabled());
        assert!(!controller.is_actually_running());

        handle.deny_access(false);
        assert_eq!(
            controller.tick(now + Duration::from_secs(1)),
            Some(ControlEvent::Started)
        );
    }

    #[test]
    fn retry_now_restarts_with_empty_history() {
        let (mut controller, handle) = controller(Config::default());
        let now = Instant::now();
        controller.startup(now).unwrap();
        handle.inject(&KeyEvent::press(KeyCode(30), 0));
        controller.retry_now(now).unwrap();
        assert_eq!(controller.retry_attempts(), 0);
        assert_eq!(
            handle.inject(&KeyEvent::press(KeyCode(30), 5)),
            Some(Verdict::PassThrough)
        );
    }

    #[test]
    fn retry_attempts_count_failures_until_success() {
        let (mut controller, handle) = controller(Config::default());
        handle.deny_access(true);
        let now = Instant::now();
        let _ = controller.startup(now);
        assert_eq!(controller.retry_attempts(), 0);

        assert!(controller.retry_now(now).is_err());
        assert_eq!(controller.retry_attempts(), 1);
        assert!(matches!(
            controller.tick(now + Duration::from_secs(1)),
            Some(ControlEvent::RetryFailed(_))
        ));
        assert_eq!(controller.retry_attempts(), 2);

        handle.deny_access(false);
        controller.retry_now(now).unwrap();
        assert_eq!(controller.retry_attempts(), 0);
    }

    #[test]
    fn persistence_writes_config() {
        let path = std::env::temp_dir().join(format!(
            "keyboard-debouncer-control-{}.toml",
            std::process::id()
        ));
        let (controller, _) = controller(Config::default());
        let mut controller = controller.with_persistence(path.clone());
        controller.set_threshold(42);
        controller.set_enabled(false, Instant::now()).unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.debounce.threshold_ms, 42);
        assert!(!saved.debounce.enabled);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn shutdown_keeps_persisted_flag() {
        let (mut controller, handle) = controller(Config::default());
        controller.startup(Instant::now()).unwrap();
        controller.shutdown();
        assert!(!handle.is_armed());
        assert!(controller.config().debounce.enabled);
    }
}
