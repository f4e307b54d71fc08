//! Main application state and logic

use super::widgets::StatEntry;
use crate::control::{ControlEvent, Controller, EngineStatus};
use crate::keyboard::get_key_info;
use crate::report::SessionReport;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a status message stays visible
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Current view/tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Dashboard,
    Keys,
    Help,
}

impl AppView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Keys => "Keys",
            Self::Help => "Help",
        }
    }

    pub fn all() -> &'static [AppView] {
        &[Self::Dashboard, Self::Keys, Self::Help]
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Dashboard => 0,
            Self::Keys => 1,
            Self::Help => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Dashboard,
            1 => Self::Keys,
            _ => Self::Help,
        }
    }
}

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Main application
pub struct App {
    /// Current view
    pub view: AppView,
    /// Application state
    pub state: AppState,
    /// Engine control surface
    pub controller: Controller,
    /// Application start time
    pub start_time: Instant,
    /// Last status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        Self {
            view: AppView::Dashboard,
            state: AppState::Running,
            controller,
            start_time: Instant::now(),
            status_message: None,
            status_time: None,
        }
    }

    /// Apply the persisted enabled flag
    pub fn startup(&mut self, now: Instant) {
        if let Err(e) = self.controller.startup(now) {
            self.set_status(format!("Capture unavailable: {}", e));
        }
    }

    /// Handle a control key. Returns false if the key is not bound.
    pub fn handle_key(&mut self, key: char, now: Instant) -> bool {
        match key {
            'e' => self.toggle_enabled(now),
            'r' => {
                self.controller.reset_suppressed_count();
                self.set_status("Suppressed counter reset".to_string());
            }
            'R' => self.retry(now),
            '+' | '=' => self.adjust_threshold(5),
            '-' => self.adjust_threshold(-5),
            ']' => self.adjust_threshold(1),
            '[' => self.adjust_threshold(-1),
            'x' => {
                let filename = format!(
                    "debounce_report_{}.json",
                    chrono::Utc::now().format("%Y%m%d_%H%M%S")
                );
                if let Err(e) = self.export_report(&filename) {
                    self.set_status(format!("Export failed: {}", e));
                }
            }
            '?' => self.view = AppView::Help,
            'q' => self.quit(),
            _ => return false,
        }
        true
    }

    fn toggle_enabled(&mut self, now: Instant) {
        match self.controller.toggle_enabled(now) {
            Ok(()) if self.controller.is_enabled() => {
                self.set_status("Debouncing enabled".to_string())
            }
            Ok(()) => self.set_status("Debouncing disabled".to_string()),
            Err(e) => self.set_status(format!("Capture unavailable: {}", e)),
        }
    }

    fn retry(&mut self, now: Instant) {
        if !self.controller.is_enabled() {
            self.set_status("Debouncing is disabled".to_string());
            return;
        }
        match self.controller.retry_now(now) {
            Ok(()) => self.set_status("Capture restarted".to_string()),
            Err(e) => self.set_status(format!("Retry failed: {}", e)),
        }
    }

    fn adjust_threshold(&mut self, delta_ms: i64) {
        let applied = self.controller.adjust_threshold(delta_ms);
        self.set_status(format!("Threshold: {} ms", applied));
    }

    /// Forward periodic housekeeping to the controller
    pub fn tick(&mut self, now: Instant) {
        match self.controller.tick(now) {
            Some(ControlEvent::Started) => self.set_status("Capture started".to_string()),
            Some(ControlEvent::Rearmed) => self.set_status("Capture re-armed".to_string()),
            Some(ControlEvent::RearmFailed(e)) => {
                self.set_status(format!("Capture lost: {}", e))
            }
            // Retries repeat every second; the dashboard already says so
            Some(ControlEvent::RetryFailed(_)) | None => {}
        }
    }

    /// Switch to the next view
    pub fn next_view(&mut self) {
        let next = (self.view.index() + 1) % AppView::all().len();
        self.view = AppView::from_index(next);
    }

    /// Switch to the previous view
    pub fn prev_view(&mut self) {
        let current = self.view.index();
        let prev = if current == 0 {
            AppView::all().len() - 1
        } else {
            current - 1
        };
        self.view = AppView::from_index(prev);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_time = Some(Instant::now());
    }

    /// Get status message if still valid
    pub fn get_status(&self) -> Option<&str> {
        match (&self.status_message, self.status_time) {
            (Some(msg), Some(time)) if time.elapsed() < STATUS_TTL => Some(msg),
            _ => None,
        }
    }

    /// Rows for the current view
    pub fn entries(&self) -> Vec<StatEntry> {
        match self.view {
            AppView::Dashboard => self.dashboard_entries(),
            AppView::Keys => self.key_entries(),
            AppView::Help => Vec::new(),
        }
    }

    fn dashboard_entries(&self) -> Vec<StatEntry> {
        let status = self.controller.status();
        let mut entries = Vec::new();

        entries.push(match &status {
            EngineStatus::Active => StatEntry::ok("Status", status.label()),
            EngineStatus::Starting => StatEntry::warning("Status", status.label()),
            EngineStatus::Failed(_) => StatEntry::error("Status", status.label()),
            EngineStatus::Disabled => StatEntry::info("Status", status.label()),
        });

        entries.push(StatEntry::info(
            "Enabled",
            if self.controller.is_enabled() { "yes" } else { "no" },
        ));
        entries.push(StatEntry::info(
            "Capture",
            format!(
                "{} ({})",
                self.controller.hookup_name(),
                if self.controller.is_actually_running() {
                    "armed"
                } else {
                    "idle"
                }
            ),
        ));
        entries.push(StatEntry::info(
            "Threshold",
            format!("{} ms", self.controller.threshold_ms()),
        ));

        let suppressed = self.controller.suppressed_count();
        entries.push(if suppressed > 0 {
            StatEntry::warning("Suppressed", suppressed.to_string())
        } else {
            StatEntry::ok("Suppressed", "0")
        });

        if let EngineStatus::Failed(reason) = &status {
            entries.push(StatEntry::error("Reason", reason.to_string()));
            if reason.is_permission_problem() {
                entries.push(StatEntry::warning(
                    "Hint",
                    "Grant access to /dev/input and /dev/uinput (input group)",
                ));
            }
            entries.push(StatEntry::info(
                "Retry",
                format!(
                    "automatic, {} attempt(s); press R to retry now",
                    self.controller.retry_attempts()
                ),
            ));
        }

        entries.push(StatEntry::info("Session", self.elapsed_formatted()));
        entries
    }

    fn key_entries(&self) -> Vec<StatEntry> {
        let snapshot = self.controller.snapshot();
        if snapshot.per_key.is_empty() {
            return vec![StatEntry::ok("Suppressed", "none yet")];
        }

        snapshot
            .per_key
            .iter()
            .map(|(key, tally)| {
                let info = get_key_info(*key);
                StatEntry::warning(
                    format!("{} ({})", info.label, key.as_u16()),
                    format!(
                        "{} total ({} press / {} release)",
                        tally.total(),
                        tally.press,
                        tally.release
                    ),
                )
            })
            .collect()
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Generate a session report
    pub fn generate_report(&self) -> SessionReport {
        SessionReport::new(self.start_time, &self.controller)
    }

    /// Export session report to JSON file
    pub fn export_report(&mut self, filename: &str) -> Result<String, std::io::Error> {
        let report = self.generate_report();
        report.export_json(Path::new(filename))?;
        let msg = format!("Exported to {}", filename);
        self.set_status(msg.clone());
        Ok(msg)
    }
}
