//! Session report and export functionality

use crate::control::Controller;
use crate::keyboard::get_key_info;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Complete session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Settings in effect when the report was generated
    pub settings: ReportSettings,
    /// Suppression statistics
    pub summary: SessionSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Session duration in seconds
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    pub threshold_ms: u64,
    pub enabled: bool,
}

/// Session summary statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Status label at report time
    pub status: String,
    /// Whether the capture hookup was armed
    pub actually_running: bool,
    /// Events suppressed since the last counter reset
    pub suppressed_total: u64,
    /// Per-key breakdown, noisiest first
    pub keys: Vec<KeyEntry>,
}

/// Suppressions for a single key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEntry {
    pub code: u16,
    pub name: String,
    pub press: u64,
    pub release: u64,
}

impl SessionReport {
    /// Create a new session report
    pub fn new(start_time: Instant, controller: &Controller) -> Self {
        let now: DateTime<Utc> = Utc::now();
        let snapshot = controller.snapshot();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                duration_secs: start_time.elapsed().as_secs_f64(),
            },
            settings: ReportSettings {
                threshold_ms: controller.threshold_ms(),
                enabled: controller.is_enabled(),
            },
            summary: SessionSummary {
                status: controller.status().label().to_string(),
                actually_running: controller.is_actually_running(),
                suppressed_total: snapshot.suppressed,
                keys: snapshot
                    .per_key
                    .iter()
                    .map(|(key, tally)| KeyEntry {
                        code: key.as_u16(),
                        name: get_key_info(*key).name.to_string(),
                        press: tally.press,
                        release: tally.release,
                    })
                    .collect(),
            },
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
