//! Keyboard event types and the pass/suppress verdict

use super::KeyCode;

/// Type of keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventType {
    /// Key was pressed down
    Press,
    /// Key was released
    Release,
}

impl KeyEventType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Release => "release",
        }
    }
}

/// A keyboard event as delivered by the capture mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code
    pub key: KeyCode,
    /// Type of event (press/release)
    pub event_type: KeyEventType,
    /// Capture time of this event in milliseconds
    pub timestamp_ms: u64,
}

impl KeyEvent {
    pub fn new(key: KeyCode, event_type: KeyEventType, timestamp_ms: u64) -> Self {
        Self {
            key,
            event_type,
            timestamp_ms,
        }
    }

    pub fn press(key: KeyCode, timestamp_ms: u64) -> Self {
        Self::new(key, KeyEventType::Press, timestamp_ms)
    }

    pub fn release(key: KeyCode, timestamp_ms: u64) -> Self {
        Self::new(key, KeyEventType::Release, timestamp_ms)
    }
}

/// Decision returned for every evaluated event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the physical event
    PassThrough,
    /// Drop the physical event as chatter
    Suppress,
}

impl Verdict {
    pub fn is_suppress(&self) -> bool {
        *self == Verdict::Suppress
    }
}
