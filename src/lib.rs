//! Keyboard Debouncer - suppresses switch chatter before applications see it
//!
//! Keyboard events are captured system-wide and any event that repeats the
//! same key and direction within the configured threshold is dropped.
//! Everything else is forwarded unchanged.

pub mod config;
pub mod control;
pub mod debounce;
pub mod error;
pub mod keyboard;
pub mod logging;
pub mod report;
pub mod ui;

pub use config::Config;
pub use control::Controller;
pub use debounce::DebounceEngine;
pub use error::HookupError;
