//! Keyboard events, key codes and the capture hookup seam

mod event;
mod hookup;
pub mod keymap;

#[cfg(target_os = "linux")]
mod evdev_hookup;

pub use event::{KeyEvent, KeyEventType, Verdict};
pub use hookup::{CaptureHookup, EventHandler, SimulatedHandle, SimulatedHookup};
pub use keymap::{get_key_info, KeyCode, KeyInfo, KEYMAP};

#[cfg(target_os = "linux")]
pub use evdev_hookup::{capture_status, EvdevHookup};
