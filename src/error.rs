//! Error types shared by the capture hookups and the engine

use std::io;
use thiserror::Error;

/// Failure to establish (or keep) the system-wide capture hookup.
///
/// None of these are fatal. The engine stays stopped and the control
/// surface decides whether and when to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookupError {
    /// Input devices exist but cannot be opened or grabbed
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Keyboards opened but are exclusively held by another program
    #[error("Keyboard devices are in use by another program: {0}")]
    Busy(String),

    /// No keyboard devices were found
    #[error("No keyboard devices found")]
    NoDevices,

    /// No capture backend exists for this platform
    #[error("Keyboard capture unsupported: {0}")]
    Unsupported(String),

    /// The virtual output keyboard could not be created
    #[error("Virtual keyboard unavailable: {0}")]
    VirtualDevice(String),

    /// Any other I/O failure while arming the hookup
    #[error("IO error: {0}")]
    Io(String),

    /// Re-arm requested before any handler was installed
    #[error("Hookup was never armed")]
    NotArmed,

    /// Re-arm requested while the engine is not running
    #[error("Engine is not running")]
    NotRunning,
}

impl HookupError {
    /// Whether the user can fix this by granting access to input devices
    pub fn is_permission_problem(&self) -> bool {
        matches!(self, HookupError::PermissionDenied(_))
    }
}

impl From<io::Error> for HookupError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::PermissionDenied {
            HookupError::PermissionDenied(e.to_string())
        } else {
            HookupError::Io(e.to_string())
        }
    }
}
