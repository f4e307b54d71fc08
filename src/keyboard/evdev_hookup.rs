//! Raw evdev capture hookup for Linux
//!
//! Every physical keyboard under `/dev/input` is grabbed exclusively so no
//! other reader sees its events. A worker thread reads the grabbed devices,
//! asks the handler for a verdict per key event, and re-emits the events
//! that pass on a uinput virtual keyboard.

use super::{CaptureHookup, EventHandler, KeyCode, KeyEvent, KeyEventType};
use crate::error::HookupError;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, Device, EventType, InputEvent, Key};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::fs;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, UNIX_EPOCH};

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;
const KEY_REPEAT: i32 = 2;

/// Name of the re-injecting virtual keyboard
const VIRTUAL_DEVICE_NAME: &str = "keyboard-debouncer virtual keyboard";

/// Sleep between polls when no device had pending events
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, HookupError> {
    let input_dir = Path::new("/dev/input");
    if !input_dir.exists() {
        return Err(HookupError::Unsupported(
            "/dev/input does not exist".to_string(),
        ));
    }

    let mut keyboards = Vec::new();
    for entry in fs::read_dir(input_dir)?.flatten() {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with("event") && is_keyboard_device(&path) {
            keyboards.push(path);
        }
    }

    if keyboards.is_empty() {
        return Err(HookupError::NoDevices);
    }
    keyboards.sort();
    Ok(keyboards)
}

/// Check if a device is a keyboard by examining /sys/class/input
fn is_keyboard_device(device_path: &Path) -> bool {
    let Some(name) = device_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    let dev_name = fs::read_to_string(format!("/sys/class/input/{}/device/name", name)).ok();
    let key_bits = fs::read_to_string(format!(
        "/sys/class/input/{}/device/capabilities/key",
        name
    ))
    .ok()
    .map(|caps| {
        // Key capabilities are a hex bitmap
        caps.split_whitespace()
            .filter_map(|hex| u64::from_str_radix(hex, 16).ok())
            .map(|n| n.count_ones())
            .sum::<u32>()
    });

    looks_like_keyboard(dev_name.as_deref(), key_bits)
}

fn looks_like_keyboard(dev_name: Option<&str>, key_bits: Option<u32>) -> bool {
    let dev_name = dev_name.map(str::trim);
    // Never grab our own output device
    if dev_name == Some(VIRTUAL_DEVICE_NAME) {
        return false;
    }
    // A keyboard maps 80+ keys
    if key_bits.is_some_and(|bits| bits > 50) {
        return true;
    }
    dev_name.is_some_and(|n| {
        let lower = n.to_lowercase();
        lower.contains("keyboard") || lower.contains("kbd")
    })
}

fn set_nonblocking(device: &Device) -> io::Result<()> {
    let fd = device.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Milliseconds since the Unix epoch of the kernel event time
fn event_time_ms(event: &InputEvent) -> u64 {
    event
        .timestamp()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Translate a raw key event into the engine's vocabulary.
///
/// Autorepeat and non-key events return `None`.
fn to_key_event(event: &InputEvent) -> Option<KeyEvent> {
    if event.event_type() != EventType::KEY {
        return None;
    }
    let event_type = match event.value() {
        KEY_PRESS => KeyEventType::Press,
        KEY_RELEASE => KeyEventType::Release,
        _ => return None,
    };
    Some(KeyEvent::new(
        KeyCode::from(event.code()),
        event_type,
        event_time_ms(event),
    ))
}

/// Open and grab every readable keyboard device
fn grab_keyboards() -> Result<Vec<(PathBuf, Device)>, HookupError> {
    let mut grabbed = Vec::new();
    let mut last_denied = None;
    let mut last_grab_error = None;

    for path in find_keyboard_devices()? {
        let mut device = match Device::open(&path) {
            Ok(device) => device,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                last_denied = Some(path.display().to_string());
                continue;
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if let Err(e) = device.grab() {
            log::warn!("Could not grab {}: {}", path.display(), e);
            last_grab_error = Some(format!("{}: {}", path.display(), e));
            continue;
        }
        if let Err(e) = set_nonblocking(&device) {
            log::warn!("Could not set {} non-blocking: {}", path.display(), e);
            let _ = device.ungrab();
            continue;
        }

        log::info!(
            "Grabbed {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed")
        );
        grabbed.push((path, device));
    }

    if grabbed.is_empty() {
        return Err(nothing_grabbed(last_denied, last_grab_error));
    }
    Ok(grabbed)
}

/// Error for a scan that ended without a single grabbed keyboard.
///
/// A failed grab means the device opened fine but someone else holds it,
/// which no permission change will fix.
fn nothing_grabbed(last_denied: Option<String>, last_grab_error: Option<String>) -> HookupError {
    match last_grab_error {
        Some(detail) => HookupError::Busy(detail),
        None => HookupError::PermissionDenied(format!(
            "cannot access any keyboard device{}; run with sudo or add the user to the 'input' group",
            last_denied.map(|p| format!(" (last tried {})", p)).unwrap_or_default()
        )),
    }
}

fn virtual_device_error(e: io::Error) -> HookupError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        HookupError::from(e)
    } else {
        HookupError::VirtualDevice(e.to_string())
    }
}

fn build_virtual_keyboard(devices: &[(PathBuf, Device)]) -> Result<VirtualDevice, HookupError> {
    let mut keys = AttributeSet::<Key>::new();
    for (_, device) in devices {
        if let Some(supported) = device.supported_keys() {
            for key in supported.iter() {
                keys.insert(key);
            }
        }
    }

    VirtualDeviceBuilder::new()
        .and_then(|builder| builder.name(VIRTUAL_DEVICE_NAME).with_keys(&keys))
        .and_then(|builder| builder.build())
        .map_err(virtual_device_error)
}

/// Background reader owning the grabbed devices
struct Worker {
    stop: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(handler: EventHandler) -> Result<Self, HookupError> {
        let devices = grab_keyboards()?;
        let output = match build_virtual_keyboard(&devices) {
            Ok(output) => output,
            Err(e) => {
                release(devices);
                return Err(e);
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let thread = {
            let stop = Arc::clone(&stop);
            let alive = Arc::clone(&alive);
            thread::Builder::new()
                .name("debounce-capture".to_string())
                .spawn(move || {
                    capture_loop(devices, output, handler, &stop);
                    alive.store(false, Ordering::Release);
                })?
        };

        Ok(Self {
            stop,
            alive,
            thread: Some(thread),
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn release(devices: Vec<(PathBuf, Device)>) {
    for (path, mut device) in devices {
        if let Err(e) = device.ungrab() {
            log::debug!("Ungrab of {} failed: {}", path.display(), e);
        }
    }
}

fn capture_loop(
    mut devices: Vec<(PathBuf, Device)>,
    mut output: VirtualDevice,
    handler: EventHandler,
    stop: &AtomicBool,
) {
    let mut forward: Vec<InputEvent> = Vec::with_capacity(64);

    'outer: while !stop.load(Ordering::Acquire) {
        let mut idle = true;

        for (path, device) in devices.iter_mut() {
            forward.clear();
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        idle = false;
                        if event.event_type() != EventType::KEY {
                            continue;
                        }
                        if event.value() == KEY_REPEAT {
                            forward.push(event);
                            continue;
                        }
                        let Some(key_event) = to_key_event(&event) else {
                            continue;
                        };
                        if handler(&key_event).is_suppress() {
                            log::debug!(
                                "Suppressed {} {}",
                                key_event.event_type.name(),
                                key_event.key
                            );
                        } else {
                            forward.push(event);
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    log::warn!("Lost {}: {}; capture disabled", path.display(), e);
                    break 'outer;
                }
            }

            if !forward.is_empty() {
                if let Err(e) = output.emit(&forward) {
                    log::warn!("Virtual keyboard write failed: {}; capture disabled", e);
                    break 'outer;
                }
            }
        }

        if idle {
            thread::sleep(IDLE_POLL);
        }
    }

    release(devices);
}

/// Capture hookup backed by exclusive evdev grabs
#[derive(Default)]
pub struct EvdevHookup {
    handler: Option<EventHandler>,
    worker: Option<Worker>,
}

impl EvdevHookup {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureHookup for EvdevHookup {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn arm(&mut self, handler: EventHandler) -> Result<(), HookupError> {
        self.disarm();
        self.worker = Some(Worker::spawn(Arc::clone(&handler))?);
        self.handler = Some(handler);
        Ok(())
    }

    fn disarm(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }

    fn rearm(&mut self) -> Result<(), HookupError> {
        let handler = self.handler.clone().ok_or(HookupError::NotArmed)?;
        self.arm(handler)
    }

    fn is_armed(&self) -> bool {
        self.worker.as_ref().is_some_and(Worker::is_alive)
    }
}

/// Get a status message about evdev availability
pub fn capture_status() -> String {
    match find_keyboard_devices() {
        Ok(devices) => format!("{} keyboard device(s) found", devices.len()),
        Err(HookupError::NoDevices) => "No keyboard devices found".to_string(),
        Err(HookupError::PermissionDenied(_)) => {
            "Permission denied - run with sudo or add user to 'input' group".to_string()
        }
        Err(e) => format!("Error: {}", e),
    }
}
