use std::sync::{Mutex, MutexGuard};

use crate::device::{ButtonState, DisplayFrame};

/// Board state shared between the packet reader and command callers
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Latest button snapshot from a button event packet
    pub buttons: ButtonState,
    /// Set when an LED send was rejected; cleared by an acknowledgement
    pub link_busy: bool,
    /// Last LED frame the transport accepted, replayed after a board reset
    pub display: DisplayFrame,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `DeviceState` behind a single short-held lock.
///
/// Every accessor copies in or out and releases the lock before returning,
/// so no caller ever holds it across a transport call.
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<DeviceState>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        // Every critical section writes whole values, so a poisoned state is still consistent
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the state
    pub fn with<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn buttons(&self) -> ButtonState {
        self.lock().buttons
    }

    pub fn set_buttons(&self, buttons: ButtonState) {
        self.lock().buttons = buttons;
    }

    pub fn is_link_busy(&self) -> bool {
        self.lock().link_busy
    }

    pub fn set_link_busy(&self, busy: bool) {
        self.lock().link_busy = busy;
    }

    pub fn display(&self) -> DisplayFrame {
        self.lock().display
    }

    pub fn set_display(&self, frame: DisplayFrame) {
        self.lock().display = frame;
    }

    pub fn snapshot(&self) -> DeviceState {
        self.lock().clone()
    }
}
