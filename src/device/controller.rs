use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::buttons::ButtonState;
use super::command::Command;
use super::leds::{DisplayFrame, LedRequest};
use super::protocol::{Response, BIOC_ON, LED_USR};
use super::ControlError;
use crate::state::SharedState;
use crate::transport::Transport;

/// Drives one controller board: decodes status packets and encodes LED commands.
///
/// All operations return as soon as the bytes are handed to the transport.
/// The board's answer shows up later through `handle_packet`.
pub struct Controller<T: Transport> {
    transport: T,
    state: SharedState,
    /// Held while an LED frame is handed off and recorded, so the stored
    /// frame is always the last one the transport accepted
    send_order: Mutex<()>,
    button_tx: broadcast::Sender<ButtonState>,
}

/// Button reports buffered per subscriber before it starts lagging
const BUTTON_CHANNEL_DEPTH: usize = 64;

impl<T: Transport> Controller<T> {
    pub fn new(transport: T) -> Self {
        let (button_tx, _) = broadcast::channel(BUTTON_CHANNEL_DEPTH);
        Self {
            transport,
            state: SharedState::new(),
            send_order: Mutex::new(()),
            button_tx,
        }
    }

    /// Receive every button snapshot decoded from here on, one per report
    pub fn subscribe_buttons(&self) -> broadcast::Receiver<ButtonState> {
        self.button_tx.subscribe()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one 3-byte status packet from the board
    pub fn handle_packet(&self, opcode: u8, arg1: u8, arg2: u8) {
        match Response::from(opcode) {
            Response::Ack => {
                debug!("ACK");
                self.state.set_link_busy(false);
            }
            Response::ButtonEvent => {
                let buttons = ButtonState::from_packet(arg1, arg2);
                debug!("Buttons: {:?}", buttons.pressed());
                self.state.set_buttons(buttons);
                // No subscribers is fine
                let _ = self.button_tx.send(buttons);
            }
            Response::Reset => {
                info!("Board reset, restoring mode and display");
                self.enable_reporting();
                let _order = self.lock_send_order();
                let frame = self.state.display();
                if self.send(frame.as_ref()).is_err() {
                    self.state.set_link_busy(true);
                }
            }
            Response::Other(opcode) => {
                debug!(
                    "Ignoring packet: {:02x} {:02x} {:02x}",
                    opcode, arg1, arg2
                );
            }
        }
    }

    /// Session setup: turn on button reporting and user LED mode, clear the
    /// busy flag and blank the display.
    pub fn init(&self) {
        info!("Initializing board");
        self.enable_reporting();

        let _order = self.lock_send_order();
        let frame = DisplayFrame::ALL_BLANK;
        self.state.with(|s| {
            s.link_busy = false;
            s.display = frame;
        });

        if self.send(frame.as_ref()).is_err() {
            self.state.set_link_busy(true);
        }
    }

    /// Encode and send an LED request.
    ///
    /// Fails with `LinkBusy` without sending anything while a previous send
    /// is unresolved. A transport rejection is not reported to this caller;
    /// it marks the link busy so later requests are refused, and leaves the
    /// stored display untouched.
    pub fn set_leds(&self, request: LedRequest) -> Result<(), ControlError> {
        let frame = request.encode();

        let _order = self.lock_send_order();
        if self.state.is_link_busy() {
            return Err(ControlError::LinkBusy);
        }
        match self.send(frame.as_ref()) {
            Ok(()) => self.state.set_display(frame),
            Err(_) => self.state.set_link_busy(true),
        }
        Ok(())
    }

    /// Turn on button reporting only, leaving the display and busy flag alone.
    ///
    /// The board reports on change, so buttons already held stay unreported
    /// until they are released or another button changes.
    pub fn enable_button_reports(&self) {
        info!("Enabling button reports");
        let _ = self.send(&[BIOC_ON]);
    }

    /// Current buttons as an active-low mask, `R L D U C B A S` from bit 7 down
    pub fn read_buttons(&self) -> u8 {
        self.state.buttons().to_mask()
    }

    /// Current buttons as a structured snapshot
    pub fn buttons(&self) -> ButtonState {
        self.state.buttons()
    }

    pub fn is_link_busy(&self) -> bool {
        self.state.is_link_busy()
    }

    /// Run a command. `ReadButtons` writes its mask into `out` and fails
    /// with `InvalidArgument` when no slot is given.
    pub fn execute(&self, command: Command, out: Option<&mut u8>) -> Result<(), ControlError> {
        match command {
            Command::Init => {
                self.init();
                Ok(())
            }
            Command::SetLeds(request) => self.set_leds(request),
            Command::ReadButtons => {
                let slot = out.ok_or(ControlError::InvalidArgument)?;
                *slot = self.read_buttons();
                Ok(())
            }
        }
    }

    fn enable_reporting(&self) {
        for opcode in [BIOC_ON, LED_USR] {
            // Mode bytes are re-sent on every reset, so a lost one is not tracked
            let _ = self.send(&[opcode]);
        }
    }

    fn lock_send_order(&self) -> MutexGuard<'_, ()> {
        self.send_order
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, bytes: &[u8]) -> Result<(), ControlError> {
        self.transport.deliver(bytes).map_err(|e| {
            warn!("Transport rejected {:02x?}: {}", bytes, e);
            ControlError::TransportRejected
        })
    }
}
