use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use super::buttons::{ButtonEvent, ButtonState};

/// Turns the stream of button reports into press/release edges
pub struct ButtonWatcher {
    rx: broadcast::Receiver<ButtonState>,
    previous: ButtonState,
}

impl ButtonWatcher {
    /// `previous` is the snapshot edges are measured from; take it after subscribing
    pub fn new(rx: broadcast::Receiver<ButtonState>, previous: ButtonState) -> Self {
        Self { rx, previous }
    }

    /// Wait for the next report and return its edges (possibly none).
    /// Returns `None` once the controller is gone.
    pub async fn next(&mut self) -> Option<Vec<ButtonEvent>> {
        loop {
            match self.rx.recv().await {
                Ok(current) => {
                    let events = current.changes_since(&self.previous);
                    self.previous = current;
                    return Some(events);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} button reports", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
