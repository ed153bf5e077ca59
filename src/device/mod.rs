mod buttons;
pub mod command;
mod controller;
mod leds;
pub mod protocol;
mod watcher;

pub use buttons::*;
pub use command::Command;
pub use controller::Controller;
pub use leds::{DisplayFrame, LedRequest};
pub use watcher::ButtonWatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("Link busy: previous LED command unacknowledged")]
    LinkBusy,

    #[error("Invalid argument")]
    InvalidArgument,

    #[error("Transport rejected command")]
    TransportRejected,
}
