use super::leds::LedRequest;
use super::ControlError;

/// Legacy command numbers
pub const CMD_SET_LED: u8 = 0x10;
pub const CMD_READ_LED: u8 = 0x11;
pub const CMD_BUTTONS: u8 = 0x12;
pub const CMD_INIT: u8 = 0x13;
pub const CMD_LED_REQUEST: u8 = 0x14;
pub const CMD_LED_ACK: u8 = 0x15;

/// Operations a caller can ask of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    SetLeds(LedRequest),
    ReadButtons,
}

impl Command {
    /// Map a legacy command number and its argument word.
    ///
    /// `CMD_READ_LED`, `CMD_LED_REQUEST` and `CMD_LED_ACK` were reserved but
    /// never implemented by the board driver, so they are rejected like any
    /// unknown number.
    pub fn from_code(code: u8, arg: u32) -> Result<Self, ControlError> {
        match code {
            CMD_SET_LED => Ok(Command::SetLeds(LedRequest::from_raw(arg))),
            CMD_BUTTONS => Ok(Command::ReadButtons),
            CMD_INIT => Ok(Command::Init),
            _ => Err(ControlError::InvalidArgument),
        }
    }
}
