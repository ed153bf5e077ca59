//! Controller board wire constants
//!
//! Host → board commands:
//!   - `0xC0 | n` opcodes, single byte for mode changes
//!   - LED set: `[LED_SET, LED_ENABLE_ALL, d0, d1, d2, d3]`
//!
//! Board → host responses (always 3 bytes):
//!   - `[opcode, arg1, arg2]`, opcode has bits 7 and 3 clear, args have bit 7 set
//!   - Button event: arg1 low nibble = C B A S, arg2 low nibble = R D L U

/// Enable asynchronous button event reporting
pub const BIOC_ON: u8 = 0xC2;

/// Set LED display contents (6-byte command)
pub const LED_SET: u8 = 0xC5;

/// Put the LEDs under user control (as opposed to clock mode)
pub const LED_USR: u8 = 0xC7;

/// Response: previous command acknowledged
pub const ACK: u8 = 0x40;

/// Response: button state report
pub const BIOC_EVENT: u8 = 0x41;

/// Response: board was reset
pub const RESET: u8 = 0x46;

/// Status packet length
pub const PACKET_LEN: usize = 3;

/// LED set command length
pub const FRAME_LEN: usize = 6;

/// Number of seven-segment digits
pub const DIGIT_COUNT: usize = 4;

/// Second byte of an LED set command: all four digits addressed
pub const LED_ENABLE_ALL: u8 = 0x0F;

/// Payload byte for a dark digit
pub const BLANK: u8 = 0x00;

/// Decimal point segment bit
pub const DECIMAL_POINT: u8 = 0x10;

/// Default serial line speed
pub const BAUD_RATE: u32 = 9600;

/// Seven-segment patterns for hex digits 0-F
pub const SEGMENTS: [u8; 16] = [
    0xE7, 0x06, 0xCB, 0x8F, // 0 1 2 3
    0x2E, 0xAD, 0xED, 0x86, // 4 5 6 7
    0xEF, 0xAF, 0xEE, 0x6D, // 8 9 A b
    0xE1, 0x4F, 0xE9, 0xE8, // C d E F
];

/// Decoded response opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ack,
    ButtonEvent,
    Reset,
    Other(u8),
}

impl From<u8> for Response {
    fn from(opcode: u8) -> Self {
        match opcode {
            ACK => Response::Ack,
            BIOC_EVENT => Response::ButtonEvent,
            RESET => Response::Reset,
            other => Response::Other(other),
        }
    }
}

/// Look up the segment pattern for the low nibble of `value`
#[inline]
pub fn segments_for(value: u8) -> u8 {
    SEGMENTS[(value & 0x0F) as usize]
}

/// True if the three bytes look like the start of a status packet
#[inline]
pub fn is_packet_aligned(bytes: &[u8]) -> bool {
    bytes.len() >= PACKET_LEN
        && bytes[0] & 0x88 == 0
        && bytes[1] & 0x80 != 0
        && bytes[2] & 0x80 != 0
}
