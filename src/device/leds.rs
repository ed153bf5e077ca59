use super::protocol::{
    segments_for, BLANK, DECIMAL_POINT, DIGIT_COUNT, FRAME_LEN, LED_ENABLE_ALL, LED_SET,
};

/// A request to show up to four hex digits.
///
/// Raw 32-bit layout:
///   - bits 0-15:  one hex nibble per digit, digit 0 in the lowest nibble
///   - bits 16-19: digit enable mask
///   - bits 24-27: decimal point mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedRequest {
    pub enable: u8,
    pub decimal: u8,
    pub digits: [u8; DIGIT_COUNT],
}

impl LedRequest {
    pub fn new(enable: u8, decimal: u8, digits: [u8; DIGIT_COUNT]) -> Self {
        Self {
            enable: enable & 0x0F,
            decimal: decimal & 0x0F,
            digits: digits.map(|d| d & 0x0F),
        }
    }

    /// Unpack the packed request word. Bits outside the documented fields are ignored.
    pub fn from_raw(raw: u32) -> Self {
        let mut digits = [0u8; DIGIT_COUNT];
        for (i, digit) in digits.iter_mut().enumerate() {
            *digit = ((raw >> (4 * i)) & 0x0F) as u8;
        }
        Self {
            enable: ((raw >> 16) & 0x0F) as u8,
            decimal: ((raw >> 24) & 0x0F) as u8,
            digits,
        }
    }

    /// Inverse of `from_raw`
    pub fn to_raw(&self) -> u32 {
        let hex = self
            .digits
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &d)| acc | (((d & 0x0F) as u32) << (4 * i)));
        hex | (((self.enable & 0x0F) as u32) << 16) | (((self.decimal & 0x0F) as u32) << 24)
    }

    /// Show a 16-bit value on all four digits, no decimal points
    pub fn from_value(value: u16) -> Self {
        Self::from_raw(0x000F_0000 | value as u32)
    }

    /// Payload byte for digit `index` (0 = rightmost); blank past the last digit
    pub fn digit_byte(&self, index: usize) -> u8 {
        if index >= DIGIT_COUNT || self.enable >> index & 1 == 0 {
            return BLANK;
        }
        let segments = segments_for(self.digits[index]);
        if self.decimal >> index & 1 == 1 {
            segments | DECIMAL_POINT
        } else {
            segments
        }
    }

    /// Encode into the 6-byte LED set command
    pub fn encode(&self) -> DisplayFrame {
        let mut bytes = [BLANK; FRAME_LEN];
        bytes[0] = LED_SET;
        bytes[1] = LED_ENABLE_ALL;
        for index in 0..DIGIT_COUNT {
            bytes[2 + index] = self.digit_byte(index);
        }
        DisplayFrame(bytes)
    }
}

/// The exact bytes of an LED set command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFrame([u8; FRAME_LEN]);

impl DisplayFrame {
    /// All digits enabled and dark
    pub const ALL_BLANK: DisplayFrame =
        DisplayFrame([LED_SET, LED_ENABLE_ALL, BLANK, BLANK, BLANK, BLANK]);

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Per-digit payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.0[2..]
    }
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self::ALL_BLANK
    }
}

impl AsRef<[u8]> for DisplayFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
