use serde::{Deserialize, Serialize};

/// Button labels, indexed by bit position in the packed mask
pub const BUTTON_LABELS: [&str; 8] = [
    "START", // 0 - arg1 bit 0
    "A",     // 1
    "B",     // 2
    "C",     // 3
    "UP",    // 4 - arg2 bit 0
    "DOWN",  // 5 - arg2 bit 2
    "LEFT",  // 6 - arg2 bit 1
    "RIGHT", // 7 - arg2 bit 3
];

/// Point-in-time snapshot of all eight buttons (true = pressed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub start: bool,
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Edge between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "button", rename_all = "snake_case")]
pub enum ButtonEvent {
    Pressed(&'static str),
    Released(&'static str),
}

impl ButtonState {
    /// Decode the two argument bytes of a button event packet.
    ///
    /// `arg1` bits 0-3 are S A B C and `arg2` bits 0-3 are U L D R.
    /// The high bits of both bytes are framing and ignored.
    pub fn from_packet(arg1: u8, arg2: u8) -> Self {
        Self {
            start: arg1 & 0x01 != 0,
            a: arg1 & 0x02 != 0,
            b: arg1 & 0x04 != 0,
            c: arg1 & 0x08 != 0,
            up: arg2 & 0x01 != 0,
            left: arg2 & 0x02 != 0,
            down: arg2 & 0x04 != 0,
            right: arg2 & 0x08 != 0,
        }
    }

    /// Flags in mask bit order (see `BUTTON_LABELS`)
    fn flags(&self) -> [bool; 8] {
        [
            self.start, self.a, self.b, self.c, self.up, self.down, self.left, self.right,
        ]
    }

    /// Active-high mask: bit set = pressed. Layout `R L D U C B A S`.
    pub fn pressed_mask(&self) -> u8 {
        self.flags()
            .iter()
            .enumerate()
            .fold(0u8, |mask, (bit, &pressed)| mask | ((pressed as u8) << bit))
    }

    /// Active-low mask returned by the button query: bit set = released.
    pub fn to_mask(&self) -> u8 {
        !self.pressed_mask()
    }

    /// Labels of the buttons currently held
    pub fn pressed(&self) -> Vec<&'static str> {
        self.flags()
            .iter()
            .zip(BUTTON_LABELS)
            .filter(|&(&pressed, _)| pressed)
            .map(|(_, label)| label)
            .collect()
    }

    /// Press/release edges going from `previous` to `self`, in label order
    pub fn changes_since(&self, previous: &ButtonState) -> Vec<ButtonEvent> {
        self.flags()
            .iter()
            .zip(previous.flags())
            .zip(BUTTON_LABELS)
            .filter_map(|((&now, was), label)| match (was, now) {
                (false, true) => Some(ButtonEvent::Pressed(label)),
                (true, false) => Some(ButtonEvent::Released(label)),
                _ => None,
            })
            .collect()
    }
}
