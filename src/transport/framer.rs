use tracing::debug;

use crate::device::protocol::{is_packet_aligned, PACKET_LEN};

/// Splits the inbound byte stream into 3-byte status packets.
///
/// Bytes that cannot start a packet are dropped one at a time until the
/// window lines up again.
#[derive(Debug, Default)]
pub struct PacketFramer {
    buf: Vec<u8>,
}

impl PacketFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes and return every complete packet, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<[u8; PACKET_LEN]> {
        self.buf.extend_from_slice(bytes);

        let mut packets = Vec::new();
        let mut start = 0;
        while self.buf.len() - start >= PACKET_LEN {
            let window = &self.buf[start..start + PACKET_LEN];
            if is_packet_aligned(window) {
                packets.push([window[0], window[1], window[2]]);
                start += PACKET_LEN;
            } else {
                debug!("Dropping unaligned byte 0x{:02x}", window[0]);
                start += 1;
            }
        }
        self.buf.drain(..start);
        packets
    }

    /// Bytes held back waiting for the rest of a packet
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
