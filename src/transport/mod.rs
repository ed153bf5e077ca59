mod framer;
pub mod serial;

pub use framer::PacketFramer;

use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transmit queue full")]
    QueueFull,

    #[error("Transport closed")]
    Closed,
}

/// Outbound byte sink. `deliver` must hand the bytes off without waiting
/// for them to reach the wire, let alone for the board to answer.
pub trait Transport: Send + Sync {
    fn deliver(&self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn deliver(&self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).deliver(bytes)
    }
}

/// Transport backed by a bounded queue drained by a writer task
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    /// Create the transport and the receiving end the writer task drains
    pub fn new(depth: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn deliver(&self, bytes: &[u8]) -> Result<(), TransportError> {
        debug!("TX: {:02x?}", bytes);
        self.tx.try_send(bytes.to_vec()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_transport_queues_bytes() {
        let (transport, mut rx) = ChannelTransport::new(4);
        transport.deliver(&[0xC2]).unwrap();
        transport.deliver(&[0xC5, 0x0F, 0, 0, 0, 0]).unwrap();

        assert_eq!(rx.recv().await, Some(vec![0xC2]));
        assert_eq!(rx.recv().await, Some(vec![0xC5, 0x0F, 0, 0, 0, 0]));
    }

    #[test]
    fn test_channel_transport_full() {
        let (transport, _rx) = ChannelTransport::new(1);
        transport.deliver(&[0xC2]).unwrap();
        assert!(matches!(
            transport.deliver(&[0xC7]),
            Err(TransportError::QueueFull)
        ));
    }

    #[test]
    fn test_channel_transport_closed() {
        let (transport, rx) = ChannelTransport::new(1);
        drop(rx);
        assert!(matches!(
            transport.deliver(&[0xC2]),
            Err(TransportError::Closed)
        ));
    }
}
