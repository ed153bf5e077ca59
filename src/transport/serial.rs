use anyhow::Result;
use std::sync::Arc;
use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialPortType};
use tracing::{debug, info, warn};

use super::{ChannelTransport, PacketFramer, Transport};
use crate::device::Controller;

/// Serial port information for the `ports` listing
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Background tasks servicing an open serial link
pub struct SerialLink {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SerialLink {
    /// Stop both tasks
    pub fn close(self) {
        info!("Closing serial link");
        self.reader.abort();
        self.writer.abort();
    }
}

/// List serial ports present on this machine
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                SerialPortType::UsbPort(usb) => format!(
                    "USB {:04x}:{:04x} {}",
                    usb.vid,
                    usb.pid,
                    usb.product.unwrap_or_default()
                ),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::Unknown => "Unknown".to_string(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect())
}

/// Open `port` and wire it to a new controller.
///
/// Outbound bytes go through a `ChannelTransport` of `queue_depth` entries;
/// inbound bytes are framed and fed to `Controller::handle_packet`.
pub fn open(
    port: &str,
    baud: u32,
    queue_depth: usize,
) -> Result<(Arc<Controller<ChannelTransport>>, SerialLink)> {
    info!("Opening {} at {} baud", port, baud);
    let stream = tokio_serial::new(port, baud).open_native_async()?;
    let (rx, tx) = split(stream);

    let (transport, queue) = ChannelTransport::new(queue_depth);
    let controller = Arc::new(Controller::new(transport));

    let writer = tokio::spawn(run_writer(tx, queue));
    let reader = tokio::spawn(run_reader(rx, controller.clone()));

    Ok((controller, SerialLink { reader, writer }))
}

/// Drain queued commands onto the wire
pub async fn run_writer<W>(mut tx: W, mut queue: mpsc::Receiver<Vec<u8>>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = queue.recv().await {
        if let Err(e) = tx.write_all(&bytes).await {
            warn!("Serial write failed: {}", e);
            break;
        }
        if let Err(e) = tx.flush().await {
            warn!("Serial flush failed: {}", e);
            break;
        }
    }
    debug!("Writer stopped");
}

/// Read bytes until EOF, handing each complete packet to the controller
pub async fn run_reader<R, T>(mut rx: R, controller: Arc<Controller<T>>)
where
    R: AsyncRead + Unpin,
    T: Transport,
{
    let mut framer = PacketFramer::new();
    let mut buf = [0u8; 64];
    loop {
        match rx.read(&mut buf).await {
            Ok(0) => {
                info!("Serial link closed");
                break;
            }
            Ok(n) => {
                debug!("RX: {:02x?}", &buf[..n]);
                for [opcode, arg1, arg2] in framer.push(&buf[..n]) {
                    controller.handle_packet(opcode, arg1, arg2);
                }
            }
            Err(e) => {
                warn!("Serial read failed: {}", e);
                break;
            }
        }
    }
}
