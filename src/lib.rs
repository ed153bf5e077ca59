pub mod config;
pub mod device;
pub mod state;
pub mod transport;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use config::Config;
use device::{ButtonEvent, ButtonState, ButtonWatcher, Controller, LedRequest};
use transport::serial::{self, SerialLink};
use transport::ChannelTransport;

/// Time given to the writer to push queued bytes out at 9600 baud
const DRAIN_DELAY: Duration = Duration::from_millis(100);

/// Main application struct
pub struct App {
    config: Config,
    controller: Arc<Controller<ChannelTransport>>,
    link: SerialLink,
}

impl App {
    /// Open the configured serial port and start the link tasks
    pub fn connect(config: Config) -> Result<Self> {
        let (controller, link) = serial::open(
            &config.serial.port,
            config.serial.baud,
            config.serial.queue_depth,
        )?;
        info!("Connected to board on {}", config.serial.port);

        Ok(Self {
            config,
            controller,
            link,
        })
    }

    pub fn controller(&self) -> &Controller<ChannelTransport> {
        &self.controller
    }

    /// Initialize the board and show the configured startup display, if any
    pub fn init(&self) -> Result<()> {
        self.controller.init();
        if let Some(request) = self.config.display.startup_request() {
            info!("Showing startup display {:08x}", request.to_raw());
            self.set_leds(request)?;
        }
        Ok(())
    }

    /// Send an LED request
    pub fn set_leds(&self, request: LedRequest) -> Result<()> {
        self.controller
            .set_leds(request)
            .map_err(|e| anyhow!("Failed to set LEDs: {}", e))
    }

    /// Latest button snapshot
    pub fn buttons(&self) -> ButtonState {
        self.controller.buttons()
    }

    /// Give queued commands and pending replies time to cross the link
    pub async fn settle(&self) {
        tokio::time::sleep(DRAIN_DELAY).await;
    }

    /// Turn on button reports without touching the display
    pub fn listen(&self) {
        self.controller.enable_button_reports();
    }

    /// Report every button edge until cancelled or the link goes away
    pub async fn watch(&self, mut on_event: impl FnMut(ButtonEvent)) -> Result<()> {
        info!("Watching buttons");
        let mut watcher =
            ButtonWatcher::new(self.controller.subscribe_buttons(), self.controller.buttons());

        while let Some(events) = watcher.next().await {
            events.into_iter().for_each(&mut on_event);
        }
        Ok(())
    }

    /// Gracefully shutdown the application
    pub async fn shutdown(self) {
        info!("Shutting down tuxctl...");
        self.settle().await;
        self.link.close();
        info!("Shutdown complete");
    }
}
