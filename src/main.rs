use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tuxctl::{config::Config, device::LedRequest, transport::serial, App};

#[derive(Parser, Debug)]
#[command(name = "tuxctl")]
#[command(about = "Drive the serial button/LED controller board")]
#[command(version)]
struct Cli {
    /// Serial port (overrides config)
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate (overrides config)
    #[arg(long, global = true)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Enable button reporting and blank the display
    Init,

    /// Set the LED digits
    Leds {
        /// Packed request word: decimal mask << 24 | enable mask << 16 | four hex nibbles
        #[arg(value_parser = parse_hex, conflicts_with = "hex")]
        raw: Option<u32>,

        /// Up to four hex digits, leftmost first
        #[arg(long, value_parser = parse_hex)]
        hex: Option<u32>,

        /// Digit enable mask (bit 0 = rightmost digit)
        #[arg(long, value_parser = parse_hex, default_value = "F")]
        enable: u32,

        /// Decimal point mask (bit 0 = rightmost digit)
        #[arg(long, value_parser = parse_hex, default_value = "0")]
        decimal: u32,
    },

    /// Print the active-low button mask.
    ///
    /// Leaves the display as it is. The board reports buttons on change, so
    /// a button held since before this command started reads as released.
    Buttons {
        /// How long to wait for a button report
        #[arg(long, value_name = "MS", default_value_t = 200)]
        wait_ms: u64,
    },

    /// Print button presses and releases until interrupted.
    ///
    /// Leaves the display as it is. Buttons already held when watching
    /// starts are reported only when released.
    Watch {
        /// Emit one JSON object per event
        #[arg(long)]
        json: bool,
    },

    /// List serial ports
    Ports,
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    if let Some(baud) = cli.baud {
        config.serial.baud = baud;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Cmd::Ports = cli.command {
        return list_ports();
    }

    info!("Starting tuxctl");
    let app = App::connect(config)?;

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    let result = tokio::select! {
        result = run(&app, cli.command) => {
            result
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            Ok(())
        }
    };

    // Always run shutdown
    app.shutdown().await;
    result
}

async fn run(app: &App, command: Cmd) -> Result<()> {
    match command {
        Cmd::Init => app.init(),
        Cmd::Leds {
            raw,
            hex,
            enable,
            decimal,
        } => {
            let request = match (raw, hex) {
                (Some(raw), _) => LedRequest::from_raw(raw),
                (None, Some(hex)) => {
                    if hex > 0xFFFF {
                        return Err(anyhow!("--hex takes at most four digits"));
                    }
                    LedRequest::from_raw(hex | (enable & 0xF) << 16 | (decimal & 0xF) << 24)
                }
                (None, None) => return Err(anyhow!("Give a packed request or --hex")),
            };
            app.init()?;
            app.set_leds(request)?;
            println!("✓ LEDs set to {:08x}", request.to_raw());
            Ok(())
        }
        Cmd::Buttons { wait_ms } => {
            app.listen();
            tokio::time::sleep(std::time::Duration::from_millis(wait_ms)).await;
            let buttons = app.buttons();
            println!("{:08b}", buttons.to_mask());
            if !buttons.pressed().is_empty() {
                println!("pressed: {}", buttons.pressed().join(" "));
            }
            Ok(())
        }
        Cmd::Watch { json } => {
            app.listen();
            app.watch(|event| {
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => eprintln!("Failed to encode event: {}", e),
                    }
                } else {
                    println!("{:?}", event);
                }
            })
            .await
        }
        Cmd::Ports => list_ports(),
    }
}

fn list_ports() -> Result<()> {
    let ports = serial::list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}  {}", port.name, port.description);
    }
    Ok(())
}
