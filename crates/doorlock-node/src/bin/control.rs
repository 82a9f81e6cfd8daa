//! Doorlock Control node binary.
//!
//! # Usage
//!
//! ```bash
//! doorlock-control --listen 127.0.0.1:7700 --eeprom /var/lib/doorlock/eeprom.bin
//! ```

use clap::Parser;
use doorlock_node::{
    ControlNode, ControlNodeConfig, FileEeprom, IntervalTicker, SystemEnv,
    peripherals::{LoggedActuator, LoggedAlarm},
};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Doorlock Control node
#[derive(Parser, Debug)]
#[command(name = "doorlock-control")]
#[command(about = "Door actuator, alarm and credential store for the doorlock system")]
#[command(version)]
struct Args {
    /// Address to accept the HMI link on
    #[arg(short, long, default_value = "127.0.0.1:7700")]
    listen: String,

    /// Path to the EEPROM image (created erased if missing)
    #[arg(short, long, default_value = "doorlock-eeprom.bin")]
    eeprom: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Doorlock control node starting");

    let eeprom = FileEeprom::open(&args.eeprom)?;
    let listener = TcpListener::bind(&args.listen).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let (stream, peer) = listener.accept().await?;
    stream.set_nodelay(true)?;
    tracing::info!("HMI connected from {peer}");

    let node = ControlNode::new(
        ControlNodeConfig::default(),
        eeprom,
        LoggedActuator,
        LoggedAlarm,
        SystemEnv::new(),
    );
    node.run(stream, IntervalTicker::seconds()).await?;

    Ok(())
}
