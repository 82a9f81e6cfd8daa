//! Doorlock HMI node binary.
//!
//! Reads keys from standard input (one or more per line) and renders the
//! display on standard output. Logs go to standard error.
//!
//! # Usage
//!
//! ```bash
//! doorlock-hmi --connect 127.0.0.1:7700
//! ```

use std::time::Duration;

use clap::Parser;
use doorlock_node::{
    HmiNode, HmiNodeConfig, IntervalTicker, SystemEnv,
    peripherals::{ConsoleDisplay, ConsoleKeypad},
};
use tokio::net::TcpStream;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Doorlock HMI node
#[derive(Parser, Debug)]
#[command(name = "doorlock-hmi")]
#[command(about = "Keypad and display front end for the doorlock system")]
#[command(version)]
struct Args {
    /// Address of the Control node
    #[arg(short, long, default_value = "127.0.0.1:7700")]
    connect: String,

    /// How long transient messages stay on screen, in milliseconds
    #[arg(long, default_value = "2000")]
    message_hold_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    tracing::info!("Doorlock HMI node starting");

    let stream = TcpStream::connect(&args.connect).await?;
    stream.set_nodelay(true)?;
    tracing::info!("Connected to {}", args.connect);

    let config = HmiNodeConfig {
        message_hold: Duration::from_millis(args.message_hold_ms),
        ..HmiNodeConfig::default()
    };
    let node = HmiNode::new(config, ConsoleKeypad::new(), ConsoleDisplay, SystemEnv::new());
    node.run(stream, IntervalTicker::seconds()).await?;

    Ok(())
}
