//! probe: send one request to a controller and print the reply.
//!
//! Works against the real board or the mock server.

use clap::{Parser, Subcommand};
use mock_controller::client::{self, Command, DEFAULT_TIMEOUT, HEARTBEAT};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(version = "0.1.0")]
#[command(about = "Send a single request to a door controller", long_about = None)]
struct Args {
    /// Controller address
    #[arg(short, long, default_value = "127.0.0.1:4211")]
    addr: SocketAddr,

    /// Connect and read timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    request: Request,
}

#[derive(Subcommand, Debug)]
enum Request {
    /// Liveness probe, expects ACK
    Heartbeat,
    /// Open a door
    Push {
        /// Door to open, e.g. apartment or suite
        target: String,
        /// Button hold time in milliseconds
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Pre-JSON command format
    Legacy {
        /// Endpoint named after `COMMAND:`
        endpoint: String,
    },
    /// Arbitrary text, sent as-is
    Raw { text: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    mock_controller::logging::init(&args.log_level);

    let payload = match args.request {
        Request::Heartbeat => HEARTBEAT.to_vec(),
        Request::Push { target, duration } => {
            let command = Command::push_button(&target, duration.map(Duration::from_millis));
            command.to_json()?.into_bytes()
        }
        Request::Legacy { endpoint } => client::legacy(&endpoint),
        Request::Raw { text } => text.into_bytes(),
    };

    let reply = client::send(args.addr, &payload, Duration::from_millis(args.timeout)).await?;
    if reply.is_empty() {
        println!("(no response)");
        return Ok(());
    }

    let text = String::from_utf8_lossy(&reply);
    match client::parse_response(&text) {
        Some(response) if response.success => println!("OK: {}", response.message),
        Some(response) => println!(
            "FAILED: {} ({})",
            response.message,
            response.error.as_deref().unwrap_or("no detail")
        ),
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}
