//! mock-controller: a TCP stand-in for the ESP32 door controller
//!
//! Run it on a development machine and point the app's Controller
//! Address at it. It answers:
//! - `PUSH_BUTTON` JSON commands with a success response
//! - any other JSON command with an "Unknown command" response
//! - `ARE_YOU_ALIVE` heartbeats with `ACK`
//! - legacy `COMMAND:` requests with `OK`
//!
//! Configuration via CLI arguments or TOML file; defaults match the board.

use mock_controller::config::Config;
use mock_controller::server::Server;
use mock_controller::{local_ip, logging};
use tracing::{info, warn};

const RULE_WIDTH: usize = 60;

/// Android emulator alias for the host's loopback interface.
const EMULATOR_HOST: &str = "10.0.2.2";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init(&config.log_level);

    let server = Server::bind(&config)?;

    let local_ip = match local_ip::local_ip().await {
        Ok(ip) => ip.to_string(),
        Err(e) => {
            warn!(error = %e, "Could not resolve local IP");
            "unknown".to_string()
        }
    };

    println!("{}", "=".repeat(RULE_WIDTH));
    println!("Mock ESP32 Server Started");
    println!("{}", "=".repeat(RULE_WIDTH));
    info!("Listening on {}", server.local_addr()?);
    info!("Your computer's IP: {local_ip}");
    println!("\nIn your Android app, set the Controller Address to:");
    println!("  For Android Emulator: {EMULATOR_HOST}");
    println!("  For Real Phone:       {local_ip}");
    println!("\nWaiting for connections...\n");

    server.run().await?;
    Ok(())
}
