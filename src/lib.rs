//! mock-controller: a stand-in for the ESP32 door controller.
//!
//! Lets the mobile app be exercised without the hardware. The server
//! speaks the controller's TCP protocol on port 4211:
//! - JSON `PUSH_BUTTON` commands
//! - `ARE_YOU_ALIVE` heartbeats
//! - the legacy `COMMAND:` format
//!
//! Every connection carries exactly one request and gets a canned answer.

pub mod client;
pub mod config;
pub mod local_ip;
pub mod logging;
pub mod protocols;
pub mod server;
