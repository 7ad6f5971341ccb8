//! Protocol implementations.
//!
//! - `door`: the controller's request/response protocol, one request per
//!   connection

pub mod door;
