//! Host address lookup for the startup banner.

use std::io;
use std::net::IpAddr;

/// Name of this host.
pub fn hostname() -> io::Result<String> {
    Ok(hostname::get()?.to_string_lossy().into_owned())
}

/// First IPv4 address the host name resolves to.
///
/// This is the address a phone on the same network should dial.
pub async fn local_ip() -> io::Result<IpAddr> {
    let host = hostname()?;
    let ip = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .map(|addr| addr.ip())
        .find(IpAddr::is_ipv4);

    ip.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no IPv4 address for host '{host}'"),
        )
    })
}
