//! TCP connection establishment
//!
//! Literal IP addresses are connected to directly; anything else goes
//! through the system resolver once. Every resolved address is tried in
//! order until one accepts.

use super::config::ProbeConfig;
use super::{Error, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};

/// Resolve `address:port` into socket addresses
///
/// A literal IP (with or without IPv6 brackets) never touches the resolver.
pub fn resolve(address: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    if port == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "port must be in the range 1-65535",
        ));
    }

    let literal = address.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs: Vec<SocketAddr> = (address, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {}", address),
        ));
    }

    Ok(addrs)
}

/// Connect to `address:port` with the configured timeouts applied
pub fn connect(address: &str, port: u16, config: &ProbeConfig) -> Result<TcpStream> {
    let target = format!("{}:{}", address, port);
    let connection_error = |source: io::Error| Error::Connection {
        target: target.clone(),
        source,
    };

    let addrs = resolve(address, port).map_err(connection_error)?;

    let mut last_error = None;
    for addr in addrs {
        match connect_addr(&addr, config) {
            Ok(stream) => {
                tracing::debug!(peer = %addr, "connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(peer = %addr, error = %e, "connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(connection_error(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no addresses to connect to")
    })))
}

fn connect_addr(addr: &SocketAddr, config: &ProbeConfig) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.connect_timeout(&SockAddr::from(*addr), config.connect_timeout)?;
    socket.set_nodelay(true)?;
    socket.set_read_timeout(Some(config.io_timeout))?;
    socket.set_write_timeout(Some(config.io_timeout))?;
    Ok(socket.into())
}
