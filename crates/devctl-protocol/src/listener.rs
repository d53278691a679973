//! Blocking listener setup for the `std::net` accept loop.
//!
//! `std::net::TcpListener::bind` neither takes a backlog nor sets
//! `SO_REUSEADDR`, so the socket is built with socket2 and converted.

use std::io;
use std::net::{SocketAddr, TcpListener};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Bind `addr` with `SO_REUSEADDR` and listen with `backlog`.
pub fn bind_listener(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;
    Ok(socket.into())
}
