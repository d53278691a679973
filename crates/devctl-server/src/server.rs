//! Device control TCP server.
//!
//! Connections are served strictly one at a time: accept, one read, one
//! write, close. A slow client therefore delays everyone behind it.

use std::net::SocketAddr;

use devctl_core::{DisplayDriver, LedDriver, SensorDriver, Settings};
use devctl_protocol::{Dispatcher, DEFAULT_READ_LIMIT};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, error, info, warn};

use crate::error::ServerError;

/// Configuration for the device server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Listen backlog.
    pub backlog: u32,
    /// Maximum bytes read from one request.
    pub read_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            backlog: 5,
            read_limit: DEFAULT_READ_LIMIT,
        }
    }
}

impl ServerConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ServerError> {
        Ok(Self {
            bind_addr: settings.socket_addr()?,
            backlog: settings.backlog,
            read_limit: settings.read_limit,
        })
    }
}

/// A bound device server.
pub struct DeviceServer<L: ?Sized, D: ?Sized, S: ?Sized> {
    listener: TcpListener,
    dispatcher: Dispatcher<L, D, S>,
}

impl<L, D, S> DeviceServer<L, D, S>
where
    L: LedDriver + ?Sized,
    D: DisplayDriver + ?Sized,
    S: SensorDriver + ?Sized,
{
    /// Bind the listening socket.
    ///
    /// The dispatcher's read limit is replaced by the one in `config`.
    pub fn bind(config: &ServerConfig, dispatcher: Dispatcher<L, D, S>) -> Result<Self, ServerError> {
        let addr = config.bind_addr;
        let bind_err = |source| ServerError::Bind { addr, source };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let listener = socket.listen(config.backlog).map_err(bind_err)?;

        Ok(Self {
            listener,
            dispatcher: dispatcher.with_read_limit(config.read_limit),
        })
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections until the task is cancelled.
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Device server listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Connection from {}", addr);
                    serve_connection(&self.dispatcher, stream).await;
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Serve one connection: a single bounded read, then one write, then close.
///
/// Errors are logged, never returned.
pub async fn serve_connection<C, L, D, S>(dispatcher: &Dispatcher<L, D, S>, mut conn: C)
where
    C: AsyncRead + AsyncWrite + Unpin,
    L: LedDriver + ?Sized,
    D: DisplayDriver + ?Sized,
    S: SensorDriver + ?Sized,
{
    let mut buf = vec![0u8; dispatcher.read_limit()];
    let n = match conn.read(&mut buf).await {
        Ok(n) => n,
        Err(e) => {
            warn!("Failed to read request: {}", e);
            return;
        }
    };

    match dispatcher.dispatch(&buf[..n]) {
        Some(response) => {
            if let Err(e) = conn.write_all(&response.encode()).await {
                warn!("Failed to write response: {}", e);
                return;
            }
        }
        None => debug!("Peer closed without sending data"),
    }

    if let Err(e) = conn.shutdown().await {
        debug!("Shutdown failed: {}", e);
    }
}
