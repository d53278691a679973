//! Blocking server loop and readout thread.
//!
//! ESP32 has no tokio, so the dispatcher runs on a plain `std::net` listener
//! (built by [`bind_listener`]) and the readout runs on its own thread. Both share the display and sensor
//! through the dispatcher's mutexes.

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use devctl_core::readout::{self, Refresh};
use devctl_core::{DashboardClient, DisplayDriver, LedDriver, SensorDriver, Shared};
use anyhow::Context;
use devctl_protocol::{bind_listener, Dispatcher};
use log::{debug, error, info, warn};

/// Stack for the readout thread. The dashboard's HTTP client needs more
/// than the default.
const POLLER_STACK_SIZE: usize = 8 * 1024;

/// Bind `addr` with `SO_REUSEADDR` and `backlog`, then serve connections one
/// at a time. Only returns on a bind failure.
pub fn serve<L, D, S>(
    addr: SocketAddr,
    backlog: u32,
    dispatcher: &Dispatcher<L, D, S>,
) -> anyhow::Result<()>
where
    L: LedDriver + ?Sized,
    D: DisplayDriver + ?Sized,
    S: SensorDriver + ?Sized,
{
    let listener = bind_listener(addr, backlog).with_context(|| format!("Failed to bind {}", addr))?;
    info!("Device server listening on {} (backlog {})", addr, backlog);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Ok(peer) = stream.peer_addr() {
                    debug!("Connection from {}", peer);
                }
                dispatcher.handle_connection(&stream);
                // Dropping the stream closes it.
            }
            Err(e) => error!("Failed to accept connection: {}", e),
        }
    }

    Ok(())
}

/// Spawn the readout thread.
pub fn spawn_poller<S, D>(
    sensor: Shared<S>,
    display: Shared<D>,
    mut dashboard: Option<Box<dyn DashboardClient>>,
    period: Duration,
) -> std::io::Result<JoinHandle<()>>
where
    S: SensorDriver + ?Sized + 'static,
    D: DisplayDriver + ?Sized + 'static,
{
    thread::Builder::new()
        .name("readout".into())
        .stack_size(POLLER_STACK_SIZE)
        .spawn(move || loop {
            match readout::refresh(&sensor, &display, dashboard.as_deref_mut()) {
                Ok(Refresh::Shown {
                    reading,
                    dashboard: forwarded,
                }) => {
                    info!("Readout: {:?}", reading);
                    if let Err(e) = forwarded {
                        warn!("Dashboard update failed: {}", e);
                    }
                }
                Ok(Refresh::SensorUnavailable) => warn!("Failed to read from DHT sensor"),
                Err(e) => warn!("Readout failed: {}", e),
            }
            thread::sleep(period);
        })
}
