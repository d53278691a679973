mod dashboard;

use std::net::SocketAddr;

use anyhow::Context;
use devctl_core::devices::shared;
use devctl_core::sim::{DriftingSensor, MemoryDisplay, MemoryLed};
use devctl_core::config::AccessPointSettings;
use devctl_core::{DashboardClient, DeviceError, NetworkProvisioner, Settings};
use devctl_server::{spawn_poller, DeviceServer, Dispatcher, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Port used when no settings file is given, so the server runs unprivileged.
const HOST_PORT: u16 = 8080;

/// Environment variable naming the settings file.
const CONFIG_ENV: &str = "DEVCTL_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,devctl_server=debug,devctl_protocol=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Device control server starting...");

    let settings = load_settings()?;
    let config = ServerConfig::from_settings(&settings)?;

    let mut network = HostNetwork {
        bind_addr: config.bind_addr,
    };
    let ip = network.ensure_connected()?;
    tracing::info!("Network ready, IP address: {}", ip);
    if let Some(ap) = &settings.access_point {
        start_access_point(&mut network, ap);
    }

    // Simulated peripherals
    let led = shared(MemoryLed::new());
    let display = shared(MemoryDisplay::new());
    let sensor = shared(DriftingSensor::new(24.0, 50.0).with_failures(7));

    let dispatcher = Dispatcher::new(led, display.clone(), sensor.clone());
    let server = DeviceServer::bind(&config, dispatcher)?;
    let addr = server.local_addr()?;

    let server_handle = tokio::spawn(server.run());

    let poller_handle = settings.poll_interval().map(|period| {
        let dashboard = settings.dashboard.clone().map(|dashboard_settings| {
            let (client, _) = dashboard::spawn_forwarder(dashboard_settings);
            Box::new(client) as Box<dyn DashboardClient>
        });
        spawn_poller(sensor.clone(), display.clone(), dashboard, period)
    });

    tracing::info!("Device control server ready!");
    tracing::info!("   Control page: http://{}/", addr);
    tracing::info!("");
    tracing::info!("Try these commands:");
    tracing::info!("   curl 'http://{}/?r=255&g=64&b=0'", addr);
    tracing::info!("   curl 'http://{}/?msg=Hello%20World'", addr);
    tracing::info!("   curl 'http://{}/?hue=170'", addr);
    tracing::info!("   curl http://{}/data", addr);

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        result = server_handle => {
            match result {
                Ok(Err(e)) => tracing::error!("Device server error: {}", e),
                _ => tracing::warn!("Device server stopped"),
            }
        }
    }

    if let Some(handle) = poller_handle {
        handle.abort();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load settings from the file named on the command line or in
/// `DEVCTL_CONFIG`, falling back to defaults on [`HOST_PORT`].
fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());

    match path {
        Some(path) => {
            tracing::info!("Loading settings from {}", path);
            Settings::load(&path).with_context(|| format!("Failed to load settings from {}", path))
        }
        None => {
            tracing::info!("No settings file given, using defaults on port {}", HOST_PORT);
            Ok(Settings {
                port: HOST_PORT,
                ..Settings::default()
            })
        }
    }
}

/// Start the optional access point. Failure is logged and not fatal.
fn start_access_point(network: &mut dyn NetworkProvisioner, ap: &AccessPointSettings) -> Option<String> {
    match network.start_access_point(&ap.ssid, &ap.password) {
        Ok(ip) => {
            tracing::info!("Access point {} started at {}", ap.ssid, ip);
            Some(ip)
        }
        Err(e) => {
            tracing::warn!("Access point {} not started: {}", ap.ssid, e);
            None
        }
    }
}

/// The host is already on a network; there is nothing to bring up.
struct HostNetwork {
    bind_addr: SocketAddr,
}

impl NetworkProvisioner for HostNetwork {
    fn ensure_connected(&mut self) -> Result<String, DeviceError> {
        Ok(self.bind_addr.ip().to_string())
    }

    fn start_access_point(&mut self, _ssid: &str, _password: &str) -> Result<String, DeviceError> {
        Err(DeviceError::Unavailable("access point"))
    }
}
