//! Blynk dashboard forwarding.
//!
//! The readout calls [`DashboardClient::virtual_write`] synchronously from
//! inside the runtime, so writes are queued and a separate task performs the
//! HTTP requests.

use std::time::Duration;

use devctl_core::config::DashboardSettings;
use devctl_core::{DashboardClient, DeviceError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Pending writes beyond this are dropped.
const QUEUE_DEPTH: usize = 16;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Dashboard handle given to the poller.
pub struct QueuedDashboard {
    tx: mpsc::Sender<(u8, f32)>,
}

impl DashboardClient for QueuedDashboard {
    fn virtual_write(&mut self, pin: u8, value: f32) -> Result<(), DeviceError> {
        self.tx.try_send((pin, value)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                DeviceError::Network("dashboard queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                DeviceError::Network("dashboard forwarder stopped".to_string())
            }
        })
    }
}

/// URL of a Blynk virtual pin update.
pub fn update_url(settings: &DashboardSettings, pin: u8, value: f32) -> String {
    format!(
        "http://{}/external/api/update?token={}&V{}={}",
        settings.server, settings.token, pin, value
    )
}

/// Spawn the forwarding task and return the handle that feeds it.
pub fn spawn_forwarder(settings: DashboardSettings) -> (QueuedDashboard, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<(u8, f32)>(QUEUE_DEPTH);

    let handle = tokio::spawn(async move {
        let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build dashboard client: {}", e);
                return;
            }
        };

        while let Some((pin, value)) = rx.recv().await {
            match client.get(update_url(&settings, pin, value)).send().await {
                Ok(res) if res.status().is_success() => {
                    debug!("Dashboard V{} = {}", pin, value);
                }
                Ok(res) => {
                    warn!("Dashboard rejected V{}: {}", pin, res.status());
                }
                Err(e) => {
                    warn!("Dashboard update of V{} failed: {}", pin, e.without_url());
                }
            }
        }
    });

    (QueuedDashboard { tx }, handle)
}
