//! Periodic sensor readout on a tokio interval.

use std::time::Duration;

use devctl_core::readout::{self, Refresh};
use devctl_core::{DashboardClient, DisplayDriver, SensorDriver, Shared};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Spawn a task that refreshes the readout every `period`.
///
/// The first refresh happens immediately. The task runs until aborted.
pub fn spawn_poller<S, D>(
    sensor: Shared<S>,
    display: Shared<D>,
    mut dashboard: Option<Box<dyn DashboardClient>>,
    period: Duration,
) -> JoinHandle<()>
where
    S: SensorDriver + ?Sized + 'static,
    D: DisplayDriver + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match readout::refresh(&sensor, &display, dashboard.as_deref_mut()) {
                Ok(Refresh::Shown { reading, dashboard: forwarded }) => {
                    debug!("Readout: {:?}", reading);
                    if let Err(e) = forwarded {
                        warn!("Dashboard update failed: {}", e);
                    }
                }
                Ok(Refresh::SensorUnavailable) => {
                    warn!("Failed to read from DHT sensor");
                }
                Err(e) => {
                    warn!("Readout failed: {}", e);
                }
            }
        }
    })
}
