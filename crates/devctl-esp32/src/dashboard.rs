//! Blynk dashboard over the ESP-IDF HTTP client.

use core::time::Duration;

use devctl_core::config::DashboardSettings;
use devctl_core::{DashboardClient, DeviceError};
use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};
use log::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes virtual pins through Blynk's HTTP API, one request per write.
pub struct BlynkDashboard {
    settings: DashboardSettings,
}

impl BlynkDashboard {
    pub fn new(settings: DashboardSettings) -> Self {
        Self { settings }
    }

    fn update_url(&self, pin: u8, value: f32) -> String {
        format!(
            "http://{}/external/api/update?token={}&V{}={}",
            self.settings.server, self.settings.token, pin, value
        )
    }
}

impl DashboardClient for BlynkDashboard {
    fn virtual_write(&mut self, pin: u8, value: f32) -> Result<(), DeviceError> {
        let config = HttpClientConfiguration {
            timeout: Some(REQUEST_TIMEOUT),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&config).map_err(network_err)?;
        let mut client = Client::wrap(connection);

        let request = client
            .request(Method::Get, &self.update_url(pin, value), &[])
            .map_err(network_err)?;
        let response = request.submit().map_err(network_err)?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(DeviceError::Network(format!(
                "dashboard rejected V{} with HTTP {}",
                pin, status
            )));
        }

        debug!("Dashboard V{} = {}", pin, value);
        Ok(())
    }
}

fn network_err<E: core::fmt::Debug>(e: E) -> DeviceError {
    DeviceError::Network(format!("{:?}", e))
}
