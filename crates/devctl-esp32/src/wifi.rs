//! WiFi bring-up for ESP32.
//!
//! The station joins the configured network first. The access point is then
//! started next to it (mixed mode), so the control page is reachable both
//! from the home network and directly at the AP address.

use devctl_core::config::WifiSettings;
use devctl_core::{DeviceError, NetworkProvisioner};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, peripheral},
    nvs::EspDefaultNvsPartition,
    sys::EspError,
    wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
        EspWifi,
    },
};
use log::info;

/// ESP-IDF WiFi driver behind [`NetworkProvisioner`].
///
/// Must be kept alive for the connection to remain active.
pub struct EspNetwork {
    wifi: BlockingWifi<EspWifi<'static>>,
    station: WifiSettings,
    client: Option<ClientConfiguration>,
}

impl EspNetwork {
    pub fn new(
        modem: impl peripheral::Peripheral<P = Modem> + 'static,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        station: &WifiSettings,
    ) -> Result<Self, DeviceError> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs).map_err(network_err)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(network_err)?;

        Ok(Self {
            wifi,
            station: station.clone(),
            client: None,
        })
    }

    fn client_configuration(&mut self) -> Result<ClientConfiguration, DeviceError> {
        let ssid = self.station.ssid.as_str();
        let password = self.station.password.as_str();

        let auth_method = if password.is_empty() {
            info!("WiFi password is empty, using open network");
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        // Initial configuration for scanning
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(network_err)?;
        self.wifi.start().map_err(network_err)?;

        info!("Scanning for WiFi networks...");
        let channel = self
            .wifi
            .scan()
            .map_err(network_err)?
            .into_iter()
            .find(|ap| ap.ssid == ssid)
            .map(|ap| {
                info!("Found '{}' on channel {}", ssid, ap.channel);
                ap.channel
            });

        if channel.is_none() {
            info!("Network '{}' not found in scan, will try anyway", ssid);
        }

        Ok(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| DeviceError::Network("SSID too long (max 32 chars)".into()))?,
            password: password
                .try_into()
                .map_err(|_| DeviceError::Network("password too long (max 64 chars)".into()))?,
            channel,
            auth_method,
            ..Default::default()
        })
    }
}

impl NetworkProvisioner for EspNetwork {
    /// Join the network, blocking until a DHCP lease is obtained.
    fn ensure_connected(&mut self) -> Result<String, DeviceError> {
        if self.station.ssid.is_empty() {
            return Err(DeviceError::Network("WiFi SSID cannot be empty".into()));
        }

        if !self.wifi.is_connected().map_err(network_err)? {
            let client = self.client_configuration()?;
            self.wifi
                .set_configuration(&Configuration::Client(client.clone()))
                .map_err(network_err)?;

            info!("Connecting to '{}'...", self.station.ssid);
            self.wifi.connect().map_err(network_err)?;

            info!("Waiting for DHCP lease...");
            self.wifi.wait_netif_up().map_err(network_err)?;
            self.client = Some(client);
        }

        let ip_info = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(network_err)?;
        info!("WiFi connected!");
        info!("  IP address: {}", ip_info.ip);
        info!("  Gateway:    {}", ip_info.subnet.gateway);
        info!("  Netmask:    {}", ip_info.subnet.mask);

        Ok(ip_info.ip.to_string())
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<String, DeviceError> {
        let ap = AccessPointConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| DeviceError::Network("AP SSID too long".into()))?,
            password: password
                .try_into()
                .map_err(|_| DeviceError::Network("AP password too long".into()))?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };

        let configuration = match &self.client {
            Some(client) => Configuration::Mixed(client.clone(), ap),
            None => Configuration::AccessPoint(ap),
        };
        self.wifi
            .set_configuration(&configuration)
            .map_err(network_err)?;
        if !self.wifi.is_started().map_err(network_err)? {
            self.wifi.start().map_err(network_err)?;
        }

        let ip_info = self
            .wifi
            .wifi()
            .ap_netif()
            .get_ip_info()
            .map_err(network_err)?;
        info!("Access point '{}' up at {}", ssid, ip_info.ip);

        Ok(ip_info.ip.to_string())
    }
}

fn network_err(e: EspError) -> DeviceError {
    DeviceError::Network(e.to_string())
}
