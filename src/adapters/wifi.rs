//! Wi-Fi adapter: station connect and the SoftAP setup portal.
//!
//! Implements [`ProvisioningPort`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF Wi-Fi driver via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Setup portal
//!
//! The portal switches the radio to an open access point named
//! `FlipClockSetup` (gateway `192.168.4.1`) and serves the settings form
//! with extra Wi-Fi fields.  It returns the first submitted record that
//! carries an SSID, or gives up after [`PORTAL_TIMEOUT_MS`].

use core::net::Ipv4Addr;

use log::{debug, error, info, warn};

use crate::app::commands::ServerRequest;
use crate::app::ports::{NetworkInfo, ProvisioningError, ProvisioningPort};
use crate::config::ClockConfig;
use crate::weather::bounded;

use super::config_server::ServerShared;

pub const PORTAL_SSID: &str = "FlipClockSetup";
pub const PORTAL_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
/// The portal restarts the device after this long without settings.
pub const PORTAL_TIMEOUT_MS: u64 = 180_000;

const CONNECT_ATTEMPTS: u32 = 5;
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const CONNECT_RETRY_DELAY_MS: u64 = 1000;
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const PORTAL_POLL_MS: u64 = 100;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ProvisioningError> {
    if ssid.is_empty() {
        return Err(ProvisioningError::NoCredentials);
    }
    if ssid.len() > 32 || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(ProvisioningError::ConnectFailed);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ProvisioningError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ProvisioningError::ConnectFailed);
    }
    Ok(())
}

/// Station connect with up to [`CONNECT_ATTEMPTS`] tries.
///
/// `pause` runs after each failed try; `feed` runs before every try and
/// after every pause, keeping the task watchdog fed across the whole
/// sequence.  Returns the attempt that succeeded.
pub fn connect_with_retries<E: core::fmt::Display>(
    mut try_once: impl FnMut() -> Result<(), E>,
    mut pause: impl FnMut(),
    mut feed: impl FnMut(),
) -> Result<u32, ProvisioningError> {
    for attempt in 1..=CONNECT_ATTEMPTS {
        feed();
        match try_once() {
            Ok(()) => return Ok(attempt),
            Err(e) => {
                warn!("WiFi: attempt {}/{} failed: {}", attempt, CONNECT_ATTEMPTS, e);
                pause();
                feed();
            }
        }
    }
    Err(ProvisioningError::ConnectFailed)
}

/// Drain portal requests until one delivers usable settings.
///
/// `now_ms` is the monotonic clock; `idle` runs between empty polls
/// (sleep and watchdog feed on the device).
pub fn wait_for_portal_settings(
    shared: &ServerShared,
    timeout_ms: u64,
    mut now_ms: impl FnMut() -> u64,
    mut idle: impl FnMut(),
) -> Result<ClockConfig, ProvisioningError> {
    let start = now_ms();
    loop {
        while let Some(request) = shared.take() {
            match request {
                ServerRequest::SaveSettings(cfg) if cfg.has_wifi_credentials() => {
                    info!("Portal: settings received for '{}'", cfg.wifi_ssid);
                    return Ok(cfg);
                }
                ServerRequest::SaveSettings(_) => warn!("Portal: form submitted without SSID"),
                other => debug!("Portal: ignoring {}", other.kind()),
            }
        }
        if now_ms().saturating_sub(start) >= timeout_ms {
            warn!("Portal: no settings after {} s", timeout_ms / 1000);
            return Err(ProvisioningError::PortalTimeout);
        }
        idle();
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    shared: &'static ServerShared,
    ssid: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

/// Host-side stand-in for the radio.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimRadio {
    /// Number of connect attempts that fail before one succeeds.
    pub failures_before_connect: u32,
    pub connected: bool,
    pub attempts: u32,
    /// Simulated clock advanced by the portal loop.
    pub portal_clock_ms: u64,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        shared: &'static ServerShared,
    ) -> anyhow::Result<Self> {
        use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
        info!("WifiAdapter: driver ready");
        Ok(Self {
            shared,
            ssid: heapless::String::new(),
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(shared: &'static ServerShared) -> Self {
        Self {
            shared,
            ssid: heapless::String::new(),
            sim: SimRadio::default(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_mut(&mut self) -> &mut SimRadio {
        &mut self.sim
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, ssid: &str, password: &str) -> Result<(), ProvisioningError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: bounded(ssid),
                password: bounded(password),
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| ProvisioningError::Driver)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| ProvisioningError::Driver)?;
        }

        let wifi = &mut self.wifi;
        let attempt = connect_with_retries(
            || {
                let result = wifi.connect().and_then(|()| wifi.wait_netif_up());
                if result.is_err() {
                    let _ = wifi.disconnect();
                }
                result
            },
            || std::thread::sleep(std::time::Duration::from_millis(CONNECT_RETRY_DELAY_MS)),
            crate::drivers::watchdog::feed_current_task,
        )?;
        info!("WiFi: connected to '{}' (attempt {})", ssid, attempt);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, ssid: &str, _password: &str) -> Result<(), ProvisioningError> {
        let sim = &mut self.sim;
        let attempt = connect_with_retries(
            || {
                sim.attempts += 1;
                if sim.attempts > sim.failures_before_connect {
                    Ok(())
                } else {
                    Err("no answer")
                }
            },
            || {},
            crate::drivers::watchdog::feed_current_task,
        )?;
        sim.connected = true;
        info!("WiFi(sim): connected to '{}' (attempt {})", ssid, attempt);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_ap(&mut self) -> Result<(), ProvisioningError> {
        use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, Configuration};

        let _ = self.wifi.stop();
        self.wifi
            .set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
                ssid: bounded(PORTAL_SSID),
                auth_method: AuthMethod::None,
                channel: 1,
                ..Default::default()
            }))
            .map_err(|_| ProvisioningError::Driver)?;
        self.wifi.start().map_err(|_| ProvisioningError::Driver)?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| ProvisioningError::Driver)?;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_wait_for_settings(
        &mut self,
        current: &ClockConfig,
    ) -> Result<ClockConfig, ProvisioningError> {
        use super::config_server::{ConfigServer, FormMode};

        let mut server = ConfigServer::new(self.shared);
        server
            .start(current, PORTAL_SSID, FormMode::Portal)
            .map_err(|e| {
                error!("Portal: HTTP server failed: {}", e);
                ProvisioningError::Driver
            })?;

        let clock = super::time::SystemClock::default();
        let result = wait_for_portal_settings(
            self.shared,
            PORTAL_TIMEOUT_MS,
            || clock.uptime_ms(),
            || {
                crate::drivers::watchdog::feed_current_task();
                std::thread::sleep(std::time::Duration::from_millis(PORTAL_POLL_MS));
            },
        );
        server.stop();
        result
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_ap(&mut self) -> Result<(), ProvisioningError> {
        self.sim.connected = false;
        info!("WiFi(sim): access point '{}' up", PORTAL_SSID);
        Ok(())
    }

    /// Form submissions are planted on the shared queue by tests.
    #[cfg(not(target_os = "espidf"))]
    fn platform_wait_for_settings(
        &mut self,
        _current: &ClockConfig,
    ) -> Result<ClockConfig, ProvisioningError> {
        let sim = &mut self.sim;
        let clock = core::cell::Cell::new(sim.portal_clock_ms);
        let result = wait_for_portal_settings(
            self.shared,
            PORTAL_TIMEOUT_MS,
            || clock.get(),
            || clock.set(clock.get() + 1000),
        );
        sim.portal_clock_ms = clock.get();
        result
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        self.sim.connected.then_some(Ipv4Addr::new(192, 168, 1, 50))
    }
}

// ───────────────────────────────────────────────────────────────
// ProvisioningPort
// ───────────────────────────────────────────────────────────────

impl ProvisioningPort for WifiAdapter {
    fn connect(&mut self, config: &ClockConfig) -> Result<(), ProvisioningError> {
        validate_ssid(&config.wifi_ssid)?;
        validate_password(&config.wifi_password)?;

        info!("WiFi: connecting to '{}'", config.wifi_ssid);
        match self.platform_connect(&config.wifi_ssid, &config.wifi_password) {
            Ok(()) => {
                self.ssid = bounded(&config.wifi_ssid);
                info!("WiFi: connected, IP {:?}", self.platform_ip());
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                Err(e)
            }
        }
    }

    fn start_provisioning_portal(
        &mut self,
        config: &ClockConfig,
    ) -> Result<ClockConfig, ProvisioningError> {
        info!("WiFi: starting setup portal '{}' at {}", PORTAL_SSID, PORTAL_IP);
        self.platform_start_ap()?;
        self.platform_wait_for_settings(config)
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn network_info(&self) -> NetworkInfo {
        NetworkInfo {
            ip: self.platform_ip(),
            ssid: self.ssid.clone(),
            ..Default::default()
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
