//! Mock device for integration tests.
//!
//! One value implements every port the service drives.  Output calls are
//! recorded in order so tests can assert on the full history; inputs
//! (touch samples, stored settings, queued web requests, weather replies)
//! are scripted up front.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use flipclock::app::commands::ServerRequest;
use flipclock::app::events::AppEvent;
use flipclock::app::ports::{
    ConfigServerPort, EventSink, NetworkInfo, Notice, PowerPort, ProvisioningError,
    ProvisioningPort, RenderPort, SettingsError, SettingsPort, TouchPort, WakeSource, WeatherPort,
};
use flipclock::app::service::AppService;
use flipclock::config::ClockConfig;
use flipclock::gesture::{TouchSample, POLL_INTERVAL_MS};
use flipclock::weather::{bounded, TemperatureUnit, WeatherReport, WeatherState};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DrawClock,
    UpdateClock,
    DrawMenu,
    DrawIpInfo(NetworkInfo),
    DrawPortal,
    Notice(Notice),
    ClearWeather,
    DrawWeather(WeatherReport),
    Blank,
    Save(ClockConfig),
    FactoryReset,
    Connect,
    StartPortal,
    Fetch,
    EnterLowPower(WakeSource),
    Restart,
    SetBacklight(bool),
}

// ── MockDevice ────────────────────────────────────────────────

pub struct MockDevice {
    pub calls: Vec<Call>,

    /// What `load` returns.
    pub stored: Result<ClockConfig, SettingsError>,
    /// Forced result for `save`; `None` accepts after validation.
    pub save_error: Option<SettingsError>,
    pub connect_result: Result<(), ProvisioningError>,
    pub portal_result: Result<ClockConfig, ProvisioningError>,
    pub network: NetworkInfo,

    /// Samples returned by `poll_touch`; released once exhausted.
    pub touch: VecDeque<TouchSample>,
    pub requests: VecDeque<ServerRequest>,
    /// Replies for `attempt_fetch`; repeats the last one when exhausted.
    pub weather: VecDeque<WeatherReport>,
    last_weather: WeatherReport,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            stored: Ok(ClockConfig::default()),
            save_error: None,
            connect_result: Ok(()),
            portal_result: Err(ProvisioningError::PortalTimeout),
            network: NetworkInfo {
                ip: Some(Ipv4Addr::new(192, 168, 1, 42)),
                ssid: bounded("HomeNet"),
                ..Default::default()
            },
            touch: VecDeque::new(),
            requests: VecDeque::new(),
            weather: VecDeque::new(),
            last_weather: WeatherReport::ok(72.4, TemperatureUnit::Fahrenheit, "clear sky"),
        }
    }

    /// A device with Wi-Fi credentials and an API key already stored.
    pub fn provisioned() -> Self {
        let mut dev = Self::new();
        dev.stored = Ok(provisioned_config());
        dev
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn fetches(&self) -> usize {
        self.count(&Call::Fetch)
    }

    pub fn backlight(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::SetBacklight(on) => Some(*on),
            _ => None,
        })
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub fn provisioned_config() -> ClockConfig {
    ClockConfig {
        wifi_ssid: bounded("HomeNet"),
        wifi_password: bounded("hunter22"),
        weather_api_key: bounded("0123456789abcdef"),
        ..Default::default()
    }
}

pub fn transient_error() -> WeatherReport {
    WeatherReport::failed(
        WeatherState::TransientError,
        TemperatureUnit::Fahrenheit,
        "HTTP Error",
    )
}

// ── Port impls ────────────────────────────────────────────────

impl TouchPort for MockDevice {
    fn poll_touch(&mut self, now_ms: u64) -> TouchSample {
        self.touch
            .pop_front()
            .map(|s| TouchSample { timestamp_ms: now_ms, ..s })
            .unwrap_or_else(|| TouchSample::released(now_ms))
    }
}

impl RenderPort for MockDevice {
    fn draw_clock_screen(&mut self) {
        self.calls.push(Call::DrawClock);
    }
    fn update_clock(&mut self) {
        self.calls.push(Call::UpdateClock);
    }
    fn draw_menu_screen(&mut self) {
        self.calls.push(Call::DrawMenu);
    }
    fn draw_ip_info_screen(&mut self, info: &NetworkInfo) {
        self.calls.push(Call::DrawIpInfo(info.clone()));
    }
    fn draw_portal_instructions(&mut self) {
        self.calls.push(Call::DrawPortal);
    }
    fn draw_notice(&mut self, notice: Notice) {
        self.calls.push(Call::Notice(notice));
    }
    fn clear_weather_panel(&mut self) {
        self.calls.push(Call::ClearWeather);
    }
    fn draw_weather_panel(&mut self, report: &WeatherReport) {
        self.calls.push(Call::DrawWeather(report.clone()));
    }
    fn blank(&mut self) {
        self.calls.push(Call::Blank);
    }
}

impl SettingsPort for MockDevice {
    fn load(&mut self) -> Result<ClockConfig, SettingsError> {
        self.stored.clone()
    }

    fn save(&mut self, config: &ClockConfig) -> Result<(), SettingsError> {
        self.calls.push(Call::Save(config.clone()));
        if let Some(e) = self.save_error {
            return Err(e);
        }
        config.validate()?;
        self.stored = Ok(config.clone());
        Ok(())
    }

    fn factory_reset(&mut self) -> Result<(), SettingsError> {
        self.calls.push(Call::FactoryReset);
        self.stored = Ok(ClockConfig::default());
        Ok(())
    }
}

impl ProvisioningPort for MockDevice {
    fn connect(&mut self, _config: &ClockConfig) -> Result<(), ProvisioningError> {
        self.calls.push(Call::Connect);
        self.connect_result
    }

    fn start_provisioning_portal(
        &mut self,
        _config: &ClockConfig,
    ) -> Result<ClockConfig, ProvisioningError> {
        self.calls.push(Call::StartPortal);
        self.portal_result.clone()
    }

    fn is_connected(&self) -> bool {
        self.connect_result.is_ok()
    }

    fn network_info(&self) -> NetworkInfo {
        self.network.clone()
    }
}

impl ConfigServerPort for MockDevice {
    fn pump_pending_requests(&mut self) -> Option<ServerRequest> {
        self.requests.pop_front()
    }
}

impl WeatherPort for MockDevice {
    fn attempt_fetch(&mut self, _config: &ClockConfig) -> WeatherReport {
        self.calls.push(Call::Fetch);
        if let Some(next) = self.weather.pop_front() {
            self.last_weather = next;
        }
        self.last_weather.clone()
    }
}

impl PowerPort for MockDevice {
    fn enter_low_power(&mut self, wake: WakeSource) {
        self.calls.push(Call::EnterLowPower(wake));
    }
    fn restart(&mut self) {
        self.calls.push(Call::Restart);
    }
    fn set_backlight(&mut self, on: bool) {
        self.calls.push(Call::SetBacklight(on));
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Collects every emitted event.
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Drivers ───────────────────────────────────────────────────

/// Contact held on `[from_ms, until_ms)` at one coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Press {
    pub from_ms: u64,
    pub until_ms: u64,
    pub x: u16,
    pub y: u16,
}

/// Start a service against `dev` at t = 0.
pub fn boot(dev: &mut MockDevice) -> (AppService, LogSink) {
    let mut app = AppService::new();
    let mut sink = LogSink::new();
    app.start(dev, &mut sink, 0);
    (app, sink)
}

/// Poll every `step_ms` over `[from_ms, to_ms]`, feeding `presses`.
pub fn run(
    app: &mut AppService,
    dev: &mut MockDevice,
    sink: &mut LogSink,
    from_ms: u64,
    to_ms: u64,
    step_ms: u64,
    presses: &[Press],
) {
    let mut t = from_ms;
    while t <= to_ms {
        if let Some(p) = presses.iter().find(|p| t >= p.from_ms && t < p.until_ms) {
            dev.touch.push_back(TouchSample::pressed_at(p.x, p.y, t));
        }
        app.poll(dev, sink, t);
        t += step_ms;
    }
}

/// One 100 ms tap at (`x`, `y`) starting at `start_ms`.  The tap resolves
/// once the double-tap window has closed, 720 ms after the press began.
/// Returns the next free poll time.
pub fn tap_at(
    app: &mut AppService,
    dev: &mut MockDevice,
    sink: &mut LogSink,
    start_ms: u64,
    x: u16,
    y: u16,
) -> u64 {
    let press = Press { from_ms: start_ms, until_ms: start_ms + 100, x, y };
    let end = start_ms + 720;
    run(app, dev, sink, start_ms, end, POLL_INTERVAL_MS, &[press]);
    end + POLL_INTERVAL_MS
}

/// Double tap on the Clock face at t = 1000.  The menu opens at 2020;
/// returns 2040.
pub fn open_menu(app: &mut AppService, dev: &mut MockDevice, sink: &mut LogSink) -> u64 {
    let presses = [
        Press { from_ms: 1000, until_ms: 1100, x: 160, y: 120 },
        Press { from_ms: 1300, until_ms: 1400, x: 160, y: 120 },
    ];
    run(app, dev, sink, 1000, 2020, POLL_INTERVAL_MS, &presses);
    2040
}
