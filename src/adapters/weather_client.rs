//! OpenWeatherMap client adapter.
//!
//! Implements [`WeatherPort`].  One call is one attempt; every outcome is
//! folded into a [`WeatherReport`] so the service never sees an error.
//!
//! The request pipeline is split into pure steps (pre-checks, URL
//! assembly, body parsing) that run on the host, and a thin HTTPS GET
//! that only exists on the device.

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::WeatherPort;
use crate::config::ClockConfig;
use crate::error::FetchError;
use crate::weather::{TemperatureUnit, WeatherReport, WeatherState};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

pub const OPENWEATHER_URL_BASE: &str = "https://api.openweathermap.org/data/2.5/weather?";

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const TIMEOUT_MS: u64 = 15_000;
/// The current-weather document is ~500 bytes; anything far larger is wrong.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BODY_BYTES: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Pure request/response helpers
// ---------------------------------------------------------------------------

/// Query-string encoding for city names: space becomes `+`, unreserved
/// characters pass through, everything else is `%XX` per byte.
pub fn url_encode(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b' ' => out.push('+'),
            b if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') => {
                out.push(char::from(b));
            }
            b => {
                out.push('%');
                out.push(char::from(HEX[usize::from(b >> 4)]));
                out.push(char::from(HEX[usize::from(b & 0x0F)]));
            }
        }
    }
    out
}

/// `"light RAIN"` -> `"Light Rain"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = true;
    for c in s.chars() {
        if prev_space && c != ' ' {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        prev_space = c == ' ';
    }
    out
}

/// Reject configurations that cannot produce a request at all.
///
/// Returns the report to surface instead of fetching.
pub fn precheck(config: &ClockConfig) -> Option<WeatherReport> {
    let unit = config.temperature_unit();
    if !config.has_api_key() {
        return Some(WeatherReport::failed(WeatherState::NoKey, unit, "No API Key"));
    }
    if config.use_city_id_mode {
        if config.weather_city_id.is_empty() {
            return Some(WeatherReport::failed(
                WeatherState::ConfigError,
                unit,
                "No ID Config",
            ));
        }
    } else if config.weather_city.is_empty() || config.weather_country_code.is_empty() {
        return Some(WeatherReport::failed(
            WeatherState::ConfigError,
            unit,
            "No City Config",
        ));
    }
    None
}

/// Full request URL for the configured location and units.
pub fn build_url(config: &ClockConfig) -> String {
    let mut url = String::from(OPENWEATHER_URL_BASE);
    if config.use_city_id_mode {
        url.push_str("id=");
        url.push_str(&config.weather_city_id);
    } else {
        url.push_str("q=");
        url.push_str(&url_encode(&config.weather_city));
        url.push(',');
        url.push_str(&config.weather_country_code);
    }
    url.push_str("&units=");
    url.push_str(config.temperature_unit().api_units());
    url.push_str("&appid=");
    url.push_str(&config.weather_api_key);
    url
}

#[derive(Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f32,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
}

/// Turn a response into a report.  Non-200 statuses map through
/// [`FetchError::from_status`]; a 200 body must carry `main.temp` and at
/// least one `weather[].description`.
pub fn parse_response(
    status: u16,
    body: &[u8],
    unit: TemperatureUnit,
) -> Result<WeatherReport, FetchError> {
    if let Some(e) = FetchError::from_status(status) {
        return Err(e);
    }
    let doc: OwmResponse = serde_json::from_slice(body).map_err(|_| FetchError::Json)?;
    let description = doc
        .weather
        .first()
        .map(|c| title_case(&c.description))
        .ok_or(FetchError::Json)?;
    Ok(WeatherReport::ok(doc.main.temp, unit, &description))
}

fn report_from(result: Result<WeatherReport, FetchError>, unit: TemperatureUnit) -> WeatherReport {
    match result {
        Ok(report) => report,
        Err(e) => {
            warn!("Weather fetch failed: {}", e);
            WeatherReport::failed(WeatherState::TransientError, unit, e.status_text())
        }
    }
}

// ---------------------------------------------------------------------------
// OwmClient
// ---------------------------------------------------------------------------

/// Scripted reply used by the host simulation.
#[cfg(not(target_os = "espidf"))]
pub type SimReply = Result<(u16, Vec<u8>), FetchError>;

pub struct OwmClient {
    #[cfg(not(target_os = "espidf"))]
    online: bool,
    #[cfg(not(target_os = "espidf"))]
    replies: VecDeque<SimReply>,
    #[cfg(not(target_os = "espidf"))]
    requested: Vec<String>,
}

impl Default for OwmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OwmClient {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            online: true,
            #[cfg(not(target_os = "espidf"))]
            replies: VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            requested: Vec::new(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn station_connected(&self) -> bool {
        let mut ap: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap) == esp_idf_svc::sys::ESP_OK }
    }

    #[cfg(target_os = "espidf")]
    fn get(&mut self, url: &str) -> Result<(u16, Vec<u8>), FetchError> {
        use embedded_svc::http::Method;
        use embedded_svc::http::client::Client;
        use embedded_svc::io::Read;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let config = Configuration {
            timeout: Some(core::time::Duration::from_millis(TIMEOUT_MS)),
            use_global_ca_store: true,
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&config).map_err(|_| FetchError::Transport)?;
        let mut client = Client::wrap(connection);
        let mut response = client
            .request(Method::Get, url, &[])
            .and_then(|req| req.submit())
            .map_err(|_| FetchError::Transport)?;

        let status = response.status();
        let mut body: Vec<u8> = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = response.read(&mut buf).map_err(|_| FetchError::Transport)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
            if body.len() > MAX_BODY_BYTES {
                return Err(FetchError::Json);
            }
        }
        Ok((status, body))
    }

    #[cfg(not(target_os = "espidf"))]
    fn station_connected(&self) -> bool {
        self.online
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&mut self, url: &str) -> Result<(u16, Vec<u8>), FetchError> {
        self.requested.push(url.to_owned());
        self.replies.pop_front().unwrap_or(Err(FetchError::Transport))
    }

    /// Simulation only: toggle the pretend station link.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Simulation only: queue the reply for the next request.
    #[cfg(not(target_os = "espidf"))]
    pub fn push_reply(&mut self, reply: SimReply) {
        self.replies.push_back(reply);
    }

    /// Simulation only: URLs requested so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl WeatherPort for OwmClient {
    fn attempt_fetch(&mut self, config: &ClockConfig) -> WeatherReport {
        if let Some(report) = precheck(config) {
            warn!("Weather: skipping fetch ({})", report.text);
            return report;
        }
        let unit = config.temperature_unit();
        if !self.station_connected() {
            return report_from(Err(FetchError::WifiOffline), unit);
        }

        if config.use_city_id_mode {
            info!("Weather: fetching by id {}", config.weather_city_id);
        } else {
            info!(
                "Weather: fetching for {}, {}",
                config.weather_city, config.weather_country_code
            );
        }
        let url = build_url(config);
        let result = self
            .get(&url)
            .and_then(|(status, body)| parse_response(status, &body, unit));
        report_from(result, unit)
    }
}
