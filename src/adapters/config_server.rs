//! Configuration web server adapter.
//!
//! HTTP handlers run on the ESP-IDF server task.  They never touch the
//! application directly: each actionable request becomes a
//! [`ServerRequest`] pushed into a bounded `embassy-sync` channel, and the
//! main loop drains one per pass through [`ConfigServerPort`].
//!
//! ```text
//! ┌──────────────┐ ServerRequest ┌──────────────┐
//! │ HTTP task    │──────────────▶│  Main loop   │
//! │ (handlers)   │   (depth 4)   │ (AppService) │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! | Route               | Effect                                        |
//! |---------------------|-----------------------------------------------|
//! | `/`                 | 302 to `/config`                              |
//! | `/config`           | settings form; with `apikey=` saves + restarts |
//! | `/reboot`           | restart                                       |
//! | `/sleep`            | deep sleep                                    |
//! | `/toggle_backlight` | flip the backlight                            |

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::commands::ServerRequest;
use crate::app::ports::{ConfigServerPort, SettingsError};
use crate::config::ClockConfig;
use crate::weather::bounded;

/// Requests that can wait for the main loop.
pub const REQUEST_DEPTH: usize = 4;

pub const ROUTES: [&str; 5] = ["/", "/config", "/reboot", "/sleep", "/toggle_backlight"];

// ---------------------------------------------------------------------------
// Shared state between the HTTP task and the main loop
// ---------------------------------------------------------------------------

pub struct ServerShared {
    requests: Channel<CriticalSectionRawMutex, ServerRequest, REQUEST_DEPTH>,
    /// Mirror of the panel backlight so `/toggle_backlight` can report the
    /// state it is about to produce.
    backlight_on: AtomicBool,
}

impl Default for ServerShared {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerShared {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            backlight_on: AtomicBool::new(true),
        }
    }

    /// Queue a request.  Returns `false` when the queue is full.
    pub fn submit(&self, request: ServerRequest) -> bool {
        self.requests.try_send(request).is_ok()
    }

    pub fn take(&self) -> Option<ServerRequest> {
        self.requests.try_receive().ok()
    }

    pub fn set_backlight_state(&self, on: bool) {
        self.backlight_on.store(on, Ordering::Relaxed);
    }

    pub fn backlight_state(&self) -> bool {
        self.backlight_on.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Query decoding and form application
// ---------------------------------------------------------------------------

/// Decode `application/x-www-form-urlencoded` text.  Malformed escapes
/// pass through literally.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// First value of `name` in a query string, decoded.
pub fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (url_decode(key) == name).then(|| url_decode(value))
        })
}

/// Split a request URI into path and query.
pub fn split_uri(uri: &str) -> (&str, &str) {
    uri.split_once('?').unwrap_or((uri, ""))
}

fn parse_number<T: core::str::FromStr>(value: &str, err: &'static str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::ValidationFailed(err))
}

/// Apply a submitted settings form on top of `current`.
///
/// `Ok(None)` means no form was submitted (no `apikey` field).  Text
/// fields are trimmed and truncated to their capacity; a non-empty
/// `city_id` switches the record to city-id mode.  The result is
/// validated before it is returned.
pub fn apply_form(query: &str, current: &ClockConfig) -> Result<Option<ClockConfig>, SettingsError> {
    let Some(api_key) = query_param(query, "apikey") else {
        return Ok(None);
    };

    let mut cfg = current.clone();
    cfg.weather_api_key = bounded(api_key.trim());

    if let Some(v) = query_param(query, "gmt") {
        cfg.gmt_offset_hr = parse_number(&v, "gmt offset must be a whole number")?;
    }
    if let Some(v) = query_param(query, "sleeptmo") {
        cfg.sleep_timeout_min = parse_number(&v, "sleep timeout must be a whole number")?;
    }
    if let Some(v) = query_param(query, "timefmt") {
        cfg.time_format_24h = v.trim() == "1";
    }
    if let Some(v) = query_param(query, "tempunit") {
        cfg.use_fahrenheit = v.trim() == "1";
    }
    if let Some(v) = query_param(query, "iconcolor") {
        cfg.use_multi_color_icons = v.trim() == "1";
    }
    if let Some(v) = query_param(query, "city") {
        cfg.weather_city = bounded(v.trim());
    }
    if let Some(v) = query_param(query, "country") {
        cfg.weather_country_code = bounded(v.trim());
    }
    if let Some(v) = query_param(query, "city_id") {
        cfg.weather_city_id = bounded(v.trim());
    }
    cfg.use_city_id_mode = !cfg.weather_city_id.is_empty();

    // Portal form only.
    if let Some(v) = query_param(query, "ssid") {
        cfg.wifi_ssid = bounded(&v);
    }
    if let Some(v) = query_param(query, "pass") {
        cfg.wifi_password = bounded(&v);
    }

    cfg.validate()?;
    Ok(Some(cfg))
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Which form variant to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// Normal operation: the station is connected.
    Station,
    /// SoftAP setup portal: the form also asks for Wi-Fi credentials.
    Portal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub location: Option<&'static str>,
    pub body: String,
}

impl HttpReply {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            location: None,
            body: body.into(),
        }
    }

    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            location: None,
            body,
        }
    }
}

/// Handle one GET request.  Side effects are limited to queueing a
/// [`ServerRequest`] on `shared`.
pub fn route(
    path: &str,
    query: &str,
    current: &ClockConfig,
    ssid: &str,
    mode: FormMode,
    shared: &ServerShared,
) -> HttpReply {
    let enqueue = |request: ServerRequest, ok: HttpReply| {
        if shared.submit(request) {
            ok
        } else {
            warn!("HTTP: request queue full, dropping {}", path);
            HttpReply::text(503, "Device busy, try again.")
        }
    };

    match path {
        "/" => HttpReply {
            status: 302,
            content_type: "text/plain",
            location: Some("/config"),
            body: "Redirecting to /config".into(),
        },
        "/config" => match apply_form(query, current) {
            Ok(Some(cfg)) => {
                info!("HTTP: settings form submitted");
                enqueue(
                    ServerRequest::SaveSettings(cfg),
                    HttpReply::text(
                        200,
                        "Settings saved successfully! Restarting Flip Clock to apply changes...",
                    ),
                )
            }
            Ok(None) => HttpReply::html(render_form(current, ssid, mode)),
            Err(e) => HttpReply::text(400, format!("Settings rejected: {}", e)),
        },
        "/reboot" => enqueue(ServerRequest::Reboot, HttpReply::text(200, "Rebooting...")),
        "/sleep" => enqueue(ServerRequest::Sleep, HttpReply::text(200, "Entering deep sleep...")),
        "/toggle_backlight" => {
            let next = !shared.backlight_state();
            enqueue(
                ServerRequest::ToggleBacklight,
                HttpReply::text(
                    200,
                    format!("Backlight is now {}", if next { "ON" } else { "OFF" }),
                ),
            )
        }
        _ => HttpReply::text(404, "Not found"),
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

const HTML_HEAD: &str = "<!DOCTYPE html><html><head><title>Clock Configuration</title>\
<meta name='viewport' content='width=device-width, initial-scale=1'><style>\
body{font-family:Arial,sans-serif;margin:20px;}\
input[type=text],input[type=number],input[type=password],select{width:100%;padding:10px;margin:8px 0;box-sizing:border-box;}\
input[type=submit]{background-color:#4CAF50;color:white;padding:14px 20px;margin:8px 0;border:none;cursor:pointer;width:100%;}\
button{background-color:#f44336;color:white;padding:14px 20px;margin:8px 0;border:none;cursor:pointer;width:100%;}\
.note{font-size:0.9em;color:#555;}</style></head><body>";

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn text_input(html: &mut String, id: &str, label: &str, value: &str, max: usize) {
    html.push_str(&format!(
        "<label for='{id}'>{label}</label><input type='text' id='{id}' name='{id}' value='{}' maxlength='{max}'><br>",
        escape_attr(value)
    ));
}

fn select(html: &mut String, id: &str, label: &str, on: bool, on_text: &str, off_text: &str) {
    let (on_sel, off_sel) = if on { (" selected", "") } else { ("", " selected") };
    html.push_str(&format!(
        "<label for='{id}'>{label}</label><select id='{id}' name='{id}'>\
<option value='1'{on_sel}>{on_text}</option><option value='0'{off_sel}>{off_text}</option></select><br>"
    ));
}

/// The settings page, pre-filled from `cfg`.
pub fn render_form(cfg: &ClockConfig, ssid: &str, mode: FormMode) -> String {
    use crate::config::{API_KEY_LEN, CITY_ID_LEN, CITY_LEN, COUNTRY_CODE_LEN, PASSWORD_LEN, SSID_LEN};

    let mut html = String::with_capacity(4096);
    html.push_str(HTML_HEAD);
    html.push_str("<h2>Flip Clock Settings</h2>");
    match mode {
        FormMode::Station => {
            html.push_str(&format!("<p>Connected to WiFi: {}</p>", escape_attr(ssid)));
        }
        FormMode::Portal => html.push_str("<p>Setup mode: enter your Wi-Fi network below.</p>"),
    }
    html.push_str("<form method='get' action='config'>");

    if mode == FormMode::Portal {
        html.push_str("<h3>Wi-Fi</h3>");
        text_input(&mut html, "ssid", "Network Name (SSID):", &cfg.wifi_ssid, SSID_LEN);
        html.push_str(&format!(
            "<label for='pass'>Password:</label><input type='password' id='pass' name='pass' value='{}' maxlength='{PASSWORD_LEN}'><br>",
            escape_attr(&cfg.wifi_password)
        ));
    }

    html.push_str("<h3>OpenWeatherMap Settings</h3>");
    text_input(&mut html, "apikey", "API Key:", &cfg.weather_api_key, API_KEY_LEN);
    html.push_str(
        "<p class='note'>*If you do not have an API Key visit openweathermap.org to create an account.</p>",
    );
    text_input(&mut html, "city", "City Name (e.g., London):", &cfg.weather_city, CITY_LEN);
    text_input(
        &mut html,
        "country",
        "Country Code (e.g., GB):",
        &cfg.weather_country_code,
        COUNTRY_CODE_LEN,
    );
    text_input(&mut html, "city_id", "City ID (Optional):", &cfg.weather_city_id, CITY_ID_LEN);
    html.push_str(
        "<p class='note'>*If City ID is entered, the clock will use ID mode and ignore City/Country fields.</p>",
    );

    html.push_str("<h3>Display</h3>");
    select(&mut html, "tempunit", "Temperature Unit:", cfg.use_fahrenheit, "Fahrenheit", "Celsius");
    select(
        &mut html,
        "iconcolor",
        "Weather Icon Style:",
        cfg.use_multi_color_icons,
        "Multi-Color",
        "Monochrome",
    );

    html.push_str("<h3>Time and Sleep</h3>");
    select(&mut html, "timefmt", "Time Format:", cfg.time_format_24h, "24-Hour", "12-Hour (AM/PM)");
    html.push_str(&format!(
        "<label for='gmt'>GMT Offset (Hours, e.g., -5 or 1):</label>\
<input type='number' id='gmt' name='gmt' min='-12' max='14' value='{}'><br>\
<label for='sleeptmo'>Sleep Timeout (Minutes, 0 to disable):</label>\
<input type='number' id='sleeptmo' name='sleeptmo' min='0' max='1440' value='{}'><br>",
        cfg.gmt_offset_hr, cfg.sleep_timeout_min
    ));

    html.push_str("<input type='submit' value='Save Settings'></form>");
    if mode == FormMode::Station {
        html.push_str(
            "<form method='get' action='toggle_backlight'><button style='background-color:#888;'>Toggle Backlight</button></form>\
<form method='get' action='sleep'><button>Deep Sleep</button></form>\
<form method='get' action='reboot'><button style='background-color:#1e90ff;'>Reboot Device</button></form>",
        );
    }
    html.push_str("</body></html>");
    html
}

// ---------------------------------------------------------------------------
// ConfigServer adapter
// ---------------------------------------------------------------------------

pub struct ConfigServer {
    shared: &'static ServerShared,
    #[cfg(target_os = "espidf")]
    server: Option<esp_idf_svc::http::server::EspHttpServer<'static>>,
}

impl ConfigServer {
    pub fn new(shared: &'static ServerShared) -> Self {
        Self {
            shared,
            #[cfg(target_os = "espidf")]
            server: None,
        }
    }

    pub fn shared(&self) -> &'static ServerShared {
        self.shared
    }

    /// Register every route on a fresh ESP-IDF HTTP server.
    ///
    /// `current` is the record the form is pre-filled from.  Settings only
    /// change through a restart, so a snapshot is enough.
    #[cfg(target_os = "espidf")]
    pub fn start(&mut self, current: &ClockConfig, ssid: &str, mode: FormMode) -> anyhow::Result<()> {
        use embedded_svc::http::Method;
        use embedded_svc::io::Write;
        use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpServer};

        let mut server = EspHttpServer::new(&HttpConfiguration {
            stack_size: 10 * 1024,
            ..Default::default()
        })?;

        for path in ROUTES {
            let shared = self.shared;
            let current = current.clone();
            let ssid = ssid.to_owned();
            server.fn_handler::<anyhow::Error, _>(path, Method::Get, move |req| {
                let uri = req.uri().to_owned();
                let (path, query) = split_uri(&uri);
                let reply = route(path, query, &current, &ssid, mode, shared);

                let headers = [
                    ("Content-Type", reply.content_type),
                    ("Location", reply.location.unwrap_or("")),
                ];
                let n = if reply.location.is_some() { 2 } else { 1 };
                let mut resp = req.into_response(reply.status, None, &headers[..n])?;
                resp.write_all(reply.body.as_bytes())?;
                Ok(())
            })?;
        }

        info!("HTTP config server started ({:?} form)", mode);
        self.server = Some(server);
        Ok(())
    }

    /// Stop serving; pending requests stay queued.
    #[cfg(target_os = "espidf")]
    pub fn stop(&mut self) {
        self.server = None;
    }
}

impl ConfigServerPort for ConfigServer {
    fn pump_pending_requests(&mut self) -> Option<ServerRequest> {
        self.shared.take()
    }
}
