//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements         | Connects to                  |
//! |------------------|--------------------|------------------------------|
//! | `config_server`  | ConfigServerPort   | ESP-IDF HTTP server          |
//! | `display`        | RenderPort         | ILI9341 TFT (embedded-graphics) |
//! | `log_sink`       | EventSink          | Serial log output            |
//! | `nvs`            | SettingsPort       | NVS / in-memory store        |
//! | `power`          | PowerPort          | Deep sleep, restart, backlight |
//! | `time`           | (none)             | System clock + SNTP          |
//! | `weather_client` | WeatherPort        | OpenWeatherMap over HTTPS    |
//! | `wifi`           | ProvisioningPort   | ESP-IDF Wi-Fi STA / SoftAP   |
//!
//! The touch panel's [`TouchPort`](crate::app::ports::TouchPort) lives in
//! [`drivers::touch`](crate::drivers::touch); it is a bus driver, not glue.

pub mod config_server;
pub mod display;
pub mod log_sink;
pub mod nvs;
pub mod power;
pub mod time;
pub mod weather_client;
pub mod wifi;
