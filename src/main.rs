//! FlipClock Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Xpt2046        TftRenderer     NvsSettings     WifiAdapter    │
//! │  (TouchPort)    (RenderPort)    (SettingsPort)  (Provisioning) │
//! │  ConfigServer   OwmClient       PowerAdapter    LogEventSink   │
//! │  (ConfigServer) (WeatherPort)   (PowerPort)     (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Gesture classifier · Mode FSM · Weather gate          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::ptr::addr_of_mut;

use anyhow::{anyhow, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use log::{info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{ColorOrder, Orientation, Rotation};
use mipidsi::Builder;

use flipclock::adapters::config_server::{ConfigServer, FormMode, ServerShared};
use flipclock::adapters::display::TftRenderer;
use flipclock::adapters::log_sink::LogEventSink;
use flipclock::adapters::nvs::NvsSettings;
use flipclock::adapters::power::PowerAdapter;
use flipclock::adapters::time::{self, SystemClock};
use flipclock::adapters::weather_client::OwmClient;
use flipclock::adapters::wifi::WifiAdapter;
use flipclock::app::commands::ServerRequest;
use flipclock::app::ports::{
    ConfigServerPort, NetworkInfo, Notice, PowerPort, ProvisioningError, ProvisioningPort,
    RenderPort, SettingsError, SettingsPort, TouchPort, WakeSource, WeatherPort,
};
use flipclock::app::service::AppService;
use flipclock::config::ClockConfig;
use flipclock::drivers::backlight::Backlight;
use flipclock::drivers::touch::Xpt2046;
use flipclock::drivers::watchdog::Watchdog;
use flipclock::fsm::DeviceMode;
use flipclock::gesture::TouchSample;
use flipclock::pins;
use flipclock::weather::WeatherReport;

/// Main loop period.  Fast enough for the gesture classifier's timing.
const POLL_INTERVAL_MS: u32 = 20;

/// Shared between the HTTP handlers and the main loop.
static SERVER_SHARED: ServerShared = ServerShared::new();

// ── Device: one value satisfying every port ───────────────────

struct Device<T, R> {
    touch: T,
    renderer: R,
    settings: NvsSettings,
    wifi: WifiAdapter,
    server: ConfigServer,
    weather: OwmClient,
    power: PowerAdapter,
}

impl<T: TouchPort, R> TouchPort for Device<T, R> {
    fn poll_touch(&mut self, now_ms: u64) -> TouchSample {
        self.touch.poll_touch(now_ms)
    }
}

impl<T, R: RenderPort> RenderPort for Device<T, R> {
    fn draw_clock_screen(&mut self) {
        self.renderer.draw_clock_screen();
    }
    fn update_clock(&mut self) {
        self.renderer.update_clock();
    }
    fn draw_menu_screen(&mut self) {
        self.renderer.draw_menu_screen();
    }
    fn draw_ip_info_screen(&mut self, info: &NetworkInfo) {
        self.renderer.draw_ip_info_screen(info);
    }
    fn draw_portal_instructions(&mut self) {
        self.renderer.draw_portal_instructions();
    }
    fn draw_notice(&mut self, notice: Notice) {
        self.renderer.draw_notice(notice);
    }
    fn clear_weather_panel(&mut self) {
        self.renderer.clear_weather_panel();
    }
    fn draw_weather_panel(&mut self, report: &WeatherReport) {
        self.renderer.draw_weather_panel(report);
    }
    fn blank(&mut self) {
        self.renderer.blank();
    }
}

impl<T, R> SettingsPort for Device<T, R> {
    fn load(&mut self) -> Result<ClockConfig, SettingsError> {
        self.settings.load()
    }
    fn save(&mut self, config: &ClockConfig) -> Result<(), SettingsError> {
        self.settings.save(config)
    }
    fn factory_reset(&mut self) -> Result<(), SettingsError> {
        self.settings.factory_reset()
    }
}

impl<T, R> ProvisioningPort for Device<T, R> {
    fn connect(&mut self, config: &ClockConfig) -> Result<(), ProvisioningError> {
        self.wifi.connect(config)
    }
    fn start_provisioning_portal(&mut self, current: &ClockConfig) -> Result<ClockConfig, ProvisioningError> {
        self.wifi.start_provisioning_portal(current)
    }
    fn is_connected(&self) -> bool {
        self.wifi.is_connected()
    }
    fn network_info(&self) -> NetworkInfo {
        self.wifi.network_info()
    }
}

impl<T, R> ConfigServerPort for Device<T, R> {
    fn pump_pending_requests(&mut self) -> Option<ServerRequest> {
        self.server.pump_pending_requests()
    }
}

impl<T, R> WeatherPort for Device<T, R> {
    fn attempt_fetch(&mut self, config: &ClockConfig) -> WeatherReport {
        self.weather.attempt_fetch(config)
    }
}

impl<T, R> PowerPort for Device<T, R> {
    fn enter_low_power(&mut self, wake: WakeSource) {
        self.power.enter_low_power(wake);
    }
    fn restart(&mut self) {
        self.power.restart();
    }
    fn set_backlight(&mut self, on: bool) {
        self.power.set_backlight(on);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  FlipClock v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let watchdog = Watchdog::new();

    // ── 2. Settings (display prefs and GMT offset are read once) ──
    let mut settings = NvsSettings::new().map_err(flipclock::error::Error::from)?;
    let boot_config = settings.load().unwrap_or_else(|e| {
        warn!("Settings load failed ({}), using defaults", e);
        ClockConfig::default()
    });

    // ── 3. Display: ILI9341 on SPI2 ───────────────────────────
    info!(
        "TFT: SCLK={} MOSI={} MISO={} CS={} DC={} BL={}",
        pins::TFT_SCLK_GPIO,
        pins::TFT_MOSI_GPIO,
        pins::TFT_MISO_GPIO,
        pins::TFT_CS_GPIO,
        pins::TFT_DC_GPIO,
        pins::BACKLIGHT_GPIO
    );
    let tft_bus = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio14,
        peripherals.pins.gpio13,
        Some(peripherals.pins.gpio12),
        &SpiDriverConfig::new(),
    )?;
    let tft_spi = SpiDeviceDriver::new(
        tft_bus,
        Some(peripherals.pins.gpio15),
        &SpiConfig::new().baudrate(pins::TFT_SPI_HZ.Hz()),
    )?;
    let dc = PinDriver::output(peripherals.pins.gpio2)?;

    static mut DISPLAY_BUFFER: [u8; 512] = [0u8; 512];
    // SAFETY: the only reference to the buffer, handed to the display once.
    let di = SpiInterface::new(tft_spi, dc, unsafe { &mut *addr_of_mut!(DISPLAY_BUFFER) });
    let display = Builder::new(ILI9341Rgb565, di)
        .orientation(Orientation::new().rotate(Rotation::Deg90).flip_horizontal())
        .color_order(ColorOrder::Bgr)
        .init(&mut FreeRtos)
        .map_err(|e| anyhow!("Display init failed: {:?}", e))?;

    let renderer = TftRenderer::new(
        display,
        SystemClock::new(boot_config.gmt_offset_secs()),
        &boot_config,
    );

    // ── 4. Touch: XPT2046 on SPI3 ─────────────────────────────
    info!(
        "Touch: SCLK={} MOSI={} MISO={} CS={} IRQ={}",
        pins::TOUCH_SCLK_GPIO,
        pins::TOUCH_MOSI_GPIO,
        pins::TOUCH_MISO_GPIO,
        pins::TOUCH_CS_GPIO,
        pins::TOUCH_IRQ_GPIO
    );
    let touch_bus = SpiDriver::new(
        peripherals.spi3,
        peripherals.pins.gpio25,
        peripherals.pins.gpio32,
        Some(peripherals.pins.gpio39),
        &SpiDriverConfig::new(),
    )?;
    let touch_spi = SpiDeviceDriver::new(
        touch_bus,
        Some(peripherals.pins.gpio33),
        &SpiConfig::new().baudrate(pins::TOUCH_SPI_HZ.Hz()),
    )?;
    let touch_irq = PinDriver::input(peripherals.pins.gpio36)?;
    let touch = Xpt2046::new(touch_spi, touch_irq);

    // ── 5. Remaining adapters ─────────────────────────────────
    let wifi = WifiAdapter::new(peripherals.modem, sysloop, &SERVER_SHARED)?;
    let power = PowerAdapter::new(Backlight::new()?, &SERVER_SHARED);

    let mut device = Device {
        touch,
        renderer,
        settings,
        wifi,
        server: ConfigServer::new(&SERVER_SHARED),
        weather: OwmClient::new(),
        power,
    };
    let mut log_sink = LogEventSink::new();
    let clock = SystemClock::new(boot_config.gmt_offset_secs());

    // ── 6. Boot: connect or run the setup portal ──────────────
    let mut app = AppService::new();
    app.start(&mut device, &mut log_sink, clock.uptime_ms());

    // The SNTP handle must stay alive for the lifetime of the loop.
    let _sntp = if app.mode() == DeviceMode::Clock {
        let ssid = device.wifi.network_info().ssid;
        if let Err(e) = device.server.start(app.config(), &ssid, FormMode::Station) {
            warn!("Config server failed to start: {}", e);
        }
        time::start_sntp()
            .map_err(|e| warn!("SNTP start failed: {}", e))
            .ok()
    } else {
        None
    };

    info!("System ready. Entering main loop.");

    // ── 7. Main loop ──────────────────────────────────────────
    loop {
        app.poll(&mut device, &mut log_sink, clock.uptime_ms());
        watchdog.feed();
        FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }
}
