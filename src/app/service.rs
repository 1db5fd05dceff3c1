//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the gesture classifier, the mode FSM with its
//! shared context, and the weather gate.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  TouchPort ──▶ ┌──────────────────────────────┐ ──▶ RenderPort
//!                │          AppService           │ ──▶ PowerPort
//! ConfigServer ─▶│ Classifier · FSM · WeatherGate│ ◀─▶ WeatherPort
//!                └──────────────────────────────┘ ◀─▶ Settings / Wi-Fi
//! ```
//!
//! One call to [`AppService::poll`] is one pass of the main loop: sample
//! the panel, classify, tick the mode controller, apply its commands,
//! then service at most one configuration server request.

use core::mem;

use log::{info, warn};

use crate::config::ClockConfig;
use crate::fsm::context::{DeviceAction, FsmContext, ModeCommands, Screen};
use crate::fsm::states::build_state_table;
use crate::fsm::{DeviceMode, Fsm};
use crate::gesture::{Gesture, GestureClassifier};
use crate::layout::TouchPoint;
use crate::weather::WeatherGate;

use super::commands::ServerRequest;
use super::events::AppEvent;
use super::ports::{
    ConfigServerPort, DevicePorts, EventSink, Notice, PowerPort, ProvisioningPort, RenderPort,
    SettingsPort, TouchPort, WakeSource, WeatherPort,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    classifier: GestureClassifier,
    weather: WeatherGate,
    backlight_on: bool,
    /// Set once a restart or deep sleep has been requested.  Nothing runs
    /// after that; on hardware the port call does not return.
    halted: bool,
    tick_count: u64,
}

impl Default for AppService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppService {
    /// Construct the service with default settings.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new() -> Self {
        let config = ClockConfig::default();
        let weather = WeatherGate::new(config.weather_interval_ms());
        Self {
            fsm: Fsm::new(build_state_table(), DeviceMode::Clock),
            ctx: FsmContext::new(config, 0),
            classifier: GestureClassifier::new(),
            weather,
            backlight_on: false,
            halted: false,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load settings, pick the boot mode and run its entry actions.
    ///
    /// Without stored Wi-Fi credentials, or when the station connect
    /// fails, the device boots into the setup portal; otherwise into Clock.
    pub fn start(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink, now_ms: u64) {
        let config = match hw.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Settings load failed ({}), using defaults", e);
                sink.emit(&AppEvent::SettingsFailed);
                ClockConfig::default()
            }
        };
        self.weather.set_interval_ms(config.weather_interval_ms());
        self.ctx = FsmContext::new(config, now_ms);
        self.classifier.reset();

        let initial = self.boot_mode(hw);
        self.fsm = Fsm::new(build_state_table(), initial);
        self.fsm.start(&mut self.ctx);

        self.set_backlight(hw, true);
        sink.emit(&AppEvent::Started(initial));
        info!("AppService started in {:?}", initial);

        self.apply_commands(hw, sink);
    }

    fn boot_mode(&mut self, hw: &mut impl DevicePorts) -> DeviceMode {
        if !self.ctx.config.has_wifi_credentials() {
            info!("No Wi-Fi credentials stored, starting setup portal");
            return DeviceMode::ConfigPortal;
        }
        match hw.connect(&self.ctx.config) {
            Ok(()) => DeviceMode::Clock,
            Err(e) => {
                warn!("Wi-Fi connect failed ({}), starting setup portal", e);
                DeviceMode::ConfigPortal
            }
        }
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// One main-loop pass: sample touch, classify, tick, pump requests.
    pub fn poll(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink, now_ms: u64) {
        if self.halted {
            return;
        }
        let sample = hw.poll_touch(now_ms);
        let gesture = self.classifier.classify(&sample, now_ms);
        let point = self.classifier.last_point();
        self.tick(gesture, point, hw, sink, now_ms);
    }

    /// Feed one classified gesture to the mode controller, apply the
    /// resulting commands, then service at most one queued server request
    /// while the station link is up.
    pub fn tick(
        &mut self,
        gesture: Gesture,
        point: TouchPoint,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        if self.halted {
            return;
        }
        self.tick_count += 1;

        if gesture.is_some() {
            sink.emit(&AppEvent::Gesture { gesture, at: point });
        }

        let prev = self.fsm.current_state();
        self.ctx.begin_tick(now_ms, gesture, point);
        self.fsm.tick(&mut self.ctx);
        self.emit_mode_change(prev, sink);

        self.apply_commands(hw, sink);

        // The web server is only reachable over the station link.
        if !self.halted && hw.is_connected() {
            if let Some(request) = hw.pump_pending_requests() {
                self.handle_request(request, hw, sink);
            }
        }
    }

    // ── Request handling ──────────────────────────────────────

    /// Act on a request from the configuration web server.
    pub fn handle_request(
        &mut self,
        request: ServerRequest,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        if self.halted {
            return;
        }
        sink.emit(&AppEvent::RequestReceived(request.kind()));

        match request {
            ServerRequest::SaveSettings(config) => match hw.save(&config) {
                Ok(()) => {
                    info!("Settings saved from web form, restarting");
                    sink.emit(&AppEvent::SettingsSaved);
                    self.ctx.config = config;
                    hw.draw_notice(Notice::SettingsSaved);
                    self.run_action(DeviceAction::Restart, hw, sink);
                }
                Err(e) => {
                    warn!("Rejected settings from web form: {}", e);
                    sink.emit(&AppEvent::SettingsFailed);
                }
            },
            ServerRequest::Reboot => {
                hw.draw_notice(Notice::Rebooting);
                self.run_action(DeviceAction::Restart, hw, sink);
            }
            ServerRequest::Sleep => {
                let prev = self.fsm.current_state();
                self.ctx.commands.notice = Some(Notice::GoingToSleep);
                self.fsm.force_transition(DeviceMode::Sleep, &mut self.ctx);
                self.emit_mode_change(prev, sink);
                self.apply_commands(hw, sink);
            }
            ServerRequest::ToggleBacklight => {
                let on = !self.backlight_on;
                self.set_backlight(hw, on);
                info!("Backlight is now {}", if on { "ON" } else { "OFF" });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> DeviceMode {
        self.fsm.current_state()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn config(&self) -> &ClockConfig {
        &self.ctx.config
    }

    pub fn weather(&self) -> &WeatherGate {
        &self.weather
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight_on
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.ctx.last_activity_ms
    }

    /// Total loop passes executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit_mode_change(&self, from: DeviceMode, sink: &mut impl EventSink) {
        let to = self.fsm.current_state();
        if to != from {
            sink.emit(&AppEvent::ModeChanged { from, to });
        }
    }

    /// Translate the FSM's command block into port calls.
    fn apply_commands(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        let cmds: ModeCommands = mem::take(&mut self.ctx.commands);

        if let Some(button) = cmds.selected {
            sink.emit(&AppEvent::MenuSelected(button));
        }
        if let Some(notice) = cmds.notice {
            hw.draw_notice(notice);
        }
        if cmds.blank {
            hw.blank();
        }
        if let Some(on) = cmds.backlight {
            self.set_backlight(hw, on);
        }

        match cmds.screen {
            Some(Screen::Clock) => {
                hw.draw_clock_screen();
                self.paint_weather(hw);
            }
            Some(Screen::Menu) => hw.draw_menu_screen(),
            Some(Screen::IpInfo) => {
                let info = hw.network_info().with_settings(&self.ctx.config);
                hw.draw_ip_info_screen(&info);
            }
            Some(Screen::PortalInstructions) => hw.draw_portal_instructions(),
            None => {}
        }

        if cmds.refresh_clock {
            hw.update_clock();
        }
        if cmds.check_weather {
            self.refresh_weather(hw, sink);
        }
        if let Some(action) = cmds.action {
            self.run_action(action, hw, sink);
        }
    }

    /// Ask the gate whether a fetch is due; repaint the panel on change.
    fn refresh_weather(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        let now_ms = self.ctx.now_ms;
        if self.weather.due_for_refresh(now_ms) {
            self.weather.record_attempt(now_ms);
            let report = hw.attempt_fetch(&self.ctx.config);
            info!("Weather fetch: {:?} \"{}\"", report.state, report.text);
            sink.emit(&AppEvent::WeatherFetched {
                state: report.state,
                temperature: report.temperature,
            });
            self.weather.record_result(report);
        }
        if self.weather.changed() {
            self.paint_weather(hw);
        }
    }

    fn paint_weather(&self, hw: &mut impl RenderPort) {
        match self.weather.report() {
            Some(report) => hw.draw_weather_panel(report),
            None => hw.clear_weather_panel(),
        }
    }

    fn set_backlight(&mut self, hw: &mut impl DevicePorts, on: bool) {
        self.backlight_on = on;
        hw.set_backlight(on);
    }

    /// Fatal and blocking actions.  Each ends with the service halted.
    fn run_action(&mut self, action: DeviceAction, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        match action {
            DeviceAction::Restart => {
                sink.emit(&AppEvent::Halting("restart"));
                self.halted = true;
                hw.restart();
            }
            DeviceAction::FactoryReset => {
                if let Err(e) = hw.factory_reset() {
                    warn!("Factory reset failed: {}", e);
                    sink.emit(&AppEvent::SettingsFailed);
                }
                sink.emit(&AppEvent::Halting("factory_reset"));
                self.halted = true;
                hw.restart();
            }
            DeviceAction::EnterSleep => {
                sink.emit(&AppEvent::Halting("sleep"));
                self.halted = true;
                self.classifier.reset();
                hw.enter_low_power(WakeSource::TouchIrq);
            }
            DeviceAction::RunPortal => {
                match hw.start_provisioning_portal(&self.ctx.config) {
                    Ok(config) => match hw.save(&config) {
                        Ok(()) => {
                            info!("Setup portal delivered settings");
                            sink.emit(&AppEvent::SettingsSaved);
                            self.ctx.config = config;
                        }
                        Err(e) => {
                            warn!("Portal settings rejected: {}", e);
                            sink.emit(&AppEvent::SettingsFailed);
                        }
                    },
                    Err(e) => warn!("Setup portal ended without settings: {}", e),
                }
                sink.emit(&AppEvent::Halting("portal"));
                self.halted = true;
                hw.restart();
            }
        }
    }
}
