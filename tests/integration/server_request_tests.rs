//! Requests queued by the configuration web server.  The main loop takes
//! one per pass, after the mode controller has run.

use crate::mock_hw::{Call, MockDevice, boot, open_menu, provisioned_config, run, tap_at};

use flipclock::app::commands::ServerRequest;
use flipclock::app::events::AppEvent;
use flipclock::app::ports::{Notice, ProvisioningError, WakeSource};
use flipclock::config::ClockConfig;
use flipclock::fsm::DeviceMode;
use flipclock::gesture::POLL_INTERVAL_MS;

#[test]
fn toggle_backlight_flips_state_each_time() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);
    assert!(!app.backlight_on());
    assert_eq!(dev.backlight(), Some(false));

    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, 40, 40, POLL_INTERVAL_MS, &[]);
    assert!(app.backlight_on());
    assert_eq!(dev.backlight(), Some(true));
    assert_eq!(app.mode(), DeviceMode::Clock);
    assert!(sink.contains(&AppEvent::RequestReceived("toggle_backlight")));
}

#[test]
fn saved_settings_are_persisted_then_device_restarts() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    dev.clear_calls();

    let updated = ClockConfig {
        gmt_offset_hr: 2,
        time_format_24h: true,
        ..provisioned_config()
    };
    dev.requests.push_back(ServerRequest::SaveSettings(updated.clone()));
    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);

    assert!(app.is_halted());
    assert_eq!(app.config().gmt_offset_hr, 2);
    assert_eq!(dev.stored, Ok(updated.clone()));
    let tail = &dev.calls[dev.calls.len() - 3..];
    assert_eq!(
        tail,
        &[Call::Save(updated), Call::Notice(Notice::SettingsSaved), Call::Restart]
    );
    assert!(sink.contains(&AppEvent::SettingsSaved));
}

#[test]
fn rejected_settings_keep_clock_running() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    let invalid = ClockConfig {
        gmt_offset_hr: 20,
        ..provisioned_config()
    };
    dev.requests.push_back(ServerRequest::SaveSettings(invalid));
    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);

    assert!(!app.is_halted());
    assert_eq!(app.config().gmt_offset_hr, -5);
    assert_eq!(dev.stored, Ok(provisioned_config()));
    assert_eq!(dev.count(&Call::Restart), 0);
    assert!(sink.contains(&AppEvent::SettingsFailed));
}

#[test]
fn reboot_request_shows_notice_then_restarts() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    dev.clear_calls();

    dev.requests.push_back(ServerRequest::Reboot);
    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);

    assert!(app.is_halted());
    assert_eq!(
        &dev.calls[dev.calls.len() - 2..],
        &[Call::Notice(Notice::Rebooting), Call::Restart]
    );
}

#[test]
fn sleep_request_enters_sleep_mode() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    dev.clear_calls();

    dev.requests.push_back(ServerRequest::Sleep);
    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);

    assert_eq!(app.mode(), DeviceMode::Sleep);
    assert!(app.is_halted());
    assert_eq!(
        &dev.calls[dev.calls.len() - 4..],
        &[
            Call::Notice(Notice::GoingToSleep),
            Call::Blank,
            Call::SetBacklight(false),
            Call::EnterLowPower(WakeSource::TouchIrq),
        ]
    );
    assert!(sink.contains(&AppEvent::ModeChanged {
        from: DeviceMode::Clock,
        to: DeviceMode::Sleep,
    }));
}

#[test]
fn one_request_per_pass() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    dev.requests.push_back(ServerRequest::ToggleBacklight);
    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);

    assert_eq!(dev.requests.len(), 1);
    assert!(!app.backlight_on());
}

#[test]
fn requests_wait_while_halted() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    dev.requests.push_back(ServerRequest::Reboot);
    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, 20, 200, POLL_INTERVAL_MS, &[]);

    assert_eq!(dev.count(&Call::Restart), 1);
    assert_eq!(dev.requests.len(), 1, "nothing is taken after the restart");
}

#[test]
fn requests_are_served_while_menu_is_open() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);
    assert_eq!(app.mode(), DeviceMode::Menu);

    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, t, t, POLL_INTERVAL_MS, &[]);

    assert!(dev.requests.is_empty());
    assert!(!app.backlight_on());
    assert_eq!(dev.backlight(), Some(false));
    assert_eq!(app.mode(), DeviceMode::Menu);
}

#[test]
fn requests_are_served_on_ip_info_screen() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);
    let t = tap_at(&mut app, &mut dev, &mut sink, t, 160, 60);
    assert_eq!(app.mode(), DeviceMode::IpInfo);

    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, t, t, POLL_INTERVAL_MS, &[]);
    assert!(!app.backlight_on());
    assert_eq!(app.mode(), DeviceMode::IpInfo);

    dev.clear_calls();
    dev.requests.push_back(ServerRequest::Reboot);
    let t = t + POLL_INTERVAL_MS;
    run(&mut app, &mut dev, &mut sink, t, t, POLL_INTERVAL_MS, &[]);
    assert!(app.is_halted());
    assert_eq!(
        &dev.calls[dev.calls.len() - 2..],
        &[Call::Notice(Notice::Rebooting), Call::Restart]
    );
}

#[test]
fn requests_wait_while_station_link_is_down() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    dev.connect_result = Err(ProvisioningError::ConnectFailed);
    dev.requests.push_back(ServerRequest::ToggleBacklight);
    run(&mut app, &mut dev, &mut sink, 20, 100, POLL_INTERVAL_MS, &[]);
    assert_eq!(dev.requests.len(), 1);
    assert!(app.backlight_on());

    dev.connect_result = Ok(());
    run(&mut app, &mut dev, &mut sink, 120, 120, POLL_INTERVAL_MS, &[]);
    assert!(dev.requests.is_empty());
    assert!(!app.backlight_on());
}
