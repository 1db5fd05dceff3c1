//! Integration tests for the touch → gesture → mode → screen pipeline.
//!
//! Every test drives `AppService::poll` at the real 20 ms loop period with
//! scripted touch samples, so the classifier timing, the mode controller
//! and the command dispatch are exercised together.

use crate::mock_hw::{
    Call, MockDevice, Press, boot, open_menu, provisioned_config, run, tap_at,
    transient_error,
};

use flipclock::app::events::AppEvent;
use flipclock::app::ports::{Notice, WakeSource};
use flipclock::config::ClockConfig;
use flipclock::fsm::DeviceMode;
use flipclock::gesture::{Gesture, POLL_INTERVAL_MS};
use flipclock::layout::{MenuButton, TouchPoint};
use flipclock::weather::WeatherState;

// ── Boot into Clock ───────────────────────────────────────────

#[test]
fn provisioned_boot_draws_clock_with_empty_weather_panel() {
    let mut dev = MockDevice::provisioned();
    let (app, sink) = boot(&mut dev);

    assert_eq!(app.mode(), DeviceMode::Clock);
    assert!(app.backlight_on());
    assert_eq!(
        dev.calls,
        vec![Call::Connect, Call::SetBacklight(true), Call::DrawClock, Call::ClearWeather]
    );
    assert!(sink.contains(&AppEvent::Started(DeviceMode::Clock)));
}

#[test]
fn first_clock_tick_updates_time_and_fetches_weather() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    dev.clear_calls();

    run(&mut app, &mut dev, &mut sink, 20, 20, POLL_INTERVAL_MS, &[]);

    assert_eq!(dev.calls[0], Call::UpdateClock);
    assert_eq!(dev.calls[1], Call::Fetch);
    assert!(matches!(&dev.calls[2], Call::DrawWeather(r) if r.is_ok()));
}

// ── Weather throttling ────────────────────────────────────────

#[test]
fn failed_fetch_is_shown_and_not_retried_before_interval() {
    let mut dev = MockDevice::provisioned();
    dev.stored = Ok(ClockConfig {
        sleep_timeout_min: 0,
        ..provisioned_config()
    });
    dev.weather.push_back(transient_error());
    let (mut app, mut sink) = boot(&mut dev);

    run(&mut app, &mut dev, &mut sink, 20, 5_000, POLL_INTERVAL_MS, &[]);
    assert_eq!(dev.fetches(), 1, "one attempt per interval");
    assert_eq!(dev.count(&Call::DrawWeather(transient_error())), 1);
    assert!(sink.contains(&AppEvent::WeatherFetched {
        state: WeatherState::TransientError,
        temperature: 0.0,
    }));

    // Next attempt is due one hour after the first; the same failure
    // does not repaint the panel.
    let interval = app.weather().interval_ms();
    run(&mut app, &mut dev, &mut sink, 20 + interval, 20 + interval, POLL_INTERVAL_MS, &[]);
    assert_eq!(dev.fetches(), 2);
    assert_eq!(dev.count(&Call::DrawWeather(transient_error())), 1);
}

// ── Menu ──────────────────────────────────────────────────────

#[test]
fn double_tap_opens_menu_and_exit_button_returns_to_clock() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    let t = open_menu(&mut app, &mut dev, &mut sink);
    assert_eq!(app.mode(), DeviceMode::Menu);
    assert_eq!(dev.calls.last(), Some(&Call::DrawMenu));
    assert!(sink.contains(&AppEvent::Gesture {
        gesture: Gesture::DoubleTap,
        at: TouchPoint::new(160, 120),
    }));

    dev.clear_calls();
    tap_at(&mut app, &mut dev, &mut sink, t, 160, 200);

    assert_eq!(app.mode(), DeviceMode::Clock);
    assert_eq!(dev.calls[0], Call::DrawClock);
    assert!(matches!(dev.calls[1], Call::DrawWeather(_)), "panel repainted from the last report");
    assert!(sink.contains(&AppEvent::MenuSelected(MenuButton::ExitMenu)));
    assert!(sink.contains(&AppEvent::ModeChanged {
        from: DeviceMode::Menu,
        to: DeviceMode::Clock,
    }));
}

#[test]
fn single_tap_on_clock_face_does_nothing() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    tap_at(&mut app, &mut dev, &mut sink, 1000, 160, 120);

    assert_eq!(app.mode(), DeviceMode::Clock);
    assert_eq!(dev.count(&Call::DrawMenu), 0);
    assert!(sink.contains(&AppEvent::Gesture {
        gesture: Gesture::Tap,
        at: TouchPoint::new(160, 120),
    }));
}

#[test]
fn tap_between_buttons_keeps_menu_open() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);

    tap_at(&mut app, &mut dev, &mut sink, t, 160, 20);

    assert_eq!(app.mode(), DeviceMode::Menu);
    assert!(!sink.events.iter().any(|e| matches!(e, AppEvent::MenuSelected(_))));
}

#[test]
fn menu_times_out_after_sixty_idle_seconds() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);
    let entered = 2020;

    run(&mut app, &mut dev, &mut sink, t, entered + 60_000, POLL_INTERVAL_MS, &[]);
    assert_eq!(app.mode(), DeviceMode::Menu, "exactly 60 s idle is not yet a timeout");

    let next = entered + 60_000 + POLL_INTERVAL_MS;
    run(&mut app, &mut dev, &mut sink, next, next, POLL_INTERVAL_MS, &[]);
    assert_eq!(app.mode(), DeviceMode::Clock);
}

#[test]
fn long_press_in_menu_only_postpones_timeout() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);

    // Hold a button for 2.5 s; releases at 52_500.
    let hold = Press { from_ms: 50_000, until_ms: 52_500, x: 160, y: 200 };
    run(&mut app, &mut dev, &mut sink, t, 60_000, POLL_INTERVAL_MS, &[hold]);
    assert!(sink.contains(&AppEvent::Gesture {
        gesture: Gesture::LongPress,
        at: TouchPoint::new(160, 200),
    }));
    assert_eq!(app.mode(), DeviceMode::Menu, "long press is not a selection");

    // Idle is now measured from the release.
    run(&mut app, &mut dev, &mut sink, 60_020, 112_500, POLL_INTERVAL_MS, &[]);
    assert_eq!(app.mode(), DeviceMode::Menu);
    run(&mut app, &mut dev, &mut sink, 112_520, 112_520, POLL_INTERVAL_MS, &[]);
    assert_eq!(app.mode(), DeviceMode::Clock);
}

// ── IP information ────────────────────────────────────────────

#[test]
fn ip_button_shows_network_summary_and_any_tap_returns_to_menu() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);

    let t = tap_at(&mut app, &mut dev, &mut sink, t, 160, 60);
    assert_eq!(app.mode(), DeviceMode::IpInfo);
    let shown = dev
        .calls
        .iter()
        .find_map(|c| match c {
            Call::DrawIpInfo(info) => Some(info.clone()),
            _ => None,
        })
        .expect("IP screen drawn");
    assert_eq!(shown.config_url().as_str(), "192.168.1.42/config");
    assert_eq!(shown.location.as_str(), "New York, US");
    assert!(shown.api_key_present);

    dev.clear_calls();
    tap_at(&mut app, &mut dev, &mut sink, t, 5, 5);
    assert_eq!(app.mode(), DeviceMode::Menu);
    assert_eq!(dev.calls, vec![Call::DrawMenu]);
}

// ── Fatal menu actions ────────────────────────────────────────

#[test]
fn reboot_button_shows_notice_then_restarts() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);
    dev.clear_calls();

    tap_at(&mut app, &mut dev, &mut sink, t, 160, 165);

    assert!(app.is_halted());
    assert_eq!(dev.calls, vec![Call::Notice(Notice::Rebooting), Call::Restart]);
    assert!(sink.contains(&AppEvent::MenuSelected(MenuButton::Reboot)));
}

#[test]
fn factory_reset_button_erases_settings_then_restarts() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);
    dev.clear_calls();

    tap_at(&mut app, &mut dev, &mut sink, t, 160, 95);

    assert!(app.is_halted());
    assert_eq!(
        dev.calls,
        vec![Call::Notice(Notice::RestoringDefaults), Call::FactoryReset, Call::Restart]
    );
    assert_eq!(dev.stored, Ok(ClockConfig::default()));
    assert!(sink.contains(&AppEvent::Halting("factory_reset")));
}

#[test]
fn sleep_button_blanks_darkens_and_arms_touch_wake() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    let t = open_menu(&mut app, &mut dev, &mut sink);
    dev.clear_calls();

    tap_at(&mut app, &mut dev, &mut sink, t, 160, 130);

    assert_eq!(app.mode(), DeviceMode::Sleep);
    assert!(app.is_halted());
    assert!(!app.backlight_on());
    assert_eq!(
        dev.calls,
        vec![
            Call::Notice(Notice::GoingToSleep),
            Call::Blank,
            Call::SetBacklight(false),
            Call::EnterLowPower(WakeSource::TouchIrq),
        ]
    );
}

// ── Idle sleep ────────────────────────────────────────────────

#[test]
fn clock_sleeps_once_idle_exceeds_timeout() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    // Default timeout is five minutes, measured from boot.
    run(&mut app, &mut dev, &mut sink, 1_000, 300_000, 1_000, &[]);
    assert_eq!(app.mode(), DeviceMode::Clock);

    run(&mut app, &mut dev, &mut sink, 301_000, 301_000, 1_000, &[]);
    assert_eq!(app.mode(), DeviceMode::Sleep);
    assert!(app.is_halted());
    assert_eq!(dev.count(&Call::Notice(Notice::GoingToSleep)), 0);
    assert_eq!(dev.calls.last(), Some(&Call::EnterLowPower(WakeSource::TouchIrq)));
    assert!(sink.contains(&AppEvent::Halting("sleep")));
}

#[test]
fn touch_activity_restarts_idle_countdown() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);

    run(&mut app, &mut dev, &mut sink, 1_000, 199_000, 1_000, &[]);
    // Tap lands at 200_720.
    tap_at(&mut app, &mut dev, &mut sink, 200_000, 160, 120);
    assert_eq!(app.last_activity_ms(), 200_720);

    run(&mut app, &mut dev, &mut sink, 201_000, 500_000, 1_000, &[]);
    assert_eq!(app.mode(), DeviceMode::Clock);
    run(&mut app, &mut dev, &mut sink, 501_000, 501_000, 1_000, &[]);
    assert_eq!(app.mode(), DeviceMode::Sleep);
}

#[test]
fn zero_timeout_disables_idle_sleep() {
    let mut dev = MockDevice::provisioned();
    dev.stored = Ok(ClockConfig {
        sleep_timeout_min: 0,
        ..provisioned_config()
    });
    let (mut app, mut sink) = boot(&mut dev);

    run(&mut app, &mut dev, &mut sink, 10_000, 3_000_000, 10_000, &[]);
    assert_eq!(app.mode(), DeviceMode::Clock);
    assert!(!app.is_halted());
}

#[test]
fn halted_service_ignores_further_polls() {
    let mut dev = MockDevice::provisioned();
    let (mut app, mut sink) = boot(&mut dev);
    run(&mut app, &mut dev, &mut sink, 1_000, 301_000, 1_000, &[]);
    assert!(app.is_halted());

    let calls = dev.calls.len();
    let ticks = app.tick_count();
    run(&mut app, &mut dev, &mut sink, 302_000, 310_000, 1_000, &[]);
    assert_eq!(dev.calls.len(), calls);
    assert_eq!(app.tick_count(), ticks);
}
