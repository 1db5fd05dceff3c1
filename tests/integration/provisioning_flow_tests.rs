//! Boot-time provisioning: when the device has no usable Wi-Fi settings
//! it hands itself to the setup portal, persists what the owner submits
//! and restarts.

use crate::mock_hw::{Call, MockDevice, boot, provisioned_config};

use flipclock::app::events::AppEvent;
use flipclock::app::ports::{ProvisioningError, SettingsError};
use flipclock::fsm::DeviceMode;

#[test]
fn blank_device_runs_portal_saves_and_restarts() {
    let mut dev = MockDevice::new();
    dev.portal_result = Ok(provisioned_config());

    let (app, sink) = boot(&mut dev);

    assert_eq!(app.mode(), DeviceMode::ConfigPortal);
    assert!(app.is_halted());
    assert_eq!(
        dev.calls,
        vec![
            Call::SetBacklight(true),
            Call::DrawPortal,
            Call::StartPortal,
            Call::Save(provisioned_config()),
            Call::Restart,
        ]
    );
    assert_eq!(dev.stored, Ok(provisioned_config()));
    assert!(sink.contains(&AppEvent::Started(DeviceMode::ConfigPortal)));
    assert!(sink.contains(&AppEvent::SettingsSaved));
    assert!(sink.contains(&AppEvent::Halting("portal")));
}

#[test]
fn blank_device_never_attempts_station_connect() {
    let mut dev = MockDevice::new();
    let _ = boot(&mut dev);
    assert_eq!(dev.count(&Call::Connect), 0);
}

#[test]
fn portal_timeout_restarts_without_saving() {
    let mut dev = MockDevice::new();
    dev.portal_result = Err(ProvisioningError::PortalTimeout);

    let (app, _sink) = boot(&mut dev);

    assert!(app.is_halted());
    assert!(!dev.calls.iter().any(|c| matches!(c, Call::Save(_))));
    assert_eq!(dev.calls.last(), Some(&Call::Restart));
}

#[test]
fn failed_connect_falls_back_to_portal() {
    let mut dev = MockDevice::provisioned();
    dev.connect_result = Err(ProvisioningError::ConnectFailed);

    let (app, _sink) = boot(&mut dev);

    assert_eq!(app.mode(), DeviceMode::ConfigPortal);
    assert_eq!(dev.calls[0], Call::Connect);
    assert_eq!(dev.count(&Call::StartPortal), 1);
    assert_eq!(dev.count(&Call::DrawClock), 0);
}

#[test]
fn unreadable_settings_boot_from_defaults() {
    let mut dev = MockDevice::new();
    dev.stored = Err(SettingsError::Corrupted);

    let (app, sink) = boot(&mut dev);

    assert!(sink.contains(&AppEvent::SettingsFailed));
    assert_eq!(app.mode(), DeviceMode::ConfigPortal);
    assert_eq!(app.config().sleep_timeout_min, 5);
}

#[test]
fn portal_settings_failing_validation_are_not_stored() {
    let mut dev = MockDevice::new();
    let mut bad = provisioned_config();
    bad.weather_interval_min = 1;
    dev.portal_result = Ok(bad);

    let (app, sink) = boot(&mut dev);

    assert!(app.is_halted());
    assert!(sink.contains(&AppEvent::SettingsFailed));
    assert!(!sink.contains(&AppEvent::SettingsSaved));
    assert!(dev.stored.as_ref().is_ok_and(|c| !c.has_wifi_credentials()));
    assert_eq!(dev.calls.last(), Some(&Call::Restart));
}
