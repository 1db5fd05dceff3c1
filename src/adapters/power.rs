//! Power adapter: deep sleep, restart and the backlight.
//!
//! Implements [`PowerPort`].  Every backlight change is mirrored into
//! [`ServerShared`] so `/toggle_backlight` can answer with the state it
//! will produce.  Off-target, halting calls are recorded instead.

use log::info;

use crate::adapters::config_server::ServerShared;
use crate::app::ports::{PowerPort, WakeSource};
use crate::drivers::backlight::Backlight;
use crate::pins;

/// What the host build did instead of halting.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimHalt {
    DeepSleep { wake_mask: u64 },
    Restart,
}

pub struct PowerAdapter {
    backlight: Backlight,
    shared: &'static ServerShared,
    #[cfg(not(target_os = "espidf"))]
    halted: Option<SimHalt>,
}

impl PowerAdapter {
    pub fn new(backlight: Backlight, shared: &'static ServerShared) -> Self {
        shared.set_backlight_state(backlight.is_on());
        Self {
            backlight,
            shared,
            #[cfg(not(target_os = "espidf"))]
            halted: None,
        }
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight.is_on()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn halted(&self) -> Option<SimHalt> {
        self.halted
    }
}

fn wake_mask(wake: WakeSource) -> u64 {
    match wake {
        WakeSource::TouchIrq => 1u64 << pins::TOUCH_IRQ_GPIO,
    }
}

impl PowerPort for PowerAdapter {
    fn enter_low_power(&mut self, wake: WakeSource) {
        self.set_backlight(false);
        let mask = wake_mask(wake);
        info!("Power: deep sleep, wake mask {:#x}", mask);

        #[cfg(target_os = "espidf")]
        // SAFETY: the IRQ pin is an RTC-capable input; deep sleep does not return.
        unsafe {
            esp_idf_sys::esp_sleep_enable_ext1_wakeup(
                mask,
                esp_idf_sys::esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ALL_LOW,
            );
            esp_idf_sys::esp_deep_sleep_start();
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.halted = Some(SimHalt::DeepSleep { wake_mask: mask });
        }
    }

    fn restart(&mut self) {
        info!("Power: restarting");

        #[cfg(target_os = "espidf")]
        // SAFETY: plain SoC reset.
        unsafe {
            esp_idf_sys::esp_restart();
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.halted = Some(SimHalt::Restart);
        }
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight.set(on);
        self.shared.set_backlight_state(on);
    }
}
