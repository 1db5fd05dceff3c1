//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the clock if the main loop stalls for more than 10 seconds.
//! The loop feeds it once per pass; blocking waits (the setup portal)
//! feed it through [`feed_current_task`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: WATCHDOG_TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", WATCHDOG_TIMEOUT_MS);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): no-op");
            Self { subscribed: false }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Must be called at least every [`WATCHDOG_TIMEOUT_MS`].
    pub fn feed(&self) {
        if self.subscribed {
            feed_current_task();
        }
    }
}

/// Reset the TWDT for the calling task.  A no-op when the task is not
/// subscribed or off-target.
pub fn feed_current_task() {
    #[cfg(target_os = "espidf")]
    unsafe {
        esp_task_wdt_reset();
    }
}
