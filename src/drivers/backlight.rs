//! TFT backlight switch (GPIO 21 on the CYD board, active HIGH).

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::error::Result;
use crate::pins;

pub struct Backlight {
    on: bool,
}

impl Backlight {
    /// Configure the pin as a push-pull output and switch the panel on.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins::BACKLIGHT_GPIO,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: one-time configuration of a pin no other driver owns.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(crate::error::Error::Init("backlight gpio"));
        }
        let mut bl = Self { on: false };
        bl.set(true);
        info!("Backlight: GPIO{} ready", pins::BACKLIGHT_GPIO);
        Ok(bl)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self> {
        info!("Backlight(sim): GPIO{}", pins::BACKLIGHT_GPIO);
        Ok(Self { on: true })
    }

    pub fn set(&mut self, on: bool) {
        #[cfg(target_os = "espidf")]
        // SAFETY: pin configured as output in `new`.
        unsafe {
            gpio_set_level(pins::BACKLIGHT_GPIO, u32::from(on));
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_lit_and_toggles() {
        let mut bl = Backlight::new().unwrap();
        assert!(bl.is_on());
        bl.set(false);
        assert!(!bl.is_on());
        bl.set(true);
        assert!(bl.is_on());
    }
}
