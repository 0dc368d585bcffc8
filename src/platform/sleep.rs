//! EXT1 deep sleep of the remote.

use esp_idf_svc::sys::{
    esp, esp_deep_sleep_start, esp_sleep_enable_ext1_wakeup,
    esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ANY_LOW, esp_sleep_get_ext1_wakeup_status,
    esp_sleep_get_wakeup_cause, esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT1,
    esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER, EspError,
};
use log::info;

use crate::buttons::{ButtonMask, BUTTON_COUNT};
use crate::config::gpio_wake_mask;
use crate::hal::{SleepControl, WakeTrigger};
use crate::power::WakeCause;

/// Deep-sleep control for the button GPIOs.
pub struct DeepSleep {
    gpios: [u8; BUTTON_COUNT],
}

impl DeepSleep {
    pub fn new(gpios: [u8; BUTTON_COUNT]) -> Self {
        Self { gpios }
    }
}

impl SleepControl for DeepSleep {
    type Error = EspError;

    fn configure_wake_sources(
        &mut self,
        lines: ButtonMask,
        trigger: WakeTrigger,
    ) -> Result<(), EspError> {
        let mask = gpio_wake_mask(lines, &self.gpios);
        let mode = match trigger {
            WakeTrigger::AnyLow => esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ANY_LOW,
        };
        info!("wake mask 0x{:x}", mask);
        // SAFETY: plain register configuration, no memory is handed over.
        esp!(unsafe { esp_sleep_enable_ext1_wakeup(mask, mode) })
    }

    fn suspend(&mut self) {
        // SAFETY: does not return; the next run starts from reset.
        unsafe { esp_deep_sleep_start() }
    }

    #[allow(non_upper_case_globals)]
    fn wake_cause(&self) -> WakeCause {
        // SAFETY: read-only queries of the sleep subsystem.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        match cause {
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT1 => {
                let status = unsafe { esp_sleep_get_ext1_wakeup_status() };
                WakeCause::from_ext1_status(status, &self.gpios)
            }
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
            _ => WakeCause::PowerOn,
        }
    }
}
