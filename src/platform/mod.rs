//! ESP-IDF implementations of the [`crate::hal`] capabilities.
//!
//! Only built for `target_os = "espidf"`. Everything here is thin glue:
//! no decisions are made in this module tree.
//!
//! Pins are claimed by GPIO number from [`crate::config`], so one pin table
//! drives both the wake mask and the drivers.
//!
//! The remote's ADC, board bundle and ext1 sleep are built only for chips
//! with "any low" ext1 wake. The classic ESP32 (receiver) lacks it.

#[cfg(not(esp32))]
pub mod battery;
#[cfg(not(esp32))]
pub mod board;
pub mod led;
pub mod radio;
#[cfg(not(esp32))]
pub mod sleep;

use std::vec::Vec;

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use crate::buttons::BUTTON_COUNT;
use crate::hal::Clock;

#[cfg(not(esp32))]
pub use battery::AdcBattery;
#[cfg(not(esp32))]
pub use board::RemoteBoard;
pub use led::StatusLed;
pub use radio::{attach_receiver, local_mac, start_radio, EspNowTransport};
#[cfg(not(esp32))]
pub use sleep::DeepSleep;

/// Milliseconds since boot from the high-resolution timer.
#[inline]
pub fn now_ms() -> u64 {
    // SAFETY: esp_timer_get_time has no preconditions once the scheduler runs.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    (us / 1000) as u64
}

/// [`Clock`] backed by `esp_timer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u64 {
        now_ms()
    }
}

/// Claim the six button lines as pulled-up inputs.
pub fn button_lines(
    gpios: &[u8; BUTTON_COUNT],
) -> Result<[PinDriver<'static, AnyIOPin, Input>; BUTTON_COUNT], EspError> {
    let mut lines = Vec::with_capacity(BUTTON_COUNT);
    for &gpio in gpios {
        // SAFETY: each configured GPIO number is claimed once, at boot.
        let mut line = PinDriver::input(unsafe { AnyIOPin::new(gpio as i32) })?;
        line.set_pull(Pull::Up)?;
        log::info!("button {} on GPIO {}", lines.len() + 1, gpio);
        lines.push(line);
    }
    Ok(into_array(lines))
}

/// Claim the six relay lines as outputs, driven low.
pub fn relay_lines(
    gpios: &[u8; BUTTON_COUNT],
) -> Result<[PinDriver<'static, AnyOutputPin, Output>; BUTTON_COUNT], EspError> {
    let mut lines = Vec::with_capacity(BUTTON_COUNT);
    for &gpio in gpios {
        // SAFETY: each configured GPIO number is claimed once, at boot.
        let mut line = PinDriver::output(unsafe { AnyOutputPin::new(gpio as i32) })?;
        line.set_low()?;
        lines.push(line);
    }
    Ok(into_array(lines))
}

fn into_array<T>(lines: Vec<T>) -> [T; BUTTON_COUNT] {
    match lines.try_into() {
        Ok(array) => array,
        Err(_) => unreachable!("one driver per configured GPIO"),
    }
}
