//! Sender battery monitoring.
//!
//! Sampled at boot and then every `check_interval_ms` while awake. The last
//! good reading is cached for the telemetry field of outgoing messages.

use log::{info, warn};

use crate::config::{BATTERY_CHECK_INTERVAL_MS, BATTERY_FULL_VOLTAGE, BATTERY_MIN_VOLTAGE};
use crate::hal::BatterySensor;
use crate::status::StatusPattern;

/// ADC full scale (12 bit).
const ADC_MAX: f32 = 4095.0;
/// ADC reference voltage.
const ADC_REF_VOLTS: f32 = 3.3;
/// Board divider halves the cell voltage.
const DIVIDER_RATIO: f32 = 2.0;
/// Empirical calibration (+2 %).
const CALIBRATION: f32 = 1.02;

/// Convert a raw 12-bit reading at the divider tap to cell volts.
pub fn volts_from_raw(raw: u16) -> f32 {
    (raw as f32 / ADC_MAX) * DIVIDER_RATIO * ADC_REF_VOLTS * CALIBRATION
}

/// Battery condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatteryStatus {
    /// On battery, above minimum.
    Normal,
    /// On battery, below minimum.
    Critical,
    /// On USB, charging.
    Charging,
    /// On USB, charged.
    Full,
}

impl BatteryStatus {
    pub fn classify(volts: f32, usb_powered: bool) -> Self {
        match (usb_powered, volts) {
            (true, v) if v > BATTERY_FULL_VOLTAGE => BatteryStatus::Full,
            (true, _) => BatteryStatus::Charging,
            (false, v) if v < BATTERY_MIN_VOLTAGE => BatteryStatus::Critical,
            (false, _) => BatteryStatus::Normal,
        }
    }

    /// Indicator for this status. `Normal` shows nothing.
    pub fn pattern(self) -> Option<StatusPattern> {
        match self {
            BatteryStatus::Normal => None,
            BatteryStatus::Critical => Some(StatusPattern::BatteryCritical),
            BatteryStatus::Charging => Some(StatusPattern::Charging),
            BatteryStatus::Full => Some(StatusPattern::BatteryFull),
        }
    }
}

/// Periodic battery check with a cached last reading.
#[derive(Debug)]
pub struct BatteryMonitor {
    interval_ms: u64,
    last_check_ms: Option<u64>,
    volts: f32,
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new(BATTERY_CHECK_INTERVAL_MS)
    }
}

impl BatteryMonitor {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_check_ms: None,
            volts: 0.0,
        }
    }

    /// Last good voltage (0.0 before the first successful read).
    #[inline]
    pub fn volts(&self) -> f32 {
        self.volts
    }

    /// `true` if a check is due at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_check_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Run a check if due. Returns the status when a check happened.
    pub fn poll<S: BatterySensor>(&mut self, sensor: &mut S, now_ms: u64) -> Option<BatteryStatus> {
        if !self.is_due(now_ms) {
            return None;
        }
        Some(self.check(sensor, now_ms))
    }

    /// Sample now. A failed read keeps the cached voltage.
    pub fn check<S: BatterySensor>(&mut self, sensor: &mut S, now_ms: u64) -> BatteryStatus {
        self.last_check_ms = Some(now_ms);

        match sensor.read_voltage() {
            Ok(volts) => self.volts = volts,
            Err(e) => warn!("battery read failed ({:?}), keeping {:.2} V", e, self.volts),
        }

        let usb = sensor.usb_powered();
        let status = BatteryStatus::classify(self.volts, usb);
        info!(
            "battery {:.2} V, USB {}: {:?}",
            self.volts,
            if usb { "connected" } else { "not connected" },
            status
        );
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volts_from_raw() {
        assert_eq!(volts_from_raw(0), 0.0);
        let full_scale = volts_from_raw(4095);
        assert!((full_scale - 6.732).abs() < 1e-3);
        let mid = volts_from_raw(2048);
        assert!((mid - 3.367).abs() < 1e-2);
    }

    #[test]
    fn test_classify() {
        assert_eq!(BatteryStatus::classify(3.2, false), BatteryStatus::Critical);
        assert_eq!(BatteryStatus::classify(3.8, false), BatteryStatus::Normal);
        assert_eq!(BatteryStatus::classify(3.2, true), BatteryStatus::Charging);
        assert_eq!(BatteryStatus::classify(4.15, true), BatteryStatus::Full);
        assert_eq!(BatteryStatus::Normal.pattern(), None);
    }
}
