//! Module: config
//!
//! Purpose: Timing, thresholds, pin maps and pairing for both nodes.
//!
//! Architecture:
//! - Compile-time constants are the single source of truth
//! - `SenderConfig` / `ReceiverConfig` bundle them for the node state machines
//!   (tests build shortened variants)
//! - Peer MACs can be overridden at build time via `AWNING_RECEIVER_MAC` and
//!   `AWNING_SENDER_MAC`; build.rs rejects malformed values
//!
//! Safety: Safe. Plain data.

use log::warn;

use crate::buttons::BUTTON_COUNT;
use crate::link::PeerAddress;
use crate::receiver::outputs::MotorPair;

// ============================================================================
// Timing
// ============================================================================

/// Second read of an asserted line happens this long after the first.
pub const DEBOUNCE_MS: u32 = 50;

/// A held button is force-released after this long.
pub const BUTTON_HOLD_TIMEOUT_MS: u64 = 5_000;

/// Sender enters deep sleep after this long without button activity.
pub const INACTIVITY_TIMEOUT_MS: u64 = 30_000;

/// Receiver de-energizes every output after this long without a valid message.
pub const RECEIVE_TIMEOUT_MS: u64 = 2_000;

/// Battery re-check period while the sender is awake.
pub const BATTERY_CHECK_INTERVAL_MS: u64 = 60_000;

/// Receiver fault summary period.
pub const DIAGNOSTICS_INTERVAL_MS: u64 = 60_000;

/// Idle pause at the end of each sender loop iteration.
pub const SENDER_LOOP_PERIOD_MS: u32 = 50;

/// Idle pause at the end of each receiver loop iteration.
pub const RECEIVER_LOOP_PERIOD_MS: u32 = 10;

// ============================================================================
// Battery
// ============================================================================

/// Below this (on battery) the remote reports critical.
pub const BATTERY_MIN_VOLTAGE: f32 = 3.3;

/// Above this (on USB) the battery counts as full.
pub const BATTERY_FULL_VOLTAGE: f32 = 4.1;

// ============================================================================
// Sender board (LILYGO T-Energy-S3)
// ============================================================================

/// Button GPIOs, buttons 1-6. All are RTC-capable for ext1 wake.
pub const SENDER_BUTTON_GPIOS: [u8; BUTTON_COUNT] = [1, 2, 4, 5, 6, 7];

/// Common-anode RGB LED (low = lit).
pub const LED_RED_GPIO: u8 = 10;
pub const LED_GREEN_GPIO: u8 = 11;
pub const LED_BLUE_GPIO: u8 = 12;

/// High while USB power is present.
pub const USB_DETECT_GPIO: u8 = 15;

/// Battery divider tap (ADC1).
pub const BATTERY_ADC_GPIO: u8 = 3;

// ============================================================================
// Receiver board (ESP32-WROOM + ULN2803)
// ============================================================================

/// Relay driver GPIOs, outputs 1-6.
pub const RECEIVER_OUTPUT_GPIOS: [u8; BUTTON_COUNT] = [26, 27, 14, 12, 13, 15];

/// (reverse, forward) output indices per motor.
pub const MOTOR_PAIRS: [MotorPair; 3] = [
    MotorPair::new(0, 1),
    MotorPair::new(2, 3),
    MotorPair::new(4, 5),
];

/// Human-readable output names for logs.
pub const OUTPUT_NAMES: [&str; BUTTON_COUNT] = [
    "motor 1 reverse (button 1)",
    "motor 1 forward (button 2)",
    "motor 2 reverse (button 3)",
    "motor 2 forward (button 4)",
    "motor 3 reverse (button 5)",
    "motor 3 forward (button 6)",
];

// ============================================================================
// Pairing
// ============================================================================

/// Receiver MAC used by the sender unless `AWNING_RECEIVER_MAC` is set.
pub const DEFAULT_RECEIVER_MAC: PeerAddress =
    PeerAddress::new([0xFC, 0xF5, 0xC4, 0x67, 0xA8, 0xE4]);

/// Sender MAC accepted by the receiver unless `AWNING_SENDER_MAC` is set.
pub const DEFAULT_SENDER_MAC: PeerAddress =
    PeerAddress::new([0x34, 0x85, 0x18, 0x78, 0x92, 0xAC]);

/// Peer the sender transmits to.
pub fn receiver_address() -> PeerAddress {
    resolve_address(option_env!("AWNING_RECEIVER_MAC"), DEFAULT_RECEIVER_MAC)
}

/// Only peer the receiver accepts commands from.
pub fn sender_address() -> PeerAddress {
    resolve_address(option_env!("AWNING_SENDER_MAC"), DEFAULT_SENDER_MAC)
}

/// Parse a build-time override, falling back to `default`.
pub fn resolve_address(value: Option<&str>, default: PeerAddress) -> PeerAddress {
    match value {
        None => default,
        Some(text) => PeerAddress::parse(text).unwrap_or_else(|e| {
            warn!("ignoring peer address '{}': {}; using {}", text, e, default);
            default
        }),
    }
}

/// ext1 wake bitmask (bit n = GPIO n) for the given button lines.
pub fn gpio_wake_mask(lines: crate::buttons::ButtonMask, gpios: &[u8; BUTTON_COUNT]) -> u64 {
    lines
        .pressed()
        .fold(0u64, |acc, line| acc | (1u64 << gpios[line]))
}

// ============================================================================
// Node configuration
// ============================================================================

/// Sender (remote) configuration.
#[derive(Clone, Copy, Debug)]
pub struct SenderConfig {
    pub receiver: PeerAddress,
    pub debounce_ms: u32,
    pub hold_timeout_ms: u64,
    pub inactivity_timeout_ms: u64,
    pub battery_check_interval_ms: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            receiver: receiver_address(),
            debounce_ms: DEBOUNCE_MS,
            hold_timeout_ms: BUTTON_HOLD_TIMEOUT_MS,
            inactivity_timeout_ms: INACTIVITY_TIMEOUT_MS,
            battery_check_interval_ms: BATTERY_CHECK_INTERVAL_MS,
        }
    }
}

/// Receiver (relay board) configuration.
#[derive(Clone, Copy, Debug)]
pub struct ReceiverConfig {
    pub sender: PeerAddress,
    pub motor_pairs: [MotorPair; 3],
    pub receive_timeout_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            sender: sender_address(),
            motor_pairs: MOTOR_PAIRS,
            receive_timeout_ms: RECEIVE_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buttons::ButtonMask;

    #[test]
    fn test_wake_mask_covers_all_buttons() {
        let mask = gpio_wake_mask(ButtonMask::ALL, &SENDER_BUTTON_GPIOS);
        let expected = (1 << 1) | (1 << 2) | (1 << 4) | (1 << 5) | (1 << 6) | (1 << 7);
        assert_eq!(mask, expected);
    }

    #[test]
    fn test_resolve_address_falls_back() {
        assert_eq!(resolve_address(None, DEFAULT_SENDER_MAC), DEFAULT_SENDER_MAC);
        assert_eq!(resolve_address(Some("nonsense"), DEFAULT_SENDER_MAC), DEFAULT_SENDER_MAC);
        assert_eq!(
            resolve_address(Some("01:02:03:04:05:06"), DEFAULT_SENDER_MAC),
            PeerAddress::new([1, 2, 3, 4, 5, 6])
        );
    }
}
