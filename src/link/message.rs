//! Module: link::message
//!
//! Purpose: Fixed-layout wire message shared by sender and receiver, plus the
//! sender-owned sequence counter.
//!
//! Wire layout (7 bytes, little-endian, no padding):
//! ```text
//! [button_mask:1][battery_volts:4 f32][sequence:1][link_quality:1]
//! ```
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

use core::fmt;

/// Exact encoded length. Anything else is rejected on receive.
pub const WIRE_LEN: usize = 7;

const OFFSET_MASK: usize = 0;
const OFFSET_BATTERY: usize = 1;
const OFFSET_SEQUENCE: usize = 5;
const OFFSET_LINK_QUALITY: usize = 6;

/// One sender-to-receiver command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WireMessage {
    /// Bits 0-5: buttons 1-6.
    pub button_mask: u8,
    /// Sender battery voltage in volts (telemetry only).
    pub battery_volts: f32,
    /// Mod-256 counter, incremented once per accepted press.
    pub sequence: u8,
    /// Signal-strength indicator measured by the sender (informational).
    pub link_quality: u8,
}

/// Receive-side decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload length differs from [`WIRE_LEN`].
    Length { actual: usize },
}

impl WireMessage {
    /// Serialize into the fixed wire layout.
    pub fn encode(&self) -> [u8; WIRE_LEN] {
        let mut buf = [0u8; WIRE_LEN];
        buf[OFFSET_MASK] = self.button_mask;
        buf[OFFSET_BATTERY..OFFSET_SEQUENCE].copy_from_slice(&self.battery_volts.to_le_bytes());
        buf[OFFSET_SEQUENCE] = self.sequence;
        buf[OFFSET_LINK_QUALITY] = self.link_quality;
        buf
    }

    /// Deserialize a received payload. Never panics on foreign input.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let buf: &[u8; WIRE_LEN] = bytes
            .try_into()
            .map_err(|_| DecodeError::Length { actual: bytes.len() })?;

        let battery = [
            buf[OFFSET_BATTERY],
            buf[OFFSET_BATTERY + 1],
            buf[OFFSET_BATTERY + 2],
            buf[OFFSET_BATTERY + 3],
        ];

        Ok(Self {
            button_mask: buf[OFFSET_MASK],
            battery_volts: f32::from_le_bytes(battery),
            sequence: buf[OFFSET_SEQUENCE],
            link_quality: buf[OFFSET_LINK_QUALITY],
        })
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { actual } => {
                write!(f, "expected {} bytes, got {}", WIRE_LEN, actual)
            }
        }
    }
}

/// Sender-exclusive mod-256 sequence counter.
///
/// Starts at 0 on every power-on or wake (deep sleep loses RAM).
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Value the next call to [`advance`](Self::advance) will hand out.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.next
    }

    /// Take the current value and step the counter, wrapping 255 -> 0.
    #[inline]
    pub fn advance(&mut self) -> u8 {
        let current = self.next;
        self.next = self.next.wrapping_add(1);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let msg = WireMessage {
            button_mask: 0b0000_0100,
            battery_volts: 3.75,
            sequence: 42,
            link_quality: 7,
        };
        let bytes = msg.encode();

        assert_eq!(bytes.len(), 7);
        assert_eq!(bytes[0], 0b0000_0100);
        assert_eq!(&bytes[1..5], &3.75f32.to_le_bytes());
        assert_eq!(bytes[5], 42);
        assert_eq!(bytes[6], 7);
    }

    #[test]
    fn test_counter_wraps() {
        let mut counter = SequenceCounter { next: 254 };
        assert_eq!(counter.advance(), 254);
        assert_eq!(counter.advance(), 255);
        assert_eq!(counter.advance(), 0);
        assert_eq!(counter.peek(), 1);
    }
}
