//! Receive validation.
//!
//! Split in two halves so the radio callback stays short:
//! - [`ReceiveValidator::screen`]: stateless identity + length check, safe to
//!   run inside the callback (no logging, no shared state).
//! - [`ReceiveValidator::admit`]: sequence bookkeeping and [`LinkHealth`]
//!   update, run by the main loop on the drained message.

use core::fmt;

use log::{info, warn};

use crate::buttons::ButtonMask;
use crate::link::{DecodeError, PeerAddress, WireMessage};

/// Receiver view of the link, owned by the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkHealth {
    /// Time of the last accepted message (boot time before the first one).
    pub last_valid_receipt_ms: u64,
    /// Sequence of the last accepted message, `None` until one arrives.
    pub last_sequence_seen: Option<u8>,
}

impl LinkHealth {
    /// Fresh link at boot. The timeout clock starts now.
    pub const fn new(now_ms: u64) -> Self {
        Self {
            last_valid_receipt_ms: now_ms,
            last_sequence_seen: None,
        }
    }

    /// Milliseconds since the last accepted message.
    #[inline]
    pub fn silence_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_valid_receipt_ms)
    }
}

/// Why a frame was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Not the paired sender.
    UnknownSender(PeerAddress),
    /// Wrong payload length.
    Malformed(DecodeError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownSender(addr) => write!(f, "unknown sender {}", addr),
            Rejection::Malformed(e) => write!(f, "malformed message: {}", e),
        }
    }
}

/// Sequence relation to the previous accepted message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceCheck {
    /// First message since boot.
    First,
    /// Exactly one more than the previous.
    InOrder,
    /// Same as the previous. Processed anyway: after 256 presses a fresh
    /// press legitimately repeats a number, and a sender reboot restarts at 0.
    Duplicate,
    /// This many numbers skipped (lost frames or sender reboot).
    Gap(u8),
}

impl SequenceCheck {
    pub fn classify(previous: Option<u8>, sequence: u8) -> Self {
        match previous {
            None => SequenceCheck::First,
            Some(prev) if prev == sequence => SequenceCheck::Duplicate,
            Some(prev) => match sequence.wrapping_sub(prev).wrapping_sub(1) {
                0 => SequenceCheck::InOrder,
                skipped => SequenceCheck::Gap(skipped),
            },
        }
    }
}

/// A message admitted by the main loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Accepted {
    pub mask: ButtonMask,
    pub sequence: SequenceCheck,
    pub message: WireMessage,
}

/// Identity, length and sequence validation for the paired sender.
#[derive(Clone, Copy, Debug)]
pub struct ReceiveValidator {
    paired: PeerAddress,
}

impl ReceiveValidator {
    pub const fn new(paired: PeerAddress) -> Self {
        Self { paired }
    }

    pub fn paired(&self) -> PeerAddress {
        self.paired
    }

    /// Callback-safe screening: identity first, then length.
    pub fn screen(&self, sender: &PeerAddress, bytes: &[u8]) -> Result<WireMessage, Rejection> {
        if *sender != self.paired {
            return Err(Rejection::UnknownSender(*sender));
        }
        WireMessage::decode(bytes).map_err(Rejection::Malformed)
    }

    /// Admit a screened message: check the sequence, update `health`.
    pub fn admit(&self, health: &mut LinkHealth, message: WireMessage, now_ms: u64) -> Accepted {
        let sequence = SequenceCheck::classify(health.last_sequence_seen, message.sequence);

        info!(
            "message seq {} mask 0b{:06b}, sender battery {:.2} V, link quality {}",
            message.sequence, message.button_mask, message.battery_volts, message.link_quality
        );

        match sequence {
            SequenceCheck::Duplicate => {
                warn!("duplicate packet (sequence {}), processing anyway", message.sequence)
            }
            SequenceCheck::Gap(skipped) => {
                info!("{} sequence number(s) skipped before {}", skipped, message.sequence)
            }
            SequenceCheck::First | SequenceCheck::InOrder => {}
        }

        if message.button_mask & !ButtonMask::VALID_BITS != 0 {
            warn!("ignoring undefined mask bits 0x{:02X}", message.button_mask);
        }

        health.last_valid_receipt_ms = now_ms;
        health.last_sequence_seen = Some(message.sequence);

        Accepted {
            mask: ButtonMask::from_bits(message.button_mask),
            sequence,
            message,
        }
    }

    /// Full validation in one call: screen, then admit.
    pub fn validate(
        &self,
        health: &mut LinkHealth,
        sender: &PeerAddress,
        bytes: &[u8],
        now_ms: u64,
    ) -> Result<Accepted, Rejection> {
        match self.screen(sender, bytes) {
            Ok(message) => Ok(self.admit(health, message, now_ms)),
            Err(rejection) => {
                warn!("packet dropped: {}", rejection);
                Err(rejection)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_classify() {
        assert_eq!(SequenceCheck::classify(None, 0), SequenceCheck::First);
        assert_eq!(SequenceCheck::classify(Some(4), 5), SequenceCheck::InOrder);
        assert_eq!(SequenceCheck::classify(Some(255), 0), SequenceCheck::InOrder);
        assert_eq!(SequenceCheck::classify(Some(9), 9), SequenceCheck::Duplicate);
        assert_eq!(SequenceCheck::classify(Some(4), 7), SequenceCheck::Gap(2));
        assert_eq!(SequenceCheck::classify(Some(250), 2), SequenceCheck::Gap(7));
    }
}
