//! Hardware Abstraction Layer for AwningLink.
//!
//! Capability traits the core consumes. Business logic stays in core modules,
//! HAL is just I/O. ESP-IDF implementations live in `crate::platform`; host
//! tests provide mocks.

pub mod gpio;

use core::fmt::Debug;

use crate::buttons::ButtonMask;
use crate::link::{PeerAddress, SendOutcome};
use crate::power::WakeCause;
use crate::status::StatusPattern;

pub use gpio::LineError;

/// Raw button lines (pull-up, active-low on the board).
pub trait ButtonInputs {
    /// `true` if `line` is currently pressed. Unreadable lines report `false`.
    fn is_asserted(&mut self, line: usize) -> bool;
}

/// Drive state of a relay output line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputLevel {
    Energized,
    Deenergized,
}

impl OutputLevel {
    #[inline]
    pub fn from_bool(on: bool) -> Self {
        if on {
            OutputLevel::Energized
        } else {
            OutputLevel::Deenergized
        }
    }

    #[inline]
    pub fn is_energized(self) -> bool {
        self == OutputLevel::Energized
    }
}

/// Relay driver lines on the receiver.
pub trait OutputLines {
    type Error: Debug;

    fn write(&mut self, line: usize, level: OutputLevel) -> Result<(), Self::Error>;
}

/// Connectionless datagram radio (ESP-NOW).
pub trait Transport {
    type Error: Debug;

    /// Start a transmission. `Ok` only means the radio accepted the frame;
    /// delivery is reported later through [`poll_outcome`](Self::poll_outcome).
    fn send(&mut self, peer: &PeerAddress, payload: &[u8]) -> Result<(), Self::Error>;

    /// Asynchronous result of the last started transmission, if one arrived.
    fn poll_outcome(&mut self) -> Option<SendOutcome>;

    /// Signal-strength indicator for outgoing telemetry, 0 if unknown.
    fn link_quality(&self) -> u8 {
        0
    }
}

/// Level condition that resumes the sender from deep sleep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeTrigger {
    /// Wake when any configured line is pulled low.
    AnyLow,
}

/// Deep-sleep primitive of the sender.
pub trait SleepControl {
    type Error: Debug;

    fn configure_wake_sources(
        &mut self,
        lines: ButtonMask,
        trigger: WakeTrigger,
    ) -> Result<(), Self::Error>;

    /// Enter deep sleep. Does not return on hardware: wake is a fresh boot.
    fn suspend(&mut self);

    fn wake_cause(&self) -> WakeCause;
}

/// Sender battery sampling.
pub trait BatterySensor {
    type Error: Debug;

    fn read_voltage(&mut self) -> Result<f32, Self::Error>;

    /// `true` while USB power is present (battery charging).
    fn usb_powered(&mut self) -> bool;
}

/// RGB status LED. Fire-and-forget.
pub trait StatusIndicator {
    fn display(&mut self, pattern: StatusPattern);
}

/// Monotonic millisecond clock since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}
