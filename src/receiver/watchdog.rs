//! Communication-loss fail-safe.
//!
//! Edge-triggered: the first poll that finds the link silent for at least the
//! receive timeout forces every output off once and latches. Further polls
//! stay quiet until a valid message clears the latch.
//!
//! If a relay write fails during the force-off, the latch holds a pending
//! force-off and every later poll retries it until all lines read off.

use log::{info, warn};

use crate::config::RECEIVE_TIMEOUT_MS;
use crate::hal::OutputLines;

use super::outputs::OutputArbiter;
use super::validator::LinkHealth;

/// Watchdog poll result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// Link fresh, or already tripped for this silence.
    Quiet,
    /// Just timed out; outputs were forced off.
    Tripped { silent_ms: u64, write_errors: u8 },
    /// Still silent with a force-off outstanding: retried.
    Retried { write_errors: u8 },
}

/// Receive-timeout watchdog with a one-shot latch.
#[derive(Debug)]
pub struct FailSafeWatchdog {
    timeout_ms: u64,
    tripped: bool,
    pending_off: bool,
    trips: u32,
}

impl Default for FailSafeWatchdog {
    fn default() -> Self {
        Self::new(RECEIVE_TIMEOUT_MS)
    }
}

impl FailSafeWatchdog {
    pub const fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            tripped: false,
            pending_off: false,
            trips: 0,
        }
    }

    #[inline]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// `true` while latched after a timeout.
    #[inline]
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// `true` while a force-off left some line energized.
    #[inline]
    pub fn is_force_off_pending(&self) -> bool {
        self.pending_off
    }

    /// Timeouts since boot.
    #[inline]
    pub fn trips(&self) -> u32 {
        self.trips
    }

    /// Check the link and force outputs off on the timeout edge.
    pub fn poll<O: OutputLines>(
        &mut self,
        now_ms: u64,
        health: &LinkHealth,
        outputs: &mut OutputArbiter<O>,
    ) -> WatchdogEvent {
        let silent_ms = health.silence_ms(now_ms);
        if silent_ms < self.timeout_ms {
            return WatchdogEvent::Quiet;
        }

        if self.tripped {
            if !self.pending_off {
                return WatchdogEvent::Quiet;
            }
            let write_errors = outputs.all_off();
            self.pending_off = write_errors != 0;
            if !self.pending_off {
                info!("all outputs off after retry");
            }
            return WatchdogEvent::Retried { write_errors };
        }

        warn!("TIMEOUT: no packet for {} ms, all outputs off", silent_ms);
        let write_errors = outputs.all_off();
        if write_errors != 0 {
            warn!("{} output(s) still on, retrying every poll", write_errors);
        }
        self.tripped = true;
        self.pending_off = write_errors != 0;
        self.trips = self.trips.wrapping_add(1);
        WatchdogEvent::Tripped {
            silent_ms,
            write_errors,
        }
    }

    /// A valid message arrived: re-arm.
    #[inline]
    pub fn clear(&mut self) {
        self.tripped = false;
        self.pending_off = false;
    }
}
