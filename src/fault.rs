//! Fault accounting for the receiver.
//!
//! # Philosophy
//!
//! > A relay that stays off is safe.
//! > A relay that runs a motor nobody commanded is not.
//!
//! Every fault class here is recovered locally and never stops the main loop.
//! The counters exist so the main loop can report what happened, including
//! faults seen inside the radio callback, which must not log itself.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use log::{info, warn};

use crate::link::PeerAddress;

/// Non-fatal fault classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// Frame from an address other than the paired sender (dropped).
    UnknownSender = 0,
    /// Frame of the wrong length (dropped).
    MalformedMessage = 1,
    /// Same sequence as the previous message (processed anyway).
    DuplicateSequence = 2,
    /// Both directions of one motor requested (pair forced off).
    MotorConflict = 3,
    /// No valid message within the receive timeout (all outputs off).
    LinkTimeout = 4,
    /// Undrained message replaced by a newer one.
    MailboxOverwrite = 5,
    /// Relay line write failed.
    OutputWrite = 6,
}

impl FaultCode {
    pub const COUNT: usize = 7;

    pub const ALL: [FaultCode; Self::COUNT] = [
        FaultCode::UnknownSender,
        FaultCode::MalformedMessage,
        FaultCode::DuplicateSequence,
        FaultCode::MotorConflict,
        FaultCode::LinkTimeout,
        FaultCode::MailboxOverwrite,
        FaultCode::OutputWrite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::UnknownSender => "unknown sender",
            FaultCode::MalformedMessage => "malformed message",
            FaultCode::DuplicateSequence => "duplicate sequence",
            FaultCode::MotorConflict => "motor conflict",
            FaultCode::LinkTimeout => "link timeout",
            FaultCode::MailboxOverwrite => "mailbox overwrite",
            FaultCode::OutputWrite => "output write",
        }
    }
}

/// Thread-safe fault counters.
///
/// Written from the radio callback and the main loop, read by the main loop.
///
/// # Usage
///
/// ```ignore
/// static FAULTS: FaultLog = FaultLog::new();
///
/// // In receive callback:
/// FAULTS.record_unknown_sender(sender);
///
/// // In main loop:
/// let snapshot = FAULTS.snapshot();
/// if snapshot != last { snapshot.log_changes(&last); }
/// ```
pub struct FaultLog {
    /// Per-code totals since boot (never cleared).
    counts: [AtomicU32; FaultCode::COUNT],

    /// Most recent unpaired address that tried to talk to us.
    last_unknown: Mutex<Cell<Option<PeerAddress>>>,
}

impl FaultLog {
    pub const fn new() -> Self {
        Self {
            counts: [
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
            last_unknown: Mutex::new(Cell::new(None)),
        }
    }

    #[inline]
    pub fn record(&self, code: FaultCode) {
        self.counts[code as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Count an unknown sender and remember its address.
    pub fn record_unknown_sender(&self, sender: PeerAddress) {
        self.record(FaultCode::UnknownSender);
        critical_section::with(|cs| self.last_unknown.borrow(cs).set(Some(sender)));
    }

    #[inline]
    pub fn count(&self, code: FaultCode) -> u32 {
        self.counts[code as usize].load(Ordering::Relaxed)
    }

    pub fn last_unknown_sender(&self) -> Option<PeerAddress> {
        critical_section::with(|cs| self.last_unknown.borrow(cs).get())
    }

    pub fn snapshot(&self) -> FaultSnapshot {
        let mut counts = [0u32; FaultCode::COUNT];
        for code in FaultCode::ALL {
            counts[code as usize] = self.count(code);
        }
        FaultSnapshot {
            counts,
            last_unknown: self.last_unknown_sender(),
        }
    }
}

impl Default for FaultLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Fault counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub counts: [u32; FaultCode::COUNT],
    pub last_unknown: Option<PeerAddress>,
}

impl FaultSnapshot {
    pub fn count(&self, code: FaultCode) -> u32 {
        self.counts[code as usize]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().fold(0u32, |acc, &c| acc.wrapping_add(c))
    }

    /// Codes whose count grew since `earlier`.
    pub fn changed_since<'a>(&'a self, earlier: &'a FaultSnapshot) -> impl Iterator<Item = FaultCode> + 'a {
        FaultCode::ALL
            .into_iter()
            .filter(move |&code| self.count(code) != earlier.count(code))
    }

    /// Periodic summary of every non-zero counter.
    pub fn log_summary(&self) {
        if self.total() == 0 {
            info!("fault summary: none");
            return;
        }
        info!("fault summary: {} total", self.total());
        for code in FaultCode::ALL {
            let n = self.count(code);
            if n > 0 {
                info!("  {}: {}", code.as_str(), n);
            }
        }
        if let Some(addr) = self.last_unknown {
            info!("  last unknown sender: {}", addr);
        }
    }

    /// Log one line per code that grew since `earlier`.
    pub fn log_changes(&self, earlier: &FaultSnapshot) {
        for code in self.changed_since(earlier) {
            let delta = self.count(code).wrapping_sub(earlier.count(code));
            match (code, self.last_unknown) {
                (FaultCode::UnknownSender, Some(addr)) => warn!(
                    "{}: +{} (total {}), last from {}, packets ignored",
                    code.as_str(),
                    delta,
                    self.count(code),
                    addr
                ),
                _ => warn!("{}: +{} (total {})", code.as_str(), delta, self.count(code)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let faults = FaultLog::new();
        assert_eq!(faults.snapshot().total(), 0);

        faults.record(FaultCode::MotorConflict);
        faults.record(FaultCode::MotorConflict);
        faults.record(FaultCode::LinkTimeout);

        assert_eq!(faults.count(FaultCode::MotorConflict), 2);
        assert_eq!(faults.count(FaultCode::LinkTimeout), 1);
        assert_eq!(faults.snapshot().total(), 3);
    }

    #[test]
    fn test_unknown_sender_remembered() {
        let faults = FaultLog::new();
        let stranger = PeerAddress::new([1, 2, 3, 4, 5, 6]);
        faults.record_unknown_sender(stranger);

        assert_eq!(faults.count(FaultCode::UnknownSender), 1);
        assert_eq!(faults.last_unknown_sender(), Some(stranger));
    }

    #[test]
    fn test_changed_since() {
        let faults = FaultLog::new();
        let before = faults.snapshot();
        faults.record(FaultCode::DuplicateSequence);
        let after = faults.snapshot();

        let changed: Vec<FaultCode> = after.changed_since(&before).collect();
        assert_eq!(changed, vec![FaultCode::DuplicateSequence]);
    }
}
