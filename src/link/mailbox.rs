//! Callback-to-main-loop handoff.
//!
//! Radio callbacks run outside the main loop and may interleave with it at any
//! point. They never touch component state directly: they post into one of the
//! slots below and the main loop drains the slot once per iteration.
//!
//! - [`Mailbox`]: single-slot, newest-wins inbox for screened messages.
//! - [`SendOutcomeSlot`]: latest asynchronous send result on the sender.

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;

use super::message::WireMessage;

/// Single-slot inbox for messages that passed identity and length screening.
///
/// # Usage
///
/// ```ignore
/// static INBOX: Mailbox = Mailbox::new();
///
/// // In receive callback:
/// if INBOX.post(message) {
///     FAULTS.record(FaultCode::MailboxOverwrite);
/// }
///
/// // In main loop:
/// if let Some(message) = INBOX.take() {
///     node.handle_message(message, now_ms, &FAULTS);
/// }
/// ```
pub struct Mailbox {
    slot: Mutex<Cell<Option<WireMessage>>>,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Store a message, replacing any undrained one.
    ///
    /// Returns `true` if an undrained message was overwritten.
    pub fn post(&self, message: WireMessage) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).replace(Some(message)).is_some())
    }

    /// Remove and return the pending message, if any.
    pub fn take(&self) -> Option<WireMessage> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }

    /// Check for a pending message without draining it.
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let pending = cell.get();
            pending.is_some()
        })
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Result reported by the radio for a started transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SendOutcome {
    /// MAC-layer acknowledgment received from the peer.
    Delivered = 1,
    /// No acknowledgment (peer out of range or powered off).
    Failed = 2,
}

const OUTCOME_EMPTY: u8 = 0;

/// Latest send outcome, written by the send callback, polled by the sender loop.
pub struct SendOutcomeSlot {
    outcome: AtomicU8,
}

impl SendOutcomeSlot {
    pub const fn new() -> Self {
        Self {
            outcome: AtomicU8::new(OUTCOME_EMPTY),
        }
    }

    #[inline]
    pub fn post(&self, outcome: SendOutcome) {
        self.outcome.store(outcome as u8, Ordering::Release);
    }

    #[inline]
    pub fn take(&self) -> Option<SendOutcome> {
        match self.outcome.swap(OUTCOME_EMPTY, Ordering::AcqRel) {
            1 => Some(SendOutcome::Delivered),
            2 => Some(SendOutcome::Failed),
            _ => None,
        }
    }
}

impl Default for SendOutcomeSlot {
    fn default() -> Self {
        Self::new()
    }
}
