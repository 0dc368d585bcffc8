//! Receiver node: relay board main-loop logic.
//!
//! # Architecture
//!
//! ```text
//! radio callback                 main loop (every RECEIVER_LOOP_PERIOD_MS)
//! ──────────────                 ─────────────────────────────────────────
//! screen(sender, bytes)          Mailbox::take ─▶ admit ─▶ OutputArbiter::apply
//!   ok  ─▶ Mailbox::post                            └──▶ watchdog.clear()
//!   err ─▶ FaultLog counters     FailSafeWatchdog::poll ─▶ all_off on timeout
//! ```
//!
//! The callback never touches [`LinkHealth`] or the outputs. Everything
//! stateful runs on the main loop, one message at a time.

pub mod outputs;
pub mod validator;
pub mod watchdog;

use log::{info, warn};

use crate::config::ReceiverConfig;
use crate::fault::{FaultCode, FaultLog};
use crate::hal::OutputLines;
use crate::link::{Mailbox, PeerAddress, WireMessage};

pub use outputs::{ApplyReport, MotorPair, OutputArbiter, OutputState, PairingError};
pub use validator::{Accepted, LinkHealth, ReceiveValidator, Rejection, SequenceCheck};
pub use watchdog::{FailSafeWatchdog, WatchdogEvent};

/// Screen a frame in callback context and hand it to the main loop.
///
/// Never logs and never blocks beyond a critical section.
pub fn on_receive(
    validator: &ReceiveValidator,
    mailbox: &Mailbox,
    faults: &FaultLog,
    sender: &PeerAddress,
    bytes: &[u8],
) {
    match validator.screen(sender, bytes) {
        Ok(message) => {
            if mailbox.post(message) {
                faults.record(FaultCode::MailboxOverwrite);
            }
        }
        Err(Rejection::UnknownSender(addr)) => faults.record_unknown_sender(addr),
        Err(Rejection::Malformed(_)) => faults.record(FaultCode::MalformedMessage),
    }
}

/// What one main-loop iteration did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ServiceReport {
    pub accepted: Option<Accepted>,
    pub applied: Option<ApplyReport>,
    pub tripped: bool,
}

/// Receiver state owned by the main loop.
pub struct ReceiverNode<O: OutputLines> {
    validator: ReceiveValidator,
    health: LinkHealth,
    outputs: OutputArbiter<O>,
    watchdog: FailSafeWatchdog,
}

impl<O: OutputLines> ReceiverNode<O> {
    /// Build at boot: outputs off, timeout clock running from `now_ms`.
    pub fn new(config: &ReceiverConfig, lines: O, now_ms: u64) -> Result<Self, PairingError> {
        let outputs = OutputArbiter::new(lines, config.motor_pairs)?;
        info!("waiting for sender {}", config.sender);

        Ok(Self {
            validator: ReceiveValidator::new(config.sender),
            health: LinkHealth::new(now_ms),
            outputs,
            watchdog: FailSafeWatchdog::new(config.receive_timeout_ms),
        })
    }

    pub fn validator(&self) -> &ReceiveValidator {
        &self.validator
    }

    pub fn health(&self) -> &LinkHealth {
        &self.health
    }

    pub fn outputs(&self) -> &OutputArbiter<O> {
        &self.outputs
    }

    pub fn watchdog(&self) -> &FailSafeWatchdog {
        &self.watchdog
    }

    /// Admit a screened message and drive the outputs from it.
    pub fn handle_message(
        &mut self,
        message: WireMessage,
        now_ms: u64,
        faults: &FaultLog,
    ) -> (Accepted, ApplyReport) {
        let accepted = self.validator.admit(&mut self.health, message, now_ms);
        if accepted.sequence == SequenceCheck::Duplicate {
            faults.record(FaultCode::DuplicateSequence);
        }

        if self.watchdog.is_tripped() {
            info!("link restored, resuming output mapping");
        }
        self.watchdog.clear();

        let report = self.outputs.apply(accepted.mask);
        if report.has_conflict() {
            faults.record(FaultCode::MotorConflict);
        }
        for _ in 0..report.write_errors {
            faults.record(FaultCode::OutputWrite);
        }
        (accepted, report)
    }

    /// Synchronous path for a raw frame: validate, then handle.
    pub fn receive(
        &mut self,
        sender: &PeerAddress,
        bytes: &[u8],
        now_ms: u64,
        faults: &FaultLog,
    ) -> Result<(Accepted, ApplyReport), Rejection> {
        match self.validator.screen(sender, bytes) {
            Ok(message) => Ok(self.handle_message(message, now_ms, faults)),
            Err(rejection) => {
                match rejection {
                    Rejection::UnknownSender(addr) => faults.record_unknown_sender(addr),
                    Rejection::Malformed(_) => faults.record(FaultCode::MalformedMessage),
                }
                warn!("packet dropped: {}", rejection);
                Err(rejection)
            }
        }
    }

    /// One main-loop iteration: drain the mailbox, then poll the watchdog.
    pub fn service(&mut self, mailbox: &Mailbox, faults: &FaultLog, now_ms: u64) -> ServiceReport {
        let mut report = ServiceReport::default();

        if let Some(message) = mailbox.take() {
            let (accepted, applied) = self.handle_message(message, now_ms, faults);
            report.accepted = Some(accepted);
            report.applied = Some(applied);
        }

        match self.watchdog.poll(now_ms, &self.health, &mut self.outputs) {
            WatchdogEvent::Tripped { write_errors, .. } => {
                faults.record(FaultCode::LinkTimeout);
                for _ in 0..write_errors {
                    faults.record(FaultCode::OutputWrite);
                }
                report.tripped = true;
            }
            WatchdogEvent::Retried { .. } | WatchdogEvent::Quiet => {}
        }

        report
    }
}
