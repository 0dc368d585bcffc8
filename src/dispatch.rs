//! Transmit dispatcher (sender side).
//!
//! Turns a validated [`ButtonCommand`] into a wire message and starts the
//! radio send. The sequence number is consumed before the send is attempted,
//! so every accepted press gets a fresh number whether or not it gets through.
//! There is no retry: the next press is the retry.

use log::{error, info};

use crate::buttons::ButtonCommand;
use crate::hal::{StatusIndicator, Transport};
use crate::link::{PeerAddress, SendOutcome, SequenceCounter, WireMessage};
use crate::status::StatusPattern;

/// Auxiliary fields carried alongside the button mask.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Telemetry {
    pub battery_volts: f32,
    pub link_quality: u8,
}

/// Result of starting a transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Radio accepted the frame; delivery outcome follows asynchronously.
    Started { sequence: u8 },
    /// Radio refused the frame.
    Refused { sequence: u8 },
}

impl Dispatch {
    pub fn sequence(&self) -> u8 {
        match *self {
            Dispatch::Started { sequence } | Dispatch::Refused { sequence } => sequence,
        }
    }
}

/// Builds wire messages and drives the send capability.
#[derive(Debug)]
pub struct TransmitDispatcher {
    peer: PeerAddress,
    sequence: SequenceCounter,
    sent: u32,
}

impl TransmitDispatcher {
    /// New dispatcher. The sequence starts at 0 on every boot.
    pub fn new(peer: PeerAddress) -> Self {
        Self {
            peer,
            sequence: SequenceCounter::new(),
            sent: 0,
        }
    }

    pub fn peer(&self) -> PeerAddress {
        self.peer
    }

    /// Sequence number the next dispatch will use.
    pub fn next_sequence(&self) -> u8 {
        self.sequence.peek()
    }

    /// Number of dispatches since boot.
    pub fn dispatched(&self) -> u32 {
        self.sent
    }

    /// Encode `command` and start sending it.
    pub fn dispatch<B>(&mut self, io: &mut B, command: ButtonCommand, telemetry: Telemetry) -> Dispatch
    where
        B: Transport + StatusIndicator,
    {
        let sequence = self.sequence.advance();
        self.sent = self.sent.wrapping_add(1);

        let message = WireMessage {
            button_mask: command.mask().bits(),
            battery_volts: telemetry.battery_volts,
            sequence,
            link_quality: telemetry.link_quality,
        };

        io.display(StatusPattern::Sending);

        match io.send(&self.peer, &message.encode()) {
            Ok(()) => {
                info!("button {} sent, sequence {}", command.number(), sequence);
                Dispatch::Started { sequence }
            }
            Err(e) => {
                error!("send of sequence {} refused: {:?}", sequence, e);
                io.display(StatusPattern::SendError);
                Dispatch::Refused { sequence }
            }
        }
    }

    /// Show the asynchronous delivery result.
    pub fn report_outcome<I: StatusIndicator>(&self, indicator: &mut I, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Delivered => {
                info!("send status: delivered");
                indicator.display(StatusPattern::SendSuccess);
            }
            SendOutcome::Failed => {
                error!("send status: not acknowledged by {}", self.peer);
                indicator.display(StatusPattern::SendError);
            }
        }
    }
}
