//! Host mocks shared by the integration tests.
//!
//! `MockBoard` is a complete sender board on a virtual clock: debounce delays
//! advance time instead of sleeping, and scripted presses decide what each
//! button line reads at the current instant.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use awning_link::buttons::{ButtonMask, BUTTON_COUNT};
use awning_link::config::{
    ReceiverConfig, SenderConfig, BATTERY_CHECK_INTERVAL_MS, BUTTON_HOLD_TIMEOUT_MS, DEBOUNCE_MS,
    INACTIVITY_TIMEOUT_MS, MOTOR_PAIRS, RECEIVE_TIMEOUT_MS,
};
use awning_link::hal::{
    BatterySensor, ButtonInputs, Clock, OutputLevel, OutputLines, SleepControl, StatusIndicator,
    Transport, WakeTrigger,
};
use awning_link::link::{PeerAddress, SendOutcome, WireMessage};
use awning_link::power::WakeCause;
use awning_link::receiver::MotorPair;
use awning_link::status::StatusPattern;
use embedded_hal::delay::DelayNs;

pub const SENDER: PeerAddress = PeerAddress::new([0x34, 0x85, 0x18, 0x78, 0x92, 0xAC]);
pub const RECEIVER: PeerAddress = PeerAddress::new([0xFC, 0xF5, 0xC4, 0x67, 0xA8, 0xE4]);
pub const STRANGER: PeerAddress = PeerAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

/// Error returned by every failing mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

pub fn sender_config() -> SenderConfig {
    SenderConfig {
        receiver: RECEIVER,
        debounce_ms: DEBOUNCE_MS,
        hold_timeout_ms: BUTTON_HOLD_TIMEOUT_MS,
        inactivity_timeout_ms: INACTIVITY_TIMEOUT_MS,
        battery_check_interval_ms: BATTERY_CHECK_INTERVAL_MS,
    }
}

pub fn receiver_config() -> ReceiverConfig {
    ReceiverConfig {
        sender: SENDER,
        motor_pairs: MOTOR_PAIRS,
        receive_timeout_ms: RECEIVE_TIMEOUT_MS,
    }
}

/// Encoded frame with the given mask and sequence.
pub fn frame(button_mask: u8, sequence: u8) -> [u8; 7] {
    WireMessage {
        button_mask,
        battery_volts: 3.9,
        sequence,
        link_quality: 0,
    }
    .encode()
}

// ============================================================================
// Sender board
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct Press {
    line: usize,
    from_ms: u64,
    until_ms: u64,
}

pub struct MockBoard {
    now_ns: u64,
    presses: Vec<Press>,

    // Transport
    pub sent: Vec<(PeerAddress, Vec<u8>)>,
    pub refuse_sends: bool,
    pub auto_outcome: Option<SendOutcome>,
    pub outcomes: VecDeque<SendOutcome>,
    pub link_quality: u8,

    // Indicator
    pub patterns: Vec<StatusPattern>,

    // Sleep
    pub wake: WakeCause,
    pub fail_wake_config: bool,
    pub wake_configs: Vec<(ButtonMask, WakeTrigger)>,
    pub suspends: u32,

    // Battery
    pub battery_volts: Option<f32>,
    pub usb_powered: bool,
    pub battery_reads: u32,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            now_ns: 0,
            presses: Vec::new(),
            sent: Vec::new(),
            refuse_sends: false,
            auto_outcome: None,
            outcomes: VecDeque::new(),
            link_quality: 0,
            patterns: Vec::new(),
            wake: WakeCause::PowerOn,
            fail_wake_config: false,
            wake_configs: Vec::new(),
            suspends: 0,
            battery_volts: Some(3.9),
            usb_powered: false,
            battery_reads: 0,
        }
    }

    /// Hold `line` down from `from_ms` until (excluding) `until_ms`.
    pub fn press(&mut self, line: usize, from_ms: u64, until_ms: u64) {
        self.presses.push(Press {
            line,
            from_ms,
            until_ms,
        });
    }

    /// Hold `line` down from `from_ms` on, forever.
    pub fn hold(&mut self, line: usize, from_ms: u64) {
        self.press(line, from_ms, u64::MAX);
    }

    pub fn release_all(&mut self) {
        self.presses.clear();
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.now_ns += ms * 1_000_000;
    }

    pub fn set_time_ms(&mut self, ms: u64) {
        self.now_ns = ms * 1_000_000;
    }

    /// Every sent payload, decoded.
    pub fn sent_messages(&self) -> Vec<WireMessage> {
        self.sent
            .iter()
            .map(|(_, bytes)| WireMessage::decode(bytes).expect("sender emitted a bad frame"))
            .collect()
    }

    pub fn count_pattern(&self, pattern: StatusPattern) -> usize {
        self.patterns.iter().filter(|&&p| p == pattern).count()
    }
}

impl ButtonInputs for MockBoard {
    fn is_asserted(&mut self, line: usize) -> bool {
        let now = self.now_ms();
        self.presses
            .iter()
            .any(|p| p.line == line && p.from_ms <= now && now < p.until_ms)
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns += ns as u64;
    }
}

impl Clock for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now_ns / 1_000_000
    }
}

impl Transport for MockBoard {
    type Error = MockError;

    fn send(&mut self, peer: &PeerAddress, payload: &[u8]) -> Result<(), MockError> {
        if self.refuse_sends {
            return Err(MockError);
        }
        self.sent.push((*peer, payload.to_vec()));
        if let Some(outcome) = self.auto_outcome {
            self.outcomes.push_back(outcome);
        }
        Ok(())
    }

    fn poll_outcome(&mut self) -> Option<SendOutcome> {
        self.outcomes.pop_front()
    }

    fn link_quality(&self) -> u8 {
        self.link_quality
    }
}

impl StatusIndicator for MockBoard {
    fn display(&mut self, pattern: StatusPattern) {
        self.patterns.push(pattern);
    }
}

impl SleepControl for MockBoard {
    type Error = MockError;

    fn configure_wake_sources(
        &mut self,
        lines: ButtonMask,
        trigger: WakeTrigger,
    ) -> Result<(), MockError> {
        if self.fail_wake_config {
            return Err(MockError);
        }
        self.wake_configs.push((lines, trigger));
        Ok(())
    }

    fn suspend(&mut self) {
        self.suspends += 1;
    }

    fn wake_cause(&self) -> WakeCause {
        self.wake
    }
}

impl BatterySensor for MockBoard {
    type Error = MockError;

    fn read_voltage(&mut self) -> Result<f32, MockError> {
        self.battery_reads += 1;
        self.battery_volts.ok_or(MockError)
    }

    fn usb_powered(&mut self) -> bool {
        self.usb_powered
    }
}

// ============================================================================
// Receiver outputs
// ============================================================================

/// Relay bank that records every write and checks the pair invariant after
/// each one. `failing_line` is shared so a test can break a line after the
/// bank has been moved into the arbiter.
pub struct RecordingLines {
    pub levels: [bool; BUTTON_COUNT],
    pub writes: Vec<(usize, OutputLevel)>,
    pub failing_line: Rc<Cell<Option<usize>>>,
    pub pair_violations: u32,
    pairs: [MotorPair; 3],
}

impl RecordingLines {
    pub fn new() -> Self {
        Self::with_levels([false; BUTTON_COUNT])
    }

    /// Bank whose physical lines start in `levels` (e.g. floating relays).
    pub fn with_levels(levels: [bool; BUTTON_COUNT]) -> Self {
        Self {
            levels,
            writes: Vec::new(),
            failing_line: Rc::new(Cell::new(None)),
            pair_violations: 0,
            pairs: MOTOR_PAIRS,
        }
    }

    pub fn energized(&self) -> Vec<usize> {
        (0..BUTTON_COUNT).filter(|&i| self.levels[i]).collect()
    }
}

impl OutputLines for RecordingLines {
    type Error = MockError;

    fn write(&mut self, line: usize, level: OutputLevel) -> Result<(), MockError> {
        if self.failing_line.get() == Some(line) {
            return Err(MockError);
        }
        self.writes.push((line, level));
        self.levels[line] = level.is_energized();
        if self
            .pairs
            .iter()
            .any(|p| self.levels[p.reverse] && self.levels[p.forward])
        {
            self.pair_violations += 1;
        }
        Ok(())
    }
}
