//! Button sampling and single-press arbitration (sender side).
//!
//! Pure logic plus a blocking debounce read. Time is passed in as
//! milliseconds since boot, so everything here is testable on host.
//!
//! # Safety policy
//!
//! A multi-button state is never turned into a command. Pressing "open" and
//! "close" of the same awning together must not reach the radio at all; the
//! receiver guards against it a second time (see `receiver::outputs`).

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::config::{BUTTON_HOLD_TIMEOUT_MS, DEBOUNCE_MS};
use crate::hal::ButtonInputs;

/// Number of physical buttons / relay outputs.
pub const BUTTON_COUNT: usize = 6;

/// Debounced button state.
///
/// Bit layout:
/// - Bits 0-5: buttons 1-6 (1 = pressed)
/// - Bits 6-7: never set
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonMask(u8);

impl ButtonMask {
    /// All six button bits.
    pub const VALID_BITS: u8 = 0x3F;

    /// No button pressed.
    pub const NONE: Self = Self(0);

    /// Every button line.
    pub const ALL: Self = Self(Self::VALID_BITS);

    /// Build from raw bits, discarding bits 6-7.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::VALID_BITS)
    }

    /// Mask with only `index` set. Out-of-range indices yield an empty mask.
    pub const fn single(index: usize) -> Self {
        if index < BUTTON_COUNT {
            Self(1 << index)
        } else {
            Self::NONE
        }
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_pressed(&self, index: usize) -> bool {
        index < BUTTON_COUNT && (self.0 >> index) & 1 == 1
    }

    /// Population count.
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn with(self, index: usize) -> Self {
        Self(self.0 | Self::single(index).0)
    }

    /// Indices of pressed buttons, lowest first.
    pub fn pressed(self) -> impl Iterator<Item = usize> {
        (0..BUTTON_COUNT).filter(move |&i| self.is_pressed(i))
    }
}

/// A validated single-button command.
///
/// Only [`classify`] constructs one, so holding a `ButtonCommand` proves the
/// mask had exactly one bit set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonCommand {
    index: u8,
}

impl ButtonCommand {
    /// Zero-based button index (0-5).
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// One-based number printed on the remote.
    #[inline]
    pub fn number(&self) -> usize {
        self.index as usize + 1
    }

    #[inline]
    pub fn mask(&self) -> ButtonMask {
        ButtonMask::single(self.index as usize)
    }
}

/// Result of inspecting one debounced mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// No button pressed: no action.
    NoneActive,
    /// Exactly one button pressed.
    Single(ButtonCommand),
    /// Two or more pressed: ambiguous, never transmitted.
    MultipleActive(u32),
}

/// Enforce the exactly-one-button policy.
pub fn classify(mask: ButtonMask) -> Classification {
    match mask.count() {
        0 => Classification::NoneActive,
        1 => Classification::Single(ButtonCommand {
            index: mask.bits().trailing_zeros() as u8,
        }),
        n => Classification::MultipleActive(n),
    }
}

/// Two-read debouncer.
///
/// A line counts as pressed only if it reads asserted, and still reads
/// asserted after `interval_ms`. Worst case latency is
/// `BUTTON_COUNT * interval_ms` when every line bounces.
#[derive(Clone, Copy, Debug)]
pub struct InputDebouncer {
    interval_ms: u32,
}

impl Default for InputDebouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

impl InputDebouncer {
    pub const fn new(interval_ms: u32) -> Self {
        Self { interval_ms }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Sample all lines once and return the confirmed mask.
    ///
    /// Blocks for `interval_ms` per asserted line.
    pub fn sample<B>(&self, board: &mut B) -> ButtonMask
    where
        B: ButtonInputs + DelayNs,
    {
        let mut mask = ButtonMask::NONE;

        for line in 0..BUTTON_COUNT {
            if !board.is_asserted(line) {
                continue;
            }
            board.delay_ms(self.interval_ms);
            if board.is_asserted(line) {
                mask = mask.with(line);
            } else {
                debug!("button {} bounced, ignored", line + 1);
            }
        }

        mask
    }
}

/// Decision for one sampling cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arbitration {
    /// Nothing pressed.
    Idle,
    /// Fresh single press: transmit it.
    Transmit(ButtonCommand),
    /// Button from the last transmit is still held: suppress re-trigger.
    Held(ButtonCommand),
    /// Ambiguous multi-press: no command, report only.
    Rejected { count: u32 },
}

impl Arbitration {
    /// Any button activity at all (keeps the remote awake).
    pub fn is_activity(&self) -> bool {
        !matches!(self, Arbitration::Idle)
    }
}

#[derive(Clone, Copy, Debug)]
struct Hold {
    command: ButtonCommand,
    since_ms: u64,
}

/// Single-press arbiter with held-button suppression.
///
/// After a `Transmit`, the same button produces `Held` for as long as it stays
/// down, up to `hold_timeout_ms`. Past that the hold is force-released so a
/// stuck or shorted button cannot block the remote forever; if it is still
/// down, the next cycle transmits again with a fresh sequence number.
#[derive(Debug)]
pub struct ButtonArbiter {
    hold_timeout_ms: u64,
    hold: Option<Hold>,
}

impl Default for ButtonArbiter {
    fn default() -> Self {
        Self::new(BUTTON_HOLD_TIMEOUT_MS)
    }
}

impl ButtonArbiter {
    pub const fn new(hold_timeout_ms: u64) -> Self {
        Self {
            hold_timeout_ms,
            hold: None,
        }
    }

    /// Button currently treated as held, if any.
    pub fn held(&self) -> Option<ButtonCommand> {
        self.hold.map(|h| h.command)
    }

    /// Arbitrate one debounced mask sampled at `now_ms`.
    ///
    /// A multi-press is rejected even while a hold is active. The hold stays
    /// latched, so letting go of the extra button does not re-transmit.
    pub fn arbitrate(&mut self, mask: ButtonMask, now_ms: u64) -> Arbitration {
        let command = match classify(mask) {
            Classification::MultipleActive(count) => {
                warn!("multiple buttons ({}) pressed, nothing sent", count);
                return Arbitration::Rejected { count };
            }
            Classification::NoneActive => None,
            Classification::Single(command) => Some(command),
        };

        if let Some(hold) = self.hold {
            if command != Some(hold.command) {
                debug!("button {} released", hold.command.number());
                self.hold = None;
            } else if now_ms.saturating_sub(hold.since_ms) < self.hold_timeout_ms {
                return Arbitration::Held(hold.command);
            } else {
                warn!(
                    "button {} held longer than {} ms, forcing release",
                    hold.command.number(),
                    self.hold_timeout_ms
                );
                self.hold = None;
            }
        }

        match command {
            None => Arbitration::Idle,
            Some(command) => {
                self.hold = Some(Hold {
                    command,
                    since_ms: now_ms,
                });
                Arbitration::Transmit(command)
            }
        }
    }

    /// Forget any held button.
    pub fn reset(&mut self) {
        self.hold = None;
    }
}
