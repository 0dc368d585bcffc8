//! Output arbitration: button mask -> relay lines.
//!
//! The arbiter is the only writer of the relay lines. Its one hard rule: the
//! two lines of a motor pair are never energized together. A mask asking for
//! both is treated as corrupt for that motor only, which is forced off; the
//! other motors follow their bits as usual.
//!
//! Writes go break-before-make: every line that must end up off is written
//! before any line that must end up on.

use core::fmt;

use log::{debug, error, info, warn};

use crate::buttons::{ButtonMask, BUTTON_COUNT};
use crate::config::OUTPUT_NAMES;
use crate::hal::{OutputLevel, OutputLines};

/// Output indices of one motor: (reverse, forward).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotorPair {
    pub reverse: usize,
    pub forward: usize,
}

impl MotorPair {
    pub const fn new(reverse: usize, forward: usize) -> Self {
        Self { reverse, forward }
    }

    #[inline]
    pub fn contains(&self, line: usize) -> bool {
        self.reverse == line || self.forward == line
    }

    /// Both directions requested by `mask`.
    #[inline]
    pub fn conflicts(&self, mask: ButtonMask) -> bool {
        mask.is_pressed(self.reverse) && mask.is_pressed(self.forward)
    }
}

/// Invalid motor pair table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairingError {
    /// Index outside 0..6.
    OutOfRange { motor: usize, line: usize },
    /// Same line used twice.
    SharedLine { line: usize },
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingError::OutOfRange { motor, line } => {
                write!(f, "motor {} uses line {} outside 0..{}", motor + 1, line, BUTTON_COUNT)
            }
            PairingError::SharedLine { line } => write!(f, "line {} assigned twice", line),
        }
    }
}

/// Commanded state of the six relay lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputState([bool; BUTTON_COUNT]);

impl OutputState {
    pub const ALL_OFF: Self = Self([false; BUTTON_COUNT]);

    #[inline]
    pub fn is_energized(&self, line: usize) -> bool {
        self.0.get(line).copied().unwrap_or(false)
    }

    pub fn lines(&self) -> [bool; BUTTON_COUNT] {
        self.0
    }

    pub fn is_all_off(&self) -> bool {
        self.0.iter().all(|on| !on)
    }

    /// Energized lines as a mask.
    pub fn as_mask(&self) -> ButtonMask {
        (0..BUTTON_COUNT)
            .filter(|&i| self.0[i])
            .fold(ButtonMask::NONE, |mask, i| mask.with(i))
    }
}

/// Outcome of applying one mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyReport {
    /// Motors (bit n = motor n+1) forced off due to a direction conflict.
    pub conflicts: u8,
    /// Line writes that failed.
    pub write_errors: u8,
}

impl ApplyReport {
    pub fn has_conflict(&self) -> bool {
        self.conflicts != 0
    }
}

/// Sole owner of the relay lines.
pub struct OutputArbiter<O: OutputLines> {
    lines: O,
    pairs: [MotorPair; 3],
    state: OutputState,
}

impl<O: OutputLines> OutputArbiter<O> {
    /// Validate the pair table and drive every line off.
    pub fn new(lines: O, pairs: [MotorPair; 3]) -> Result<Self, PairingError> {
        let mut seen = [false; BUTTON_COUNT];
        for (motor, pair) in pairs.iter().enumerate() {
            for line in [pair.reverse, pair.forward] {
                if line >= BUTTON_COUNT {
                    return Err(PairingError::OutOfRange { motor, line });
                }
                if seen[line] {
                    return Err(PairingError::SharedLine { line });
                }
                seen[line] = true;
            }
        }

        let mut arbiter = Self {
            lines,
            pairs,
            state: OutputState::ALL_OFF,
        };
        arbiter.drive(OutputState::ALL_OFF);
        for (line, name) in OUTPUT_NAMES.iter().enumerate() {
            debug!("output {} initialized: {}", line + 1, name);
        }
        Ok(arbiter)
    }

    #[inline]
    pub fn state(&self) -> OutputState {
        self.state
    }

    pub fn pairs(&self) -> &[MotorPair; 3] {
        &self.pairs
    }

    /// Access the line driver (tests inspect mocks through this).
    pub fn lines(&self) -> &O {
        &self.lines
    }

    /// Map `mask` onto the outputs, pair by pair.
    pub fn apply(&mut self, mask: ButtonMask) -> ApplyReport {
        let mut target = [false; BUTTON_COUNT];
        for (line, on) in target.iter_mut().enumerate() {
            *on = mask.is_pressed(line);
        }

        let mut conflicts = 0u8;
        for (motor, pair) in self.pairs.iter().enumerate() {
            if pair.conflicts(mask) {
                error!(
                    "motor {} commanded reverse and forward at once, forcing both off",
                    motor + 1
                );
                target[pair.reverse] = false;
                target[pair.forward] = false;
                conflicts |= 1 << motor;
            }
        }

        if conflicts != 0 {
            warn!("invalid button combination 0b{:06b} received", mask.bits());
        }

        let write_errors = self.drive(OutputState(target));
        for (line, &on) in target.iter().enumerate() {
            info!("  {}: {}", OUTPUT_NAMES[line], if on { "ON" } else { "OFF" });
        }

        ApplyReport {
            conflicts,
            write_errors,
        }
    }

    /// De-energize every line.
    pub fn all_off(&mut self) -> u8 {
        self.drive(OutputState::ALL_OFF)
    }

    fn partner(&self, line: usize) -> Option<usize> {
        self.pairs.iter().find(|p| p.contains(line)).map(|p| {
            if p.reverse == line {
                p.forward
            } else {
                p.reverse
            }
        })
    }

    /// Write `target` break-before-make. Returns the number of failed writes.
    fn drive(&mut self, target: OutputState) -> u8 {
        let mut errors = 0u8;

        for energize in [false, true] {
            for line in 0..BUTTON_COUNT {
                if target.0[line] != energize {
                    continue;
                }
                // A partner whose "off" write failed may still be energized.
                if energize && self.partner(line).is_some_and(|p| self.state.0[p]) {
                    error!("output {} left off, its pair partner is still on", line + 1);
                    errors = errors.saturating_add(1);
                    continue;
                }
                match self.lines.write(line, OutputLevel::from_bool(energize)) {
                    Ok(()) => self.state.0[line] = energize,
                    Err(e) => {
                        error!("write to output {} failed: {:?}", line + 1, e);
                        errors = errors.saturating_add(1);
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MOTOR_PAIRS;

    #[test]
    fn test_pair_contains() {
        let pair = MotorPair::new(2, 3);
        assert!(pair.contains(2));
        assert!(pair.contains(3));
        assert!(!pair.contains(4));
        assert!(pair.conflicts(ButtonMask::from_bits(0b0000_1100)));
        assert!(!pair.conflicts(ButtonMask::from_bits(0b0000_0100)));
    }

    #[test]
    fn test_state_as_mask() {
        let state = OutputState([true, false, false, false, true, false]);
        assert_eq!(state.as_mask(), ButtonMask::from_bits(0b0001_0001));
        assert!(!state.is_all_off());
        assert!(OutputState::ALL_OFF.is_all_off());
        assert_eq!(MOTOR_PAIRS.len(), 3);
    }
}
