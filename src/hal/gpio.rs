//! `embedded-hal` adapters for button inputs and relay outputs.
//!
//! Any array of `InputPin`s is a button bank (active-low, pull-up), any array
//! of `OutputPin`s is a relay bank (high = energized).

use embedded_hal::digital::{InputPin, OutputPin};

use super::{ButtonInputs, OutputLevel, OutputLines};

/// Output write failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError<E> {
    /// Line index beyond the bank.
    OutOfRange(usize),
    /// Pin driver error.
    Pin(E),
}

impl<P: InputPin, const N: usize> ButtonInputs for [P; N] {
    fn is_asserted(&mut self, line: usize) -> bool {
        match self.get_mut(line) {
            Some(pin) => pin.is_low().unwrap_or(false),
            None => false,
        }
    }
}

impl<P: OutputPin, const N: usize> OutputLines for [P; N] {
    type Error = LineError<P::Error>;

    fn write(&mut self, line: usize, level: OutputLevel) -> Result<(), Self::Error> {
        let pin = self.get_mut(line).ok_or(LineError::OutOfRange(line))?;
        match level {
            OutputLevel::Energized => pin.set_high(),
            OutputLevel::Deenergized => pin.set_low(),
        }
        .map_err(LineError::Pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct FakePin {
        low: bool,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(!self.low)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(self.low)
        }
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.low = true;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.low = false;
            Ok(())
        }
    }

    #[test]
    fn test_input_bank_is_active_low() {
        let mut bank = [FakePin { low: false }, FakePin { low: true }];
        assert!(!bank.is_asserted(0));
        assert!(bank.is_asserted(1));
        assert!(!bank.is_asserted(5)); // out of range reads as released
    }

    #[test]
    fn test_output_bank_levels() {
        let mut bank = [FakePin { low: true }, FakePin { low: true }];
        bank.write(1, OutputLevel::Energized).unwrap();
        assert!(!bank[1].low);
        bank.write(1, OutputLevel::Deenergized).unwrap();
        assert!(bank[1].low);
        assert_eq!(bank.write(2, OutputLevel::Energized), Err(LineError::OutOfRange(2)));
    }
}
