//! RGB status indicator patterns of the remote.
//!
//! Each pattern is a fixed list of steps. The platform plays them on the
//! common-anode LED; the core only decides which pattern to show.

/// LED colour (each channel on/off).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Rgb {
    pub const OFF: Self = Self::new(false, false, false);
    pub const RED: Self = Self::new(true, false, false);
    pub const GREEN: Self = Self::new(false, true, false);
    pub const BLUE: Self = Self::new(false, false, true);
    pub const CYAN: Self = Self::new(false, true, true);
    pub const ORANGE: Self = Self::new(true, true, false);

    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

/// One step of a pattern: show `color` for `hold_ms`.
///
/// A final step with `hold_ms == 0` leaves the colour on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub color: Rgb,
    pub hold_ms: u32,
}

const fn step(color: Rgb, hold_ms: u32) -> Step {
    Step { color, hold_ms }
}

const AWAKE: &[Step] = &[step(Rgb::CYAN, 100), step(Rgb::OFF, 0)];
const BUTTON_OK: &[Step] = &[step(Rgb::GREEN, 100), step(Rgb::OFF, 0)];
const MULTI_BUTTON_ERROR: &[Step] = &[
    step(Rgb::RED, 200),
    step(Rgb::OFF, 100),
    step(Rgb::RED, 200),
    step(Rgb::OFF, 100),
    step(Rgb::RED, 200),
    step(Rgb::OFF, 100),
];
const SENDING: &[Step] = &[step(Rgb::BLUE, 200), step(Rgb::OFF, 0)];
const SEND_SUCCESS: &[Step] = &[
    step(Rgb::GREEN, 100),
    step(Rgb::OFF, 80),
    step(Rgb::GREEN, 100),
    step(Rgb::OFF, 80),
];
const SEND_ERROR: &[Step] = &[
    step(Rgb::RED, 50),
    step(Rgb::OFF, 50),
    step(Rgb::RED, 50),
    step(Rgb::OFF, 50),
    step(Rgb::RED, 50),
    step(Rgb::OFF, 50),
    step(Rgb::RED, 50),
    step(Rgb::OFF, 50),
    step(Rgb::RED, 50),
    step(Rgb::OFF, 50),
];
const BATTERY_CRITICAL: &[Step] = &[step(Rgb::RED, 2_000), step(Rgb::OFF, 2_000)];
const CHARGING: &[Step] = &[step(Rgb::ORANGE, 1_000), step(Rgb::OFF, 1_000)];
const BATTERY_FULL: &[Step] = &[step(Rgb::GREEN, 0)];
const INACTIVITY_TIMEOUT: &[Step] = &[step(Rgb::CYAN, 1_000), step(Rgb::OFF, 0)];

/// Indicator sequences of the remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusPattern {
    /// Boot / wake (cyan flash).
    Awake,
    /// Valid single press (green flash).
    ButtonOk,
    /// Several buttons at once, nothing sent (red x3).
    MultiButtonError,
    /// Transmission started (blue).
    Sending,
    /// Peer acknowledged (green x2).
    SendSuccess,
    /// Send failed or not acknowledged (fast red x5).
    SendError,
    /// Battery below minimum (slow red).
    BatteryCritical,
    /// On USB, charging (orange).
    Charging,
    /// On USB, full (steady green).
    BatteryFull,
    /// Going to sleep (cyan 1 s).
    InactivityTimeout,
}

impl StatusPattern {
    pub fn steps(self) -> &'static [Step] {
        match self {
            Self::Awake => AWAKE,
            Self::ButtonOk => BUTTON_OK,
            Self::MultiButtonError => MULTI_BUTTON_ERROR,
            Self::Sending => SENDING,
            Self::SendSuccess => SEND_SUCCESS,
            Self::SendError => SEND_ERROR,
            Self::BatteryCritical => BATTERY_CRITICAL,
            Self::Charging => CHARGING,
            Self::BatteryFull => BATTERY_FULL,
            Self::InactivityTimeout => INACTIVITY_TIMEOUT,
        }
    }

    /// Total play time in milliseconds.
    pub fn duration_ms(self) -> u32 {
        self.steps().iter().map(|s| s.hold_ms).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_counts() {
        let red_flashes = |p: StatusPattern| p.steps().iter().filter(|s| s.color == Rgb::RED).count();
        assert_eq!(red_flashes(StatusPattern::MultiButtonError), 3);
        assert_eq!(red_flashes(StatusPattern::SendError), 5);
        assert_eq!(StatusPattern::SendError.duration_ms(), 500);
    }

    #[test]
    fn test_only_battery_full_stays_lit() {
        let all = [
            StatusPattern::Awake,
            StatusPattern::ButtonOk,
            StatusPattern::MultiButtonError,
            StatusPattern::Sending,
            StatusPattern::SendSuccess,
            StatusPattern::SendError,
            StatusPattern::BatteryCritical,
            StatusPattern::Charging,
            StatusPattern::InactivityTimeout,
        ];
        for pattern in all {
            assert_eq!(pattern.steps().last().unwrap().color, Rgb::OFF, "{:?}", pattern);
        }
        assert_eq!(StatusPattern::BatteryFull.steps().last().unwrap().color, Rgb::GREEN);
    }
}
